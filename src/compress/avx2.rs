use core::arch::x86_64::*;

use crate::registers::{set_dense_register, DenseRegisters, RawRegisters, REGISTERS};
use crate::simd::avx2::pack_registers;

/// AVX2 compress over plain, unpadded buffers.
///
/// Each iteration packs 32 register bytes into 12 packed bytes per
/// 128-bit half and stores the halves as overlapping 16-byte chunks at a
/// 12-byte stride; the four zero bytes each chunk trails are overwritten
/// by the next store. The final packed block is finished with scalar
/// read-modify-write so the last chunk's zero tail never leaves the
/// buffer.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx2`.
#[target_feature(enable = "avx2")]
pub unsafe fn compress_avx2(dense: &mut DenseRegisters, raw: &RawRegisters) {
    let mut r = raw.as_ptr();
    let mut t = dense.as_mut_ptr();

    for _ in 0..REGISTERS / 32 - 1 {
        let x = _mm256_loadu_si256(r as *const __m256i);
        let y = pack_registers(x);

        let lower = _mm256_castsi256_si128(y);
        let higher = _mm256_extracti128_si256::<1>(y);
        _mm_storeu_si128(t as *mut __m128i, lower);
        _mm_storeu_si128(t.add(12) as *mut __m128i, higher);

        r = r.add(32);
        t = t.add(24);
    }

    for i in REGISTERS - 32..REGISTERS {
        set_dense_register(dense, i, raw[i]);
    }
}

/// Full-vector AVX2 compress: all 512 blocks go through the split store.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx2`, that `raw` points to
/// 16384 readable bytes, and that `dense` points to the 12288 packed bytes
/// with at least 4 writable bytes after them: the last chunk ends at
/// `dense + 12292`, leaving zeros in the overhang.
#[target_feature(enable = "avx2")]
pub unsafe fn compress_avx2_padded(dense: *mut u8, raw: *const u8) {
    let mut r = raw;
    let mut t = dense;

    for _ in 0..REGISTERS / 32 {
        let x = _mm256_loadu_si256(r as *const __m256i);
        let y = pack_registers(x);

        let lower = _mm256_castsi256_si128(y);
        let higher = _mm256_extracti128_si256::<1>(y);
        _mm_storeu_si128(t as *mut __m128i, lower);
        _mm_storeu_si128(t.add(12) as *mut __m128i, higher);

        r = r.add(32);
        t = t.add(24);
    }
}
