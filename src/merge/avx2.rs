use core::arch::x86_64::*;

use crate::registers::{get_dense_register, DenseRegisters, RawRegisters, DENSE_LEN, REGISTERS};
use crate::simd::avx2::unpack_registers;

/// AVX2 merge over plain, unpadded buffers.
///
/// The first 8 and final 24 registers take the scalar path; in between,
/// each iteration unpacks one 24-byte packed block to 32 register bytes
/// and folds them into the accumulator with `max_epu8`. Starting the
/// scalar head at register 8 puts the first vector window at `dense + 2`,
/// so every load and store lands inside the caller's buffers.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx2`.
#[target_feature(enable = "avx2")]
pub unsafe fn merge_avx2(raw: &mut RawRegisters, dense: &DenseRegisters) {
    for i in 0..8 {
        let val = get_dense_register(dense, i);
        if val > raw[i] {
            raw[i] = val;
        }
    }

    let mut r = dense.as_ptr().add(2);
    let mut t = raw.as_mut_ptr().add(8);

    for _ in 0..REGISTERS / 32 - 1 {
        let window = _mm256_loadu_si256(r as *const __m256i);
        let y = unpack_registers(window);

        let z = _mm256_loadu_si256(t as *const __m256i);
        let z = _mm256_max_epu8(z, y);
        _mm256_storeu_si256(t as *mut __m256i, z);

        r = r.add(24);
        t = t.add(32);
    }

    for i in REGISTERS - 24..REGISTERS {
        let val = get_dense_register(dense, i);
        if val > raw[i] {
            raw[i] = val;
        }
    }
}

/// Full-vector AVX2 merge: all 512 packed blocks go through the shuffle,
/// including both edge blocks.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx2`, that `raw` points to
/// 16384 writable bytes, and that `dense` points to the 12288 packed bytes
/// with at least 4 addressable bytes on either side: the first window load
/// starts at `dense - 4` and the last one ends at `dense + 12292`.
#[target_feature(enable = "avx2")]
pub unsafe fn merge_avx2_padded(raw: *mut u8, dense: *const u8) {
    let mut r = dense.sub(4);
    let mut t = raw;

    for _ in 0..REGISTERS / 32 {
        let window = _mm256_loadu_si256(r as *const __m256i);
        let y = unpack_registers(window);

        let z = _mm256_loadu_si256(t as *const __m256i);
        let z = _mm256_max_epu8(z, y);
        _mm256_storeu_si256(t as *mut __m256i, z);

        r = r.add(24);
        t = t.add(32);
    }
}

/// Scalar-prefix AVX2 merge: the first packed block (32 registers) takes
/// the scalar path, which lets the vector loop start on a whole block
/// without a prefix read.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx2`, that `raw` points to
/// 16384 writable bytes, and that `dense` points to the 12288 packed bytes
/// with at least 4 addressable bytes after them; the final window load
/// ends at `dense + 12292`.
#[target_feature(enable = "avx2")]
pub unsafe fn merge_avx2_scalar_head(raw: *mut u8, dense: *const u8) {
    let dense_bytes = core::slice::from_raw_parts(dense, DENSE_LEN);
    for i in 0..32 {
        let val = get_dense_register(dense_bytes, i);
        if val > *raw.add(i) {
            *raw.add(i) = val;
        }
    }

    let mut r = dense.add(24 - 4);
    let mut t = raw.add(32);

    for _ in 1..REGISTERS / 32 {
        let window = _mm256_loadu_si256(r as *const __m256i);
        let y = unpack_registers(window);

        let z = _mm256_loadu_si256(t as *const __m256i);
        let z = _mm256_max_epu8(z, y);
        _mm256_storeu_si256(t as *mut __m256i, z);

        r = r.add(24);
        t = t.add(32);
    }
}
