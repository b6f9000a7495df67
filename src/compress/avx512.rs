use core::arch::x86_64::*;

use crate::registers::{set_dense_register, DenseRegisters, RawRegisters, REGISTERS};
use crate::simd::avx512::{pack_lanes_512, pack_shuffle_512, stride3_offsets};

/// AVX-512 compress over plain, unpadded buffers: 64 registers per
/// iteration packed to 12 bytes per 128-bit lane and stored as four
/// overlapping 16-byte chunks at a 12-byte stride. The final packed block
/// is finished with scalar read-modify-write.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx512f` and `avx512bw`.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
pub unsafe fn compress_avx512(dense: &mut DenseRegisters, raw: &RawRegisters) {
    let mut r = raw.as_ptr();
    let mut t = dense.as_mut_ptr();

    for _ in 0..REGISTERS / 64 - 1 {
        let x = _mm512_loadu_si512(r as *const __m512i);
        let y = _mm512_shuffle_epi8(pack_lanes_512(x), pack_shuffle_512());

        let p1 = _mm512_extracti32x4_epi32::<0>(y);
        let p2 = _mm512_extracti32x4_epi32::<1>(y);
        let p3 = _mm512_extracti32x4_epi32::<2>(y);
        let p4 = _mm512_extracti32x4_epi32::<3>(y);

        _mm_storeu_si128(t as *mut __m128i, p1);
        _mm_storeu_si128(t.add(12) as *mut __m128i, p2);
        _mm_storeu_si128(t.add(24) as *mut __m128i, p3);
        _mm_storeu_si128(t.add(36) as *mut __m128i, p4);

        r = r.add(64);
        t = t.add(48);
    }

    for i in REGISTERS - 64..REGISTERS {
        set_dense_register(dense, i, raw[i]);
    }
}

/// Full-vector AVX-512 split-store compress.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx512f` and `avx512bw`, that
/// `raw` points to 16384 readable bytes, and that `dense` points to the
/// 12288 packed bytes with at least 4 writable bytes after them: the last
/// chunk ends at `dense + 12292`, leaving zeros in the overhang.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
pub unsafe fn compress_avx512_padded(dense: *mut u8, raw: *const u8) {
    let mut r = raw;
    let mut t = dense;

    for _ in 0..REGISTERS / 64 {
        let x = _mm512_loadu_si512(r as *const __m512i);
        let y = _mm512_shuffle_epi8(pack_lanes_512(x), pack_shuffle_512());

        let p1 = _mm512_extracti32x4_epi32::<0>(y);
        let p2 = _mm512_extracti32x4_epi32::<1>(y);
        let p3 = _mm512_extracti32x4_epi32::<2>(y);
        let p4 = _mm512_extracti32x4_epi32::<3>(y);

        _mm_storeu_si128(t as *mut __m128i, p1);
        _mm_storeu_si128(t.add(12) as *mut __m128i, p2);
        _mm_storeu_si128(t.add(24) as *mut __m128i, p3);
        _mm_storeu_si128(t.add(36) as *mut __m128i, p4);

        r = r.add(64);
        t = t.add(48);
    }
}

/// Scatter-based AVX-512 compress: each lane's packed triplet is written
/// by a 16-lane stride-3 scatter.
///
/// Adjacent lanes overlap by one byte; scatter commits lanes from low to
/// high, so the zero fourth byte each lane carries is overwritten by the
/// next lane's low bits.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx512f`, that `raw` points to
/// 16384 readable bytes, and that `dense` points to the 12288 packed bytes
/// with at least one writable byte after them: the final lane's element
/// ends at `dense + 12289`, leaving a zero in the overhang byte.
#[target_feature(enable = "avx512f")]
pub unsafe fn compress_avx512_scatter(dense: *mut u8, raw: *const u8) {
    let offsets = stride3_offsets();
    let mut r = raw;
    let mut t = dense;

    for _ in 0..REGISTERS / 64 {
        let x = _mm512_loadu_si512(r as *const __m512i);
        let y = pack_lanes_512(x);
        _mm512_i32scatter_epi32::<1>(t as *mut i32, offsets, y);

        r = r.add(64);
        t = t.add(48);
    }
}
