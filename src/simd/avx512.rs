use core::arch::x86_64::*;

use super::avx2;

/// The 256-bit triplet shuffle duplicated across both halves of a 512-bit
/// register. `_mm512_shuffle_epi8` also permutes within 128-bit lanes, so
/// the pattern carries over unchanged.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
#[inline]
pub(crate) unsafe fn triplet_shuffle_512() -> __m512i {
    let s = avx2::triplet_shuffle();
    _mm512_inserti64x4::<1>(_mm512_castsi256_si512(s), s)
}

#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
#[inline]
pub(crate) unsafe fn pack_shuffle_512() -> __m512i {
    let s = avx2::pack_shuffle();
    _mm512_inserti64x4::<1>(_mm512_castsi256_si512(s), s)
}

/// Byte offsets of the sixteen packed triplets within a 48-byte block,
/// used by the stride-3 gather and scatter kernels.
#[target_feature(enable = "avx512f")]
#[inline]
pub(crate) unsafe fn stride3_offsets() -> __m512i {
    _mm512_setr_epi32(0, 3, 6, 9, 12, 15, 18, 21, 24, 27, 30, 33, 36, 39, 42, 45)
}

/// Lane numbers 0..16, used to spread histogram updates over private
/// sub-histogram columns.
#[target_feature(enable = "avx512f")]
#[inline]
pub(crate) unsafe fn lane_indices() -> __m512i {
    _mm512_setr_epi32(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15)
}

/// Loads a 48-register block as two overlapping 256-bit windows placed in
/// the two halves of a 512-bit register: bytes `r..r+32` low, bytes
/// `r+24..r+56` high. The 24 payload bytes of each half sit at the offsets
/// [`triplet_shuffle_512`] expects.
#[target_feature(enable = "avx512f")]
#[inline]
pub(crate) unsafe fn load_split_window(r: *const u8) -> __m512i {
    let x0 = _mm256_loadu_si256(r as *const __m256i);
    let x1 = _mm256_loadu_si256(r.add(24) as *const __m256i);
    _mm512_inserti64x4::<1>(_mm512_castsi256_si512(x0), x1)
}

/// Spreads the four 6-bit fields of each lane's 24 packed bits into the
/// lane's four bytes: `v0 | v1 << 8 | v2 << 16 | v3 << 24`. The lane's
/// own fourth byte never participates, so lanes gathered straight off the
/// wire (stride-3, one byte of slack) work as well as shuffled ones.
#[target_feature(enable = "avx512f")]
#[inline]
pub(crate) unsafe fn expand_lanes_512(x: __m512i) -> __m512i {
    let a1 = _mm512_and_si512(x, _mm512_set1_epi32(0x0000003f));
    let a2 = _mm512_and_si512(x, _mm512_set1_epi32(0x00000fc0));
    let a3 = _mm512_and_si512(x, _mm512_set1_epi32(0x0003f000));
    let a4 = _mm512_and_si512(x, _mm512_set1_epi32(0x00fc0000));

    let a2 = _mm512_slli_epi32::<2>(a2);
    let a3 = _mm512_slli_epi32::<4>(a3);
    let a4 = _mm512_slli_epi32::<6>(a4);

    _mm512_or_si512(_mm512_or_si512(a1, a2), _mm512_or_si512(a3, a4))
}

/// Unpacks a split window into 64 register bytes, each in `[0, 63]`.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
#[inline]
pub(crate) unsafe fn unpack_registers_512(window: __m512i) -> __m512i {
    expand_lanes_512(_mm512_shuffle_epi8(window, triplet_shuffle_512()))
}

/// Collapses 64 register bytes into four 6-bit fields per lane without the
/// final byte compaction, leaving `v0 | v1<<6 | v2<<12 | v3<<18` in the
/// low three bytes of each lane. The scatter kernel stores this directly;
/// the split-store kernel follows up with [`pack_shuffle_512`].
#[target_feature(enable = "avx512f")]
#[inline]
pub(crate) unsafe fn pack_lanes_512(x: __m512i) -> __m512i {
    let a1 = _mm512_and_si512(x, _mm512_set1_epi32(0x0000003f));
    let a2 = _mm512_and_si512(x, _mm512_set1_epi32(0x00003f00));
    let a3 = _mm512_and_si512(x, _mm512_set1_epi32(0x003f0000));
    let a4 = _mm512_and_si512(x, _mm512_set1_epi32(0x3f000000));

    let a2 = _mm512_srli_epi32::<2>(a2);
    let a3 = _mm512_srli_epi32::<4>(a3);
    let a4 = _mm512_srli_epi32::<6>(a4);

    _mm512_or_si512(_mm512_or_si512(a1, a2), _mm512_or_si512(a3, a4))
}
