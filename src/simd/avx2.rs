use core::arch::x86_64::*;

/// Byte permutation that scatters each 3-byte packed triplet of the 24
/// payload bytes into its own 32-bit lane, laid out `{b0, b1, b2, 0}`.
///
/// `_mm256_shuffle_epi8` indexes within each 128-bit half, so the 24
/// payload bytes must sit at bytes 4..28 of the loaded window: the low
/// half contributes its bytes 4..16, the high half its bytes 0..12. That
/// is why the shuffle-based kernels place their load cursor 4 bytes before
/// the packed data they are about to unpack.
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn triplet_shuffle() -> __m256i {
    _mm256_setr_epi8(
        4, 5, 6, -1, //
        7, 8, 9, -1, //
        10, 11, 12, -1, //
        13, 14, 15, -1, //
        0, 1, 2, -1, //
        3, 4, 5, -1, //
        6, 7, 8, -1, //
        9, 10, 11, -1, //
    )
}

/// Byte permutation that compacts the low three bytes of each 32-bit lane
/// into the low 12 bytes of each 128-bit half, zeroing the remainder.
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn pack_shuffle() -> __m256i {
    _mm256_setr_epi8(
        0, 1, 2, //
        4, 5, 6, //
        8, 9, 10, //
        12, 13, 14, //
        -1, -1, -1, -1, //
        0, 1, 2, //
        4, 5, 6, //
        8, 9, 10, //
        12, 13, 14, //
        -1, -1, -1, -1, //
    )
}

/// Unpacks a loaded 32-byte window (payload in bytes 4..28) into 32
/// register bytes, one per output byte, each in `[0, 63]`.
///
/// After the triplet shuffle each lane holds 24 packed bits as
/// `{b0, b1, b2, 0}`; the four 6-bit fields are masked out and shifted so
/// the lane becomes `v0 | v1 << 8 | v2 << 16 | v3 << 24`.
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn unpack_registers(window: __m256i) -> __m256i {
    let x = _mm256_shuffle_epi8(window, triplet_shuffle());

    let a1 = _mm256_and_si256(x, _mm256_set1_epi32(0x0000003f));
    let a2 = _mm256_and_si256(x, _mm256_set1_epi32(0x00000fc0));
    let a3 = _mm256_and_si256(x, _mm256_set1_epi32(0x0003f000));
    let a4 = _mm256_and_si256(x, _mm256_set1_epi32(0x00fc0000));

    let a2 = _mm256_slli_epi32::<2>(a2);
    let a3 = _mm256_slli_epi32::<4>(a3);
    let a4 = _mm256_slli_epi32::<6>(a4);

    _mm256_or_si256(_mm256_or_si256(a1, a2), _mm256_or_si256(a3, a4))
}

/// Packs 32 register bytes into 24 packed bytes: 12 in the low bytes of
/// each 128-bit half, the remaining four bytes of each half zero.
///
/// The inverse of [`unpack_registers`]: the low 6 bits of the four bytes
/// in each lane collapse to `v0 | v1 << 6 | v2 << 12 | v3 << 18`, then the
/// pack shuffle drops the spent fourth byte of every lane.
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn pack_registers(x: __m256i) -> __m256i {
    let a1 = _mm256_and_si256(x, _mm256_set1_epi32(0x0000003f));
    let a2 = _mm256_and_si256(x, _mm256_set1_epi32(0x00003f00));
    let a3 = _mm256_and_si256(x, _mm256_set1_epi32(0x003f0000));
    let a4 = _mm256_and_si256(x, _mm256_set1_epi32(0x3f000000));

    let a2 = _mm256_srli_epi32::<2>(a2);
    let a3 = _mm256_srli_epi32::<4>(a3);
    let a4 = _mm256_srli_epi32::<6>(a4);

    let y = _mm256_or_si256(_mm256_or_si256(a1, a2), _mm256_or_si256(a3, a4));
    _mm256_shuffle_epi8(y, pack_shuffle())
}
