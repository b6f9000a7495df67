use core::arch::x86_64::*;

use super::{RegisterHistogram, BINS};
use crate::registers::{get_dense_register, DenseRegisters, REGISTERS};
use crate::simd::avx512::{lane_indices, load_split_window, triplet_shuffle_512};

/// Sub-histograms per bin in the AVX-512 tally, one per vector lane.
const LANES: usize = 16;

/// AVX-512 gather/scatter histogram over plain, unpadded buffers.
///
/// The tally runs entirely in vector registers against a bank of sixteen
/// interleaved sub-histograms (`bank[value * 16 + lane]`): each unpacked
/// field is rescaled to its bank row offset, a lane index is added, and
/// the sixteen counters are gathered, incremented and scattered back.
/// Within one round all sixteen lane indices are distinct, and rounds are
/// data-dependent sequences, so no update is lost. A horizontal reduce
/// per bin folds the bank into `hist`.
///
/// The first 8 and final 56 registers take the scalar accessor path so the
/// split windows stay inside the packed buffer.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx512f` and `avx512bw`.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
pub unsafe fn histogram_avx512(dense: &DenseRegisters, hist: &mut RegisterHistogram) {
    let mut bank = [0u32; BINS * LANES];

    for i in 0..8 {
        hist.bins[get_dense_register(dense, i) as usize] += 1;
    }

    let mut r = dense.as_ptr().add(2);
    for _ in 0..(REGISTERS - 8 - 56) / 64 {
        tally_block(&mut bank, r);
        r = r.add(48);
    }

    for i in REGISTERS - 56..REGISTERS {
        hist.bins[get_dense_register(dense, i) as usize] += 1;
    }

    reduce_bank(&bank, hist);
}

/// Full-vector AVX-512 gather/scatter histogram: all 256 packed blocks go
/// through the split-window shuffle.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx512f` and `avx512bw`, and
/// that `dense` points to the 12288 packed bytes with at least 4
/// addressable bytes on either side: the first window load starts at
/// `dense - 4` and the last one ends at `dense + 12292`.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
pub unsafe fn histogram_avx512_padded(dense: *const u8, hist: &mut RegisterHistogram) {
    let mut bank = [0u32; BINS * LANES];

    let mut r = dense.sub(4);
    for _ in 0..REGISTERS / 64 {
        tally_block(&mut bank, r);
        r = r.add(48);
    }

    reduce_bank(&bank, hist);
}

/// Tallies the 64 registers of one split window into the bank.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
#[inline]
unsafe fn tally_block(bank: &mut [u32; BINS * LANES], r: *const u8) {
    let x = _mm512_shuffle_epi8(load_split_window(r), triplet_shuffle_512());

    let a1 = _mm512_and_si512(x, _mm512_set1_epi32(0x0000003f));
    let a2 = _mm512_and_si512(x, _mm512_set1_epi32(0x00000fc0));
    let a3 = _mm512_and_si512(x, _mm512_set1_epi32(0x0003f000));
    let a4 = _mm512_and_si512(x, _mm512_set1_epi32(0x00fc0000));

    // Field k sits at value << 6k; rescale each to value * 16, the bank
    // row offset.
    let a1 = _mm512_slli_epi32::<4>(a1);
    let a2 = _mm512_srli_epi32::<2>(a2);
    let a3 = _mm512_srli_epi32::<8>(a3);
    let a4 = _mm512_srli_epi32::<14>(a4);

    let lanes = lane_indices();
    let a1 = _mm512_add_epi32(a1, lanes);
    let a2 = _mm512_add_epi32(a2, lanes);
    let a3 = _mm512_add_epi32(a3, lanes);
    let a4 = _mm512_add_epi32(a4, lanes);

    bump(bank, a1);
    bump(bank, a2);
    bump(bank, a3);
    bump(bank, a4);
}

/// Gathers sixteen counters, adds one, scatters them back.
#[target_feature(enable = "avx512f")]
#[inline]
unsafe fn bump(bank: &mut [u32; BINS * LANES], idx: __m512i) {
    let counts = _mm512_i32gather_epi32::<4>(idx, bank.as_ptr() as *const i32);
    let counts = _mm512_add_epi32(counts, _mm512_set1_epi32(1));
    _mm512_i32scatter_epi32::<4>(bank.as_mut_ptr() as *mut i32, idx, counts);
}

/// Folds the sixteen sub-histograms into `hist`, one horizontal reduce
/// per bin.
#[target_feature(enable = "avx512f")]
#[inline]
unsafe fn reduce_bank(bank: &[u32; BINS * LANES], hist: &mut RegisterHistogram) {
    for (value, bin) in hist.bins.iter_mut().enumerate() {
        let row = _mm512_loadu_si512(bank.as_ptr().add(value * LANES) as *const __m512i);
        *bin += _mm512_reduce_add_epi32(row) as u32;
    }
}
