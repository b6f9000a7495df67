use core::arch::x86_64::*;

use super::{RegisterHistogram, BINS};
use crate::registers::{get_dense_register, DenseRegisters, REGISTERS};
use crate::simd::avx2::unpack_registers;

/// AVX2 histogram over plain, unpadded buffers: each iteration unpacks 32
/// registers with the shuffle, then tallies them with 32 scalar
/// increments. The increments stay scalar because lanes holding the same
/// value would collide on one bin.
///
/// The first 8 and final 24 registers take the scalar accessor path so the
/// shuffle windows stay inside the packed buffer.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx2`.
#[target_feature(enable = "avx2")]
pub unsafe fn histogram_avx2(dense: &DenseRegisters, hist: &mut RegisterHistogram) {
    for i in 0..8 {
        hist.bins[get_dense_register(dense, i) as usize] += 1;
    }

    let mut r = dense.as_ptr().add(2);
    let mut unpacked = [0u8; 32];

    for _ in 0..REGISTERS / 32 - 1 {
        let window = _mm256_loadu_si256(r as *const __m256i);
        let y = unpack_registers(window);
        _mm256_storeu_si256(unpacked.as_mut_ptr() as *mut __m256i, y);

        for &val in &unpacked {
            hist.bins[val as usize] += 1;
        }

        r = r.add(24);
    }

    for i in REGISTERS - 24..REGISTERS {
        hist.bins[get_dense_register(dense, i) as usize] += 1;
    }
}

/// Full-vector AVX2 histogram: all 512 packed blocks go through the
/// shuffle.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx2` and that `dense` points
/// to the 12288 packed bytes with at least 4 addressable bytes on either
/// side: the first window load starts at `dense - 4` and the last one
/// ends at `dense + 12292`.
#[target_feature(enable = "avx2")]
pub unsafe fn histogram_avx2_padded(dense: *const u8, hist: &mut RegisterHistogram) {
    let mut r = dense.sub(4);
    let mut unpacked = [0u8; 32];

    for _ in 0..REGISTERS / 32 {
        let window = _mm256_loadu_si256(r as *const __m256i);
        let y = unpack_registers(window);
        _mm256_storeu_si256(unpacked.as_mut_ptr() as *mut __m256i, y);

        for &val in &unpacked {
            hist.bins[val as usize] += 1;
        }

        r = r.add(24);
    }
}

/// Multi-bin AVX2 histogram over plain, unpadded buffers.
///
/// The serial dependency of a shared bin array is broken by tallying into
/// eight private sub-histograms: the value at position `i` of each
/// unpacked block goes to sub-histogram `i % 8`. The sub-histograms use
/// exact `u32` counters (a single lane can see up to 2048 increments) and
/// are reduced column-wise into `hist` at the end, so the result is
/// identical to the scalar tally.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx2`.
#[target_feature(enable = "avx2")]
pub unsafe fn histogram_avx2_multibin(dense: &DenseRegisters, hist: &mut RegisterHistogram) {
    let mut sub = [[0u32; BINS]; 8];

    for i in 0..8 {
        hist.bins[get_dense_register(dense, i) as usize] += 1;
    }

    let mut r = dense.as_ptr().add(2);
    let mut unpacked = [0u8; 32];

    for _ in 0..REGISTERS / 32 - 1 {
        let window = _mm256_loadu_si256(r as *const __m256i);
        let y = unpack_registers(window);
        _mm256_storeu_si256(unpacked.as_mut_ptr() as *mut __m256i, y);

        for (i, &val) in unpacked.iter().enumerate() {
            sub[i & 7][val as usize] += 1;
        }

        r = r.add(24);
    }

    for i in REGISTERS - 24..REGISTERS {
        hist.bins[get_dense_register(dense, i) as usize] += 1;
    }

    for (value, bin) in hist.bins.iter_mut().enumerate() {
        for lane in &sub {
            *bin += lane[value];
        }
    }
}
