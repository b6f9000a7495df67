//! Tally the value distribution of a dense register array.
//!
//! The cardinality estimator of a HyperLogLog sketch consumes a 64-bin
//! histogram of register values. [`histogram_dynamic`] walks all 16,384
//! packed registers of a dense array and *adds* each register's count to
//! the caller's [`RegisterHistogram`]; callers zero the histogram first
//! for a fresh tally, or keep accumulating across several arrays.
//!
//! A histogram update is a serial read-modify-write per bin, which is what
//! makes this kernel interesting to vectorize: the unpacking runs in wide
//! registers, but naively sharing one bin array across lanes would race on
//! colliding values. The kernels here either keep the 32 per-iteration
//! increments scalar, or split the tally across private per-lane
//! sub-histograms (exact `u32` counters) that are reduced column-wise at
//! the end.
//!
//! # Examples
//!
//! ```
//! use hll_dense_kernels::histogram::RegisterHistogram;
//! use hll_dense_kernels::registers::{DENSE_LEN, REGISTERS};
//!
//! let dense = [0u8; DENSE_LEN];
//! let hist = RegisterHistogram::from_dense(&dense);
//! assert_eq!(hist.bins[0], REGISTERS as u32);
//! assert!(hist.bins[1..].iter().all(|&c| c == 0));
//! ```

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "x86_64")]
pub mod avx512;

use core::mem;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::registers::{get_dense_register, DenseRegisters, DENSE_LEN, REGISTERS, REGISTER_MAX};

/// Number of histogram bins, one per possible register value.
pub const BINS: usize = REGISTER_MAX as usize + 1;

/// A 64-bin histogram of register values with 32-bit counters.
///
/// A single dense array contributes at most 16,384 to one bin, so `u32`
/// counters leave room to accumulate hundreds of thousands of arrays
/// before overflow becomes a concern.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RegisterHistogram {
    pub bins: [u32; BINS],
}

impl Default for RegisterHistogram {
    // Defaults to a zero'd array.
    fn default() -> Self {
        RegisterHistogram { bins: [0; BINS] }
    }
}

impl RegisterHistogram {
    /// Tallies a dense array into a fresh histogram. This is a shortcut
    /// for [`histogram_dynamic`] over a zeroed histogram.
    pub fn from_dense(dense: &DenseRegisters) -> Self {
        let mut hist = RegisterHistogram::default();
        histogram_dynamic(dense, &mut hist);
        hist
    }
}

type HistogramKernel = unsafe fn(&DenseRegisters, &mut RegisterHistogram);

static HISTOGRAM_KERNEL: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

/// Scalar reference: one register at a time through the bit-pack
/// accessor. Every other histogram kernel is checked against it.
pub fn histogram_scalar(dense: &DenseRegisters, hist: &mut RegisterHistogram) {
    for i in 0..REGISTERS {
        hist.bins[get_dense_register(dense, i) as usize] += 1;
    }
}

/// Counted scalar form: four registers per 3-byte packed word, the shift
/// arithmetic written out instead of going through the accessor.
pub fn histogram_scalar_words(dense: &DenseRegisters, hist: &mut RegisterHistogram) {
    let mut at = 0;
    for _ in 0..DENSE_LEN / 3 {
        let b0 = dense[at];
        let b1 = dense[at + 1];
        let b2 = dense[at + 2];

        hist.bins[(b0 & 63) as usize] += 1;
        hist.bins[((b0 >> 6 | b1 << 2) & 63) as usize] += 1;
        hist.bins[((b1 >> 4 | b2 << 4) & 63) as usize] += 1;
        hist.bins[((b2 >> 2) & 63) as usize] += 1;

        at += 3;
    }
}

/// Cursor-bounded scalar form: the same 3-byte word arithmetic driven by
/// an exact-chunk iterator instead of a trip count.
pub fn histogram_scalar_chunks(dense: &DenseRegisters, hist: &mut RegisterHistogram) {
    for word in dense.chunks_exact(3) {
        let (b0, b1, b2) = (word[0], word[1], word[2]);

        hist.bins[(b0 & 63) as usize] += 1;
        hist.bins[((b0 >> 6 | b1 << 2) & 63) as usize] += 1;
        hist.bins[((b1 >> 4 | b2 << 4) & 63) as usize] += 1;
        hist.bins[((b2 >> 2) & 63) as usize] += 1;
    }
}

/// Unrolled scalar form: sixteen registers per 12-byte chunk.
pub fn histogram_scalar_unroll(dense: &DenseRegisters, hist: &mut RegisterHistogram) {
    let bins = &mut hist.bins;
    for c in dense.chunks_exact(12) {
        bins[(c[0] & 63) as usize] += 1;
        bins[((c[0] >> 6 | c[1] << 2) & 63) as usize] += 1;
        bins[((c[1] >> 4 | c[2] << 4) & 63) as usize] += 1;
        bins[((c[2] >> 2) & 63) as usize] += 1;

        bins[(c[3] & 63) as usize] += 1;
        bins[((c[3] >> 6 | c[4] << 2) & 63) as usize] += 1;
        bins[((c[4] >> 4 | c[5] << 4) & 63) as usize] += 1;
        bins[((c[5] >> 2) & 63) as usize] += 1;

        bins[(c[6] & 63) as usize] += 1;
        bins[((c[6] >> 6 | c[7] << 2) & 63) as usize] += 1;
        bins[((c[7] >> 4 | c[8] << 4) & 63) as usize] += 1;
        bins[((c[8] >> 2) & 63) as usize] += 1;

        bins[(c[9] & 63) as usize] += 1;
        bins[((c[9] >> 6 | c[10] << 2) & 63) as usize] += 1;
        bins[((c[10] >> 4 | c[11] << 4) & 63) as usize] += 1;
        bins[((c[11] >> 2) & 63) as usize] += 1;
    }
}

/// Tallies `dense` into `hist` with the fastest kernel the running CPU
/// supports.
///
/// Kernel selection and caching work as in
/// [`merge_dynamic`](crate::merge::merge_dynamic). The AVX2 tier uses the
/// multi-bin kernel (it breaks the serial bin dependency); the AVX-512
/// tier uses the gather/scatter kernel; the scalar tier uses the unrolled
/// form.
pub fn histogram_dynamic(dense: &DenseRegisters, hist: &mut RegisterHistogram) {
    let mut kernel = HISTOGRAM_KERNEL.load(Ordering::Relaxed);
    if kernel.is_null() {
        kernel = select_kernel() as *mut ();
        HISTOGRAM_KERNEL.store(kernel, Ordering::Relaxed);
    }

    // Cached kernels were selected for a CPU tier detected at runtime.
    unsafe {
        let kernel: HistogramKernel = mem::transmute(kernel);
        kernel(dense, hist)
    }
}

fn select_kernel() -> HistogramKernel {
    #[cfg(all(target_arch = "x86_64", feature = "std"))]
    {
        if std::is_x86_feature_detected!("avx512f") && std::is_x86_feature_detected!("avx512bw")
        {
            return avx512::histogram_avx512;
        }
        if std::is_x86_feature_detected!("avx2") {
            return avx2::histogram_avx2_multibin;
        }
    }
    histogram_scalar_unroll
}
