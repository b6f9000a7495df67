//! Merge a packed dense register array into an unpacked accumulator.
//!
//! [`merge_dynamic`] updates `raw[i] <- max(raw[i], register i of dense)`
//! for all 16,384 registers. The operation is commutative, associative and
//! idempotent, which is what lets a caller fold any number of dense
//! sketches into one raw accumulator in any order.
//!
//! The vectorized kernels unpack 32 (AVX2) or 64 (AVX-512) registers per
//! iteration with a byte shuffle and run an unsigned byte-max against the
//! accumulator. The public entry points handle the first and last packed
//! blocks with scalar code, so they accept plain fixed-size buffers with
//! no padding; the `*_padded` variants cover the whole array with vector
//! loads and document the bytes they touch around it.
//!
//! # Examples
//!
//! ```
//! use hll_dense_kernels::merge::merge_dynamic;
//! use hll_dense_kernels::registers::{DENSE_LEN, REGISTERS};
//!
//! let dense = [0u8; DENSE_LEN];
//! let mut raw = [7u8; REGISTERS];
//! merge_dynamic(&mut raw, &dense);
//! // Merging an all-zero sketch changes nothing.
//! assert!(raw.iter().all(|&v| v == 7));
//! ```

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "x86_64")]
pub mod avx512;

use core::mem;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::registers::{get_dense_register, DenseRegisters, RawRegisters, REGISTERS};

type MergeKernel = unsafe fn(&mut RawRegisters, &DenseRegisters);

static MERGE_KERNEL: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

/// Scalar baseline: one register at a time through the bit-pack accessor.
///
/// This is the reference semantics every vectorized merge kernel is
/// checked against.
pub fn merge_scalar(raw: &mut RawRegisters, dense: &DenseRegisters) {
    for i in 0..REGISTERS {
        let val = get_dense_register(dense, i);
        if val > raw[i] {
            raw[i] = val;
        }
    }
}

/// Merges `dense` into `raw` with the fastest kernel the running CPU
/// supports.
///
/// The kernel is selected on first call and cached; racing first callers
/// select the same kernel, so the cache needs no stronger coordination.
/// Selection prefers AVX-512 (`avx512f` + `avx512bw`), then AVX2, then the
/// scalar baseline. Without the `std` feature there is no runtime
/// detection and this resolves to [`merge_scalar`].
pub fn merge_dynamic(raw: &mut RawRegisters, dense: &DenseRegisters) {
    let mut kernel = MERGE_KERNEL.load(Ordering::Relaxed);
    if kernel.is_null() {
        kernel = select_kernel() as *mut ();
        MERGE_KERNEL.store(kernel, Ordering::Relaxed);
    }

    // Cached kernels were selected for a CPU tier detected at runtime.
    unsafe {
        let kernel: MergeKernel = mem::transmute(kernel);
        kernel(raw, dense)
    }
}

fn select_kernel() -> MergeKernel {
    #[cfg(all(target_arch = "x86_64", feature = "std"))]
    {
        if std::is_x86_feature_detected!("avx512f") && std::is_x86_feature_detected!("avx512bw")
        {
            return avx512::merge_avx512;
        }
        if std::is_x86_feature_detected!("avx2") {
            return avx2::merge_avx2;
        }
    }
    merge_scalar
}
