//! Compress an unpacked register accumulator back into the dense layout.
//!
//! [`compress_dynamic`] writes the low 6 bits of each of the 16,384
//! accumulator bytes into the packed buffer, overwriting every bit of its
//! 12,288 bytes. Together with the merge kernels this gives the round
//! trip `merge(zero, compress(raw)) == raw` for any accumulator holding
//! values in `[0, 63]`.
//!
//! The vectorized kernels collapse 32 (AVX2) or 64 (AVX-512) register
//! bytes into 24 or 48 packed bytes per iteration and store them either as
//! overlapping 16-byte chunks at a 12-byte stride ("split store") or via a
//! stride-3 scatter. The public entry points finish the last packed block
//! with scalar code so nothing is written past the buffer; the `*_padded`
//! and scatter variants write a few bytes beyond it and say so in their
//! safety contracts.
//!
//! # Examples
//!
//! ```
//! use hll_dense_kernels::compress::compress_dynamic;
//! use hll_dense_kernels::registers::{get_dense_register, DENSE_LEN, REGISTERS};
//!
//! let mut raw = [0u8; REGISTERS];
//! raw[100] = 31;
//! let mut dense = [0xFFu8; DENSE_LEN];
//! compress_dynamic(&mut dense, &raw);
//! assert_eq!(get_dense_register(&dense, 100), 31);
//! assert_eq!(get_dense_register(&dense, 101), 0);
//! ```

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "x86_64")]
pub mod avx512;

use core::mem;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::registers::{set_dense_register, DenseRegisters, RawRegisters, REGISTERS};

type CompressKernel = unsafe fn(&mut DenseRegisters, &RawRegisters);

static COMPRESS_KERNEL: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

/// Scalar baseline: one register at a time through the bit-pack accessor.
///
/// Read-modify-write per register, so it writes only the 12,288 logical
/// bytes. Every vectorized compress kernel is checked against it.
pub fn compress_scalar(dense: &mut DenseRegisters, raw: &RawRegisters) {
    for i in 0..REGISTERS {
        set_dense_register(dense, i, raw[i]);
    }
}

/// Compresses `raw` into `dense` with the fastest kernel the running CPU
/// supports.
///
/// Kernel selection and caching work as in
/// [`merge_dynamic`](crate::merge::merge_dynamic): AVX-512, then AVX2,
/// then scalar; selected once, cached in a process-wide pointer. All
/// selectable kernels write only the 12,288 logical bytes.
pub fn compress_dynamic(dense: &mut DenseRegisters, raw: &RawRegisters) {
    let mut kernel = COMPRESS_KERNEL.load(Ordering::Relaxed);
    if kernel.is_null() {
        kernel = select_kernel() as *mut ();
        COMPRESS_KERNEL.store(kernel, Ordering::Relaxed);
    }

    // Cached kernels were selected for a CPU tier detected at runtime.
    unsafe {
        let kernel: CompressKernel = mem::transmute(kernel);
        kernel(dense, raw)
    }
}

fn select_kernel() -> CompressKernel {
    #[cfg(all(target_arch = "x86_64", feature = "std"))]
    {
        if std::is_x86_feature_detected!("avx512f") && std::is_x86_feature_detected!("avx512bw")
        {
            return avx512::compress_avx512;
        }
        if std::is_x86_feature_detected!("avx2") {
            return avx2::compress_avx2;
        }
    }
    compress_scalar
}
