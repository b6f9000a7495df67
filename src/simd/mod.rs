//! Lane-arrangement helpers shared by the vectorized kernels.
//!
//! Every 32-bit lane processed by the kernels holds either three packed
//! bytes (24 bits, four 6-bit registers) or four unpacked register bytes.
//! The helpers here perform the two conversions between those shapes; the
//! per-kernel modules add only the memory access pattern around them.

pub(crate) mod avx2;
pub(crate) mod avx512;
