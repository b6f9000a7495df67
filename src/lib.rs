#![doc = include_str!("../README.MD")]
#![no_std]

#[cfg(feature = "c-exports")]
pub mod exports;

#[cfg(feature = "std")]
extern crate std;

pub mod check;
pub mod compress;
pub mod histogram;
pub mod merge;
pub mod registers;

#[cfg(target_arch = "x86_64")]
pub(crate) mod simd;
