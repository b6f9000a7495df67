//! Equivalence helpers for comparing kernel outputs.
//!
//! Every vectorized kernel must agree with its scalar baseline
//! byte-for-byte (merge, compress) or bin-for-bin (histogram). These
//! helpers report the first position where two outputs diverge, which the
//! tests and the verification harness turn into a diagnostic.

use crate::histogram::RegisterHistogram;

/// Returns the index of the first byte where the two buffers differ, or
/// `None` if they are equal over the compared length.
///
/// Compares up to the shorter of the two slices.
pub fn first_divergence(lhs: &[u8], rhs: &[u8]) -> Option<usize> {
    lhs.iter().zip(rhs.iter()).position(|(a, b)| a != b)
}

/// Returns the first bin where the two histograms disagree, or `None`.
pub fn first_bin_divergence(
    lhs: &RegisterHistogram,
    rhs: &RegisterHistogram,
) -> Option<usize> {
    lhs.bins.iter().zip(rhs.bins.iter()).position(|(a, b)| a != b)
}
