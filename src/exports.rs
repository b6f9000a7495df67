use crate::histogram::RegisterHistogram;
use crate::registers::{DenseRegisters, RawRegisters};

/// Merges a packed dense register array into an unpacked accumulator,
/// taking the element-wise maximum. Selects the fastest kernel for the
/// running CPU.
///
/// # Safety
///
/// `raw` must point to 16384 writable bytes and `dense` to 12288 readable
/// bytes. Null pointers are ignored.
#[no_mangle]
pub unsafe extern "C" fn hll_merge(raw: *mut u8, dense: *const u8) {
    if raw.is_null() || dense.is_null() {
        return;
    }
    crate::merge::merge_dynamic(
        &mut *(raw as *mut RawRegisters),
        &*(dense as *const DenseRegisters),
    );
}

/// Packs an unpacked register accumulator into the dense 6-bit layout,
/// overwriting all 12288 output bytes.
///
/// # Safety
///
/// `dense` must point to 12288 writable bytes and `raw` to 16384 readable
/// bytes. Null pointers are ignored.
#[no_mangle]
pub unsafe extern "C" fn hll_compress(dense: *mut u8, raw: *const u8) {
    if dense.is_null() || raw.is_null() {
        return;
    }
    crate::compress::compress_dynamic(
        &mut *(dense as *mut DenseRegisters),
        &*(raw as *const RawRegisters),
    );
}

/// Adds the value distribution of a packed dense register array to a
/// 64-bin histogram of 32-bit counters.
///
/// # Safety
///
/// `dense` must point to 12288 readable bytes and `hist` to a valid
/// [`RegisterHistogram`] (64 contiguous `u32` counters). Null pointers are
/// ignored.
#[no_mangle]
pub unsafe extern "C" fn hll_histogram(dense: *const u8, hist: *mut RegisterHistogram) {
    if dense.is_null() || hist.is_null() {
        return;
    }
    crate::histogram::histogram_dynamic(&*(dense as *const DenseRegisters), &mut *hist);
}

/// Gets the count for a specific register value from the histogram.
///
/// # Safety
///
/// The caller must ensure `hist` points to a valid [`RegisterHistogram`].
///
/// # Remarks
///
/// Provided only for completeness, you can access this through the field
/// of [`RegisterHistogram`] directly too.
#[no_mangle]
pub unsafe extern "C" fn hll_histogram_bin(hist: *const RegisterHistogram, value: u8) -> u32 {
    if hist.is_null() || value > 63 {
        return 0;
    }
    (*hist).bins[value as usize]
}
