use core::arch::x86_64::*;

use crate::registers::{get_dense_register, DenseRegisters, RawRegisters, REGISTERS};
use crate::simd::avx512::{
    expand_lanes_512, load_split_window, stride3_offsets, unpack_registers_512,
};

/// AVX-512 merge over plain, unpadded buffers: 64 registers per iteration,
/// with the first 8 and final 56 registers on the scalar path so the split
/// windows stay inside the packed buffer.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx512f` and `avx512bw`.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
pub unsafe fn merge_avx512(raw: &mut RawRegisters, dense: &DenseRegisters) {
    for i in 0..8 {
        let val = get_dense_register(dense, i);
        if val > raw[i] {
            raw[i] = val;
        }
    }

    let mut r = dense.as_ptr().add(2);
    let mut t = raw.as_mut_ptr().add(8);

    for _ in 0..(REGISTERS - 8 - 56) / 64 {
        let y = unpack_registers_512(load_split_window(r));

        let z = _mm512_loadu_si512(t as *const __m512i);
        let z = _mm512_max_epu8(z, y);
        _mm512_storeu_si512(t as *mut __m512i, z);

        r = r.add(48);
        t = t.add(64);
    }

    for i in REGISTERS - 56..REGISTERS {
        let val = get_dense_register(dense, i);
        if val > raw[i] {
            raw[i] = val;
        }
    }
}

/// Full-vector AVX-512 merge: every 48-byte packed block is unpacked with
/// the split-window shuffle.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx512f` and `avx512bw`, that
/// `raw` points to 16384 writable bytes, and that `dense` points to the
/// 12288 packed bytes with at least 4 addressable bytes on either side:
/// the first window load starts at `dense - 4` and the last one ends at
/// `dense + 12292`.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
pub unsafe fn merge_avx512_padded(raw: *mut u8, dense: *const u8) {
    let mut r = dense.sub(4);
    let mut t = raw;

    for _ in 0..REGISTERS / 64 {
        let y = unpack_registers_512(load_split_window(r));

        let z = _mm512_loadu_si512(t as *const __m512i);
        let z = _mm512_max_epu8(z, y);
        _mm512_storeu_si512(t as *mut __m512i, z);

        r = r.add(48);
        t = t.add(64);
    }
}

/// Gather-based AVX-512 merge: a 16-lane stride-3 gather fetches one
/// 4-byte window per packed triplet, replacing the byte shuffle and its
/// prefix read.
///
/// # Safety
///
/// The caller must ensure the CPU supports `avx512f` and `avx512bw`, that
/// `raw` points to 16384 writable bytes, and that `dense` points to the
/// 12288 packed bytes with at least one addressable byte after them: the
/// final lane's gather ends at `dense + 12289`.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
pub unsafe fn merge_avx512_gather(raw: *mut u8, dense: *const u8) {
    let offsets = stride3_offsets();
    let mut r = dense;
    let mut t = raw;

    for _ in 0..REGISTERS / 64 {
        let x = _mm512_i32gather_epi32::<1>(offsets, r as *const i32);
        let y = expand_lanes_512(x);

        let z = _mm512_loadu_si512(t as *const __m512i);
        let z = _mm512_max_epu8(z, y);
        _mm512_storeu_si512(t as *mut __m512i, z);

        r = r.add(48);
        t = t.add(64);
    }
}
