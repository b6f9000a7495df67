//! Self-verifying benchmark runner for every kernel variant.
//!
//! Configuration comes from the environment: `ROUNDS` (default 100,000)
//! and `SEED` (default: current UNIX time in seconds). For each kernel
//! family the harness first runs a verify phase of `ROUNDS / 10`
//! iterations, each checking every runtime-supported candidate against
//! the scalar baseline on fresh seeded-random buffers; the first
//! divergence prints the kernel name, the divergent index and both values
//! to stderr and exits non-zero. A benchmark phase then times each
//! candidate over `ROUNDS` rounds in shuffled order and prints a summary
//! table.
//!
//! Run with `cargo bench --bench verification`.

use std::env;
use std::io::{self, Write};
use std::process;
use std::ptr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use hll_dense_kernels::check::{first_bin_divergence, first_divergence};
use hll_dense_kernels::compress;
use hll_dense_kernels::histogram::{self, RegisterHistogram};
use hll_dense_kernels::merge;
use hll_dense_kernels::registers::{
    get_dense_register, DenseRegisters, RawRegisters, DENSE_LEN, REGISTERS,
};

/// Slack around the packed buffer for the `*_padded` kernel variants.
const PAD: usize = 64;

struct BenchmarkGroup {
    names: Vec<&'static str>,
    functions: Vec<Box<dyn FnMut()>>,
    runtime: Vec<f64>,
}

impl BenchmarkGroup {
    fn new() -> Self {
        BenchmarkGroup { names: Vec::new(), functions: Vec::new(), runtime: Vec::new() }
    }

    fn add(&mut self, name: &'static str, function: Box<dyn FnMut()>) {
        self.names.push(name);
        self.functions.push(function);
        self.runtime.push(0.0);
    }

    fn run(&mut self, rounds: usize, rng: &mut StdRng) {
        let mut order: Vec<usize> = (0..self.functions.len()).collect();
        order.shuffle(rng);

        for &idx in &order {
            print!("{:<24}: ", self.names[idx]);
            io::stdout().flush().ok();

            let function = &mut self.functions[idx];
            let start = Instant::now();
            for _ in 0..rounds {
                function();
            }
            let elapsed = start.elapsed().as_secs_f64();
            self.runtime[idx] = elapsed;

            println!("{elapsed:.6}s");
        }
    }

    fn summary(&self) {
        println!("---summary---");
        for (name, elapsed) in self.names.iter().zip(&self.runtime) {
            println!("[{name:<22}]: {elapsed:.6}s");
        }
    }
}

// Every candidate funnels through the pointer shape of the padded
// kernels; the wrappers below adapt the safe entry points.

type MergeKernel = unsafe fn(*mut u8, *const u8);
type CompressKernel = unsafe fn(*mut u8, *const u8);
type HistogramKernel = unsafe fn(*const u8, &mut RegisterHistogram);

unsafe fn merge_scalar_ptr(raw: *mut u8, dense: *const u8) {
    merge::merge_scalar(&mut *(raw as *mut RawRegisters), &*(dense as *const DenseRegisters));
}

unsafe fn merge_dynamic_ptr(raw: *mut u8, dense: *const u8) {
    merge::merge_dynamic(&mut *(raw as *mut RawRegisters), &*(dense as *const DenseRegisters));
}

#[cfg(target_arch = "x86_64")]
unsafe fn merge_avx2_ptr(raw: *mut u8, dense: *const u8) {
    merge::avx2::merge_avx2(&mut *(raw as *mut RawRegisters), &*(dense as *const DenseRegisters));
}

#[cfg(target_arch = "x86_64")]
unsafe fn merge_avx512_ptr(raw: *mut u8, dense: *const u8) {
    merge::avx512::merge_avx512(
        &mut *(raw as *mut RawRegisters),
        &*(dense as *const DenseRegisters),
    );
}

unsafe fn compress_scalar_ptr(dense: *mut u8, raw: *const u8) {
    compress::compress_scalar(&mut *(dense as *mut DenseRegisters), &*(raw as *const RawRegisters));
}

unsafe fn compress_dynamic_ptr(dense: *mut u8, raw: *const u8) {
    compress::compress_dynamic(
        &mut *(dense as *mut DenseRegisters),
        &*(raw as *const RawRegisters),
    );
}

#[cfg(target_arch = "x86_64")]
unsafe fn compress_avx2_ptr(dense: *mut u8, raw: *const u8) {
    compress::avx2::compress_avx2(
        &mut *(dense as *mut DenseRegisters),
        &*(raw as *const RawRegisters),
    );
}

#[cfg(target_arch = "x86_64")]
unsafe fn compress_avx512_ptr(dense: *mut u8, raw: *const u8) {
    compress::avx512::compress_avx512(
        &mut *(dense as *mut DenseRegisters),
        &*(raw as *const RawRegisters),
    );
}

unsafe fn histogram_scalar_ptr(dense: *const u8, hist: &mut RegisterHistogram) {
    histogram::histogram_scalar(&*(dense as *const DenseRegisters), hist);
}

unsafe fn histogram_words_ptr(dense: *const u8, hist: &mut RegisterHistogram) {
    histogram::histogram_scalar_words(&*(dense as *const DenseRegisters), hist);
}

unsafe fn histogram_chunks_ptr(dense: *const u8, hist: &mut RegisterHistogram) {
    histogram::histogram_scalar_chunks(&*(dense as *const DenseRegisters), hist);
}

unsafe fn histogram_unroll_ptr(dense: *const u8, hist: &mut RegisterHistogram) {
    histogram::histogram_scalar_unroll(&*(dense as *const DenseRegisters), hist);
}

unsafe fn histogram_dynamic_ptr(dense: *const u8, hist: &mut RegisterHistogram) {
    histogram::histogram_dynamic(&*(dense as *const DenseRegisters), hist);
}

#[cfg(target_arch = "x86_64")]
unsafe fn histogram_avx2_ptr(dense: *const u8, hist: &mut RegisterHistogram) {
    histogram::avx2::histogram_avx2(&*(dense as *const DenseRegisters), hist);
}

#[cfg(target_arch = "x86_64")]
unsafe fn histogram_avx2_multibin_ptr(dense: *const u8, hist: &mut RegisterHistogram) {
    histogram::avx2::histogram_avx2_multibin(&*(dense as *const DenseRegisters), hist);
}

#[cfg(target_arch = "x86_64")]
unsafe fn histogram_avx512_ptr(dense: *const u8, hist: &mut RegisterHistogram) {
    histogram::avx512::histogram_avx512(&*(dense as *const DenseRegisters), hist);
}

#[cfg(target_arch = "x86_64")]
fn avx2_supported() -> bool {
    is_x86_feature_detected!("avx2")
}

#[cfg(target_arch = "x86_64")]
fn avx512_supported() -> bool {
    is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw")
}

fn merge_candidates() -> Vec<(&'static str, MergeKernel)> {
    let mut list: Vec<(&'static str, MergeKernel)> = vec![("merge_dynamic", merge_dynamic_ptr)];
    #[cfg(target_arch = "x86_64")]
    {
        if avx2_supported() {
            list.push(("merge_avx2", merge_avx2_ptr));
            list.push(("merge_avx2_padded", merge::avx2::merge_avx2_padded));
            list.push(("merge_avx2_scalar_head", merge::avx2::merge_avx2_scalar_head));
        }
        if avx512_supported() {
            list.push(("merge_avx512", merge_avx512_ptr));
            list.push(("merge_avx512_padded", merge::avx512::merge_avx512_padded));
            list.push(("merge_avx512_gather", merge::avx512::merge_avx512_gather));
        }
    }
    list
}

fn compress_candidates() -> Vec<(&'static str, CompressKernel)> {
    let mut list: Vec<(&'static str, CompressKernel)> =
        vec![("compress_dynamic", compress_dynamic_ptr)];
    #[cfg(target_arch = "x86_64")]
    {
        if avx2_supported() {
            list.push(("compress_avx2", compress_avx2_ptr));
            list.push(("compress_avx2_padded", compress::avx2::compress_avx2_padded));
        }
        if avx512_supported() {
            list.push(("compress_avx512", compress_avx512_ptr));
            list.push(("compress_avx512_padded", compress::avx512::compress_avx512_padded));
            list.push(("compress_avx512_scatter", compress::avx512::compress_avx512_scatter));
        }
    }
    list
}

fn histogram_candidates() -> Vec<(&'static str, HistogramKernel)> {
    let mut list: Vec<(&'static str, HistogramKernel)> = vec![
        ("histogram_words", histogram_words_ptr),
        ("histogram_chunks", histogram_chunks_ptr),
        ("histogram_unroll", histogram_unroll_ptr),
        ("histogram_dynamic", histogram_dynamic_ptr),
    ];
    #[cfg(target_arch = "x86_64")]
    {
        if avx2_supported() {
            list.push(("histogram_avx2", histogram_avx2_ptr));
            list.push(("histogram_avx2_multibin", histogram_avx2_multibin_ptr));
            list.push(("histogram_avx2_padded", histogram::avx2::histogram_avx2_padded));
        }
        if avx512_supported() {
            list.push(("histogram_avx512", histogram_avx512_ptr));
            list.push(("histogram_avx512_padded", histogram::avx512::histogram_avx512_padded));
        }
    }
    list
}

fn bench_merge(rounds: usize, seed: u64) {
    println!("------bench_merge------");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut raw_init = [0u8; REGISTERS];
    let mut padded = [0u8; PAD + DENSE_LEN + PAD];
    let candidates = merge_candidates();

    println!("verify");
    for _ in 0..rounds / 10 {
        rng.fill(&mut raw_init[..]);
        rng.fill(&mut padded[PAD..PAD + DENSE_LEN]);
        let dense: &DenseRegisters = (&padded[PAD..PAD + DENSE_LEN]).try_into().unwrap();

        let mut baseline = raw_init;
        merge::merge_scalar(&mut baseline, dense);

        for &(name, kernel) in &candidates {
            let mut out = raw_init;
            unsafe { kernel(out.as_mut_ptr(), padded.as_ptr().add(PAD)) };
            if let Some(idx) = first_divergence(&baseline, &out) {
                eprintln!(
                    "error: {name} diverged at register {idx}: expected {}, got {} \
                     (accumulator held {}, dense register {})",
                    baseline[idx],
                    out[idx],
                    raw_init[idx],
                    get_dense_register(dense, idx)
                );
                process::exit(1);
            }
        }
    }

    let raw_ptr = raw_init.as_mut_ptr();
    let dense_ptr = unsafe { padded.as_ptr().add(PAD) };

    let mut group = BenchmarkGroup::new();
    group.add(
        "merge_scalar",
        Box::new(move || unsafe {
            ptr::write_bytes(raw_ptr, 0, REGISTERS);
            merge_scalar_ptr(raw_ptr, dense_ptr);
        }),
    );
    for &(name, kernel) in &candidates {
        group.add(
            name,
            Box::new(move || unsafe {
                ptr::write_bytes(raw_ptr, 0, REGISTERS);
                kernel(raw_ptr, dense_ptr);
            }),
        );
    }

    println!("benchmark");
    group.run(rounds, &mut rng);
    group.summary();

    println!("-----------------------");
}

fn bench_compress(rounds: usize, seed: u64) {
    println!("------bench_compress------");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut raw = [0u8; REGISTERS];
    let mut padded = [0u8; PAD + DENSE_LEN + PAD];
    let candidates = compress_candidates();

    println!("verify");
    for _ in 0..rounds / 10 {
        rng.fill(&mut raw[..]);

        let mut baseline = [0u8; DENSE_LEN];
        compress::compress_scalar(&mut baseline, &raw);

        for &(name, kernel) in &candidates {
            padded.fill(0);
            unsafe { kernel(padded.as_mut_ptr().add(PAD), raw.as_ptr()) };
            // Bytes past the logical window are each variant's business.
            if let Some(idx) = first_divergence(&baseline, &padded[PAD..PAD + DENSE_LEN]) {
                eprintln!(
                    "error: {name} diverged at byte {idx}: expected {:#04x}, got {:#04x}",
                    baseline[idx],
                    padded[PAD + idx]
                );
                process::exit(1);
            }
        }
    }

    let raw_ptr = raw.as_ptr();
    let dense_ptr = unsafe { padded.as_mut_ptr().add(PAD) };

    let mut group = BenchmarkGroup::new();
    group.add("compress_scalar", Box::new(move || unsafe { compress_scalar_ptr(dense_ptr, raw_ptr) }));
    for &(name, kernel) in &candidates {
        group.add(name, Box::new(move || unsafe { kernel(dense_ptr, raw_ptr) }));
    }

    println!("benchmark");
    group.run(rounds, &mut rng);
    group.summary();

    println!("-----------------------");
}

fn bench_histogram(rounds: usize, seed: u64) {
    println!("------bench_histogram------");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut padded = [0u8; PAD + DENSE_LEN + PAD];
    let candidates = histogram_candidates();

    println!("verify");
    for _ in 0..rounds / 10 {
        rng.fill(&mut padded[PAD..PAD + DENSE_LEN]);
        let dense: &DenseRegisters = (&padded[PAD..PAD + DENSE_LEN]).try_into().unwrap();

        let mut baseline = RegisterHistogram::default();
        histogram::histogram_scalar(dense, &mut baseline);

        for &(name, kernel) in &candidates {
            let mut out = RegisterHistogram::default();
            unsafe { kernel(padded.as_ptr().add(PAD), &mut out) };
            if let Some(bin) = first_bin_divergence(&baseline, &out) {
                eprintln!(
                    "error: {name} diverged at bin {bin}: expected {}, got {}",
                    baseline.bins[bin], out.bins[bin]
                );
                process::exit(1);
            }
        }
    }

    let dense_ptr = unsafe { padded.as_ptr().add(PAD) };

    let mut group = BenchmarkGroup::new();
    group.add(
        "histogram_scalar",
        Box::new(move || unsafe {
            let mut hist = RegisterHistogram::default();
            histogram_scalar_ptr(dense_ptr, &mut hist);
        }),
    );
    for &(name, kernel) in &candidates {
        group.add(
            name,
            Box::new(move || unsafe {
                let mut hist = RegisterHistogram::default();
                kernel(dense_ptr, &mut hist);
            }),
        );
    }

    println!("benchmark");
    group.run(rounds, &mut rng);
    group.summary();

    println!("-----------------------");
}

fn main() {
    let rounds: usize =
        env::var("ROUNDS").ok().and_then(|v| v.parse().ok()).unwrap_or(100_000);
    let seed: u64 = env::var("SEED").ok().and_then(|v| v.parse().ok()).unwrap_or_else(|| {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
    });

    println!("rounds: {rounds}");
    println!("seed: {seed}");

    bench_histogram(rounds, seed);
    bench_merge(rounds, seed);
    bench_compress(rounds, seed);
}
