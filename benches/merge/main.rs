use criterion::*;
use hll_dense_kernels::merge::*;
use hll_dense_kernels::registers::{DENSE_LEN, REGISTERS};

// Benchmark group configuration
#[cfg(not(target_os = "windows"))]
use pprof::criterion::{Output, PProfProfiler};

#[cfg(not(target_os = "windows"))]
pub fn get_benchmark_config() -> Criterion {
    Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

#[cfg(target_os = "windows")]
pub fn get_benchmark_config() -> Criterion {
    Criterion::default()
}

const PAD: usize = 64;

fn mixed_dense_padded() -> [u8; PAD + DENSE_LEN + PAD] {
    let mut buf = [0u8; PAD + DENSE_LEN + PAD];
    for (i, byte) in buf[PAD..PAD + DENSE_LEN].iter_mut().enumerate() {
        *byte = ((i as u32).wrapping_mul(0x9E3779B1) >> 24) as u8;
    }
    buf
}

pub fn run_merge_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Bytes(DENSE_LEN as u64));

    let padded = mixed_dense_padded();
    let dense: [u8; DENSE_LEN] = padded[PAD..PAD + DENSE_LEN].try_into().unwrap();
    let mut raw = [0u8; REGISTERS];

    group.bench_function("scalar", |b| {
        b.iter(|| {
            raw.fill(0);
            merge_scalar(&mut raw, black_box(&dense));
        })
    });

    group.bench_function("dynamic", |b| {
        b.iter(|| {
            raw.fill(0);
            merge_dynamic(&mut raw, black_box(&dense));
        })
    });

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            group.bench_function("avx2", |b| {
                b.iter(|| unsafe {
                    raw.fill(0);
                    avx2::merge_avx2(&mut raw, black_box(&dense));
                })
            });
            group.bench_function("avx2_padded", |b| {
                b.iter(|| unsafe {
                    raw.fill(0);
                    avx2::merge_avx2_padded(raw.as_mut_ptr(), black_box(padded.as_ptr().add(PAD)));
                })
            });
            group.bench_function("avx2_scalar_head", |b| {
                b.iter(|| unsafe {
                    raw.fill(0);
                    avx2::merge_avx2_scalar_head(
                        raw.as_mut_ptr(),
                        black_box(padded.as_ptr().add(PAD)),
                    );
                })
            });
        }

        if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw") {
            group.bench_function("avx512", |b| {
                b.iter(|| unsafe {
                    raw.fill(0);
                    avx512::merge_avx512(&mut raw, black_box(&dense));
                })
            });
            group.bench_function("avx512_padded", |b| {
                b.iter(|| unsafe {
                    raw.fill(0);
                    avx512::merge_avx512_padded(
                        raw.as_mut_ptr(),
                        black_box(padded.as_ptr().add(PAD)),
                    );
                })
            });
            group.bench_function("avx512_gather", |b| {
                b.iter(|| unsafe {
                    raw.fill(0);
                    avx512::merge_avx512_gather(
                        raw.as_mut_ptr(),
                        black_box(padded.as_ptr().add(PAD)),
                    );
                })
            });
        }
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = get_benchmark_config();
    targets = run_merge_benchmarks
}

criterion_main!(benches);
