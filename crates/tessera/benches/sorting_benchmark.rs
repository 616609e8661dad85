use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rayon::ThreadPoolBuilder;
use tessera::{sorting::sort_by_comparator, Jet, Tower};

fn random_jets(rng: &mut fastrand::Rng, n: usize) -> Vec<Jet> {
    (0..n)
        .map(|_| Jet {
            pt: rng.f64() * 500.0,
            eta: (rng.f64() * 2.0 - 1.0) * 4.0,
            phi: (rng.f64() * 2.0 - 1.0) * std::f64::consts::PI,
            ..Default::default()
        })
        .collect()
}

fn random_towers(rng: &mut fastrand::Rng, n: usize) -> Vec<Tower> {
    (0..n)
        .map(|_| {
            let et = rng.f64() * 100.0;
            Tower {
                et,
                eta: (rng.f64() * 2.0 - 1.0) * 4.0,
                phi: (rng.f64() * 2.0 - 1.0) * std::f64::consts::PI,
                e: et * (1.0 + rng.f64()),
                ..Default::default()
            }
        })
        .collect()
}

fn sorting_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Jet sorting");
    let n_threads: Vec<usize> = (0..)
        .map(|x| 1 << x)
        .take_while(|&p| p <= num_cpus::get())
        .collect();
    for threads in n_threads {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &_threads| {
                let mut rng = fastrand::Rng::with_seed(0);
                b.iter_batched(
                    || random_jets(&mut rng, 10_000),
                    |mut jets| pool.install(|| sort_by_comparator(black_box(&mut jets))),
                    BatchSize::LargeInput,
                )
            },
        );
    }
    group.finish();

    c.bench_function("Tower sorting", |b| {
        let mut rng = fastrand::Rng::with_seed(1);
        b.iter_batched(
            || random_towers(&mut rng, 4_000),
            |mut towers| sort_by_comparator(black_box(&mut towers)),
            BatchSize::LargeInput,
        )
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = sorting_benchmark
}
criterion_main!(benches);
