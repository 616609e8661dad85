use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tessera::{Candidate, EventStore, Ref, Vec4};

/// Build `n_jets` candidates which each own `size` leaves, drawn from a shared pool so that
/// neighbouring jets overlap.
fn build_jets(store: &mut EventStore, n_jets: usize, size: usize) -> Vec<Ref<Candidate>> {
    let mut rng = fastrand::Rng::with_seed(0);
    let leaves: Vec<_> = (0..n_jets * size / 2)
        .map(|_| {
            store.candidates.insert(Candidate::with_momentum(Vec4::from_pt_eta_phi_m(
                rng.f64() * 50.0,
                rng.f64() * 2.0 - 1.0,
                rng.f64(),
                0.0,
            )))
        })
        .collect();
    (0..n_jets)
        .map(|_| {
            let mut jet = Candidate::new();
            for _ in 0..size {
                jet.add_candidate(leaves[rng.usize(0..leaves.len())]);
            }
            store.candidates.insert(jet)
        })
        .collect()
}

fn overlap_benchmark(c: &mut Criterion) {
    let mut store = EventStore::new();
    let jets = build_jets(&mut store, 64, 30);
    c.bench_function("Pairwise overlaps", |b| {
        b.iter(|| {
            let mut count = 0usize;
            for &a in &jets {
                for &other in &jets {
                    if store.candidates.overlaps(black_box(a), black_box(other)) {
                        count += 1;
                    }
                }
            }
            count
        })
    });
    c.bench_function("Deep clone", |b| {
        b.iter_batched(
            || {
                let mut store = EventStore::new();
                let jets = build_jets(&mut store, 8, 30);
                (store, jets[0])
            },
            |(mut store, jet)| store.candidates.clone_candidate(black_box(jet)),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, overlap_benchmark);
criterion_main!(benches);
