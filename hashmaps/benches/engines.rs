use std::collections::HashMap as StdHashMap;
use std::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::Throughput;
use hashmaps::chained::Chained;
use hashmaps::hopscotch::Hopscotch;
use hashmaps::linear::Linear;
use hashmaps::robin_hood::RobinHood;
use hashmaps_core::Map;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

const NUM_KEYS: usize = 100_000;

fn random_keys(seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    // Non-zero so the same key set works for the sentinel-based linear engine.
    (0..NUM_KEYS).map(|_| rng.random_range(1..=u64::MAX)).collect()
}

fn filled<M: Map<u64, u64>>(mut table: M, keys: &[u64]) -> M {
    for &key in keys {
        table.put(key, key);
    }
    table
}

fn bench_insert(c: &mut Criterion) {
    let keys = random_keys(7);

    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(NUM_KEYS as u64));

    group.bench_function("chained", |b| {
        b.iter_batched(
            Chained::<u64, u64>::new,
            |table| filled(table, &keys),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("linear", |b| {
        b.iter_batched(
            Linear::<u64, u64>::new,
            |table| filled(table, &keys),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("robin_hood", |b| {
        b.iter_batched(
            RobinHood::<u64, u64>::new,
            |table| filled(table, &keys),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("hopscotch", |b| {
        b.iter_batched(
            Hopscotch::<u64, u64>::new,
            |table| filled(table, &keys),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("std", |b| {
        b.iter_batched(
            StdHashMap::<u64, u64>::new,
            |mut table| {
                for &key in &keys {
                    table.insert(key, key);
                }
                table
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_lookup_hit(c: &mut Criterion) {
    let keys = random_keys(7);
    let misses = random_keys(13);

    let chained = filled(Chained::<u64, u64>::new(), &keys);
    let linear = filled(Linear::<u64, u64>::new(), &keys);
    let robin_hood = filled(RobinHood::<u64, u64>::new(), &keys);
    let hopscotch = filled(Hopscotch::<u64, u64>::new(), &keys);
    let std_map: StdHashMap<u64, u64> = keys.iter().map(|&key| (key, key)).collect();

    let mut group = c.benchmark_group("lookup");
    group.throughput(Throughput::Elements(NUM_KEYS as u64));

    for (name, table) in [
        ("chained", &chained as &dyn Map<u64, u64>),
        ("linear", &linear),
        ("robin_hood", &robin_hood),
        ("hopscotch", &hopscotch),
    ] {
        group.bench_function(format!("{}/hit", name), |b| {
            b.iter(|| {
                let mut found = 0_usize;
                for key in &keys {
                    found += usize::from(table.get(black_box(key)).is_some());
                }
                found
            })
        });
        group.bench_function(format!("{}/miss", name), |b| {
            b.iter(|| {
                let mut found = 0_usize;
                for key in &misses {
                    found += usize::from(table.get(black_box(key)).is_some());
                }
                found
            })
        });
    }

    group.bench_function("std/hit", |b| {
        b.iter(|| {
            let mut found = 0_usize;
            for key in &keys {
                found += usize::from(std_map.get(black_box(key)).is_some());
            }
            found
        })
    });

    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let keys = random_keys(7);

    let mut group = c.benchmark_group("remove");
    group.throughput(Throughput::Elements(NUM_KEYS as u64));

    group.bench_function("chained", |b| {
        b.iter_batched(
            || filled(Chained::<u64, u64>::new(), &keys),
            |mut table| {
                for key in &keys {
                    table.remove(key);
                }
                table
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("linear", |b| {
        b.iter_batched(
            || filled(Linear::<u64, u64>::new(), &keys),
            |mut table| {
                for key in &keys {
                    table.remove(key);
                }
                table
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("robin_hood", |b| {
        b.iter_batched(
            || filled(RobinHood::<u64, u64>::new(), &keys),
            |mut table| {
                for key in &keys {
                    table.remove(key);
                }
                table
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("hopscotch", |b| {
        b.iter_batched(
            || filled(Hopscotch::<u64, u64>::new(), &keys),
            |mut table| {
                for key in &keys {
                    table.remove(key);
                }
                table
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup_hit, bench_remove);
criterion_main!(benches);
