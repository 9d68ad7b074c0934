use core::hash::BuildHasher;
use core::hash::Hash;
use core::hint::black_box;
use std::collections::HashMap as StdHashMap;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::HashMap as HashbrownHashMap;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::distr;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use robin_dense::HashMap as RobinHashMap;
use siphasher::sip::SipHasher;

/// Keyed SipHash, shared by every map so only the table design differs.
#[derive(Clone, Copy)]
struct SipState {
    k1: u64,
    k2: u64,
}

impl SipState {
    fn random() -> Self {
        let mut rng = OsRng;
        Self {
            k1: rng.try_next_u64().unwrap(),
            k2: rng.try_next_u64().unwrap(),
        }
    }
}

impl BuildHasher for SipState {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new_with_keys(self.k1, self.k2)
    }
}

trait BenchKey: Hash + Eq + Clone {
    fn new(key: u64) -> Self;
}

impl BenchKey for u64 {
    fn new(key: u64) -> Self {
        black_box(key)
    }
}

#[derive(Clone, Hash, PartialEq, Eq)]
struct StringKey(String);

impl BenchKey for StringKey {
    fn new(key: u64) -> Self {
        black_box(Self(format!("key_{:016X}", key)))
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 12),
    (1 << 14),
    (1 << 16),
    (1 << 18),
];

fn random_keys<K: BenchKey>(count: usize) -> Vec<K> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| K::new(rng.try_next_u64().unwrap()))
        .collect()
}

fn shuffled<K: Clone>(keys: &[K]) -> Vec<K> {
    let mut keys = keys.to_vec();
    keys.shuffle(&mut SmallRng::from_os_rng());
    keys
}

fn bench_insert_random<K: BenchKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "insert_random_{}",
        core::any::type_name::<K>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let keys = random_keys::<K>(size);
        let state = SipState::random();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("robin_dense/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut map = RobinHashMap::with_hasher(state);
                    for key in keys {
                        black_box(map.insert(key, 0u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("robin_dense_mix/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut map = RobinHashMap::new();
                    for key in keys {
                        black_box(map.insert(key, 0u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut map = HashbrownHashMap::with_hasher(state);
                    for key in keys {
                        black_box(map.insert(key, 0u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("std/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut map = StdHashMap::with_hasher(state);
                    for key in keys {
                        black_box(map.insert(key, 0u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_insert_preallocated<K: BenchKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "insert_preallocated_{}",
        core::any::type_name::<K>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let keys = random_keys::<K>(size);
        let state = SipState::random();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("robin_dense/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut map = RobinHashMap::with_capacity_and_hasher(size, state);
                    for key in keys {
                        black_box(map.insert(key, 0u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut map = HashbrownHashMap::with_capacity_and_hasher(size, state);
                    for key in keys {
                        black_box(map.insert(key, 0u64));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit_miss<K: BenchKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "find_hit_miss_{}",
        core::any::type_name::<K>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let keys = random_keys::<K>(size);
        let probes = shuffled(&[keys.clone(), random_keys::<K>(size)].concat());
        let state = SipState::random();
        group.throughput(Throughput::Elements(probes.len() as u64));

        let mut robin = RobinHashMap::with_hasher(state);
        let mut hashbrown = HashbrownHashMap::with_hasher(state);
        let mut std_map = StdHashMap::with_hasher(state);
        for key in &keys {
            robin.insert(key.clone(), 0u64);
            hashbrown.insert(key.clone(), 0u64);
            std_map.insert(key.clone(), 0u64);
        }

        group.bench_function(format!("robin_dense/{size}"), |b| {
            b.iter(|| {
                for probe in &probes {
                    black_box(robin.get(probe));
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for probe in &probes {
                    black_box(hashbrown.get(probe));
                }
            })
        });

        group.bench_function(format!("std/{size}"), |b| {
            b.iter(|| {
                for probe in &probes {
                    black_box(std_map.get(probe));
                }
            })
        });
    }

    group.finish();
}

fn bench_iteration<K: BenchKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("iteration_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let keys = random_keys::<K>(size);
        let state = SipState::random();
        group.throughput(Throughput::Elements(size as u64));

        let robin: RobinHashMap<K, u64, _> = {
            let mut map = RobinHashMap::with_hasher(state);
            map.extend(keys.iter().cloned().zip(0..));
            map
        };
        let hashbrown: HashbrownHashMap<K, u64, _> = {
            let mut map = HashbrownHashMap::with_hasher(state);
            map.extend(keys.iter().cloned().zip(0..));
            map
        };

        group.bench_function(format!("robin_dense/{size}"), |b| {
            b.iter(|| black_box(robin.values().sum::<u64>()))
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| black_box(hashbrown.values().sum::<u64>()))
        });
    }

    group.finish();
}

/// Half lookups, half upserts, with keys drawn from a Zipf distribution.
fn bench_mixed_zipf<K: BenchKey>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("mixed_zipf_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let state = SipState::random();
        let mut rng = SmallRng::from_os_rng();
        let key_distr = Zipf::new(size as f32 * 2.0, 1.0).unwrap();
        let operations = (0..size * 2)
            .map(|_| {
                let insert = rng.sample(distr::Bernoulli::new(0.5).unwrap());
                (insert, K::new(rng.sample(key_distr) as u64))
            })
            .collect::<Vec<(bool, K)>>();
        group.throughput(Throughput::Elements(operations.len() as u64));

        group.bench_function(format!("robin_dense/{size}"), |b| {
            b.iter_batched(
                || operations.clone(),
                |operations| {
                    let mut map = RobinHashMap::with_hasher(state);
                    for (insert, key) in operations {
                        if insert {
                            *map.entry(key).or_insert(0u64) += 1;
                        } else {
                            black_box(map.get(&key));
                        }
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || operations.clone(),
                |operations| {
                    let mut map = HashbrownHashMap::with_hasher(state);
                    for (insert, key) in operations {
                        if insert {
                            *map.entry(key).or_insert(0u64) += 1;
                        } else {
                            black_box(map.get(&key));
                        }
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<u64>,
    bench_insert_random::<StringKey>,
    bench_insert_preallocated::<u64>,
    bench_insert_preallocated::<StringKey>,
    bench_find_hit_miss::<u64>,
    bench_find_hit_miss::<StringKey>,
    bench_iteration::<u64>,
    bench_iteration::<StringKey>,
    bench_mixed_zipf::<u64>,
    bench_mixed_zipf::<StringKey>,
);

criterion_main!(benches);
