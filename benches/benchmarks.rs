//! Cuckoo哈希集合性能基准测试

use criterion::{
    criterion_group, criterion_main, BenchmarkId, Criterion, PlotConfiguration, Throughput,
};

use cuckoo_hashset::{batch_contains, batch_insert, CuckooSet, CuckooSetConfig, HashAlgorithm};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// 基准测试配置
const SEED: u64 = 42;
const ITEM_COUNTS: [usize; 3] = [1_000, 10_000, 100_000];
const KEY_SIZE: usize = 16;

/// 生成随机键
fn generate_keys(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..count)
        .map(|_| {
            (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(KEY_SIZE)
                .map(char::from)
                .collect()
        })
        .collect()
}

fn filled_set(keys: &[String]) -> CuckooSet {
    let set = CuckooSet::new(16);
    batch_insert(&set, keys.iter().map(String::as_str));
    set
}

/// 插入基准测试 (含扩容)
fn bench_insert(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(criterion::AxisScale::Logarithmic);
    let mut group = c.benchmark_group("Insert");
    group.plot_config(plot_config);

    for &count in ITEM_COUNTS.iter() {
        let keys = generate_keys(count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            b.iter_batched(
                || CuckooSet::new(16),
                |set| {
                    for key in keys {
                        set.insert(key);
                    }
                },
                criterion::BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

/// 查询基准测试
fn bench_contains(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(criterion::AxisScale::Logarithmic);
    let mut group = c.benchmark_group("Contains");
    group.plot_config(plot_config);

    for &count in ITEM_COUNTS.iter() {
        let keys = generate_keys(count);
        let set = filled_set(&keys);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            b.iter(|| {
                let hits = batch_contains(&set, keys.iter().map(String::as_str));
                criterion::black_box(hits);
            });
        });
    }
    group.finish();
}

/// 删除基准测试
fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("Remove");

    for &count in ITEM_COUNTS.iter() {
        let keys = generate_keys(count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            b.iter_batched(
                || filled_set(keys),
                |set| {
                    for key in keys {
                        criterion::black_box(set.remove(key));
                    }
                },
                criterion::BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

/// 哈希算法对比
fn bench_hash_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hash Algorithms");
    let keys = generate_keys(10_000);

    for algorithm in [HashAlgorithm::XxHash, HashAlgorithm::AHash, HashAlgorithm::Default] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", algorithm)),
            &keys,
            |b, keys| {
                b.iter_batched(
                    || {
                        CuckooSet::with_config(CuckooSetConfig {
                            hash_algorithm: algorithm,
                            ..CuckooSetConfig::default()
                        })
                        .unwrap()
                    },
                    |set| {
                        batch_insert(&set, keys.iter().map(String::as_str));
                    },
                    criterion::BatchSize::PerIteration,
                );
            },
        );
    }
    group.finish();
}

/// 扩容基准测试
fn bench_rehash(c: &mut Criterion) {
    let mut group = c.benchmark_group("Rehash");

    for &count in ITEM_COUNTS.iter() {
        let keys = generate_keys(count);

        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            b.iter_batched(
                || filled_set(keys),
                |set| {
                    set.force_rehash().unwrap();
                },
                criterion::BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

/// 并发性能测试
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent");
    let keys = generate_keys(100_000);

    for &thread_count in [1, 4, 8, 16].iter() {
        group.bench_with_input(
            BenchmarkId::new("Concurrent Insert", format!("{} threads", thread_count)),
            &(thread_count, keys.clone()),
            |b, (thread_count, keys)| {
                b.iter(|| {
                    let set = Arc::new(CuckooSet::new(16));
                    let chunk_size = keys.len() / thread_count;
                    let handles: Vec<_> = keys
                        .chunks(chunk_size)
                        .map(|chunk| {
                            let set = Arc::clone(&set);
                            let chunk = chunk.to_vec();
                            thread::spawn(move || {
                                for key in chunk {
                                    set.insert(&key);
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(5))
        .noise_threshold(0.05);
    targets =
        bench_insert,
        bench_contains,
        bench_remove,
        bench_hash_algorithms,
        bench_rehash,
        bench_concurrent
);
criterion_main!(benches);
