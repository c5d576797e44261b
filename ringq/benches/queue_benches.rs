use std::ffi::CString;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use moveit::moveit;
use rand::seq::SliceRandom;
use ringq::queue::StrQueue;

const SIZES: &[usize] = &[100, 1_000, 10_000];

fn payloads(n: usize) -> Vec<CString> {
    (0..n)
        .map(|i| CString::new(format!("payload{i}")).unwrap())
        .collect()
}

fn fifo_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo");

    for &n in SIZES {
        let strings = payloads(n);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(BenchmarkId::new("insert_tail_remove_head", n), |b| {
            b.iter(|| {
                moveit! {
                    let mut queue = StrQueue::new();
                }

                for s in &strings {
                    queue.as_mut().insert_tail(s);
                }
                while let Some(node) = queue.as_mut().remove_head(None) {
                    black_box(node);
                }
            })
        });
    }

    group.finish();
}

fn transform_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("transforms");
    let mut rng = rand::rng();

    for &n in SIZES {
        let mut strings = payloads(n);
        strings.shuffle(&mut rng);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(BenchmarkId::new("reverse", n), |b| {
            moveit! {
                let mut queue = StrQueue::new();
            }
            for s in &strings {
                queue.as_mut().insert_tail(s);
            }

            b.iter(|| queue.as_mut().reverse())
        });

        group.bench_function(BenchmarkId::new("sort_shuffled", n), |b| {
            b.iter(|| {
                moveit! {
                    let mut queue = StrQueue::new();
                }
                for s in &strings {
                    queue.as_mut().insert_tail(s);
                }
                queue.as_mut().sort();
                black_box(queue.as_ref().len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, fifo_benchmark, transform_benchmark);
criterion_main!(benches);
