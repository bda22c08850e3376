//! Micro-operation benchmarks for every container shape.
//!
//! Run with: `cargo bench --bench aged_ops`
//!
//! Measures per-operation latency for insert, find, touch and the
//! pop-oldest expiry loop, ordered against hashed primary indices.

use std::hint::black_box;
use std::time::Instant;

use agedkit::clock::ManualClock;
use agedkit::{AgedHashMap, AgedHashMultiMap, AgedMap, AgedMultiMap};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

const SIZE: u64 = 16_384;
const OPS: u64 = 100_000;

/// Cheap deterministic key scramble so lookups do not walk memory in order.
fn scramble(i: u64) -> u64 {
    i.wrapping_mul(0x9E37_79B9_7F4A_7C15) % SIZE
}

// ============================================================================
// Insert (ns/op)
// ============================================================================

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_ns");
    group.throughput(Throughput::Elements(SIZE));

    group.bench_function("ordered_map", |b| {
        let clock = ManualClock::new(0);
        b.iter(|| {
            let mut map: AgedMap<u64, u64, _> = AgedMap::new(&clock);
            for i in 0..SIZE {
                map.insert(scramble(i), i).unwrap();
            }
            black_box(map.len())
        })
    });

    group.bench_function("hashed_map", |b| {
        let clock = ManualClock::new(0);
        b.iter(|| {
            let mut map: AgedHashMap<u64, u64, _> = AgedHashMap::new(&clock);
            for i in 0..SIZE {
                map.insert(scramble(i), i).unwrap();
            }
            black_box(map.len())
        })
    });

    group.bench_function("hashed_map_reserved", |b| {
        let clock = ManualClock::new(0);
        b.iter(|| {
            let mut map: AgedHashMap<u64, u64, _> = AgedHashMap::new(&clock);
            map.reserve(SIZE as usize).unwrap();
            for i in 0..SIZE {
                map.insert(scramble(i), i).unwrap();
            }
            black_box(map.len())
        })
    });

    group.bench_function("hashed_multimap_dupes", |b| {
        let clock = ManualClock::new(0);
        b.iter(|| {
            let mut map: AgedHashMultiMap<u64, u64, _> = AgedHashMultiMap::new(&clock);
            for i in 0..SIZE {
                map.insert(i % 64, i).unwrap();
            }
            black_box(map.len())
        })
    });

    group.finish();
}

// ============================================================================
// Find hit (ns/op)
// ============================================================================

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_hit_ns");
    group.throughput(Throughput::Elements(OPS));
    let clock = ManualClock::new(0);

    let mut ordered: AgedMap<u64, u64, _> = AgedMap::new(&clock);
    let mut hashed: AgedHashMap<u64, u64, _> = AgedHashMap::new(&clock);
    for i in 0..SIZE {
        ordered.insert(i, i).unwrap();
        hashed.insert(i, i).unwrap();
    }

    group.bench_function("ordered_map", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(ordered.get(&scramble(i)));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("hashed_map", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(hashed.get(&scramble(i)));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Touch (ns/op)
// ============================================================================

fn bench_touch(c: &mut Criterion) {
    let mut group = c.benchmark_group("touch_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("ordered_multimap", |b| {
        b.iter_custom(|iters| {
            let clock = ManualClock::new(0);
            let mut map: AgedMultiMap<u64, u64, _> = AgedMultiMap::new(&clock);
            for i in 0..SIZE {
                map.insert(i, i).unwrap();
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    clock.advance(1);
                    black_box(map.touch(&scramble(i)));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("hashed_map", |b| {
        b.iter_custom(|iters| {
            let clock = ManualClock::new(0);
            let mut map: AgedHashMap<u64, u64, _> = AgedHashMap::new(&clock);
            for i in 0..SIZE {
                map.insert(i, i).unwrap();
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    clock.advance(1);
                    black_box(map.touch(&scramble(i)));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Expiry churn: insert newest, pop oldest
// ============================================================================

fn bench_expiry_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("expiry_churn_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("hashed_map", |b| {
        b.iter_custom(|iters| {
            let clock = ManualClock::new(0);
            let mut map: AgedHashMap<u64, u64, _> = AgedHashMap::new(&clock);
            for i in 0..SIZE {
                map.insert(i, i).unwrap();
            }
            let mut next = SIZE;
            let start = Instant::now();
            for _ in 0..iters {
                for _ in 0..OPS {
                    clock.advance(1);
                    black_box(map.pop_oldest());
                    map.insert(next, next).unwrap();
                    next += 1;
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("ordered_map", |b| {
        b.iter_custom(|iters| {
            let clock = ManualClock::new(0);
            let mut map: AgedMap<u64, u64, _> = AgedMap::new(&clock);
            for i in 0..SIZE {
                map.insert(i, i).unwrap();
            }
            let mut next = SIZE;
            let start = Instant::now();
            for _ in 0..iters {
                for _ in 0..OPS {
                    clock.advance(1);
                    black_box(map.pop_oldest());
                    map.insert(next, next).unwrap();
                    next += 1;
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_find, bench_touch, bench_expiry_churn);
criterion_main!(benches);
