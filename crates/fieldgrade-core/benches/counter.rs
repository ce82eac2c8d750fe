use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fieldgrade_core::counter::FrequencyCounter;

fn populated(distinct: usize, total: usize) -> FrequencyCounter<String> {
    let mut counter = FrequencyCounter::new();
    for i in 0..total {
        counter.increment(format!("K{}ABC", i % distinct));
    }
    counter
}

fn bench_increment(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_increment");

    group.bench_function("null_safe x1000", |b| {
        b.iter(|| {
            let mut counter = FrequencyCounter::new();
            for i in 0..1000 {
                let value = if i % 10 == 0 { None } else { Some("W1AW") };
                counter.increment_null_safe(black_box(value));
            }
            counter
        })
    });

    group.finish();
}

fn bench_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_ordering");

    for distinct in [10usize, 100, 1000] {
        let counter = populated(distinct, distinct * 5);
        group.bench_function(format!("by_count_descending/{distinct}"), |b| {
            b.iter(|| black_box(&counter).by_count_descending())
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let left = populated(500, 5000);
    let right = populated(800, 5000);

    c.bench_function("counter_merge/500+800", |b| {
        b.iter(|| {
            let mut merged = left.clone();
            merged.merge(black_box(&right));
            merged
        })
    });
}

criterion_group!(benches, bench_increment, bench_ordering, bench_merge);
criterion_main!(benches);
