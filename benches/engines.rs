use criterion::{criterion_group, criterion_main, Criterion};
use min_unsat::counting::counter::{select_counter, Counter, Params, RunOptions};
use min_unsat::counting::evaluator::CountMode;
use std::hint::black_box;
use std::time::Duration;

fn count(v: u32, l: u32, c: u32, cpu: bool) -> u64 {
    let params = Params::new(v, l, c).unwrap();
    let options = RunOptions {
        force_cpu: cpu,
        ..RunOptions::default()
    };
    let mut counter = select_counter(params, options, CountMode::MinUnsat).unwrap();
    counter.count().unwrap().count
}

fn bench_two_sat(c: &mut Criterion) {
    let mut group = c.benchmark_group("2sat");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("v4 c6 parallel", |b| {
        b.iter(|| black_box(count(4, 2, 6, false)))
    });
    group.bench_function("v4 c6 cpu", |b| b.iter(|| black_box(count(4, 2, 6, true))));
    group.bench_function("v4 c8 parallel", |b| {
        b.iter(|| black_box(count(4, 2, 8, false)))
    });
    group.finish();
}

fn bench_three_sat(c: &mut Criterion) {
    let mut group = c.benchmark_group("3sat");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(15));

    group.bench_function("v4 c8 exact cover", |b| {
        b.iter(|| black_box(count(4, 3, 8, false)))
    });
    group.bench_function("v5 c8 exact cover", |b| {
        b.iter(|| black_box(count(5, 3, 8, false)))
    });
    group.bench_function("v4 c9 hybrid", |b| {
        b.iter(|| black_box(count(4, 3, 9, false)))
    });
    group.finish();
}

criterion_group!(benches, bench_two_sat, bench_three_sat);
criterion_main!(benches);
