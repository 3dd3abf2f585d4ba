use criterion::{black_box, criterion_group, criterion_main, Criterion};
use interval_containers::{AvlTree, Interval, Query, SplayTree};
use rand::{thread_rng, Rng};

const N: i32 = 10_000;

fn random_intervals(n: i32) -> Vec<Interval<i32, ()>> {
    let mut rng = thread_rng();
    (0..n)
        .map(|_| {
            let start = rng.gen_range(0..100_000);
            let len = rng.gen_range(1..500);
            Interval::new(start, start + len, ())
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("avl insert", |b| {
        let mut tree = AvlTree::new();
        let mut rng = thread_rng();
        b.iter(|| {
            let start = rng.gen_range(0..100_000);
            let len = rng.gen_range(1..500);
            tree.insert(black_box(Interval::new(start, start + len, ())));
        })
    });

    c.bench_function("avl find_overlaps", |b| {
        let mut tree = AvlTree::new();
        for iv in random_intervals(N) {
            tree.insert(iv);
        }
        let mut rng = thread_rng();
        b.iter(|| {
            let start = rng.gen_range(0..100_000);
            black_box(tree.find_overlaps(&Query::new(start, start + 1_000)));
        })
    });

    c.bench_function("splay find_overlaps repeated hot range", |b| {
        let mut tree = SplayTree::new();
        for iv in random_intervals(N) {
            tree.insert(iv);
        }
        b.iter(|| {
            black_box(tree.find_overlaps(&Query::new(50_000, 51_000)));
        })
    });

    c.bench_function("implicit find_overlaps after index", |b| {
        let mut tree = interval_containers::ImplicitTree::new();
        for iv in random_intervals(N) {
            tree.add("chr1", iv.start, iv.end, ());
        }
        tree.index();
        let mut rng = thread_rng();
        b.iter(|| {
            let start = rng.gen_range(0..100_000);
            black_box(tree.find_overlaps("chr1", start, start + 1_000));
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
