use boxrecon::{
    evaluate_size_consistency, median_dimensions, reconcile, BoundingBox, BoxArray, CheckMode,
    ConsistencyMode,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn word_line(len: usize) -> BoxArray {
    BoxArray::from_boxes((0..len).map(|i| {
        let w = if i % 17 == 0 { 180 } else { 95 + (i % 11) as u32 };
        let h = if i % 23 == 0 { 90 } else { 38 + (i % 5) as u32 };
        BoundingBox::new(i as i32 * 120, 0, w, h)
    }))
}

fn bench_reconcile(c: &mut Criterion) {
    let boxes = word_line(300);

    c.bench_function("median_dimensions_300", |b| {
        b.iter(|| median_dimensions(black_box(&boxes)))
    });

    c.bench_function("size_consistency_pairwise_300", |b| {
        b.iter(|| evaluate_size_consistency(black_box(&boxes), ConsistencyMode::Pairwise))
    });

    c.bench_function("reconcile_both_300", |b| {
        b.iter(|| reconcile(black_box(&boxes), CheckMode::Both, 0.05, 1.03))
    });
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
