use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_core::{ElementTree, Key, MemoryApplier, OwnerOptions, Widget};
use trellis_testing::{Column, Text};

const LIST_SIZES: &[usize] = &[16, 64, 256, 1024];

fn keyed_list(order: &[usize]) -> Widget {
    let children = order
        .iter()
        .map(|&item| Text::keyed(format!("item {item}"), Key::value(item)).widget())
        .collect();
    Column::new("list", children).widget()
}

fn tree() -> ElementTree {
    ElementTree::with_options(
        MemoryApplier::new(),
        OwnerOptions::new()
            .strict_contracts(false)
            .debug_checks(false),
    )
}

fn bench_noop_rebuild(c: &mut Criterion) {
    let order: Vec<usize> = (0..256).collect();
    let widget = keyed_list(&order);
    let tree = tree();
    tree.set_root_widget(widget.clone()).expect("initial build");

    c.bench_function("reconcile_identical_root", |b| {
        b.iter(|| {
            tree.set_root_widget(black_box(widget.clone()))
                .expect("rebuild");
        });
    });
}

fn bench_fresh_configuration(c: &mut Criterion) {
    let order: Vec<usize> = (0..256).collect();
    let tree = tree();
    tree.set_root_widget(keyed_list(&order)).expect("initial build");

    c.bench_function("reconcile_equal_configuration", |b| {
        b.iter(|| {
            tree.set_root_widget(keyed_list(black_box(&order)))
                .expect("rebuild");
        });
    });
}

fn bench_keyed_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_keyed_reverse");
    for &size in LIST_SIZES {
        group.bench_with_input(BenchmarkId::new("children", size), &size, |b, &size| {
            let forward: Vec<usize> = (0..size).collect();
            let reversed: Vec<usize> = forward.iter().rev().copied().collect();
            let tree = tree();
            tree.set_root_widget(keyed_list(&forward)).expect("initial build");
            let mut flipped = false;

            b.iter(|| {
                let order = if flipped { &forward } else { &reversed };
                flipped = !flipped;
                tree.set_root_widget(keyed_list(order)).expect("reorder");
            });
        });
    }
    group.finish();
}

fn bench_insert_remove(c: &mut Criterion) {
    let full: Vec<usize> = (0..256).collect();
    let sparse: Vec<usize> = full.iter().copied().filter(|item| item % 4 != 0).collect();
    let tree = tree();
    tree.set_root_widget(keyed_list(&full)).expect("initial build");
    let mut shrunk = false;

    c.bench_function("reconcile_insert_remove", |b| {
        b.iter(|| {
            let order = if shrunk { &full } else { &sparse };
            shrunk = !shrunk;
            tree.set_root_widget(keyed_list(order)).expect("update");
        });
    });
}

criterion_group!(
    benches,
    bench_noop_rebuild,
    bench_fresh_configuration,
    bench_keyed_reverse,
    bench_insert_remove
);
criterion_main!(benches);
