// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_fiber` passes over a recording target.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_fiber::memory::{MemoryNode, MemoryTarget};
use understory_fiber::{Element, Engine};

fn list(rows: usize, generation: i64) -> Element {
    Element::host("ul").with_children((0..rows).map(|i| {
        Element::host("li")
            .with("data-row", i as i64)
            .with("data-gen", generation)
            .with_child(Element::text(format!("row {i}")))
    }))
}

fn mounted(rows: usize) -> (Engine<MemoryTarget>, MemoryNode) {
    let mut target = MemoryTarget::new();
    let container = target.create_container();
    let mut engine = Engine::new(target);
    engine.render(list(rows, 0), container);
    let _ = engine.flush().expect("initial mount");
    engine.target_mut().clear_mutations();
    (engine, container)
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("fiber");

    for rows in [16_usize, 256, 2048] {
        group.bench_with_input(BenchmarkId::new("mount", rows), &rows, |b, &rows| {
            b.iter_batched(
                || {
                    let mut target = MemoryTarget::new();
                    let container = target.create_container();
                    (Engine::new(target), container)
                },
                |(mut engine, container)| {
                    engine.render(list(rows, 0), container);
                    black_box(engine.flush().expect("mount"));
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("rerender_same", rows), &rows, |b, &rows| {
            b.iter_batched(
                || mounted(rows),
                |(mut engine, container)| {
                    engine.render(list(rows, 0), container);
                    black_box(engine.flush().expect("rerender"));
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("rerender_changed", rows), &rows, |b, &rows| {
            b.iter_batched(
                || mounted(rows),
                |(mut engine, container)| {
                    engine.render(list(rows, 1), container);
                    black_box(engine.flush().expect("rerender"));
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("shrink_half", rows), &rows, |b, &rows| {
            b.iter_batched(
                || mounted(rows),
                |(mut engine, container)| {
                    engine.render(list(rows / 2, 0), container);
                    black_box(engine.flush().expect("shrink"));
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
