// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use arbor_chunk::Node;
use arbor_partition::{PartitionConfig, partition_node};
use arbor_scene::{LayoutConfig, Scene};
use arbor_view::{Camera, Preset, Projection};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Size};

/// `width` children per branch, `depth` levels deep.
fn synthetic(name: String, level: u32, depth: u32, width: usize) -> Node {
    if depth == 0 {
        return Node::leaf(name, level);
    }
    let children = (0..width)
        .map(|i| synthetic(format!("{name}.{i}"), level + 1, depth - 1, width))
        .collect();
    Node::branch(name, level, children)
}

fn bench_cull(c: &mut Criterion) {
    let mut group = c.benchmark_group("cull");
    let viewport = Size::new(1280.0, 800.0);
    let projection = Projection::new(viewport);
    // 1 + 8 + 64 + 512 + 4096 + 32768 nodes.
    let tree = synthetic("Life".to_owned(), 0, 5, 8);
    let scene = Scene::build(&tree, LayoutConfig::default());
    let home = projection.fit_circle(scene.layout().root_circle(), 0.1);
    group.throughput(Throughput::Elements(scene.len() as u64));

    for preset in Preset::ALL {
        let settings = preset.settings();
        group.bench_function(format!("home_{preset:?}"), |b| {
            b.iter(|| black_box(scene.cull(home, viewport, &settings).entries().len()));
        });
    }

    let settings = Preset::Balanced.settings();
    let deep = Camera::new(home.x + 37.0, home.y - 21.0, home.k * 40.0);
    group.bench_function("zoomed_in", |b| {
        b.iter(|| black_box(scene.cull(deep, viewport, &settings).entries().len()));
    });

    let frame = scene.cull(home, viewport, &settings);
    group.bench_function("first_pick", |b| {
        b.iter_batched(
            || scene.cull(home, viewport, &settings),
            |frame| black_box(frame.pick(Point::new(640.0, 400.0)).map(|e| e.depth)),
            BatchSize::LargeInput,
        );
    });
    group.bench_function("repeat_pick", |b| {
        b.iter(|| black_box(frame.pick(Point::new(640.0, 400.0)).map(|e| e.depth)));
    });
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let tree = synthetic("Life".to_owned(), 0, 5, 8);
    group.bench_function("build_37k", |b| {
        b.iter(|| black_box(Scene::build(&tree, LayoutConfig::default()).len()));
    });
    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    let tree = synthetic("Life".to_owned(), 0, 5, 8);
    for (budget, depth) in [(500_u64, 1_u32), (5_000, 3)] {
        let config = PartitionConfig {
            chunk_size_budget: budget,
            depth_threshold: depth,
        };
        group.bench_function(format!("b{budget}_d{depth}"), |b| {
            b.iter(|| {
                let partition = partition_node(&tree, config).unwrap();
                black_box(partition.chunks.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cull, bench_layout, bench_partition);
criterion_main!(benches);
