// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use arbor_index::{Backend, FlatVec, Index, UniformGrid};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Screen-space bounding boxes of `count` circles with radii spread over two
/// orders of magnitude, like a frame's entries.
fn gen_frame_boxes(count: usize, width: f64, height: f64) -> Vec<Rect> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let r = 2.0 + rng.next_f64().powi(4) * 200.0;
            let x = rng.next_f64() * width;
            let y = rng.next_f64() * height;
            Rect::new(x - r, y - r, x + r, y + r)
        })
        .collect()
}

/// Nested squares: a few huge boxes over many small ones, as when zoomed deep.
fn gen_nested_boxes(levels: usize, fan: usize) -> Vec<Rect> {
    let mut out = vec![Rect::new(-5_000.0, -5_000.0, 6_000.0, 6_000.0)];
    let mut frontier = out.clone();
    for _ in 0..levels {
        let mut next = Vec::new();
        for parent in &frontier {
            let step = parent.width() / fan as f64;
            for i in 0..fan {
                for j in 0..fan {
                    let x0 = parent.x0 + i as f64 * step;
                    let y0 = parent.y0 + j as f64 * step;
                    next.push(Rect::new(x0 + step * 0.05, y0 + step * 0.05, x0 + step * 0.95, y0 + step * 0.95));
                }
            }
        }
        out.extend_from_slice(&next);
        frontier = next;
    }
    out
}

fn build<B: Backend>(mut idx: Index<u32, B>, rects: &[Rect]) -> Index<u32, B> {
    idx.reserve(rects.len());
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = idx.insert(r, i as u32);
    }
    idx
}

fn bench_build_and_query<B: Backend>(c: &mut Criterion, name: &str, make: fn() -> Index<u32, B>) {
    let mut group = c.benchmark_group(name);
    for &n in &[1_000_usize, 4_000, 16_000] {
        let rects = gen_frame_boxes(n, 1280.0, 800.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("build_query_rect_n{n}"), |b| {
            b.iter_batched(
                make,
                |idx| {
                    let idx = build(idx, &rects);
                    let hits = idx.query_rect(Rect::new(300.0, 200.0, 700.0, 500.0)).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            );
        });
    }
    let rects = gen_frame_boxes(4_000, 1280.0, 800.0);
    group.bench_function("pick_heavy", |b| {
        let idx = build(make(), &rects);
        b.iter(|| {
            let mut total = 0_usize;
            for q in 0..256 {
                let pt = Point::new((q % 32) as f64 * 40.0, (q / 32) as f64 * 100.0);
                total += idx.query_point(pt).count();
            }
            black_box(total);
        });
    });
    let nested = gen_nested_boxes(3, 6);
    group.bench_function("nested_deep_zoom", |b| {
        let idx = build(make(), &nested);
        b.iter(|| {
            let hits = idx.query_rect(Rect::new(0.0, 0.0, 1280.0, 800.0)).count();
            black_box(hits);
        });
    });
    group.finish();
}

fn bench_flatvec(c: &mut Criterion) {
    bench_build_and_query::<FlatVec>(c, "flatvec", Index::new);
}

fn bench_grid(c: &mut Criterion) {
    bench_build_and_query::<UniformGrid>(c, "grid_32", || Index::with_uniform_grid(32.0));
    bench_build_and_query::<UniformGrid>(c, "grid_128", || Index::with_uniform_grid(128.0));
}

criterion_group!(benches, bench_flatvec, bench_grid);
criterion_main!(benches);
