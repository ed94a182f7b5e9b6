// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A headless exploration session.
//!
//! Partitions a small taxonomy into memory, opens an explorer over it, and
//! drives it the way a UI loop would: hover, click to zoom, render frames at
//! 60 Hz while loads land, and print what each frame would draw.
//!
//! Run:
//! - `RUST_LOG=arbor_explorer=debug cargo run -p arbor_demos --example explore_headless`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use arbor_chunk::{MANIFEST_FILE, Node, encode};
use arbor_explorer::{Explorer, ExplorerConfig};
use arbor_loader::{MemoryFetch, Visibility};
use arbor_partition::{PartitionConfig, partition_node};
use arbor_scene::Frame;
use arbor_view::{Preset, Projection};
use kurbo::Size;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_micros(16_667);

fn taxonomy() -> Node {
    let kingdoms = ["Animalia", "Plantae", "Fungi", "Protista", "Archaea", "Bacteria"];
    Node::branch(
        "Life",
        0,
        kingdoms
            .iter()
            .enumerate()
            .map(|(k, name)| {
                Node::branch(
                    *name,
                    1,
                    (0..8 + k * 2)
                        .map(|o| {
                            Node::branch(
                                format!("{name} order {o}"),
                                2,
                                (0..12 + o).map(|s| Node::leaf(format!("{name} {o}.{s}"), 3)).collect(),
                            )
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

fn describe(label: &str, frame: &Frame) {
    let stats = frame.stats();
    println!(
        "{label:>10}: {:>4} entries, {:>3} labels, {:>2} requests ({} deferred), {} pruned off screen, {} too small",
        frame.entries().len(),
        frame.labels().len(),
        frame.requests().len(),
        stats.deferred_requests,
        stats.offscreen,
        stats.too_small,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(false)
        .init();

    let partition = partition_node(
        &taxonomy(),
        PartitionConfig {
            chunk_size_budget: 60,
            depth_threshold: 1,
        },
    )
    .context("partitioning")?;
    let mut docs = MemoryFetch::new();
    docs.insert(MANIFEST_FILE, partition.manifest.encode()?);
    docs.insert(partition.manifest.root_file.clone(), encode(&partition.root)?);
    for chunk in &partition.chunks {
        docs.insert(chunk.file_name(), encode(&chunk.data)?);
    }

    let config = ExplorerConfig {
        viewport: Size::new(1280.0, 800.0),
        settings: Preset::Balanced.settings(),
        ..ExplorerConfig::default()
    };
    let mut explorer = Explorer::open(Arc::new(docs), config, Visibility::new())
        .await
        .context("opening the explorer")?;

    let mut now = Duration::ZERO;
    describe("open", explorer.render(now));
    let applied = explorer.settle().await;
    println!("{:>10}: {} grafted, {} nodes", "settled", applied.grafted, applied.nodes);
    describe("grafted", explorer.render(now));

    // Hover over the centre of the largest kingdom, then click it.
    let target = explorer
        .root()
        .children()
        .iter()
        .max_by_key(|k| k.leaf_count)
        .map(|k| k.name.clone())
        .context("empty taxonomy")?;
    let path = arbor_chunk::NodePath::from(&["Life", target.as_str()][..]);
    let node = explorer
        .scene()
        .find(&path)
        .and_then(|id| explorer.scene().node(id))
        .context("kingdom not laid out")?;
    let at = Projection::new(explorer.viewport()).world_to_screen(explorer.camera().camera(), node.circle().center);
    for event in explorer.pointer_move(at) {
        println!("{:>10}: {event:?}", "hover");
    }
    let clicked = explorer.click(at, now);
    println!("{:>10}: {clicked:?}", "click");

    let mut frames = 0;
    while explorer.is_animating() || explorer.pending_requests() > 0 {
        now += FRAME;
        frames += 1;
        let applied = explorer.apply_completed();
        if !applied.is_empty() {
            println!("{:>10}: frame {frames}, {} grafted", "loaded", applied.grafted);
        }
        explorer.render(now);
        tokio::task::yield_now().await;
    }
    describe("zoomed", explorer.render(now));

    let progress = explorer.progress();
    println!(
        "{:>10}: {}/{} nodes materialized after {frames} frames",
        "progress", progress.loaded, progress.total
    );
    Ok(())
}
