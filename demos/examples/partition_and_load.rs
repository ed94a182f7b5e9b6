// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offline partition, then a full lazy load from disk.
//!
//! Builds a 12,000-node synthetic taxonomy, partitions it with budget 5000 and
//! depth threshold 3, writes the files to a temporary directory, and hydrates
//! every stub through the file system loader.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p arbor_demos --example partition_and_load`

use std::sync::Arc;

use anyhow::Context;
use arbor_chunk::Node;
use arbor_loader::{FsFetch, LazyLoader, LoaderConfig, Visibility};
use arbor_partition::{PartitionConfig, partition_node, write_partition};
use tracing_subscriber::EnvFilter;

/// Root, 4 kingdoms, 30 families each, 99 species per family except the
/// very last family, which has 94: 12,000 nodes.
fn taxonomy() -> Node {
    Node::branch(
        "Life",
        0,
        (0..4)
            .map(|k| {
                Node::branch(
                    format!("Kingdom {k}"),
                    1,
                    (0..30)
                        .map(|f| {
                            Node::branch(
                                format!("Family {k}.{f}"),
                                2,
                                (0..if (k, f) == (3, 29) { 94 } else { 99 })
                                    .map(|s| Node::leaf(format!("Species {k}.{f}.{s}"), 3))
                                    .collect(),
                            )
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(false)
        .init();

    let tree = taxonomy();
    let config = PartitionConfig {
        chunk_size_budget: 5_000,
        depth_threshold: 3,
    };
    let partition = partition_node(&tree, config).context("partitioning")?;
    anyhow::ensure!(partition.manifest.total_nodes == 12_000, "unexpected tree size");
    println!(
        "{} nodes in {} chunks; skeleton has {} stubs",
        partition.manifest.total_nodes,
        partition.manifest.total_chunks,
        partition.root.stubs().len()
    );
    for warning in &partition.report.warnings {
        println!("warning: {warning}");
    }

    let dir = tempfile::tempdir().context("creating a temporary directory")?;
    write_partition(dir.path(), &partition, false).context("writing the partition")?;

    let (loader, mut root) = LazyLoader::open(Arc::new(FsFetch::new(dir.path())), LoaderConfig::default())
        .await
        .context("opening the partition")?;
    let loader = Arc::new(loader);
    let before = loader.progress();
    println!("skeleton loaded: {}/{} nodes", before.loaded, before.total);

    let summary = loader.hydrate_all(&mut root, &Visibility::new()).await;
    let after = loader.progress();
    println!(
        "hydrated {} chunks: {}/{} nodes ({:.0}%), peak {} concurrent fetches",
        summary.chunks,
        after.loaded,
        after.total,
        after.fraction() * 100.0,
        loader.stats().peak_in_flight
    );
    anyhow::ensure!(root == tree, "hydrated tree differs from the source");
    Ok(())
}
