// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partition a synthetic tree to disk, then explore it through the file system.

use std::sync::Arc;
use std::time::Duration;

use arbor_chunk::Node;
use arbor_explorer::{Explorer, ExplorerConfig};
use arbor_loader::{FsFetch, Visibility};
use arbor_partition::{PartitionConfig, partition_node, write_partition};
use arbor_view::Preset;
use kurbo::Size;

/// `width` children per branch, `depth` levels of branches, then leaves.
fn synthetic(name: String, level: u32, depth: u32, width: usize) -> Node {
    if depth == 0 {
        return Node::leaf(name, level);
    }
    let children = (0..width)
        .map(|i| synthetic(format!("{name}.{i}"), level + 1, depth - 1, width))
        .collect();
    Node::branch(name, level, children)
}

#[tokio::test]
async fn explores_a_partition_written_to_disk() {
    // 1 + 6 + 36 + 216 + 1296 nodes.
    let tree = synthetic("Life".to_owned(), 0, 4, 6);
    let partition = partition_node(
        &tree,
        PartitionConfig {
            chunk_size_budget: 100,
            depth_threshold: 1,
        },
    )
    .unwrap();
    assert_eq!(partition.manifest.total_nodes, 1555);
    assert!(!partition.chunks.is_empty());

    let dir = tempfile::tempdir().unwrap();
    write_partition(dir.path(), &partition, false).unwrap();

    let config = ExplorerConfig {
        viewport: Size::new(1024.0, 768.0),
        settings: Preset::Quality.settings(),
        ..ExplorerConfig::default()
    };
    let mut explorer = Explorer::open(Arc::new(FsFetch::new(dir.path())), config, Visibility::new())
        .await
        .unwrap();
    assert!(!explorer.root().stubs().is_empty());

    // Zoom into the first kingdom so its descendants are large enough to be
    // requested, then keep rendering until nothing is outstanding.
    let first = explorer.root().children()[0].name.clone();
    let path = arbor_chunk::NodePath::from(&["Life", first.as_str()][..]);
    assert!(explorer.zoom_to(&path, Duration::ZERO));
    for step in 0..50_u64 {
        explorer.render(Duration::from_millis(step * 100));
        if !explorer.is_animating() && explorer.pending_requests() == 0 {
            break;
        }
        explorer.settle().await;
    }

    let hydrated = explorer.root().find(path.segments()).unwrap();
    assert!(!hydrated.is_stub);
    assert_eq!(hydrated, tree.find(path.segments()).unwrap());
    assert_eq!(explorer.failures().count(), 0);
    assert!(explorer.progress().loaded > 1);
}
