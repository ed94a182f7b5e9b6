// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `arbor-partition`: split a large tree document into chunk files.
//!
//! ```bash
//! arbor-partition taxonomy.json data/ --budget 5000 --depth-threshold 3
//! RUST_LOG=arbor_partition=debug arbor-partition nested.json data/ --format nested --pretty
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use arbor_partition::{PartitionConfig, SourceFormat, SourceTree, partition, write_partition};
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "arbor-partition")]
#[command(version)]
#[command(about = "Split a tree document into size-bounded chunks, a root skeleton and a manifest")]
struct Cli {
    /// Source tree document (JSON)
    input: PathBuf,

    /// Directory to write manifest.json, root.json and chunk files into
    output: PathBuf,

    /// Maximum nodes per chunk
    #[arg(long, default_value_t = PartitionConfig::default().chunk_size_budget)]
    budget: u64,

    /// Levels below a region root before a subtree may be split off
    #[arg(long, default_value_t = PartitionConfig::default().depth_threshold)]
    depth_threshold: u32,

    /// Indent the written JSON
    #[arg(long)]
    pretty: bool,

    /// Layout of the source document
    #[arg(long, value_enum, default_value = "auto")]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Auto,
    Tree,
    Nested,
    Adjacency,
}

impl From<Format> for SourceFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Auto => Self::Auto,
            Format::Tree => Self::Tree,
            Format::Nested => Self::Nested,
            Format::Adjacency => Self::Adjacency,
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    tracing::info!(input = %cli.input.display(), bytes = bytes.len(), "loaded source");

    let tree = SourceTree::parse(&bytes, cli.format.into())
        .with_context(|| format!("parsing {}", cli.input.display()))?;
    let config = PartitionConfig {
        chunk_size_budget: cli.budget,
        depth_threshold: cli.depth_threshold,
    };
    let result = partition(&tree, config).context("partitioning")?;
    for warning in &result.report.warnings {
        tracing::warn!("{warning}");
    }
    write_partition(&cli.output, &result, cli.pretty)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    tracing::info!(
        total_nodes = result.manifest.total_nodes,
        chunks = result.manifest.total_chunks,
        largest_chunk = result.report.largest_chunk,
        skeleton_nodes = result.report.skeleton_nodes,
        output = %cli.output.display(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
