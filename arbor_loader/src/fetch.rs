// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transport capability the loader is given at construction.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

/// Why a transport could not produce a document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No document with that name.
    #[error("not found: {0}")]
    NotFound(String),
    /// The name is not a plain file name.
    #[error("invalid document name: {0:?}")]
    InvalidName(String),
    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Fetches named documents (the manifest, the root skeleton, chunk files).
///
/// Names are plain file names relative to the partition's location.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Return the bytes of the document called `name`.
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, FetchError>;
}

fn check_name(name: &str) -> Result<(), FetchError> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');
    if plain {
        Ok(())
    } else {
        Err(FetchError::InvalidName(name.to_owned()))
    }
}

/// Reads documents from a partition directory.
#[derive(Clone, Debug)]
pub struct FsFetch {
    root: PathBuf,
}

impl FsFetch {
    /// Serve files from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Fetch for FsFetch {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, FetchError> {
        check_name(name)?;
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(name.to_owned()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Serves documents held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetch {
    docs: HashMap<String, Vec<u8>>,
}

impl MemoryFetch {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.docs.insert(name.into(), bytes);
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl FromIterator<(String, Vec<u8>)> for MemoryFetch {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        Self {
            docs: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Fetch for MemoryFetch {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, FetchError> {
        check_name(name)?;
        self.docs
            .get(name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(name.to_owned()))
    }
}
