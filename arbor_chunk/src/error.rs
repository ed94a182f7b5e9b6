// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decode-time errors.

/// A document that does not conform to the node, chunk or manifest format.
///
/// Every variant that concerns a specific node carries the JSON path of that
/// node (for example `$.children[3]`). The error is `Clone` so a single decode
/// failure can be handed to every task waiting on the same chunk.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The bytes are not valid JSON, or do not match the expected document shape.
    #[error("invalid JSON: {0}")]
    Json(String),
    /// A node is not a JSON object.
    #[error("{path}: expected a node object")]
    NotAnObject {
        /// JSON path of the offending value.
        path: String,
    },
    /// A node has no string `name`.
    #[error("{path}: missing string field `name`")]
    MissingName {
        /// JSON path of the offending node.
        path: String,
    },
    /// `children` is present but is not an array.
    #[error("{path}: `children` must be an array")]
    ChildrenNotArray {
        /// JSON path of the offending node.
        path: String,
    },
    /// A typed field holds a value of the wrong type or range.
    #[error("{path}: invalid `{field}`: {reason}")]
    InvalidField {
        /// JSON path of the offending node.
        path: String,
        /// Field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// The stub invariant (`isStub` iff no children and a `chunkRef`) does not hold.
    #[error("{path}: {reason}")]
    StubInvariant {
        /// JSON path of the offending node.
        path: String,
        /// Which half of the invariant failed.
        reason: &'static str,
    },
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
