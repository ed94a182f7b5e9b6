// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in backends.

mod flatvec;
mod grid;

pub use flatvec::FlatVec;
pub use grid::UniformGrid;
