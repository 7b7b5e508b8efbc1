// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Chunk runtime
//!
//! Chunks announce themselves by pushing a [`ChunkRegistration`]. The
//! runtime records their factories, then lets the backend evaluate the
//! chunk's runtime params: dependency chunks first, then eager entries, then
//! the optional CommonJS re-export.

mod chunk_runtime;
mod registration;

pub use chunk_runtime::ChunkRuntime;
pub use registration::{ChunkIndex, ChunkRegistration, RuntimeParams};
