// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Chunk loading backends
//!
//! A runtime picks one backend when it is built:
//! - [`DynamicBackend`] fetches and executes chunks through a
//!   [`ChunkHost`](crate::host::ChunkHost)
//! - [`StaticBackend`] refuses to load anything, for programs whose chunks
//!   are all linked in ahead of time

mod dynamic;
mod static_linked;

pub use dynamic::DynamicBackend;
pub use static_linked::StaticBackend;

use crate::error::Result;
use crate::module_system::SourceInfo;
use crate::runtime::{ChunkRuntime, RuntimeParams};
use crate::value::Value;

/// Strategy for physically loading chunks
pub trait RuntimeBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Evaluates a freshly registered chunk according to its params.
    ///
    /// Returns the chunk's exported value when the params name one.
    fn register_chunk(
        &self,
        runtime: &ChunkRuntime,
        chunk_path: &str,
        params: Option<&RuntimeParams>,
    ) -> Result<Option<Value>>;

    /// Fetches and executes a chunk, which registers itself as a side effect
    fn load_chunk(&self, runtime: &ChunkRuntime, chunk_path: &str, source: &SourceInfo)
    -> Result<()>;
}
