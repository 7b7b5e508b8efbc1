// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Chunk hosts
//!
//! The dynamic backend never reads chunks itself. It asks a host to resolve
//! a request against the runtime chunk's directory, drop whatever the host
//! cached for that location, and execute it. Executing a chunk pushes its
//! registration back into the runtime.

mod fs;
mod memory;
pub mod resolver;

pub use fs::{ChunkExecutor, FsHost};
pub use memory::{ChunkProgram, MemoryHost};

use crate::error::Result;
use crate::runtime::ChunkRuntime;
use std::path::{Path, PathBuf};

/// Physical chunk fetching and execution
pub trait ChunkHost: Send + Sync {
    /// Resolves `request` (relative to `base_dir`, the runtime chunk's
    /// directory) to a loadable location
    fn resolve(&self, base_dir: &Path, request: &Path) -> Result<PathBuf>;

    /// Drops any cached artifact at `resolved`
    fn invalidate(&self, resolved: &Path);

    /// Executes the chunk at `resolved` once
    fn execute(&self, resolved: &Path, runtime: &ChunkRuntime) -> Result<()>;
}
