// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host-backed dynamic chunk loading

use super::RuntimeBackend;
use crate::error::Result;
use crate::host::{ChunkHost, resolver};
use crate::module_system::SourceInfo;
use crate::runtime::{ChunkRuntime, RuntimeParams};
use crate::value::Value;
use std::sync::Arc;
use tracing::debug;

/// Loads chunks on demand through a [`ChunkHost`].
///
/// Chunk requests are made relative to the directory of the runtime chunk
/// named by the runtime's config.
pub struct DynamicBackend {
    host: Arc<dyn ChunkHost>,
}

impl DynamicBackend {
    /// Create a backend executing chunks through `host`
    pub fn new(host: Arc<dyn ChunkHost>) -> Self {
        Self { host }
    }

    /// Resolves, invalidates and executes one chunk.
    ///
    /// Every call re-executes the chunk so updated contents are picked up.
    fn load(&self, runtime: &ChunkRuntime, chunk_path: &str) -> Result<()> {
        let config = runtime.config();
        if !config.is_executable(chunk_path) {
            // e.g. stylesheet chunks, nothing to execute
            debug!("Skipping non-executable chunk {}", chunk_path);
            return Ok(());
        }

        let runtime_chunk_dir = config.runtime_chunk_dir();
        let request = resolver::relative(&runtime_chunk_dir, chunk_path);
        let resolved = self.host.resolve(&runtime_chunk_dir, &request)?;
        self.host.invalidate(&resolved);

        debug!("Loading chunk {} from {}", chunk_path, resolved.display());
        self.host.execute(&resolved, runtime)
    }
}

impl RuntimeBackend for DynamicBackend {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    fn register_chunk(
        &self,
        runtime: &ChunkRuntime,
        chunk_path: &str,
        params: Option<&RuntimeParams>,
    ) -> Result<Option<Value>> {
        let Some(params) = params else {
            return Ok(None);
        };

        if params.has_entries() {
            for other_chunk_path in &params.other_chunks {
                self.load(runtime, other_chunk_path)?;
            }
        }

        for module_id in &params.runtime_module_ids {
            runtime.instantiate_runtime_module(module_id, chunk_path)?;
        }

        match &params.exported_cjs_module_id {
            Some(module_id) => {
                let module = runtime.instantiate_runtime_module(module_id, chunk_path)?;
                Ok(Some(module.exports()))
            }
            None => Ok(None),
        }
    }

    fn load_chunk(&self, runtime: &ChunkRuntime, chunk_path: &str, source: &SourceInfo) -> Result<()> {
        debug!("Chunk {} requested {}", chunk_path, source.reason());
        self.load(runtime, chunk_path)
    }
}
