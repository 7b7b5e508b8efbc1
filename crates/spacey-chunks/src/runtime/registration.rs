// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Chunk registration events and chunk membership bookkeeping

use crate::error::Result;
use crate::host::resolver;
use crate::module_system::{ChunkPath, ModuleFactory, ModuleId, RuntimeContext};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Runtime parameters a chunk carries when it is an execution entry point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeParams {
    /// Chunks that must be loaded before the entries run
    pub other_chunks: Vec<ChunkPath>,
    /// Modules to instantiate eagerly, in order
    pub runtime_module_ids: Vec<ModuleId>,
    /// Module whose exports become the chunk's own export
    pub exported_cjs_module_id: Option<ModuleId>,
}

impl RuntimeParams {
    /// Empty parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dependency chunk
    pub fn other_chunk(mut self, chunk_path: impl Into<ChunkPath>) -> Self {
        self.other_chunks.push(chunk_path.into());
        self
    }

    /// Adds an eager runtime module
    pub fn runtime_module(mut self, id: impl Into<ModuleId>) -> Self {
        self.runtime_module_ids.push(id.into());
        self
    }

    /// Sets the module re-exported as the chunk's export
    pub fn exported_cjs_module(mut self, id: impl Into<ModuleId>) -> Self {
        self.exported_cjs_module_id = Some(id.into());
        self
    }

    /// Whether registering with these params evaluates anything
    pub fn has_entries(&self) -> bool {
        !self.runtime_module_ids.is_empty() || self.exported_cjs_module_id.is_some()
    }
}

/// One chunk's registration: its path, its module factories in order, and
/// optional runtime parameters
#[derive(Clone)]
pub struct ChunkRegistration {
    /// The chunk's output path
    pub chunk_path: ChunkPath,
    /// Module factories in chunk order
    pub modules: Vec<(ModuleId, ModuleFactory)>,
    /// Present when the chunk is evaluated as an entry
    pub params: Option<RuntimeParams>,
}

impl ChunkRegistration {
    /// A registration with no modules and no params
    pub fn new(chunk_path: impl Into<ChunkPath>) -> Self {
        Self {
            chunk_path: chunk_path.into(),
            modules: Vec::new(),
            params: None,
        }
    }

    /// Adds a module factory
    pub fn module(
        mut self,
        id: impl Into<ModuleId>,
        factory: impl Fn(&RuntimeContext<'_>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        let factory: ModuleFactory = Arc::new(factory);
        self.modules.push((id.into(), factory));
        self
    }

    /// Sets the runtime params
    pub fn params(mut self, params: RuntimeParams) -> Self {
        self.params = Some(params);
        self
    }
}

impl fmt::Debug for ChunkRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkRegistration")
            .field("chunk_path", &self.chunk_path)
            .field(
                "modules",
                &self.modules.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field("params", &self.params)
            .finish()
    }
}

/// Chunk paths are stored normalized, so `./a.js` and `a.js` name one chunk
fn chunk_key(chunk_path: &str) -> ChunkPath {
    resolver::normalize(Path::new(chunk_path))
        .to_string_lossy()
        .into_owned()
}

/// Which chunks registered which modules
#[derive(Default)]
pub struct ChunkIndex {
    module_chunks: DashMap<ModuleId, Vec<ChunkPath>>,
    chunk_modules: DashMap<ChunkPath, Vec<ModuleId>>,
}

impl ChunkIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `chunk_path` registered, even with no modules
    pub fn add_chunk(&self, chunk_path: &str) {
        self.chunk_modules.entry(chunk_key(chunk_path)).or_default();
    }

    /// Records that `chunk_path` contains `id`
    pub fn add_module_to_chunk(&self, id: &str, chunk_path: &str) {
        let chunk_path = chunk_key(chunk_path);
        let mut chunks = self.module_chunks.entry(id.to_string()).or_default();
        if !chunks.iter().any(|c| *c == chunk_path) {
            chunks.push(chunk_path.clone());
        }
        drop(chunks);

        let mut modules = self.chunk_modules.entry(chunk_path).or_default();
        if !modules.iter().any(|m| m == id) {
            modules.push(id.to_string());
        }
    }

    /// Whether a registration for `chunk_path` has been seen
    pub fn is_registered(&self, chunk_path: &str) -> bool {
        self.chunk_modules.contains_key(&chunk_key(chunk_path))
    }

    /// The first chunk that registered `id`
    pub fn first_module_chunk(&self, id: &str) -> Option<ChunkPath> {
        self.module_chunks
            .get(id)
            .and_then(|chunks| chunks.first().cloned())
    }

    /// Every chunk that registered `id`, in registration order
    pub fn module_chunks(&self, id: &str) -> Vec<ChunkPath> {
        self.module_chunks
            .get(id)
            .map(|chunks| chunks.value().clone())
            .unwrap_or_default()
    }

    /// Modules registered by `chunk_path`, in registration order
    pub fn chunk_modules(&self, chunk_path: &str) -> Vec<ModuleId> {
        self.chunk_modules
            .get(&chunk_key(chunk_path))
            .map(|modules| modules.value().clone())
            .unwrap_or_default()
    }
}
