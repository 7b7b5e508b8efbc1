// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The chunk runtime and its registrar

use crate::backend::{DynamicBackend, RuntimeBackend, StaticBackend};
use crate::config::{BackendKind, RuntimeConfig};
use crate::error::{Result, RuntimeError};
use crate::host::ChunkHost;
use crate::module_system::{
    ChunkPath, Module, ModuleCache, ModuleFactory, ModuleId, ModuleLoader, ProcessStub,
    SourceInfo,
};
use crate::runtime::registration::{ChunkIndex, ChunkRegistration};
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// A module runtime over a set of registered chunks.
///
/// Owns the module cache, the factory registry and the chunk loading
/// backend. Every module factory receives a context borrowing this runtime,
/// so separate runtimes share nothing.
pub struct ChunkRuntime {
    config: RuntimeConfig,
    loader: ModuleLoader,
    chunks: ChunkIndex,
    backend: Box<dyn RuntimeBackend>,
    process: ProcessStub,
}

impl ChunkRuntime {
    /// Create a runtime with an explicit backend
    pub fn new(config: RuntimeConfig, backend: impl RuntimeBackend + 'static) -> Self {
        let process = ProcessStub::new(config.env.clone());
        Self {
            config,
            loader: ModuleLoader::new(),
            chunks: ChunkIndex::new(),
            backend: Box::new(backend),
            process,
        }
    }

    /// Create a runtime loading chunks through `host`
    pub fn dynamic(config: RuntimeConfig, host: Arc<dyn ChunkHost>) -> Self {
        Self::new(config, DynamicBackend::new(host))
    }

    /// Create a runtime that never loads chunks
    pub fn static_linked(config: RuntimeConfig) -> Self {
        Self::new(config, StaticBackend::new())
    }

    /// Create a runtime with the backend `config` selects
    pub fn from_config(config: RuntimeConfig, host: Option<Arc<dyn ChunkHost>>) -> Result<Self> {
        match (config.backend, host) {
            (BackendKind::Dynamic, Some(host)) => Ok(Self::dynamic(config, host)),
            (BackendKind::Dynamic, None) => Err(RuntimeError::Config(
                "the dynamic backend needs a chunk host".to_string(),
            )),
            (BackendKind::Static, _) => Ok(Self::static_linked(config)),
        }
    }

    /// The runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Name of the active backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// The module cache
    pub fn cache(&self) -> &ModuleCache {
        self.loader.cache()
    }

    /// The `process` stub handed to modules
    pub fn process(&self) -> &ProcessStub {
        &self.process
    }

    /// Registers a chunk and evaluates it according to its params.
    ///
    /// Factories are recorded first (an id keeps the first factory ever
    /// registered for it), then the backend takes over. Failures are logged
    /// with the chunk path and returned.
    pub fn register_chunk(&self, registration: ChunkRegistration) -> Result<Option<Value>> {
        let ChunkRegistration {
            chunk_path,
            modules,
            params,
        } = registration;

        debug!("Registering chunk {} ({} modules)", chunk_path, modules.len());
        self.register_modules(&chunk_path, modules);

        self.backend
            .register_chunk(self, &chunk_path, params.as_ref())
            .inspect_err(|err| {
                error!("Failed to register chunk {}: {}", chunk_path, err);
            })
    }

    /// Push-style registration used by chunks as they execute.
    ///
    /// Errors are logged, not returned, so one failing chunk does not stop
    /// the ones registered after it.
    pub fn push_chunk(&self, registration: ChunkRegistration) -> Option<Value> {
        self.register_chunk(registration).ok().flatten()
    }

    /// Registers chunks that were queued before the runtime existed, in order
    pub fn push_all(&self, registrations: impl IntoIterator<Item = ChunkRegistration>) {
        for registration in registrations {
            self.push_chunk(registration);
        }
    }

    /// Makes the factories of a chunk available without evaluating anything
    pub fn register_modules(&self, chunk_path: &str, modules: Vec<(ModuleId, ModuleFactory)>) {
        self.chunks.add_chunk(chunk_path);
        for (id, factory) in modules {
            self.chunks.add_module_to_chunk(&id, chunk_path);
            if !self.loader.register_factory(id.clone(), factory) {
                debug!("Module {} already registered, keeping first factory", id);
            }
        }
    }

    /// Loads a chunk unless it already registered
    pub fn load_chunk(&self, chunk_path: &str, source: SourceInfo) -> Result<()> {
        if self.chunks.is_registered(chunk_path) {
            return Ok(());
        }
        self.backend.load_chunk(self, chunk_path, &source)
    }

    /// Returns the module for `id`, instantiating it on first request
    pub fn get_or_instantiate(&self, id: &str, source: SourceInfo) -> Result<Module> {
        self.loader.get_or_instantiate(self, id, source)
    }

    /// Instantiates `id` as a runtime entry of `chunk_path`
    pub fn instantiate_runtime_module(&self, id: &str, chunk_path: &str) -> Result<Module> {
        self.get_or_instantiate(id, SourceInfo::runtime(chunk_path))
    }

    /// The cached module for `id`, without instantiating it
    pub fn module(&self, id: &str) -> Option<Module> {
        self.loader.cache().get(id)
    }

    /// Drops the record for `id` so the next reference re-runs its factory
    pub fn invalidate(&self, id: &str) -> Option<Module> {
        self.loader.invalidate(id)
    }

    /// Whether `id` has a registered factory
    pub fn has_factory(&self, id: &str) -> bool {
        self.loader.has_factory(id)
    }

    /// Whether `id` was instantiated as some chunk's runtime entry
    pub fn is_runtime_module(&self, id: &str) -> bool {
        self.loader.is_runtime_module(id)
    }

    /// Whether a registration for `chunk_path` has been seen
    pub fn is_chunk_registered(&self, chunk_path: &str) -> bool {
        self.chunks.is_registered(chunk_path)
    }

    /// The first chunk that registered `id`
    pub fn first_module_chunk(&self, id: &str) -> Option<ChunkPath> {
        self.chunks.first_module_chunk(id)
    }

    /// Modules registered by `chunk_path`
    pub fn chunk_modules(&self, chunk_path: &str) -> Vec<ModuleId> {
        self.chunks.chunk_modules(chunk_path)
    }
}
