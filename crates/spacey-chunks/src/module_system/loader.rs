// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - looks up factories and instantiates modules

use crate::error::{Result, RuntimeError};
use crate::module_system::cache::ModuleCache;
use crate::module_system::context::RuntimeContext;
use crate::module_system::interop;
use crate::module_system::record::{Module, ModuleId, SourceInfo};
use crate::runtime::ChunkRuntime;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use tracing::debug;

/// A module's executable definition
pub type ModuleFactory = Arc<dyn Fn(&RuntimeContext<'_>) -> Result<()> + Send + Sync>;

/// Module loader
pub struct ModuleLoader {
    /// Factories by module id, first registration wins
    factories: DashMap<ModuleId, ModuleFactory>,
    /// Module cache
    cache: ModuleCache,
    /// Modules instantiated as runtime entries of a chunk
    runtime_modules: DashSet<ModuleId>,
}

impl ModuleLoader {
    /// Create a new module loader
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
            cache: ModuleCache::new(),
            runtime_modules: DashSet::new(),
        }
    }

    /// Makes a factory available. Returns false if `id` already had one.
    pub fn register_factory(&self, id: ModuleId, factory: ModuleFactory) -> bool {
        match self.factories.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(factory);
                true
            }
        }
    }

    /// Check if a factory is available for `id`
    pub fn has_factory(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Returns the cached module for `id`, instantiating it first if needed.
    ///
    /// A cached module is returned as-is, even while its factory is still
    /// running; this is what lets circular requires terminate. A module whose
    /// factory failed keeps failing with the same error.
    pub fn get_or_instantiate(
        &self,
        runtime: &ChunkRuntime,
        id: &str,
        source: SourceInfo,
    ) -> Result<Module> {
        if let SourceInfo::Parent { parent_id } = &source {
            if let Some(parent) = self.cache.get(parent_id) {
                parent.add_child(id);
            }
        }

        if let Some(module) = self.cache.get(id) {
            if let SourceInfo::Parent { parent_id } = &source {
                module.add_parent(parent_id);
            }
            if let Some(error) = module.error() {
                return Err(RuntimeError::FactoryExecution {
                    module_id: id.to_string(),
                    source: error,
                });
            }
            return Ok(module);
        }

        self.instantiate(runtime, id, source)
    }

    /// Runs the factory for `id` against a fresh record
    fn instantiate(&self, runtime: &ChunkRuntime, id: &str, source: SourceInfo) -> Result<Module> {
        let factory = self
            .factories
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RuntimeError::module_not_found(id, source.reason()))?;

        debug!("Instantiating module {} {}", id, source.reason());

        let parents = match source {
            SourceInfo::Runtime { .. } => {
                self.runtime_modules.insert(id.to_string());
                Vec::new()
            }
            SourceInfo::Parent { parent_id } => vec![parent_id],
        };

        // Stored before the factory runs so re-entrant requests find it
        let module = Module::new(id, parents);
        self.cache.set(id.to_string(), module.clone());

        let context = RuntimeContext::new(runtime, module.clone());
        if let Err(err) = factory(&context) {
            let err = Arc::new(err);
            module.write().error = Some(Arc::clone(&err));
            return Err(RuntimeError::FactoryExecution {
                module_id: id.to_string(),
                source: err,
            });
        }

        interop::sync_namespace_object(&module);
        module.write().loaded = true;
        Ok(module)
    }

    /// Drops the record for `id` so the next reference re-runs its factory
    pub fn invalidate(&self, id: &str) -> Option<Module> {
        self.runtime_modules.remove(id);
        let removed = self.cache.delete(id);
        if removed.is_some() {
            debug!("Invalidated module {}", id);
        }
        removed
    }

    /// Whether `id` was instantiated as a chunk's runtime entry
    pub fn is_runtime_module(&self, id: &str) -> bool {
        self.runtime_modules.contains(id)
    }

    /// Get the module cache
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}
