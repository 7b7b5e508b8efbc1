// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module record cache

use crate::module_system::record::{Module, ModuleId};
use dashmap::DashMap;

/// Cache of every module record instantiated by a runtime.
///
/// Lookups hand out cloned [`Module`] handles so no map guard outlives the
/// call; factories may re-enter the cache while their own record is stored.
pub struct ModuleCache {
    /// Cache mapping module ids to records
    cache: DashMap<ModuleId, Module>,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Get a cached module by id
    pub fn get(&self, id: &str) -> Option<Module> {
        self.cache.get(id).map(|entry| entry.value().clone())
    }

    /// Check if a module is cached
    pub fn has(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    /// Add a module to the cache
    pub(crate) fn set(&self, id: ModuleId, module: Module) {
        self.cache.insert(id, module);
    }

    /// Remove a module so the next reference re-runs its factory
    pub fn delete(&self, id: &str) -> Option<Module> {
        self.cache.remove(id).map(|(_, module)| module)
    }

    /// Get all cached module ids
    pub fn keys(&self) -> Vec<ModuleId> {
        self.cache.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new()
    }
}
