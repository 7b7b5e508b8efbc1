// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The capability object handed to every module factory

use crate::error::Result;
use crate::module_system::cache::ModuleCache;
use crate::module_system::interop::{self, ExportGetters};
use crate::module_system::record::{Module, SourceInfo};
use crate::runtime::ChunkRuntime;
use crate::value::{Getter, Value};
use std::collections::BTreeMap;

/// Minimal `process` stand-in exposed to modules
#[derive(Debug, Clone, Default)]
pub struct ProcessStub {
    env: BTreeMap<String, String>,
}

impl ProcessStub {
    /// Create a process stub with the given environment
    pub fn new(env: BTreeMap<String, String>) -> Self {
        Self { env }
    }

    /// Look up an environment variable
    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }
}

/// Everything a module factory may rely on.
///
/// Bound to one module record; requests made through it are recorded as
/// edges from that module.
pub struct RuntimeContext<'a> {
    runtime: &'a ChunkRuntime,
    module: Module,
    exports: Value,
}

impl<'a> RuntimeContext<'a> {
    pub(crate) fn new(runtime: &'a ChunkRuntime, module: Module) -> Self {
        let exports = module.exports();
        Self {
            runtime,
            module,
            exports,
        }
    }

    /// The exports object the module started with
    pub fn exports(&self) -> &Value {
        &self.exports
    }

    /// CommonJS `require`
    pub fn require(&self, id: &str) -> Result<Value> {
        interop::commonjs_require(self.runtime, &self.module, id)
    }

    /// ESM `import`
    pub fn import(&self, id: &str, allow_export_default: bool) -> Result<Value> {
        interop::esm_import(self.runtime, &self.module, id, allow_export_default)
    }

    /// Declares named exports backed by getters
    pub fn export<K, I>(&self, getters: I) -> Result<()>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Getter)>,
    {
        let getters: ExportGetters = getters
            .into_iter()
            .map(|(key, getter)| (key.into(), getter))
            .collect();
        interop::esm_export(&self.module, getters)
    }

    /// Replaces the module's exports with a single value
    pub fn export_value(&self, value: impl Into<Value>) {
        interop::export_value(&self.module, value.into());
    }

    /// The module's own record
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The runtime's whole module cache
    pub fn cache(&self) -> &ModuleCache {
        self.runtime.cache()
    }

    /// Loads a chunk on behalf of this module
    pub fn load_chunk(&self, chunk_path: &str) -> Result<()> {
        self.runtime
            .load_chunk(chunk_path, SourceInfo::parent(self.module.id()))
    }

    /// The `process` stub
    pub fn process(&self) -> &ProcessStub {
        self.runtime.process()
    }
}
