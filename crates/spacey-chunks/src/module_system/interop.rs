// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS / ESM interop
//!
//! Both request styles reach the same underlying exports:
//! - `require(id)` returns the raw exports value
//! - `import(id)` returns the raw exports when they carry the `__esModule`
//!   marker, otherwise a read-only namespace built once per record whose
//!   getters read through to the raw exports
//!
//! Export declarations install getters, so every later read observes the
//! current value of the binding rather than a snapshot.

use crate::error::{Result, RuntimeError};
use crate::module_system::record::{Module, SourceInfo};
use crate::runtime::ChunkRuntime;
use crate::value::{Getter, ObjectRef, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Named export getters in declaration order
pub type ExportGetters = IndexMap<String, Getter>;

/// Marks `ns` as an ES module and installs `getters` on it.
///
/// Keys `ns` already owns are left untouched.
pub fn esm(ns: &ObjectRef, getters: ExportGetters) {
    ns.mark_es_module();
    for (key, getter) in getters {
        ns.define_getter(key, getter);
    }
}

/// Getter reading `key` from `obj` at call time
pub fn create_getter(obj: &ObjectRef, key: &str) -> Getter {
    let obj = obj.clone();
    let key = key.to_string();
    Arc::new(move || obj.get(&key))
}

/// Populates `ns` with live views of every enumerable key of `raw`.
///
/// A `default` getter returning the whole raw value is added unless
/// `allow_export_default` is set and `raw` already has its own `default`.
pub fn interop_esm(raw: &Value, ns: &ObjectRef, allow_export_default: bool) {
    let mut getters = ExportGetters::new();
    if let Value::Object(obj) = raw {
        for key in obj.keys() {
            let getter = create_getter(obj, &key);
            getters.insert(key, getter);
        }
    }

    if !(allow_export_default && getters.contains_key("default")) {
        let raw = raw.clone();
        getters.insert("default".to_string(), Arc::new(move || raw.clone()));
    }

    esm(ns, getters);
}

/// Declares ESM exports on the module's exports object
pub fn esm_export(module: &Module, getters: ExportGetters) -> Result<()> {
    let exports = module.exports();
    let Some(obj) = exports.as_object().cloned() else {
        return Err(RuntimeError::type_error(format!(
            "Cannot declare exports of module {} on a {} value",
            module.id(),
            exports.type_of()
        )));
    };

    esm(&obj, getters);
    module.write().namespace_object = Some(obj);
    Ok(())
}

/// Replaces the module's exports wholesale
pub fn export_value(module: &Module, value: Value) {
    module.write().exports = value;
}

/// Re-syncs a namespace object after the exports value was replaced.
///
/// Runs once a factory returns; a no-op unless the module both declared ESM
/// exports and later swapped its exports value.
pub(crate) fn sync_namespace_object(module: &Module) {
    let stale = {
        let record = module.read();
        match &record.namespace_object {
            Some(ns) if !record.exports.as_object().is_some_and(|obj| obj.ptr_eq(ns)) => {
                Some((record.exports.clone(), ns.clone()))
            }
            _ => None,
        }
    };

    if let Some((exports, ns)) = stale {
        interop_esm(&exports, &ns, false);
    }
}

/// CommonJS `require`: the raw exports of `id`, instantiated on behalf of
/// `parent`
pub fn commonjs_require(runtime: &ChunkRuntime, parent: &Module, id: &str) -> Result<Value> {
    let module = runtime.get_or_instantiate(id, SourceInfo::parent(parent.id()))?;
    Ok(module.exports())
}

/// ESM `import`: the namespace of `id`, instantiated on behalf of `parent`
pub fn esm_import(
    runtime: &ChunkRuntime,
    parent: &Module,
    id: &str,
    allow_export_default: bool,
) -> Result<Value> {
    let module = runtime.get_or_instantiate(id, SourceInfo::parent(parent.id()))?;
    Ok(namespace_of(&module, allow_export_default))
}

/// The ESM view of an instantiated module
pub fn namespace_of(module: &Module, allow_export_default: bool) -> Value {
    let raw = module.exports();
    if raw.is_es_module() {
        return raw;
    }

    module.interop_namespace(|| {
        let ns = ObjectRef::new();
        interop_esm(&raw, &ns, allow_export_default);
        ns.freeze();
        Value::Object(ns)
    })
}
