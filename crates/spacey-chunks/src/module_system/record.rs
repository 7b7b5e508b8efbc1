// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records

use crate::error::RuntimeError;
use crate::value::{ObjectRef, Value};
use once_cell::sync::OnceCell;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// Opaque module identifier assigned by the compiler
pub type ModuleId = String;

/// Opaque chunk identifier, the chunk's output path
pub type ChunkPath = String;

/// Why a module was instantiated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInfo {
    /// The module is a runtime entry of an evaluated chunk
    Runtime {
        /// The chunk listing the module as an entry
        chunk_path: ChunkPath,
    },
    /// A parent module imported it
    Parent {
        /// The importing module
        parent_id: ModuleId,
    },
}

impl SourceInfo {
    /// Source for a runtime entry of `chunk_path`
    pub fn runtime(chunk_path: impl Into<ChunkPath>) -> Self {
        SourceInfo::Runtime {
            chunk_path: chunk_path.into(),
        }
    }

    /// Source for a module requested by `parent_id`
    pub fn parent(parent_id: impl Into<ModuleId>) -> Self {
        SourceInfo::Parent {
            parent_id: parent_id.into(),
        }
    }

    /// Human readable reason used in error messages
    pub fn reason(&self) -> String {
        match self {
            SourceInfo::Runtime { chunk_path } => {
                format!("as a runtime entry of chunk {}", chunk_path)
            }
            SourceInfo::Parent { parent_id } => {
                format!("because it was required from module {}", parent_id)
            }
        }
    }
}

/// Mutable state of one module
#[derive(Debug)]
pub struct ModuleRecord {
    /// The module id
    pub id: ModuleId,
    /// The module's exports
    pub exports: Value,
    /// Whether the factory has returned successfully
    pub loaded: bool,
    /// Modules this module requested, in first-request order
    pub children: Vec<ModuleId>,
    /// Modules that requested this module, in first-request order
    pub parents: Vec<ModuleId>,
    /// Exports object that received ESM export declarations
    pub(crate) namespace_object: Option<ObjectRef>,
    /// Failure raised by the factory
    pub(crate) error: Option<Arc<RuntimeError>>,
}

struct ModuleInner {
    record: RwLock<ModuleRecord>,
    interop_namespace: OnceCell<Value>,
}

/// Shared handle to a module record.
///
/// Handles compare by identity: two handles are equal only if they point at
/// the same record instance.
#[derive(Clone)]
pub struct Module(Arc<ModuleInner>);

impl Module {
    pub(crate) fn new(id: impl Into<ModuleId>, parents: Vec<ModuleId>) -> Self {
        Self(Arc::new(ModuleInner {
            record: RwLock::new(ModuleRecord {
                id: id.into(),
                exports: Value::object(),
                loaded: false,
                children: Vec::new(),
                parents,
                namespace_object: None,
                error: None,
            }),
            interop_namespace: OnceCell::new(),
        }))
    }

    /// The module id
    pub fn id(&self) -> ModuleId {
        self.0.record.read().id.clone()
    }

    /// Current exports value
    pub fn exports(&self) -> Value {
        self.0.record.read().exports.clone()
    }

    /// Whether the factory finished without error
    pub fn is_loaded(&self) -> bool {
        self.0.record.read().loaded
    }

    /// Ids of modules this module requested
    pub fn children(&self) -> Vec<ModuleId> {
        self.0.record.read().children.clone()
    }

    /// Ids of modules that requested this module
    pub fn parents(&self) -> Vec<ModuleId> {
        self.0.record.read().parents.clone()
    }

    /// The error the factory failed with, if it did
    pub fn error(&self) -> Option<Arc<RuntimeError>> {
        self.0.record.read().error.clone()
    }

    /// The exports object ESM exports were declared on, if any
    pub fn namespace_object(&self) -> Option<ObjectRef> {
        self.0.record.read().namespace_object.clone()
    }

    /// Read access to the record
    pub fn read(&self) -> RwLockReadGuard<'_, ModuleRecord> {
        self.0.record.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, ModuleRecord> {
        self.0.record.write()
    }

    pub(crate) fn add_child(&self, id: &str) {
        let mut record = self.write();
        if !record.children.iter().any(|child| child == id) {
            record.children.push(id.to_string());
        }
    }

    pub(crate) fn add_parent(&self, id: &str) {
        let mut record = self.write();
        if !record.parents.iter().any(|parent| parent == id) {
            record.parents.push(id.to_string());
        }
    }

    /// The memoized interop namespace, built by `init` on first access
    pub(crate) fn interop_namespace(&self, init: impl FnOnce() -> Value) -> Value {
        self.0.interop_namespace.get_or_init(init).clone()
    }

    /// Whether an interop namespace has been built
    pub fn has_interop_namespace(&self) -> bool {
        self.0.interop_namespace.get().is_some()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.read();
        f.debug_struct("Module")
            .field("id", &record.id)
            .field("loaded", &record.loaded)
            .field("children", &record.children)
            .field("parents", &record.parents)
            .finish()
    }
}
