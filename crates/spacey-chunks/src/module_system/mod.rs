// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module system
//!
//! Instantiates modules from registered factories and links CommonJS and
//! ESM access to the same exports.
//!
//! ## Records
//! - one record per module id, created on first request
//! - inserted before its factory runs, so circular requires see it
//! - removed only by explicit invalidation
//!
//! ## Interop
//! - `require()` returns raw exports
//! - `import()` returns an ESM namespace, synthesizing `default` for
//!   CommonJS modules
//! - export declarations are live getter bindings

mod cache;
mod context;
pub mod interop;
mod loader;
mod record;

pub use cache::ModuleCache;
pub use context::{ProcessStub, RuntimeContext};
pub use interop::ExportGetters;
pub use loader::{ModuleFactory, ModuleLoader};
pub use record::{ChunkPath, Module, ModuleId, ModuleRecord, SourceInfo};
