// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-chunks
//!
//! A module runtime for bundler output split into chunks.
//!
//! Each chunk carries a set of module factories and, when it is an entry
//! point, runtime params naming what to evaluate. This crate provides:
//!
//! - At-most-once module instantiation with a shared module cache
//! - CommonJS `require()` and ESM `import()` over the same exports,
//!   including `default` interop for CommonJS modules
//! - Live ESM export bindings
//! - A dynamic backend that loads chunks through a [`ChunkHost`], and a
//!   static backend for programs with every chunk linked in
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spacey_chunks::{ChunkRegistration, ChunkRuntime, MemoryHost, RuntimeConfig, RuntimeParams};
//! use std::sync::Arc;
//!
//! let runtime = ChunkRuntime::dynamic(RuntimeConfig::default(), Arc::new(MemoryHost::new()));
//! let exports = runtime.register_chunk(
//!     ChunkRegistration::new("a.js")
//!         .module("m1", |ctx| {
//!             ctx.export_value(42);
//!             Ok(())
//!         })
//!         .params(RuntimeParams::new().exported_cjs_module("m1")),
//! )?;
//! assert_eq!(exports, Some(42.into()));
//! ```
//!
//! ## Configuration
//!
//! [`RuntimeConfig`] is read from JSON and `SPACEY_CHUNKS_*` environment
//! variables:
//!
//! ```bash
//! SPACEY_CHUNKS_BACKEND=static
//! SPACEY_CHUNKS_RUNTIME_CHUNK_PATH=server/chunks/runtime.js
//! SPACEY_CHUNKS_ENV_NODE_ENV=production   # process.env.NODE_ENV
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod host;
pub mod module_system;
pub mod runtime;
pub mod value;

// Re-exports
pub use backend::{DynamicBackend, RuntimeBackend, StaticBackend};
pub use config::{BackendKind, RuntimeConfig};
pub use error::{Result, RuntimeError};
pub use host::{ChunkHost, FsHost, MemoryHost};
pub use module_system::{Module, ModuleFactory, ModuleId, RuntimeContext, SourceInfo};
pub use runtime::{ChunkRegistration, ChunkRuntime, RuntimeParams};
pub use value::{Function, ObjectRef, Value};

/// Version of the spacey-chunks runtime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
