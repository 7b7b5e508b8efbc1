// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Backend for programs with every chunk linked in

use super::RuntimeBackend;
use crate::error::{Result, RuntimeError};
use crate::module_system::SourceInfo;
use crate::runtime::{ChunkRuntime, RuntimeParams};
use crate::value::Value;

/// Fails every load and registration.
///
/// Reaching it means the build expected runtime chunk loading that this
/// host cannot do.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticBackend;

impl StaticBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl RuntimeBackend for StaticBackend {
    fn name(&self) -> &'static str {
        "static"
    }

    fn register_chunk(
        &self,
        _runtime: &ChunkRuntime,
        _chunk_path: &str,
        _params: Option<&RuntimeParams>,
    ) -> Result<Option<Value>> {
        Err(RuntimeError::ChunkLoadUnsupported)
    }

    fn load_chunk(
        &self,
        _runtime: &ChunkRuntime,
        _chunk_path: &str,
        _source: &SourceInfo,
    ) -> Result<()> {
        Err(RuntimeError::ChunkLoadUnsupported)
    }
}
