// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Filesystem chunk host

use super::ChunkHost;
use crate::error::{Result, RuntimeError};
use crate::runtime::ChunkRuntime;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Runs the source text of a chunk read from disk
pub type ChunkExecutor = Arc<dyn Fn(&Path, &str, &ChunkRuntime) -> Result<()> + Send + Sync>;

/// Host reading chunks from an output directory.
///
/// Reading and caching the artifact is done here; running it is delegated to
/// the executor, which is expected to push the chunk's registration.
pub struct FsHost {
    /// Output directory the runtime chunk path is relative to
    root: PathBuf,
    executor: ChunkExecutor,
    /// Source text by canonical path
    artifacts: DashMap<PathBuf, Arc<str>>,
}

impl FsHost {
    /// Create a host rooted at `root`
    pub fn new(
        root: impl Into<PathBuf>,
        executor: impl Fn(&Path, &str, &ChunkRuntime) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            root: root.into(),
            executor: Arc::new(executor),
            artifacts: DashMap::new(),
        }
    }

    /// Whether the artifact at `resolved` is cached
    pub fn is_cached(&self, resolved: &Path) -> bool {
        self.artifacts.contains_key(resolved)
    }

    fn read(&self, resolved: &Path) -> Result<Arc<str>> {
        if let Some(source) = self.artifacts.get(resolved) {
            return Ok(Arc::clone(source.value()));
        }

        let source: Arc<str> = std::fs::read_to_string(resolved)?.into();
        debug!("Read chunk {} ({} bytes)", resolved.display(), source.len());
        self.artifacts
            .insert(resolved.to_path_buf(), Arc::clone(&source));
        Ok(source)
    }
}

impl ChunkHost for FsHost {
    fn resolve(&self, base_dir: &Path, request: &Path) -> Result<PathBuf> {
        let candidate = self.root.join(base_dir).join(request);
        candidate.canonicalize().map_err(|err| {
            RuntimeError::chunk_load(
                request.display().to_string(),
                format!("cannot resolve {}: {}", candidate.display(), err),
            )
        })
    }

    fn invalidate(&self, resolved: &Path) {
        self.artifacts.remove(resolved);
    }

    fn execute(&self, resolved: &Path, runtime: &ChunkRuntime) -> Result<()> {
        let source = self.read(resolved)?;
        (self.executor)(resolved, &source, runtime)
    }
}
