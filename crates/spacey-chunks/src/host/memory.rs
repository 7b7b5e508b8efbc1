// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! In-memory chunk host

use super::{ChunkHost, resolver};
use crate::error::{Result, RuntimeError};
use crate::runtime::{ChunkRegistration, ChunkRuntime};
use dashmap::{DashMap, DashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What executing an in-memory chunk does
pub type ChunkProgram = Arc<dyn Fn(&ChunkRuntime) -> Result<()> + Send + Sync>;

/// Host serving chunk programs from memory, keyed by normalized path.
///
/// Keeps per-chunk execution and invalidation counters for inspection.
#[derive(Default)]
pub struct MemoryHost {
    programs: DashMap<PathBuf, ChunkProgram>,
    resident: DashSet<PathBuf>,
    executions: DashMap<PathBuf, usize>,
    invalidations: DashMap<PathBuf, usize>,
}

impl MemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `program` at `path`, replacing any previous program
    pub fn insert(
        &self,
        path: impl AsRef<Path>,
        program: impl Fn(&ChunkRuntime) -> Result<()> + Send + Sync + 'static,
    ) {
        let program: ChunkProgram = Arc::new(program);
        self.programs
            .insert(resolver::normalize(path.as_ref()), program);
    }

    /// Serves a chunk whose execution pushes the registration built by `make`
    pub fn insert_registration(
        &self,
        path: impl AsRef<Path>,
        make: impl Fn() -> ChunkRegistration + Send + Sync + 'static,
    ) {
        self.insert(path, move |runtime| {
            runtime.push_chunk(make());
            Ok(())
        });
    }

    /// How many times the chunk at `path` was executed
    pub fn execution_count(&self, path: impl AsRef<Path>) -> usize {
        let key = resolver::normalize(path.as_ref());
        self.executions.get(&key).map(|n| *n).unwrap_or(0)
    }

    /// How many times the cache entry for `path` was invalidated
    pub fn invalidation_count(&self, path: impl AsRef<Path>) -> usize {
        let key = resolver::normalize(path.as_ref());
        self.invalidations.get(&key).map(|n| *n).unwrap_or(0)
    }

    /// Whether the chunk at `path` is currently cached as executed
    pub fn is_resident(&self, path: impl AsRef<Path>) -> bool {
        self.resident.contains(&resolver::normalize(path.as_ref()))
    }
}

impl ChunkHost for MemoryHost {
    fn resolve(&self, base_dir: &Path, request: &Path) -> Result<PathBuf> {
        let resolved = resolver::normalize(&base_dir.join(request));
        if self.programs.contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(RuntimeError::chunk_load(
                request.display().to_string(),
                format!("no chunk at {}", resolved.display()),
            ))
        }
    }

    fn invalidate(&self, resolved: &Path) {
        self.resident.remove(resolved);
        *self.invalidations.entry(resolved.to_path_buf()).or_insert(0) += 1;
    }

    fn execute(&self, resolved: &Path, runtime: &ChunkRuntime) -> Result<()> {
        let program = self
            .programs
            .get(resolved)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                RuntimeError::chunk_load(resolved.display().to_string(), "no such chunk")
            })?;

        self.resident.insert(resolved.to_path_buf());
        *self.executions.entry(resolved.to_path_buf()).or_insert(0) += 1;
        program(runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_normalizes() {
        let host = MemoryHost::new();
        host.insert("server/b.js", |_| Ok(()));

        let resolved = host
            .resolve(Path::new("server/chunks"), Path::new("../b.js"))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("server/b.js"));
    }

    #[test]
    fn test_resolve_missing_chunk() {
        let host = MemoryHost::new();
        let err = host
            .resolve(Path::new(""), Path::new("missing.js"))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ChunkLoad { .. }));
    }

    #[test]
    fn test_invalidate_drops_residency() {
        let host = MemoryHost::new();
        host.insert("a.js", |_| Ok(()));
        host.resident.insert(PathBuf::from("a.js"));

        host.invalidate(Path::new("a.js"));
        assert!(!host.is_resident("a.js"));
        assert_eq!(host.invalidation_count("a.js"), 1);
        assert_eq!(host.execution_count("a.js"), 0);
    }
}
