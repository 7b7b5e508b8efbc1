// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, RuntimeError};

/// Prefix of environment variables read by [`RuntimeConfig::load_from_env`]
pub const ENV_PREFIX: &str = "SPACEY_CHUNKS_";

/// Which chunk loading backend a runtime uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Chunks are fetched and executed on demand through a host
    #[default]
    Dynamic,
    /// Every chunk is linked in ahead of time; loading is an error
    Static,
}

/// Configuration for a chunk runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Output path of the chunk holding the runtime itself; chunk paths are
    /// resolved relative to its directory
    pub runtime_chunk_path: String,

    /// Suffix of chunks the dynamic backend executes
    pub executable_extension: String,

    /// Chunk loading backend
    pub backend: BackendKind,

    /// Variables exposed through `process.env`
    pub env: BTreeMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            runtime_chunk_path: "runtime.js".to_string(),
            executable_extension: ".js".to_string(),
            backend: BackendKind::Dynamic,
            env: BTreeMap::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.load_from_env();
        Ok(config)
    }

    /// Parse configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON text; missing fields take defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply `SPACEY_CHUNKS_*` environment variables.
    pub fn load_from_env(&mut self) {
        let vars: Vec<(String, String)> = std::env::vars().collect();
        self.apply_env(vars);
    }

    fn apply_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                // SPACEY_CHUNKS_ENV_<NAME> keeps NAME as written
                let config_key = match config_key.strip_prefix("ENV_") {
                    Some(name) => format!("env.{}", name),
                    None => config_key.to_lowercase().replace('_', "-"),
                };
                if let Err(err) = self.set(&config_key, &value) {
                    tracing::warn!("Ignoring {}: {}", key, err);
                }
            }
        }
    }

    /// Set a configuration value.
    ///
    /// Keys of the form `env.NAME` populate the `process.env` stub.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "runtime-chunk-path" => self.runtime_chunk_path = value.to_string(),
            "executable-extension" => {
                self.executable_extension = if value.starts_with('.') {
                    value.to_string()
                } else {
                    format!(".{}", value)
                }
            }
            "backend" => {
                self.backend = match value {
                    "dynamic" => BackendKind::Dynamic,
                    "static" => BackendKind::Static,
                    other => {
                        return Err(RuntimeError::Config(format!(
                            "unknown backend '{}'",
                            other
                        )));
                    }
                }
            }
            _ => match key.strip_prefix("env.") {
                Some(name) if !name.is_empty() => {
                    self.env.insert(name.to_string(), value.to_string());
                }
                _ => {
                    return Err(RuntimeError::Config(format!("unknown key '{}'", key)));
                }
            },
        }
        Ok(())
    }

    /// Directory of the runtime chunk, the base for chunk resolution
    pub fn runtime_chunk_dir(&self) -> PathBuf {
        Path::new(&self.runtime_chunk_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Whether the dynamic backend may execute `chunk_path`
    pub fn is_executable(&self, chunk_path: &str) -> bool {
        chunk_path.ends_with(&self.executable_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.backend, BackendKind::Dynamic);
        assert!(config.is_executable("chunks/a.js"));
        assert!(!config.is_executable("chunks/a.css"));
        assert_eq!(config.runtime_chunk_dir(), PathBuf::new());
    }

    #[test]
    fn test_from_json_partial() {
        let config = RuntimeConfig::from_json(
            r#"{ "runtime_chunk_path": "server/chunks/runtime.js", "backend": "static" }"#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Static);
        assert_eq!(config.runtime_chunk_dir(), PathBuf::from("server/chunks"));
        assert_eq!(config.executable_extension, ".js");
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "env": {{ "NODE_ENV": "test" }} }}"#).unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.env.get("NODE_ENV").map(String::as_str), Some("test"));
    }

    #[test]
    fn test_set() {
        let mut config = RuntimeConfig::default();
        config.set("executable-extension", "mjs").unwrap();
        config.set("backend", "static").unwrap();
        config.set("env.API_URL", "http://localhost").unwrap();

        assert!(config.is_executable("a.mjs"));
        assert_eq!(config.backend, BackendKind::Static);
        assert_eq!(config.env["API_URL"], "http://localhost");
        assert!(config.set("backend", "wasm").is_err());
        assert!(config.set("nonsense", "1").is_err());
    }

    #[test]
    fn test_apply_env() {
        let mut config = RuntimeConfig::default();
        config.apply_env(vec![
            ("SPACEY_CHUNKS_BACKEND".to_string(), "static".to_string()),
            (
                "SPACEY_CHUNKS_RUNTIME_CHUNK_PATH".to_string(),
                "out/runtime.js".to_string(),
            ),
            ("SPACEY_CHUNKS_ENV_NODE_ENV".to_string(), "production".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);

        assert_eq!(config.backend, BackendKind::Static);
        assert_eq!(config.runtime_chunk_path, "out/runtime.js");
        assert_eq!(config.env.get("NODE_ENV").map(String::as_str), Some("production"));
        assert_eq!(config.env.len(), 1);
    }
}
