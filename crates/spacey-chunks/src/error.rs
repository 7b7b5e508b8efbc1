// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the chunk runtime

use std::sync::Arc;
use thiserror::Error;

/// Result type for chunk runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while registering chunks or instantiating modules
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No loaded chunk ever registered a factory for the module
    #[error(
        "Module {id} was instantiated {reason}, but the module factory is not available. \
         It might have been deleted in an HMR update."
    )]
    ModuleNotFound {
        /// Module id
        id: String,
        /// Why instantiation was requested
        reason: String,
    },

    /// The static backend was asked to load or register a chunk
    #[error("chunk loading is not supported")]
    ChunkLoadUnsupported,

    /// A module factory failed while running
    #[error("Error evaluating module {module_id}: {source}")]
    FactoryExecution {
        /// Module whose factory failed
        module_id: String,
        /// The error raised by the factory
        #[source]
        source: Arc<RuntimeError>,
    },

    /// The host could not resolve or execute a chunk
    #[error("Failed to load chunk '{chunk_path}': {reason}")]
    ChunkLoad {
        /// Chunk path as requested
        chunk_path: String,
        /// Reason for failure
        reason: String,
    },

    /// Type error (read-only namespace, non-callable value)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Error raised by a module factory itself
    #[error("{0}")]
    Thrown(String),

    /// Invalid runtime configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuntimeError {
    /// Create an error raised from inside a module factory
    pub fn thrown(msg: impl Into<String>) -> Self {
        Self::Thrown(msg.into())
    }

    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a module not found error
    pub fn module_not_found(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModuleNotFound {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a chunk load error
    pub fn chunk_load(chunk_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ChunkLoad {
            chunk_path: chunk_path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from a failed module factory
    pub fn is_factory_error(&self) -> bool {
        matches!(self, Self::FactoryExecution { .. })
    }

    /// The innermost error a chain of failed factories started from
    pub fn root_cause(&self) -> &RuntimeError {
        match self {
            Self::FactoryExecution { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_not_found_message() {
        let err = RuntimeError::module_not_found("42", "as a runtime entry of chunk a.js");
        assert_eq!(
            err.to_string(),
            "Module 42 was instantiated as a runtime entry of chunk a.js, but the module \
             factory is not available. It might have been deleted in an HMR update."
        );
    }

    #[test]
    fn test_root_cause_unwraps_nested_factories() {
        let inner = RuntimeError::FactoryExecution {
            module_id: "b".into(),
            source: Arc::new(RuntimeError::thrown("boom")),
        };
        let outer = RuntimeError::FactoryExecution {
            module_id: "a".into(),
            source: Arc::new(inner),
        };

        assert!(outer.is_factory_error());
        assert!(matches!(outer.root_cause(), RuntimeError::Thrown(msg) if msg == "boom"));
        assert_eq!(outer.to_string(), "Error evaluating module a: Error evaluating module b: boom");
    }
}
