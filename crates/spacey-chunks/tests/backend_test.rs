//! Chunk loading backend integration tests

use parking_lot::Mutex;
use serde::Deserialize;
use spacey_chunks::{
    BackendKind, ChunkRegistration, ChunkRuntime, FsHost, MemoryHost, RuntimeConfig,
    RuntimeError, RuntimeParams, SourceInfo, Value,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(runtime_chunk_path: &str) -> RuntimeConfig {
    RuntimeConfig {
        runtime_chunk_path: runtime_chunk_path.to_string(),
        ..RuntimeConfig::default()
    }
}

#[test]
fn test_other_chunks_load_before_entries() {
    init_tracing();
    let log = Arc::new(Mutex::new(Vec::new()));
    let host = Arc::new(MemoryHost::new());

    let c2_log = Arc::clone(&log);
    host.insert_registration("server/chunks/c2.js", move || {
        let log = Arc::clone(&c2_log);
        ChunkRegistration::new("server/chunks/c2.js")
            .module("shared", move |_| {
                log.lock().push("shared");
                Ok(())
            })
            .params(RuntimeParams::new().runtime_module("shared"))
    });

    let rt = ChunkRuntime::dynamic(config("server/chunks/runtime.js"), host.clone());
    let m1_log = Arc::clone(&log);
    let m2_log = Arc::clone(&log);
    rt.register_chunk(
        ChunkRegistration::new("server/chunks/entry.js")
            .module("m1", move |_| {
                m1_log.lock().push("m1");
                Ok(())
            })
            .module("m2", move |_| {
                m2_log.lock().push("m2");
                Ok(())
            })
            .params(
                RuntimeParams::new()
                    .other_chunk("server/chunks/c2.js")
                    .runtime_module("m1")
                    .runtime_module("m2"),
            ),
    )
    .unwrap();

    assert_eq!(*log.lock(), vec!["shared", "m1", "m2"]);
    assert_eq!(host.execution_count("server/chunks/c2.js"), 1);
    assert_eq!(host.invalidation_count("server/chunks/c2.js"), 1);
    assert!(rt.is_chunk_registered("server/chunks/c2.js"));
    assert_eq!(
        rt.first_module_chunk("shared"),
        Some("server/chunks/c2.js".to_string())
    );
}

#[test]
fn test_other_chunks_ignored_without_entries() {
    init_tracing();
    let host = Arc::new(MemoryHost::new());
    host.insert("c2.js", |_| Ok(()));

    let rt = ChunkRuntime::dynamic(RuntimeConfig::default(), host.clone());
    let value = rt
        .register_chunk(
            ChunkRegistration::new("entry.js").params(RuntimeParams::new().other_chunk("c2.js")),
        )
        .unwrap();

    assert!(value.is_none());
    assert_eq!(host.execution_count("c2.js"), 0);
}

#[test]
fn test_dependency_chunks_reexecute_on_every_load() {
    init_tracing();
    let host = Arc::new(MemoryHost::new());
    host.insert("dep.js", |_| Ok(()));

    let rt = ChunkRuntime::dynamic(RuntimeConfig::default(), host.clone());
    for entry in ["one.js", "two.js"] {
        rt.register_chunk(
            ChunkRegistration::new(entry)
                .module(entry, |_| Ok(()))
                .params(RuntimeParams::new().other_chunk("dep.js").runtime_module(entry)),
        )
        .unwrap();
    }

    assert_eq!(host.execution_count("dep.js"), 2);
    assert_eq!(host.invalidation_count("dep.js"), 2);
    assert!(host.is_resident("dep.js"));
}

#[test]
fn test_non_executable_chunks_are_skipped() {
    init_tracing();
    let host = Arc::new(MemoryHost::new());
    let rt = ChunkRuntime::dynamic(RuntimeConfig::default(), host.clone());

    rt.load_chunk("styles/main.css", SourceInfo::parent("app"))
        .unwrap();
    rt.register_chunk(
        ChunkRegistration::new("entry.js")
            .module("app", |_| Ok(()))
            .params(
                RuntimeParams::new()
                    .other_chunk("styles/main.css")
                    .runtime_module("app"),
            ),
    )
    .unwrap();

    assert_eq!(host.execution_count("styles/main.css"), 0);
    assert!(!rt.is_chunk_registered("styles/main.css"));
    assert!(rt.module("app").unwrap().is_loaded());
}

#[test]
fn test_executable_extension_comes_from_config() {
    init_tracing();
    let host = Arc::new(MemoryHost::new());
    host.insert("a.js", |_| Ok(()));
    host.insert("a.mjs", |_| Ok(()));

    let mut config = RuntimeConfig::default();
    config.set("executable-extension", "mjs").unwrap();
    let rt = ChunkRuntime::dynamic(config, host.clone());

    rt.load_chunk("a.js", SourceInfo::parent("app")).unwrap();
    rt.load_chunk("a.mjs", SourceInfo::parent("app")).unwrap();

    assert_eq!(host.execution_count("a.js"), 0);
    assert_eq!(host.execution_count("a.mjs"), 1);
}

#[test]
fn test_missing_dependency_chunk_fails_registration() {
    init_tracing();
    let rt = ChunkRuntime::dynamic(RuntimeConfig::default(), Arc::new(MemoryHost::new()));
    let err = rt
        .register_chunk(
            ChunkRegistration::new("entry.js")
                .module("app", |_| Ok(()))
                .params(RuntimeParams::new().other_chunk("gone.js").runtime_module("app")),
        )
        .unwrap_err();

    assert!(matches!(err, RuntimeError::ChunkLoad { ref chunk_path, .. } if chunk_path == "gone.js"));
    assert!(rt.module("app").is_none());
}

#[test]
fn test_failing_entry_in_dependency_chunk_stays_in_that_chunk() {
    init_tracing();
    let host = Arc::new(MemoryHost::new());
    host.insert_registration("dep.js", || {
        ChunkRegistration::new("dep.js")
            .module("dep_ok", |_| Ok(()))
            .module("dep_bad", |_| Err(RuntimeError::thrown("dep failed")))
            .module("dep_after", |_| Ok(()))
            .params(
                RuntimeParams::new()
                    .runtime_module("dep_ok")
                    .runtime_module("dep_bad")
                    .runtime_module("dep_after"),
            )
    });

    let rt = ChunkRuntime::dynamic(RuntimeConfig::default(), host.clone());
    let exported = rt
        .register_chunk(
            ChunkRegistration::new("entry.js")
                .module("main", |ctx| {
                    ctx.export_value("ok");
                    Ok(())
                })
                .params(
                    RuntimeParams::new()
                        .other_chunk("dep.js")
                        .runtime_module("main")
                        .exported_cjs_module("main"),
                ),
        )
        .unwrap();

    assert_eq!(exported, Some(Value::from("ok")));
    assert_eq!(host.execution_count("dep.js"), 1);
    assert!(rt.module("dep_ok").unwrap().is_loaded());
    let bad = rt.module("dep_bad").unwrap();
    assert!(!bad.is_loaded());
    assert_eq!(bad.error().unwrap().to_string(), "dep failed");
    assert!(rt.module("dep_after").is_none());
    assert!(rt.has_factory("dep_after"));
}

#[test]
fn test_static_backend_refuses_everything() {
    init_tracing();
    let rt = ChunkRuntime::static_linked(RuntimeConfig {
        backend: BackendKind::Static,
        ..RuntimeConfig::default()
    });

    let err = rt
        .register_chunk(ChunkRegistration::new("a.js").module("m", |_| Ok(())))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::ChunkLoadUnsupported));
    assert_eq!(err.to_string(), "chunk loading is not supported");

    let err = rt
        .register_chunk(
            ChunkRegistration::new("b.js").params(RuntimeParams::new().runtime_module("m")),
        )
        .unwrap_err();
    assert!(matches!(err, RuntimeError::ChunkLoadUnsupported));
    assert!(rt.module("m").is_none());

    let err = rt
        .load_chunk("c.js", SourceInfo::parent("m"))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::ChunkLoadUnsupported));
}

#[test]
fn test_static_backend_serves_linked_modules() {
    init_tracing();
    let rt = ChunkRuntime::static_linked(RuntimeConfig::default());
    rt.register_modules(
        "bundle.js",
        ChunkRegistration::new("bundle.js")
            .module("main", |ctx| {
                ctx.load_chunk("bundle.js")?;
                let dep = ctx.require("dep")?;
                ctx.export_value(dep);
                Ok(())
            })
            .module("dep", |ctx| {
                ctx.export_value("linked");
                Ok(())
            })
            .modules,
    );

    let main = rt.instantiate_runtime_module("main", "bundle.js").unwrap();
    assert_eq!(main.exports(), Value::from("linked"));
    assert_eq!(rt.backend_name(), "static");
}

/// On-disk chunk format used by the filesystem tests: each module exports a
/// constant or requires the modules it lists.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    chunk_path: String,
    #[serde(default)]
    modules: BTreeMap<String, ManifestModule>,
    #[serde(default)]
    params: Option<RuntimeParams>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ManifestModule {
    exports: Option<String>,
    requires: Vec<String>,
}

fn manifest_executor(_path: &Path, source: &str, runtime: &ChunkRuntime) -> spacey_chunks::Result<()> {
    let manifest: Manifest = serde_json::from_str(source)?;
    let mut registration = ChunkRegistration::new(manifest.chunk_path);
    for (id, module) in manifest.modules {
        registration = registration.module(id, move |ctx| {
            for dep in &module.requires {
                ctx.require(dep)?;
            }
            if let Some(exports) = &module.exports {
                ctx.export_value(exports.as_str());
            }
            Ok(())
        });
    }
    if let Some(params) = manifest.params {
        registration = registration.params(params);
    }
    runtime.push_chunk(registration);
    Ok(())
}

#[test]
fn test_fs_host_loads_chunks_from_disk() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let chunks = dir.path().join("server/chunks");
    std::fs::create_dir_all(&chunks).unwrap();
    std::fs::write(
        chunks.join("lib.js"),
        r#"{
            "chunkPath": "server/chunks/lib.js",
            "modules": { "lib": { "exports": "from disk" } }
        }"#,
    )
    .unwrap();

    let host = Arc::new(FsHost::new(dir.path(), manifest_executor));
    let rt = ChunkRuntime::dynamic(config("server/runtime.js"), host.clone());

    let exported = rt
        .register_chunk(
            ChunkRegistration::new("server/entry.js")
                .module("app", |ctx| {
                    let lib = ctx.require("lib")?;
                    ctx.export_value(lib);
                    Ok(())
                })
                .params(
                    RuntimeParams::new()
                        .other_chunk("server/chunks/lib.js")
                        .exported_cjs_module("app"),
                ),
        )
        .unwrap();

    assert_eq!(exported, Some(Value::from("from disk")));
    assert_eq!(rt.module("lib").unwrap().parents(), vec!["app"]);
}

#[test]
fn test_fs_host_lazy_chunk_with_own_entries() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("lazy.js"),
        r#"{
            "chunkPath": "lazy.js",
            "modules": {
                "lazy": { "requires": ["util"] },
                "util": { "exports": "util" }
            },
            "params": { "runtimeModuleIds": ["lazy"] }
        }"#,
    )
    .unwrap();

    let host = Arc::new(FsHost::new(dir.path(), manifest_executor));
    let rt = ChunkRuntime::dynamic(RuntimeConfig::default(), host);
    rt.register_chunk(ChunkRegistration::new("main.js").module("main", |ctx| {
        ctx.load_chunk("lazy.js")
    }))
    .unwrap();

    rt.instantiate_runtime_module("main", "main.js").unwrap();
    assert!(rt.is_runtime_module("lazy"));
    assert_eq!(rt.module("util").unwrap().exports(), Value::from("util"));
    assert_eq!(rt.chunk_modules("lazy.js"), vec!["lazy", "util"]);
}

#[test]
fn test_fs_host_bad_chunk_surfaces_json_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.js"), "not json").unwrap();

    let host = Arc::new(FsHost::new(dir.path(), manifest_executor));
    let rt = ChunkRuntime::dynamic(RuntimeConfig::default(), host);
    let err = rt
        .load_chunk("bad.js", SourceInfo::runtime("main.js"))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Json(_)));
}

#[test]
fn test_backend_from_config_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runtime.json");
    std::fs::write(&path, r#"{ "backend": "static" }"#).unwrap();

    let config = RuntimeConfig::from_file(&path).unwrap();
    let rt = ChunkRuntime::from_config(config, None).unwrap();
    assert_eq!(rt.backend_name(), "static");
}
