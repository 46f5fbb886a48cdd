//! End-to-end closure tracing over on-disk fixture trees.

use serial_test::serial;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::{tempdir, TempDir};
use tracepack_core::{
    codes, compute_closure, compute_closure_with, Closure, Host, MemoryCache, ModulePathResolver,
    NodeResolver, ResolveFailure, TraceConfig,
};

/// Temp project whose root is canonical, so closure paths compare directly.
struct Fixture {
    _dir: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        Self { _dir: dir, root }
    }

    fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    fn config(&self) -> TraceConfig {
        TraceConfig::new(&self.root)
    }

    fn trace(&self, entry: &str) -> Result<Closure, tracepack_core::TraceError> {
        let config = self.config();
        let host = Host::native(&config);
        compute_closure_with(&host, &config, Path::new(entry), None)
    }

    /// Closure files relative to the root, `/`-separated and sorted.
    fn relative(&self, closure: &Closure) -> Vec<String> {
        closure
            .files
            .iter()
            .map(|p| {
                p.strip_prefix(&self.root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }
}

#[test]
fn test_handler_with_local_files_and_package() {
    let fx = Fixture::new();
    fx.write("src/handler.js", "import util from './util';\nimport x from 'libx';\n")
        .write("src/util.js", "export * from '../lib/helper';\n")
        .write("lib/helper.js", "module.exports = 1;\n")
        .write("node_modules/libx/package.json", r#"{"name":"libx","version":"1.0.0"}"#)
        .write("node_modules/libx/index.js", "module.exports = {};\n")
        .write("node_modules/libx/lib/impl.js", "")
        .write("node_modules/libx/node_modules/inner/index.js", "");

    let closure = fx.trace("src/handler.js").unwrap();

    assert_eq!(
        fx.relative(&closure),
        vec![
            "lib/helper.js",
            "node_modules/libx/index.js",
            "node_modules/libx/lib/impl.js",
            "node_modules/libx/package.json",
            "src/handler.js",
            "src/util.js",
        ]
    );
    assert_eq!(closure.packages, vec![fx.root.join("node_modules/libx")]);
    assert!(closure.warnings.is_empty());
}

#[test]
fn test_entry_only() {
    let fx = Fixture::new();
    fx.write("handler.js", "module.exports.run = () => 42;\n");

    let closure = fx.trace("handler.js").unwrap();
    assert_eq!(fx.relative(&closure), vec!["handler.js"]);
    assert!(closure.packages.is_empty());
}

#[test]
fn test_local_cycle_terminates() {
    let fx = Fixture::new();
    fx.write("a.js", "require('./b');\n")
        .write("b.js", "require('./a');\n");

    let closure = fx.trace("a.js").unwrap();
    assert_eq!(fx.relative(&closure), vec!["a.js", "b.js"]);
}

#[test]
fn test_builtins_are_ignored() {
    let fx = Fixture::new();
    fx.write(
        "handler.js",
        "const fs = require('fs');\nimport path from 'node:path';\nrequire('fs/promises');\n",
    );

    let closure = fx.trace("handler.js").unwrap();
    assert_eq!(fx.relative(&closure), vec!["handler.js"]);
}

#[test]
fn test_template_and_regex_contents_are_not_imports() {
    let fx = Fixture::new();
    fx.write(
        "handler.js",
        "const code = `module.exports = require('./generated-at-runtime');`;\n\
         const url = `http://example.com/api`; const a = require('./a');\n\
         const quote = /\"/; const b = require('./b');\n",
    )
    .write("a.js", "")
    .write("b.js", "");

    let closure = fx.trace("handler.js").unwrap();
    assert_eq!(fx.relative(&closure), vec!["a.js", "b.js", "handler.js"]);
}

#[test]
fn test_package_dependencies_are_followed() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('libx');\n")
        .write(
            "node_modules/libx/package.json",
            r#"{"name":"libx","dependencies":{"liby":"^1.0.0"}}"#,
        )
        .write("node_modules/libx/index.js", "")
        .write("node_modules/liby/package.json", r#"{"name":"liby"}"#)
        .write("node_modules/liby/index.js", "");

    let closure = fx.trace("handler.js").unwrap();
    assert!(closure.contains(&fx.root.join("node_modules/liby/index.js")));
    assert_eq!(closure.packages.len(), 2);
}

#[test]
fn test_package_reached_twice_is_expanded_once() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('libx');\nrequire('liby');\n")
        .write("node_modules/libx/package.json", r#"{"name":"libx"}"#)
        .write("node_modules/libx/index.js", "")
        .write(
            "node_modules/liby/package.json",
            r#"{"name":"liby","dependencies":{"libx":"*"},"peerDependencies":{"libx":"*"}}"#,
        )
        .write("node_modules/liby/index.js", "");

    let closure = fx.trace("handler.js").unwrap();
    let libx = fx.root.join("node_modules/libx");
    assert_eq!(closure.packages.iter().filter(|p| **p == libx).count(), 1);
    assert_eq!(closure.packages.len(), 2);
}

#[test]
fn test_nested_version_resolves_from_declaring_package() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('libx');\n")
        .write(
            "node_modules/libx/package.json",
            r#"{"name":"libx","dependencies":{"liby":"1.x"}}"#,
        )
        .write("node_modules/libx/index.js", "")
        .write(
            "node_modules/libx/node_modules/liby/package.json",
            r#"{"name":"liby","version":"1.0.0"}"#,
        )
        .write("node_modules/libx/node_modules/liby/index.js", "")
        .write(
            "node_modules/liby/package.json",
            r#"{"name":"liby","version":"2.0.0"}"#,
        )
        .write("node_modules/liby/index.js", "");

    let closure = fx.trace("handler.js").unwrap();
    assert!(closure.contains(&fx.root.join("node_modules/libx/node_modules/liby/index.js")));
    assert!(!closure.contains(&fx.root.join("node_modules/liby/index.js")));
}

#[test]
fn test_missing_optional_dependency_is_warning() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('libx');\n")
        .write(
            "node_modules/libx/package.json",
            r#"{"name":"libx","optionalDependencies":{"fsevents":"^2"}}"#,
        )
        .write("node_modules/libx/index.js", "");

    let closure = fx.trace("handler.js").unwrap();
    assert_eq!(closure.warnings, vec!["fsevents".to_string()]);
    assert!(closure.contains(&fx.root.join("node_modules/libx/index.js")));
}

#[test]
fn test_missing_optional_peer_is_warning() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('libx');\n")
        .write(
            "node_modules/libx/package.json",
            r#"{
                "name": "libx",
                "peerDependencies": {"react": "*"},
                "peerDependenciesMeta": {"react": {"optional": true}}
            }"#,
        )
        .write("node_modules/libx/index.js", "");

    let closure = fx.trace("handler.js").unwrap();
    assert_eq!(closure.warnings, vec!["react".to_string()]);
}

#[test]
fn test_missing_required_peer_fails() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('libx');\n")
        .write(
            "node_modules/libx/package.json",
            r#"{"name":"libx","peerDependencies":{"react":"*"}}"#,
        )
        .write("node_modules/libx/index.js", "");

    let err = fx.trace("handler.js").unwrap_err();
    assert_eq!(err.code(), codes::TRACE_DEPENDENCY_NOT_FOUND);
    assert_eq!(err.to_string(), "Could not find npm package: react");
}

#[test]
fn test_missing_top_level_import_fails_with_package_name() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('@scope/ghost/sub/path');\n");

    let err = fx.trace("handler.js").unwrap_err();
    assert_eq!(err.code(), codes::TRACE_DEPENDENCY_NOT_FOUND);
    assert_eq!(err.to_string(), "Could not find npm package: @scope/ghost");
}

#[test]
fn test_top_level_import_is_never_optional() {
    let fx = Fixture::new();
    fx.write(
        "package.json",
        r#"{"name":"svc","optionalDependencies":{"fsevents":"^2"}}"#,
    )
    .write("handler.js", "require('fsevents');\n");

    let err = fx.trace("handler.js").unwrap_err();
    assert_eq!(err.code(), codes::TRACE_DEPENDENCY_NOT_FOUND);
}

#[test]
fn test_scoped_package_subpath() {
    let fx = Fixture::new();
    fx.write("handler.js", "import { a } from '@scope/pkg/sub';\n")
        .write("node_modules/@scope/pkg/package.json", r#"{"name":"@scope/pkg"}"#)
        .write("node_modules/@scope/pkg/sub.js", "")
        .write("node_modules/@scope/pkg/index.js", "");

    let closure = fx.trace("handler.js").unwrap();
    assert_eq!(closure.packages, vec![fx.root.join("node_modules/@scope/pkg")]);
    assert!(closure.contains(&fx.root.join("node_modules/@scope/pkg/sub.js")));
}

#[test]
fn test_alias_is_traced_as_local_code() {
    let fx = Fixture::new();
    fx.write(
        "package.json",
        r#"{"name":"svc","_moduleAliases":{"@lib":"./src/lib"}}"#,
    )
    .write("handler.js", "const h = require('@lib/helper');\n")
    .write("src/lib/helper.js", "require('./format');\n")
    .write("src/lib/format.js", "");

    let closure = fx.trace("handler.js").unwrap();
    assert_eq!(
        fx.relative(&closure),
        vec!["handler.js", "src/lib/format.js", "src/lib/helper.js"]
    );
    assert!(closure.packages.is_empty());
}

#[test]
fn test_fallback_lookup_of_bare_file() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('shim');\n")
        .write("node_modules/shim.js", "module.exports = 1;\n");

    let closure = fx.trace("handler.js").unwrap();
    assert_eq!(
        fx.relative(&closure),
        vec!["handler.js", "node_modules/shim.js"]
    );
}

#[test]
fn test_unresolved_local_import_fails() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('./missing');\n");

    let err = fx.trace("handler.js").unwrap_err();
    assert_eq!(err.code(), codes::TRACE_LOCAL_NOT_FOUND);
    assert!(err.to_string().contains("./missing"));
}

#[test]
fn test_missing_entry_fails() {
    let fx = Fixture::new();

    let err = fx.trace("nope.js").unwrap_err();
    assert_eq!(err.code(), codes::TRACE_ENTRY_NOT_FOUND);
}

#[test]
fn test_malformed_dependency_manifest_fails() {
    let fx = Fixture::new();
    fx.write("handler.js", "require('bad');\n")
        .write("node_modules/bad/package.json", "{ broken");

    let err = fx.trace("handler.js").unwrap_err();
    assert_eq!(err.code(), codes::TRACE_MANIFEST_INVALID);
}

/// Delegates to [`NodeResolver`] and counts calls per (base dir, specifier).
struct CountingResolver {
    inner: NodeResolver,
    calls: Rc<RefCell<HashMap<(PathBuf, String), usize>>>,
}

impl ModulePathResolver for CountingResolver {
    fn resolve(&self, specifier: &str, base_dir: &Path) -> Result<PathBuf, ResolveFailure> {
        *self
            .calls
            .borrow_mut()
            .entry((base_dir.to_path_buf(), specifier.to_string()))
            .or_default() += 1;
        self.inner.resolve(specifier, base_dir)
    }
}

#[test]
fn test_shared_cache_skips_repeated_lookups() {
    let fx = Fixture::new();
    fx.write("a.js", "require('libx');\n")
        .write("b.js", "require('libx');\nrequire('./shared');\n")
        .write("shared.js", "")
        .write("node_modules/libx/package.json", r#"{"name":"libx"}"#)
        .write("node_modules/libx/index.js", "");

    let config = fx.config();
    let calls = Rc::new(RefCell::new(HashMap::new()));
    let host = Host::native(&config).with_resolver(CountingResolver {
        inner: NodeResolver::new(&config),
        calls: Rc::clone(&calls),
    });
    let mut cache = MemoryCache::new();

    let first = compute_closure_with(&host, &config, Path::new("a.js"), Some(&mut cache)).unwrap();
    let second = compute_closure_with(&host, &config, Path::new("b.js"), Some(&mut cache)).unwrap();

    assert!(first.contains(&fx.root.join("node_modules/libx/index.js")));
    // Already emitted by the first computation
    assert!(!second.contains(&fx.root.join("node_modules/libx/index.js")));
    assert!(second.contains(&fx.root.join("shared.js")));

    let key = (fx.root.clone(), "libx/package.json".to_string());
    assert_eq!(calls.borrow().get(&key).copied(), Some(1));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_without_cache_each_computation_is_complete() {
    let fx = Fixture::new();
    fx.write("a.js", "require('libx');\n")
        .write("b.js", "require('libx');\n")
        .write("node_modules/libx/package.json", r#"{"name":"libx"}"#)
        .write("node_modules/libx/index.js", "");

    let first = fx.trace("a.js").unwrap();
    let second = fx.trace("b.js").unwrap();
    assert!(first.contains(&fx.root.join("node_modules/libx/index.js")));
    assert!(second.contains(&fx.root.join("node_modules/libx/index.js")));
}

#[test]
#[serial]
fn test_compute_closure_returns_sorted_slash_paths() {
    let fx = Fixture::new();
    fx.write("src/handler.js", "require('./b');\nrequire('./a');\n")
        .write("src/a.js", "")
        .write("src/b.js", "");

    std::env::remove_var("NODE_PATH");
    let files = compute_closure(Path::new("src/handler.js"), &fx.root, None).unwrap();

    let root = fx.root.to_string_lossy().replace('\\', "/");
    assert_eq!(
        files,
        vec![
            format!("{root}/src/a.js"),
            format!("{root}/src/b.js"),
            format!("{root}/src/handler.js"),
        ]
    );
}

#[test]
#[serial]
fn test_compute_closure_uses_node_path() {
    let fx = Fixture::new();
    fx.write("app/handler.js", "require('common');\n")
        .write("shared/common/package.json", r#"{"name":"common"}"#)
        .write("shared/common/index.js", "");

    std::env::set_var("NODE_PATH", fx.root.join("shared"));
    let result = compute_closure(Path::new("handler.js"), &fx.root.join("app"), None);
    std::env::remove_var("NODE_PATH");

    let files = result.unwrap();
    assert!(files.iter().any(|f| f.ends_with("shared/common/index.js")));
}
