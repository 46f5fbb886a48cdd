//! Import discovery for JavaScript/TypeScript files.
//!
//! [`ImportExtractor`] is the capability the walker consumes; [`SourceScanner`]
//! is the native implementation built on a lightweight scanner.

mod scan;

pub use scan::{kinds, scan_imports, ImportSpec};

use crate::error::TraceError;
use std::path::Path;

/// Given a source file, return the import specifiers it references.
///
/// Implementations must not report Node builtin modules.
pub trait ImportExtractor {
    fn extract(&self, file: &Path) -> Result<Vec<String>, TraceError>;
}

/// Native extractor: reads the file and scans it for `import`/`export from`/`require`/`import()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceScanner;

impl ImportExtractor for SourceScanner {
    fn extract(&self, file: &Path) -> Result<Vec<String>, TraceError> {
        // Manifests and other data files carry no imports
        if file.extension().is_some_and(|ext| ext == "json" || ext == "node") {
            return Ok(Vec::new());
        }

        let source =
            tracepack_util::fs::read_to_string_lossy(file).map_err(|e| TraceError::ReadSource {
                path: file.to_path_buf(),
                source: e,
            })?;

        Ok(scan_imports(&source)
            .into_iter()
            .map(|spec| spec.raw)
            .filter(|raw| !is_builtin(raw))
            .collect())
    }
}

/// Node builtin module names (without the `node:` prefix).
const BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Whether a specifier names a Node builtin (`fs`, `fs/promises`, `node:test`, ...).
#[must_use]
pub fn is_builtin(specifier: &str) -> bool {
    if specifier.starts_with("node:") {
        return true;
    }
    let root = specifier.split('/').next().unwrap_or(specifier);
    BUILTINS.contains(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("fs"));
        assert!(is_builtin("fs/promises"));
        assert!(is_builtin("node:test"));
        assert!(!is_builtin("lodash"));
        assert!(!is_builtin("./fs"));
        assert!(!is_builtin("@scope/fs"));
    }

    #[test]
    fn test_source_scanner_filters_builtins() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("handler.js");
        fs::write(
            &file,
            "const fs = require('fs');\nconst p = require('node:path');\nconst x = require('libx');\n",
        )
        .unwrap();

        let specs = SourceScanner.extract(&file).unwrap();
        assert_eq!(specs, vec!["libx".to_string()]);
    }

    #[test]
    fn test_source_scanner_json_has_no_imports() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("data.json");
        fs::write(&file, r#"{"require": "x"}"#).unwrap();

        assert!(SourceScanner.extract(&file).unwrap().is_empty());
    }

    #[test]
    fn test_source_scanner_missing_file() {
        let err = SourceScanner
            .extract(Path::new("/nonexistent/handler.js"))
            .unwrap_err();
        assert_eq!(err.code(), crate::error::codes::TRACE_SOURCE_READ_FAILED);
    }
}
