//! Node-style module path resolution.
//!
//! Supports:
//! - Relative specifiers: `./`, `../`
//! - Absolute filesystem specifiers
//! - Bare specifiers with `node_modules` walk-up, then extra search roots (`NODE_PATH`)
//! - Extension probing
//! - Directory resolution (`package.json` main, then `index.*`)

use super::{ModulePathResolver, ResolveFailure};
use crate::config::TraceConfig;
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Resolver following Node's CommonJS lookup rules.
#[derive(Debug, Clone)]
pub struct NodeResolver {
    extensions: Vec<String>,
    search_paths: Vec<PathBuf>,
    dependency_dir: String,
}

impl NodeResolver {
    #[must_use]
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            search_paths: config.extra_search_paths.clone(),
            dependency_dir: config.dependency_dir.clone(),
        }
    }

    /// Resolve a filesystem candidate: exact file, file with an extension, or directory entry.
    fn resolve_path(&self, base: &Path) -> Result<Option<PathBuf>, ResolveFailure> {
        if let Some(file) = self.resolve_file(base) {
            return Ok(Some(file));
        }
        if base.is_dir() {
            return self.resolve_directory(base);
        }
        Ok(None)
    }

    fn resolve_file(&self, base: &Path) -> Option<PathBuf> {
        if base.is_file() {
            return Some(canonical(base));
        }

        // Append rather than replace: `./config.prod` probes `config.prod.js`
        for ext in &self.extensions {
            let mut with_ext = OsString::from(base.as_os_str());
            with_ext.push(ext);
            let with_ext = PathBuf::from(with_ext);
            if with_ext.is_file() {
                return Some(canonical(&with_ext));
            }
        }

        None
    }

    fn resolve_index(&self, dir: &Path) -> Option<PathBuf> {
        self.extensions.iter().find_map(|ext| {
            let index = dir.join(format!("index{ext}"));
            index.is_file().then(|| canonical(&index))
        })
    }

    /// Resolve a directory (package.json main > index.*).
    fn resolve_directory(&self, dir: &Path) -> Result<Option<PathBuf>, ResolveFailure> {
        let pkg_json_path = dir.join("package.json");

        if pkg_json_path.is_file() {
            let main = read_main(&pkg_json_path)?;
            if let Some(main) = main {
                let main_path = dir.join(&main);
                if let Some(found) = self
                    .resolve_file(&main_path)
                    .or_else(|| self.resolve_index(&main_path))
                {
                    return Ok(Some(found));
                }
            }
        }

        Ok(self.resolve_index(dir))
    }

    /// Resolve a bare specifier via `node_modules` directories, then extra search roots.
    fn resolve_bare(&self, spec: &str, base_dir: &Path) -> Result<Option<PathBuf>, ResolveFailure> {
        for dir in base_dir.ancestors() {
            // `node_modules/node_modules` is never a lookup location
            if dir
                .file_name()
                .is_some_and(|name| name == self.dependency_dir.as_str())
            {
                continue;
            }

            let candidate = dir.join(&self.dependency_dir).join(spec);
            if let Some(found) = self.resolve_path(&candidate)? {
                return Ok(Some(found));
            }
        }

        for root in &self.search_paths {
            if let Some(found) = self.resolve_path(&root.join(spec))? {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }
}

impl ModulePathResolver for NodeResolver {
    fn resolve(&self, specifier: &str, base_dir: &Path) -> Result<PathBuf, ResolveFailure> {
        if specifier.is_empty() {
            return Err(ResolveFailure::Invalid {
                specifier: specifier.to_string(),
                message: "empty specifier".to_string(),
            });
        }

        let found = if is_relative(specifier) {
            self.resolve_path(&base_dir.join(specifier))?
        } else if Path::new(specifier).is_absolute() {
            self.resolve_path(Path::new(specifier))?
        } else {
            self.resolve_bare(specifier, base_dir)?
        };

        found.ok_or_else(|| ResolveFailure::NotFound {
            specifier: specifier.to_string(),
            base_dir: base_dir.to_path_buf(),
        })
    }
}

/// Whether a specifier is relative to the importing file (`.`, `..`, `./x`, `../x`).
#[must_use]
pub fn is_relative(spec: &str) -> bool {
    spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../")
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Read the `main` field of a package.json. A malformed manifest is a hard failure.
fn read_main(pkg_json_path: &Path) -> Result<Option<String>, ResolveFailure> {
    let invalid = |message: String| ResolveFailure::Invalid {
        specifier: pkg_json_path.to_string_lossy().into_owned(),
        message,
    };

    let content = std::fs::read_to_string(pkg_json_path)
        .map_err(|e| invalid(format!("Failed to read package.json: {e}")))?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| invalid(format!("Invalid package.json: {e}")))?;

    Ok(value
        .get("main")
        .and_then(Value::as_str)
        .filter(|main| !main.is_empty())
        .map(String::from))
}
