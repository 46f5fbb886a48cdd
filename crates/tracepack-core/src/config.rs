use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable listing extra module search roots.
pub const NODE_PATH_ENV: &str = "NODE_PATH";

/// Directory holding installed packages; never descended into when a package is expanded.
pub const DEFAULT_DEPENDENCY_DIR: &str = "node_modules";

/// Default extensions for probing, in Node's order followed by the ESM/TS variants.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".js", ".json", ".node", ".mjs", ".cjs", ".ts", ".tsx", ".jsx",
];

/// Configuration for one closure computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Project/service root: base for top-level bare specifiers and alias lookup.
    pub service_root: PathBuf,

    /// Extensions to probe (in order).
    pub extensions: Vec<String>,

    /// Extra roots consulted by the last-resort module lookup.
    pub extra_search_paths: Vec<PathBuf>,

    /// Name of the nested dependency directory excluded from package expansion.
    pub dependency_dir: String,
}

impl TraceConfig {
    /// Create a config for the given service root with default settings.
    #[must_use]
    pub fn new(service_root: impl Into<PathBuf>) -> Self {
        Self {
            service_root: service_root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            extra_search_paths: Vec::new(),
            dependency_dir: DEFAULT_DEPENDENCY_DIR.to_string(),
        }
    }

    /// Create a config that also honors `NODE_PATH`.
    #[must_use]
    pub fn from_env(service_root: impl Into<PathBuf>) -> Self {
        let extra = std::env::var_os(NODE_PATH_ENV)
            .map(|value| {
                std::env::split_paths(&value)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self::new(service_root).with_extra_search_paths(extra)
    }

    /// Set extra search paths.
    #[must_use]
    pub fn with_extra_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.extra_search_paths = paths;
        self
    }

    /// Set probe extensions.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Exclusion pattern for nested dependency storage, relative to a package root.
    #[must_use]
    pub fn dependency_exclusion(&self) -> String {
        format!("{}/**", self.dependency_dir)
    }
}
