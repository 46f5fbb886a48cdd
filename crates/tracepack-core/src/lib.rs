#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Runtime dependency closure tracing for Node.js services.
//!
//! Starting from an entry file, [`compute_closure`] follows local imports,
//! resolves package imports against `node_modules`, recurses into every
//! declared dependency, and returns the full set of files a deployment
//! artifact must contain.

pub mod alias;
pub mod cache;
pub mod collect;
pub mod config;
pub mod error;
pub mod host;
pub mod imports;
pub mod manifest;
pub mod resolver;
pub mod version;
pub mod walker;

pub use alias::{load_aliases, resolve_alias, AliasMap};
pub use cache::{CacheKey, MemoryCache, NoCache, ResolutionCache};
pub use config::TraceConfig;
pub use error::{codes, TraceError};
pub use host::Host;
pub use imports::{scan_imports, ImportExtractor, ImportSpec, SourceScanner};
pub use manifest::{FsManifestLocator, ManifestLocator, OptionalPolicy, PackageManifest};
pub use resolver::{ModulePathResolver, NodeResolver, ResolveFailure};
pub use version::{CLOSURE_SCHEMA_VERSION, VERSION};
pub use walker::{Closure, DependencyWalker, ModuleResolver, Resolution};

use std::path::Path;

/// Compute the sorted, `/`-separated file closure of `entry`.
///
/// Relative entries are taken relative to `service_root`. Extra search
/// paths are read from `NODE_PATH`. Passing the same `cache` to several
/// calls skips lookups an earlier call already handled, so each later
/// closure only holds what is new to it; union the results to get the
/// artifact contents.
///
/// # Errors
/// Returns the first [`TraceError`] hit while tracing.
pub fn compute_closure(
    entry: &Path,
    service_root: &Path,
    cache: Option<&mut dyn ResolutionCache>,
) -> Result<Vec<String>, TraceError> {
    let config = TraceConfig::from_env(service_root);
    let host = Host::native(&config);
    Ok(compute_closure_with(&host, &config, entry, cache)?.to_slash_paths())
}

/// Compute the closure of `entry` with explicit capabilities and configuration.
///
/// # Errors
/// Returns the first [`TraceError`] hit while tracing.
pub fn compute_closure_with(
    host: &Host,
    config: &TraceConfig,
    entry: &Path,
    cache: Option<&mut dyn ResolutionCache>,
) -> Result<Closure, TraceError> {
    DependencyWalker::new(host, config).walk(entry, cache)
}
