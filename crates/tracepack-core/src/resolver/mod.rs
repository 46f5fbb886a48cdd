//! Module path resolution.
//!
//! [`ModulePathResolver`] is the capability consumed by the walker: given a
//! specifier and a base directory, return an absolute path or fail.
//! [`NodeResolver`] implements Node's lookup rules natively.

mod node;

pub use node::{is_relative, NodeResolver};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a module path could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// Nothing matched at any lookup location.
    #[error("Cannot find module '{specifier}' from {}", base_dir.display())]
    NotFound { specifier: String, base_dir: PathBuf },

    /// Resolution hit something malformed (e.g. an unparseable package.json).
    #[error("Cannot resolve '{specifier}': {message}")]
    Invalid { specifier: String, message: String },
}

impl ResolveFailure {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Resolves a specifier from a base directory following the host's module rules.
pub trait ModulePathResolver {
    /// # Errors
    /// [`ResolveFailure::NotFound`] when no candidate exists; anything else is a hard failure.
    fn resolve(&self, specifier: &str, base_dir: &Path) -> Result<PathBuf, ResolveFailure>;
}

/// Split a bare specifier into package name and optional subpath.
///
/// `lodash/fp` gives `("lodash", Some("fp"))`, `@scope/pkg/sub` gives `("@scope/pkg", Some("sub"))`.
#[must_use]
pub fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    // Scoped package: the name spans the first two segments
    let name_segments = if spec.starts_with('@') { 2 } else { 1 };

    match spec.match_indices('/').nth(name_segments - 1) {
        Some((i, _)) => (&spec[..i], Some(&spec[i + 1..])),
        None => (spec, None),
    }
}

/// Root package name of a specifier, with `\` separators normalized to `/`.
#[must_use]
pub fn package_name(spec: &str) -> String {
    let normalized = spec.replace('\\', "/");
    parse_bare_specifier(&normalized).0.to_string()
}
