use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes for closure tracing errors.
pub mod codes {
    pub const TRACE_DEPENDENCY_NOT_FOUND: &str = "TRACE_DEPENDENCY_NOT_FOUND";
    pub const TRACE_LOCAL_NOT_FOUND: &str = "TRACE_LOCAL_NOT_FOUND";
    pub const TRACE_SOURCE_READ_FAILED: &str = "TRACE_SOURCE_READ_FAILED";
    pub const TRACE_MANIFEST_INVALID: &str = "TRACE_MANIFEST_INVALID";
    pub const TRACE_RESOLVE_FAILED: &str = "TRACE_RESOLVE_FAILED";
    pub const TRACE_LIST_FAILED: &str = "TRACE_LIST_FAILED";
    pub const TRACE_ENTRY_NOT_FOUND: &str = "TRACE_ENTRY_NOT_FOUND";
}

/// Hard failure of a closure computation.
///
/// Any of these aborts the walk for the entry file; no partial closure is returned.
#[derive(Error, Debug)]
pub enum TraceError {
    /// A declared, non-optional dependency could not be located anywhere.
    #[error("Could not find npm package: {name}")]
    MissingDependency { name: String },

    #[error("Could not resolve '{specifier}' imported from {}", from.display())]
    UnresolvedLocal { specifier: String, from: PathBuf },

    #[error("Failed to read source {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid package manifest at {}: {message}", path.display())]
    ManifestInvalid { path: PathBuf, message: String },

    #[error("Failed to resolve '{specifier}': {message}")]
    Resolve { specifier: String, message: String },

    #[error("Failed to list files under {}: {message}", root.display())]
    ListFiles { root: PathBuf, message: String },

    #[error("Entry file not found: {}", path.display())]
    EntryNotFound { path: PathBuf },
}

impl TraceError {
    /// Get the stable error code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingDependency { .. } => codes::TRACE_DEPENDENCY_NOT_FOUND,
            Self::UnresolvedLocal { .. } => codes::TRACE_LOCAL_NOT_FOUND,
            Self::ReadSource { .. } => codes::TRACE_SOURCE_READ_FAILED,
            Self::ManifestInvalid { .. } => codes::TRACE_MANIFEST_INVALID,
            Self::Resolve { .. } => codes::TRACE_RESOLVE_FAILED,
            Self::ListFiles { .. } => codes::TRACE_LIST_FAILED,
            Self::EntryNotFound { .. } => codes::TRACE_ENTRY_NOT_FOUND,
        }
    }
}
