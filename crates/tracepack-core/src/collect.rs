//! Whole-package file collection.
//!
//! A package that is needed at all is shipped whole: it may load files
//! dynamically in ways import scanning cannot see.

use crate::error::TraceError;
use std::path::{Path, PathBuf};

/// Recursive directory listing with glob-style exclusions relative to the root.
pub trait FileLister {
    /// # Errors
    /// Returns an error if the directory tree cannot be read.
    fn list(&self, root: &Path, exclusions: &[&str]) -> Result<Vec<PathBuf>, TraceError>;
}

/// Native lister backed by `walkdir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkLister;

impl FileLister for WalkLister {
    fn list(&self, root: &Path, exclusions: &[&str]) -> Result<Vec<PathBuf>, TraceError> {
        tracepack_util::fs::list_files(root, exclusions).map_err(|e| TraceError::ListFiles {
            root: root.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Every file under a package root, excluding its nested dependency directory.
///
/// # Errors
/// Returns [`TraceError::ListFiles`] if the package tree cannot be read.
pub fn collect_package_files(
    root: &Path,
    dependency_exclusion: &str,
    lister: &dyn FileLister,
) -> Result<Vec<PathBuf>, TraceError> {
    let files = lister.list(root, &[dependency_exclusion])?;
    tracing::debug!(root = %root.display(), files = files.len(), "expanded package");
    Ok(files)
}
