use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Recursively list every file under `root`, skipping anything matched by `exclusions`.
///
/// Exclusions are glob patterns relative to `root`. A pattern ending in `/**`
/// prunes the whole directory, so `node_modules/**` never descends into
/// `root/node_modules`. Symlinks are not followed, but a symlink that points
/// at a file is listed.
///
/// Returned paths are absolute when `root` is, sorted for determinism.
///
/// # Errors
/// Returns an error if `root` or any directory under it cannot be read.
pub fn list_files(root: &Path, exclusions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let patterns: Vec<glob::Pattern> = exclusions
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_excluded(e.path(), root, exclusions, &patterns))
    {
        let entry = entry?;
        let file_type = entry.file_type();

        if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_excluded(path: &Path, root: &Path, exclusions: &[&str], patterns: &[glob::Pattern]) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    if rel.as_os_str().is_empty() {
        return false;
    }
    let rel_str = rel.to_string_lossy().replace('\\', "/");

    for exclusion in exclusions {
        if let Some(prefix) = exclusion.strip_suffix("/**") {
            if rel_str == prefix || rel_str.starts_with(&format!("{prefix}/")) {
                return true;
            }
        }
    }

    patterns.iter().any(|p| p.matches(&rel_str))
}
