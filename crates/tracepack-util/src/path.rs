//! Path helpers shared by the tracer and the CLI.

use std::path::{Component, Path, PathBuf};

/// Render a path with forward slashes regardless of platform.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Lexically normalize a path: drop `.` components and fold `..` into its parent.
///
/// Does not touch the filesystem, so symlinks are not resolved.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("a/b/c.js")), "a/b/c.js");
        assert_eq!(to_slash(Path::new(r"a\b\c.js")), "a/b/c.js");
    }

    #[test]
    fn test_normalize_parent_dirs() {
        assert_eq!(
            normalize(Path::new("/srv/app/./src/../lib")),
            PathBuf::from("/srv/app/lib")
        );
    }

    #[test]
    fn test_normalize_does_not_escape_root() {
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_normalize_relative_keeps_leading_parents() {
        assert_eq!(normalize(Path::new("../../a/b")), PathBuf::from("../../a/b"));
    }
}
