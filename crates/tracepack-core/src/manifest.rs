//! Package manifest (`package.json`) records and the nearest-manifest lookup.

use crate::error::TraceError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name.
pub const MANIFEST_FILE: &str = "package.json";

/// Dependency sections walked for every discovered package, in walk order.
pub const DEPENDENCY_SECTIONS: &[&str] =
    &["dependencies", "peerDependencies", "optionalDependencies"];

/// Declared dependencies: name to version range (absent when the range is not a string).
pub type DependencyMap = BTreeMap<String, Option<String>>;

/// Parsed manifest content for one package.
///
/// Identity is the package root (`root`); the walker keys its processed set on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    /// Absolute path of the manifest file.
    pub path: PathBuf,
    /// Directory containing the manifest.
    pub root: PathBuf,
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: DependencyMap,
    pub peer_dependencies: DependencyMap,
    pub optional_dependencies: DependencyMap,
    /// `peerDependenciesMeta`: name to its `optional` flag.
    pub peer_dependencies_meta: BTreeMap<String, bool>,
    /// `_moduleAliases` entries in declaration order, targets as written.
    pub module_aliases: Vec<(String, String)>,
}

impl PackageManifest {
    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    /// Returns [`TraceError::ManifestInvalid`] if the file cannot be read or is not a JSON object.
    pub fn read(path: &Path) -> Result<Self, TraceError> {
        let content = fs::read_to_string(path).map_err(|e| TraceError::ManifestInvalid {
            path: path.to_path_buf(),
            message: format!("Failed to read: {e}"),
        })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| TraceError::ManifestInvalid {
                path: path.to_path_buf(),
                message: format!("Invalid JSON: {e}"),
            })?;
        if !value.is_object() {
            return Err(TraceError::ManifestInvalid {
                path: path.to_path_buf(),
                message: "Manifest is not a JSON object".to_string(),
            });
        }
        Ok(Self::from_value(path, &value))
    }

    /// Build a manifest record from parsed JSON. Malformed sections are treated as absent.
    #[must_use]
    pub fn from_value(path: &Path, value: &Value) -> Self {
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let peer_dependencies_meta: BTreeMap<String, bool> = value
            .get("peerDependenciesMeta")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(name, meta)| {
                        let optional = meta
                            .get("optional")
                            .and_then(Value::as_bool)
                            .unwrap_or(false);
                        (name.clone(), optional)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let module_aliases: Vec<(String, String)> = value
            .get("_moduleAliases")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(prefix, target)| {
                        target.as_str().map(|t| (prefix.clone(), t.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            root,
            name: value.get("name").and_then(Value::as_str).map(String::from),
            version: value
                .get("version")
                .and_then(Value::as_str)
                .map(String::from),
            dependencies: extract_deps(value, "dependencies"),
            peer_dependencies: extract_deps(value, "peerDependencies"),
            optional_dependencies: extract_deps(value, "optionalDependencies"),
            peer_dependencies_meta,
            module_aliases,
        }
    }

    /// Declared dependencies of one section (see [`DEPENDENCY_SECTIONS`]).
    #[must_use]
    pub fn section(&self, section: &str) -> Option<&DependencyMap> {
        match section {
            "dependencies" => Some(&self.dependencies),
            "peerDependencies" => Some(&self.peer_dependencies),
            "optionalDependencies" => Some(&self.optional_dependencies),
            _ => None,
        }
    }

    /// The policy deciding whether a missing dependency of this package is acceptable.
    #[must_use]
    pub fn optional_policy(&self) -> OptionalPolicy<'_> {
        OptionalPolicy {
            optional: Some(&self.optional_dependencies),
            peer_meta: Some(&self.peer_dependencies_meta),
        }
    }

    /// Display label: `name@version`, falling back to the root directory.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.name, &self.version) {
            (Some(name), Some(version)) => format!("{name}@{version}"),
            (Some(name), None) => name.clone(),
            _ => self.root.display().to_string(),
        }
    }
}

fn extract_deps(value: &Value, section: &str) -> DependencyMap {
    value
        .get(section)
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(name, range)| (name.clone(), range.as_str().map(String::from)))
                .collect()
        })
        .unwrap_or_default()
}

/// Declared optional metadata of the package whose dependencies are being resolved.
///
/// Top-level imports resolve with [`OptionalPolicy::none`]: nothing is optional there.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalPolicy<'a> {
    optional: Option<&'a DependencyMap>,
    peer_meta: Option<&'a BTreeMap<String, bool>>,
}

impl OptionalPolicy<'_> {
    /// A policy under which every dependency is required.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether `name` may be missing: listed in `optionalDependencies`, or a peer marked optional.
    #[must_use]
    pub fn allows_missing(&self, name: &str) -> bool {
        self.optional.is_some_and(|deps| deps.contains_key(name))
            || self
                .peer_meta
                .is_some_and(|meta| meta.get(name).copied().unwrap_or(false))
    }
}

/// Finds the nearest manifest at or above a path and parses it.
pub trait ManifestLocator {
    /// # Errors
    /// Returns an error if a manifest is found but cannot be parsed.
    fn nearest(&self, start: &Path) -> Result<Option<PackageManifest>, TraceError>;
}

/// Native locator: walks parent directories looking for `package.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsManifestLocator;

impl ManifestLocator for FsManifestLocator {
    fn nearest(&self, start: &Path) -> Result<Option<PackageManifest>, TraceError> {
        // When `start` is a file, `start/package.json` simply doesn't exist
        for dir in start.ancestors() {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                return PackageManifest::read(&candidate).map(Some);
            }
        }
        Ok(None)
    }
}
