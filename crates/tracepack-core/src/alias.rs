//! User-declared module aliases (`_moduleAliases` in the project's package.json).

use crate::manifest::ManifestLocator;
use std::path::{Path, PathBuf};
use tracepack_util::path::normalize;

/// Prefix to absolute directory, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: Vec<(String, PathBuf)>,
}

impl AliasMap {
    #[must_use]
    pub fn new(entries: Vec<(String, PathBuf)>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, PathBuf)] {
        &self.entries
    }

    /// Map a specifier through the first declared prefix it starts with.
    ///
    /// The remainder after the prefix is joined onto the alias target; a
    /// leading separator on the remainder is dropped so it never replaces the target.
    #[must_use]
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        let (prefix, target) = self
            .entries
            .iter()
            .find(|(prefix, _)| specifier.starts_with(prefix.as_str()))?;

        let rest = specifier[prefix.len()..].trim_start_matches(['/', '\\']);
        if rest.is_empty() {
            Some(target.clone())
        } else {
            Some(normalize(&target.join(rest)))
        }
    }
}

/// Load aliases from the nearest manifest at or above `service_root`.
///
/// Alias targets are resolved against `service_root`. A missing or unreadable
/// manifest yields an empty map: aliasing is an optional convenience.
pub fn load_aliases(service_root: &Path, locator: &dyn ManifestLocator) -> AliasMap {
    let manifest = match locator.nearest(service_root) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => return AliasMap::default(),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring module aliases");
            return AliasMap::default();
        }
    };

    AliasMap::new(
        manifest
            .module_aliases
            .into_iter()
            .map(|(prefix, target)| (prefix, normalize(&service_root.join(target))))
            .collect(),
    )
}

/// Resolve `specifier` through `aliases`; `None` when no prefix matches.
#[must_use]
pub fn resolve_alias(specifier: &str, aliases: &AliasMap) -> Option<PathBuf> {
    aliases.resolve(specifier)
}
