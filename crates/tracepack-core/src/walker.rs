//! Dependency closure walker.
//!
//! Two worklists, both consumed last-in-first-out:
//! 1. local files: scanned for imports; relative imports stay local, bare
//!    imports go through [`ModuleResolver`] from the service root.
//! 2. package manifests: every declared dependency (regular, peer, optional)
//!    is resolved from the manifest's own directory.
//!
//! Every discovered package root is then expanded into its full file list.
//! Visited files and processed package roots only grow, so the walk
//! terminates on any finite tree, cycles included.

use crate::alias::{load_aliases, AliasMap};
use crate::cache::{CacheKey, ResolutionCache};
use crate::collect::collect_package_files;
use crate::config::TraceConfig;
use crate::error::TraceError;
use crate::host::Host;
use crate::manifest::{OptionalPolicy, PackageManifest, DEPENDENCY_SECTIONS, MANIFEST_FILE};
use crate::resolver::{is_relative, package_name, ResolveFailure};
use std::cell::OnceCell;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracepack_util::path::to_slash;
use tracing::{debug, trace, warn};

/// Outcome of resolving one module specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The specifier names an installed package; its manifest joins the module worklist.
    Found(PackageManifest),
    /// Handled without a package: an alias target or fallback-resolved file to trace locally.
    Redirect(PathBuf),
    /// Nothing to add: a cache hit, a missing optional dependency, or a path without a manifest.
    Skipped,
}

/// Resolves bare specifiers to package manifests, applying the optional-dependency policy.
pub struct ModuleResolver<'h, 'c> {
    host: &'h Host,
    service_root: &'h Path,
    cache: Option<&'c mut dyn ResolutionCache>,
    aliases: OnceCell<AliasMap>,
    warnings: Vec<String>,
}

impl<'h, 'c> ModuleResolver<'h, 'c> {
    #[must_use]
    pub fn new(
        host: &'h Host,
        service_root: &'h Path,
        cache: Option<&'c mut dyn ResolutionCache>,
    ) -> Self {
        Self {
            host,
            service_root,
            cache,
            aliases: OnceCell::new(),
            warnings: Vec::new(),
        }
    }

    /// Names of optional dependencies found missing so far.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Resolve `specifier` starting from `base_dir`.
    ///
    /// `policy` carries the optional metadata of the package declaring the
    /// dependency; top-level imports pass [`OptionalPolicy::none`].
    ///
    /// # Errors
    /// [`TraceError::MissingDependency`] if a required dependency cannot be
    /// found on disk, via an alias, or via the fallback lookup. Malformed
    /// manifests and other resolver failures propagate as well.
    pub fn resolve(
        &mut self,
        specifier: &str,
        base_dir: &Path,
        policy: OptionalPolicy<'_>,
    ) -> Result<Resolution, TraceError> {
        let name = package_name(specifier);
        let key = CacheKey::new(base_dir, specifier);

        if self.cache.as_ref().is_some_and(|cache| cache.has(&key)) {
            trace!(specifier, base_dir = %base_dir.display(), "cache hit");
            return Ok(Resolution::Skipped);
        }

        let manifest_spec = format!("{name}/{MANIFEST_FILE}");
        match self.host.resolver.resolve(&manifest_spec, base_dir) {
            Ok(path) => match self.host.manifests.nearest(&path)? {
                Some(manifest) => {
                    debug!(package = %manifest.label(), root = %manifest.root.display(), "found package");
                    self.remember(key);
                    Ok(Resolution::Found(manifest))
                }
                None => {
                    // Resolved but unowned by any manifest; dropped without failing the walk
                    debug!(specifier, path = %path.display(), "no manifest for resolved path");
                    Ok(Resolution::Skipped)
                }
            },
            Err(failure) if failure.is_not_found() => {
                self.resolve_missing(specifier, &name, base_dir, policy, key)
            }
            Err(failure) => Err(TraceError::Resolve {
                specifier: specifier.to_string(),
                message: failure.to_string(),
            }),
        }
    }

    fn resolve_missing(
        &mut self,
        specifier: &str,
        name: &str,
        base_dir: &Path,
        policy: OptionalPolicy<'_>,
        key: CacheKey,
    ) -> Result<Resolution, TraceError> {
        if policy.allows_missing(name) {
            warn!(package = name, "missing optional dependency: {name}");
            self.warnings.push(name.to_string());
            return Ok(Resolution::Skipped);
        }

        if let Some(target) = self.aliases().resolve(specifier) {
            let target = self.probe_local(target);
            debug!(specifier, target = %target.display(), "resolved via alias");
            self.remember(key);
            return Ok(Resolution::Redirect(target));
        }

        match self.host.resolver.resolve(specifier, base_dir) {
            Ok(path) => {
                debug!(specifier, path = %path.display(), "resolved via fallback lookup");
                self.remember(key);
                Ok(Resolution::Redirect(path))
            }
            Err(_) => Err(TraceError::MissingDependency {
                name: name.to_string(),
            }),
        }
    }

    fn aliases(&self) -> &AliasMap {
        self.aliases
            .get_or_init(|| load_aliases(self.service_root, self.host.manifests.as_ref()))
    }

    /// Apply extension/index probing to an alias target, keeping it as-is when nothing matches.
    fn probe_local(&self, target: PathBuf) -> PathBuf {
        let spec = target.to_string_lossy();
        self.host
            .resolver
            .resolve(&spec, self.service_root)
            .unwrap_or_else(|_| target.clone())
    }

    fn remember(&mut self, key: CacheKey) {
        if let Some(cache) = self.cache.as_mut() {
            cache.add(key);
        }
    }
}

/// Result of one closure computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    /// Every file needed at runtime, entry file included.
    pub files: BTreeSet<PathBuf>,
    /// Package roots expanded into `files`, in discovery order.
    pub packages: Vec<PathBuf>,
    /// Optional dependencies that were declared but missing.
    pub warnings: Vec<String>,
}

impl Closure {
    /// Files as sorted, deduplicated `/`-separated strings.
    #[must_use]
    pub fn to_slash_paths(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|p| to_slash(p))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Default)]
struct WalkState {
    visited: HashSet<PathBuf>,
    local: Vec<PathBuf>,
    modules: Vec<PackageManifest>,
    processed: HashSet<PathBuf>,
    packages: Vec<PathBuf>,
}

/// Drives the two-phase traversal for one entry file.
#[derive(Debug)]
pub struct DependencyWalker<'h> {
    host: &'h Host,
    config: &'h TraceConfig,
}

impl<'h> DependencyWalker<'h> {
    #[must_use]
    pub fn new(host: &'h Host, config: &'h TraceConfig) -> Self {
        Self { host, config }
    }

    /// Compute the closure of `entry`.
    ///
    /// # Errors
    /// The first hard failure aborts the walk; no partial closure is returned.
    pub fn walk(
        &self,
        entry: &Path,
        cache: Option<&mut dyn ResolutionCache>,
    ) -> Result<Closure, TraceError> {
        let service_root = canonical(&self.config.service_root);
        let entry_path = if entry.is_absolute() {
            entry.to_path_buf()
        } else {
            service_root.join(entry)
        };
        if !entry_path.is_file() {
            return Err(TraceError::EntryNotFound { path: entry_path });
        }

        let span = tracing::debug_span!("closure", entry = %entry_path.display());
        let _guard = span.enter();

        let mut resolver = ModuleResolver::new(self.host, &service_root, cache);
        let mut state = WalkState::default();
        state.local.push(canonical(&entry_path));

        self.drain_local(&mut resolver, &mut state, &service_root)?;
        self.drain_modules(&mut resolver, &mut state, &service_root)?;

        let exclusion = self.config.dependency_exclusion();
        let mut files: BTreeSet<PathBuf> = state.visited.into_iter().collect();
        for root in &state.packages {
            files.extend(collect_package_files(
                root,
                &exclusion,
                self.host.lister.as_ref(),
            )?);
        }

        debug!(
            files = files.len(),
            packages = state.packages.len(),
            "closure complete"
        );

        Ok(Closure {
            files,
            packages: state.packages,
            warnings: resolver.warnings().to_vec(),
        })
    }

    /// Phase 1: trace local files until the local worklist is empty.
    fn drain_local(
        &self,
        resolver: &mut ModuleResolver<'_, '_>,
        state: &mut WalkState,
        service_root: &Path,
    ) -> Result<(), TraceError> {
        while let Some(file) = state.local.pop() {
            if !state.visited.insert(file.clone()) {
                continue;
            }
            trace!(file = %file.display(), "scanning");

            let from_dir = file.parent().unwrap_or(service_root);
            for specifier in self.host.imports.extract(&file)? {
                if is_local(&specifier) {
                    let resolved = self
                        .host
                        .resolver
                        .resolve(&specifier, from_dir)
                        .map_err(|failure| local_error(&specifier, &file, failure))?;
                    state.local.push(resolved);
                    continue;
                }

                match resolver.resolve(&specifier, service_root, OptionalPolicy::none())? {
                    Resolution::Found(manifest) => state.modules.push(manifest),
                    Resolution::Redirect(path) => state.local.push(path),
                    Resolution::Skipped => {}
                }
            }
        }
        Ok(())
    }

    /// Phase 2: walk declared dependencies until the module worklist is empty.
    fn drain_modules(
        &self,
        resolver: &mut ModuleResolver<'_, '_>,
        state: &mut WalkState,
        service_root: &Path,
    ) -> Result<(), TraceError> {
        while let Some(manifest) = state.modules.pop() {
            if !state.processed.insert(manifest.root.clone()) {
                continue;
            }
            state.packages.push(manifest.root.clone());

            let policy = manifest.optional_policy();
            for section in DEPENDENCY_SECTIONS {
                let Some(deps) = manifest.section(section) else {
                    continue;
                };
                for name in deps.keys() {
                    match resolver.resolve(name, &manifest.root, policy)? {
                        Resolution::Found(found) => state.modules.push(found),
                        Resolution::Redirect(path) => {
                            state.local.push(path);
                            self.drain_local(resolver, state, service_root)?;
                        }
                        Resolution::Skipped => {}
                    }
                }
            }
        }
        Ok(())
    }
}

/// Relative (`./`, `../`) and absolute specifiers are traced as local files.
fn is_local(specifier: &str) -> bool {
    is_relative(specifier) || Path::new(specifier).is_absolute()
}

fn local_error(specifier: &str, from: &Path, failure: ResolveFailure) -> TraceError {
    match failure {
        ResolveFailure::NotFound { .. } => TraceError::UnresolvedLocal {
            specifier: specifier.to_string(),
            from: from.to_path_buf(),
        },
        ResolveFailure::Invalid { .. } => TraceError::Resolve {
            specifier: specifier.to_string(),
            message: failure.to_string(),
        },
    }
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
