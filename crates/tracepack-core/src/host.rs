//! The capabilities a closure computation consumes.

use crate::collect::{FileLister, WalkLister};
use crate::config::TraceConfig;
use crate::imports::{ImportExtractor, SourceScanner};
use crate::manifest::{FsManifestLocator, ManifestLocator};
use crate::resolver::{ModulePathResolver, NodeResolver};

/// Bundle of collaborator capabilities: import extraction, manifest lookup,
/// module path resolution and directory listing.
///
/// [`Host::native`] wires the filesystem-backed implementations; the `with_*`
/// methods swap one capability out (e.g. to instrument resolution).
pub struct Host {
    pub imports: Box<dyn ImportExtractor>,
    pub manifests: Box<dyn ManifestLocator>,
    pub resolver: Box<dyn ModulePathResolver>,
    pub lister: Box<dyn FileLister>,
}

impl Host {
    #[must_use]
    pub fn native(config: &TraceConfig) -> Self {
        Self {
            imports: Box::new(SourceScanner),
            manifests: Box::new(FsManifestLocator),
            resolver: Box::new(NodeResolver::new(config)),
            lister: Box::new(WalkLister),
        }
    }

    #[must_use]
    pub fn with_imports(mut self, imports: impl ImportExtractor + 'static) -> Self {
        self.imports = Box::new(imports);
        self
    }

    #[must_use]
    pub fn with_manifests(mut self, manifests: impl ManifestLocator + 'static) -> Self {
        self.manifests = Box::new(manifests);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl ModulePathResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    #[must_use]
    pub fn with_lister(mut self, lister: impl FileLister + 'static) -> Self {
        self.lister = Box::new(lister);
        self
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}
