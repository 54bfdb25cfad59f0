// src/workspace.rs
//
// One resolution pass: manifest -> index -> module roots -> schema files.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::{
    enumerate::enumerate_schema_files,
    error::{ResolveError, ResolveResult},
    manifest::{load_manifest, parse_manifest, ManifestEntry, ManifestIndex, ManifestMode},
    resolve::{ModulePathResolver, ModuleRegistration, Resolution},
    tree::{DiskTree, WorkspaceTree},
};

pub const DEFAULT_MANIFEST: &str = "buf.yaml";
pub const DEFAULT_SCHEMA_DIR: &str = "proto";
pub const DEFAULT_EXTENSION: &str = "proto";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Manifest location, relative to the workspace root.
    pub manifest: String,
    pub schema_dir: String,
    pub extension: String,
    pub mode: ManifestMode,
    /// Fail when any registration stays unresolved.
    pub require_all: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            manifest: DEFAULT_MANIFEST.to_string(),
            schema_dir: DEFAULT_SCHEMA_DIR.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            mode: ManifestMode::Lenient,
            require_all: false,
        }
    }
}

/// Output of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoPaths {
    pub resolution: Resolution,
    /// Sorted, deduplicated, forward-slash separated.
    pub files: Vec<String>,
}

/// Pure core of a pass. `manifest_text` is `None` when the workspace has no
/// manifest.
pub fn resolve_proto_paths<T: WorkspaceTree + ?Sized>(
    opts: &ResolveOptions,
    manifest_text: Option<&str>,
    registrations: &[ModuleRegistration],
    tree: &T,
) -> ResolveResult<ProtoPaths> {
    let entries = match manifest_text {
        Some(text) => parse_manifest(text, opts.mode)?,
        None => Vec::new(),
    };
    finish(opts, &entries, registrations, tree)
}

fn finish<T: WorkspaceTree + ?Sized>(
    opts: &ResolveOptions,
    entries: &[ManifestEntry],
    registrations: &[ModuleRegistration],
    tree: &T,
) -> ResolveResult<ProtoPaths> {
    let index = ManifestIndex::build(entries, &opts.schema_dir, opts.mode)?;
    let resolution = ModulePathResolver::new(&index, tree, &opts.schema_dir).resolve(registrations);

    if resolution.roots.is_empty() {
        return Err(ResolveError::NoModulePathsResolved {
            manifest: opts.manifest.clone(),
            registrations: registrations.iter().map(|r| r.name.clone()).collect(),
        });
    }

    if opts.require_all && !resolution.unresolved.is_empty() {
        return Err(ResolveError::UnresolvedModules {
            names: resolution.unresolved.clone(),
        });
    }

    let files = enumerate_schema_files(tree, &resolution.roots, &opts.extension)?;
    if files.is_empty() {
        return Err(ResolveError::NoSchemaFiles {
            roots: resolution.root_paths(),
        });
    }

    info!(
        modules = resolution.roots.len(),
        unresolved = resolution.unresolved.len(),
        files = files.len(),
        "resolved schema path filters"
    );

    Ok(ProtoPaths { resolution, files })
}

/// A workspace on disk.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    opts: ResolveOptions,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, opts: ResolveOptions) -> Self {
        Self {
            root: root.into(),
            opts,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.opts
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.opts.manifest)
    }

    pub fn resolve(&self, registrations: &[ModuleRegistration]) -> ResolveResult<ProtoPaths> {
        let entries = load_manifest(&self.manifest_path(), self.opts.mode)?;
        let tree = DiskTree::new(&self.root);

        let mut opts = self.opts.clone();
        opts.manifest = self.manifest_path().display().to_string();
        finish(&opts, &entries, registrations, &tree)
    }
}
