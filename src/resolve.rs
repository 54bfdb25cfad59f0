use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::{
    manifest::ManifestIndex,
    tree::{join_rel, normalize_rel, WorkspaceTree},
};

/// A module the build asked for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleRegistration {
    pub name: String,

    #[serde(default)]
    pub subdir: Option<String>,
}

impl ModuleRegistration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subdir: None,
        }
    }

    pub fn with_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }

    /// The subdirectory override, or the name when there is none.
    pub fn subdir_or_name(&self) -> &str {
        self.subdir
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// Parses `name` or `name:subdir`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, subdir) = match raw.split_once(':') {
            Some((n, s)) => (n.trim(), Some(s.trim()).filter(|s| !s.is_empty())),
            None => (raw.trim(), None),
        };
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            subdir: subdir.map(str::to_string),
        })
    }
}

/// Which rule produced a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSource {
    ManifestName,
    ManifestSubdir,
    ConventionSubdir,
    ConventionName,
    BareSubdir,
    BareName,
}

impl fmt::Display for RootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RootSource::ManifestName => "manifest (name)",
            RootSource::ManifestSubdir => "manifest (subdir)",
            RootSource::ConventionSubdir => "convention (subdir)",
            RootSource::ConventionName => "convention (name)",
            RootSource::BareSubdir => "directory (subdir)",
            RootSource::BareName => "directory (name)",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModuleRoot {
    pub registration_name: String,
    pub root_path: String,
    pub source: RootSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// In registration order. Two registrations may share a root.
    pub roots: Vec<ResolvedModuleRoot>,
    /// Registration names that matched nothing, in registration order.
    pub unresolved: Vec<String>,
}

impl Resolution {
    pub fn root_paths(&self) -> Vec<String> {
        self.roots.iter().map(|r| r.root_path.clone()).collect()
    }
}

pub struct ModulePathResolver<'a, T: WorkspaceTree + ?Sized> {
    pub index: &'a ManifestIndex,
    pub tree: &'a T,
    pub schema_dir: &'a str,
}

impl<'a, T: WorkspaceTree + ?Sized> ModulePathResolver<'a, T> {
    pub fn new(index: &'a ManifestIndex, tree: &'a T, schema_dir: &'a str) -> Self {
        Self {
            index,
            tree,
            schema_dir,
        }
    }

    pub fn resolve(&self, registrations: &[ModuleRegistration]) -> Resolution {
        let mut out = Resolution::default();

        for reg in registrations {
            match self.resolve_one(reg) {
                Some((root_path, source)) => {
                    debug!(module = %reg.name, root = %root_path, %source, "resolved module root");
                    out.roots.push(ResolvedModuleRoot {
                        registration_name: reg.name.clone(),
                        root_path,
                        source,
                    });
                }
                None => {
                    warn!(module = %reg.name, "module did not resolve to any directory");
                    out.unresolved.push(reg.name.clone());
                }
            }
        }

        out
    }

    /// First match wins. Manifest hits are trusted without checking the disk.
    pub fn resolve_one(&self, reg: &ModuleRegistration) -> Option<(String, RootSource)> {
        let name = reg.name.as_str();
        let subdir = reg.subdir_or_name();

        // 1) manifest by registration name
        if let Some(p) = self.index.get(name) {
            return Some((normalize_rel(p), RootSource::ManifestName));
        }

        // 2) manifest by subdir (or name)
        if let Some(p) = self.index.get(subdir) {
            return Some((normalize_rel(p), RootSource::ManifestSubdir));
        }

        // 3-6) on-disk conventions
        let candidates = [
            (join_rel(subdir, self.schema_dir), RootSource::ConventionSubdir),
            (join_rel(name, self.schema_dir), RootSource::ConventionName),
            (normalize_rel(subdir), RootSource::BareSubdir),
            (normalize_rel(name), RootSource::BareName),
        ];

        candidates
            .into_iter()
            .filter(|(p, _)| !p.is_empty())
            .find(|(p, _)| self.tree.is_dir(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        manifest::{ManifestEntry, ManifestMode},
        tree::MemoryTree,
    };

    fn index(entries: &[(&str, Option<&str>)]) -> ManifestIndex {
        let entries: Vec<ManifestEntry> = entries
            .iter()
            .map(|(p, n)| ManifestEntry {
                declared_path: p.to_string(),
                declared_name: n.map(str::to_string),
            })
            .collect();
        ManifestIndex::build(&entries, "proto", ManifestMode::Lenient).unwrap()
    }

    fn resolve_one(
        idx: &ManifestIndex,
        tree: &MemoryTree,
        reg: ModuleRegistration,
    ) -> Option<(String, RootSource)> {
        ModulePathResolver::new(idx, tree, "proto").resolve_one(&reg)
    }

    #[test]
    fn parses_registration_shorthand() {
        assert_eq!(
            ModuleRegistration::parse("config:cfg"),
            Some(ModuleRegistration::new("config").with_subdir("cfg"))
        );
        assert_eq!(
            ModuleRegistration::parse(" common "),
            Some(ModuleRegistration::new("common"))
        );
        assert_eq!(
            ModuleRegistration::parse("common:"),
            Some(ModuleRegistration::new("common"))
        );
        assert_eq!(ModuleRegistration::parse(":cfg"), None);
    }

    #[test]
    fn manifest_path_entry_resolves_by_name() {
        let idx = index(&[("common/proto", None)]);
        let tree = MemoryTree::default();
        assert_eq!(
            resolve_one(&idx, &tree, ModuleRegistration::new("common")),
            Some(("common/proto".to_string(), RootSource::ManifestName))
        );
    }

    #[test]
    fn manifest_lookup_falls_back_to_subdir() {
        let idx = index(&[("schemas/cfg/proto", None)]);
        let tree = MemoryTree::default();
        assert_eq!(
            resolve_one(
                &idx,
                &tree,
                ModuleRegistration::new("config").with_subdir("cfg")
            ),
            Some(("schemas/cfg/proto".to_string(), RootSource::ManifestSubdir))
        );
    }

    #[test]
    fn manifest_wins_over_convention() {
        let idx = index(&[("vendor/common/proto", None)]);
        let tree = MemoryTree::new(["common/proto/a.proto", "vendor/common/proto/a.proto"]);
        assert_eq!(
            resolve_one(&idx, &tree, ModuleRegistration::new("common")),
            Some(("vendor/common/proto".to_string(), RootSource::ManifestName))
        );
    }

    #[test]
    fn convention_without_manifest() {
        let idx = ManifestIndex::default();
        let tree = MemoryTree::new(["billing/proto/invoice.proto"]);
        assert_eq!(
            resolve_one(&idx, &tree, ModuleRegistration::new("billing")),
            Some(("billing/proto".to_string(), RootSource::ConventionName))
        );
    }

    #[test]
    fn subdir_convention_before_name_convention() {
        let idx = ManifestIndex::default();
        let tree = MemoryTree::new(["cfg/proto/x.proto", "config/proto/y.proto"]);
        assert_eq!(
            resolve_one(
                &idx,
                &tree,
                ModuleRegistration::new("config").with_subdir("cfg")
            ),
            Some(("cfg/proto".to_string(), RootSource::ConventionSubdir))
        );
    }

    #[test]
    fn bare_directories_are_last_resort() {
        let idx = ManifestIndex::default();
        let tree = MemoryTree::new(["cfg/x.proto", "events/y.proto"]);
        assert_eq!(
            resolve_one(
                &idx,
                &tree,
                ModuleRegistration::new("config").with_subdir("cfg")
            ),
            Some(("cfg".to_string(), RootSource::BareSubdir))
        );
        assert_eq!(
            resolve_one(
                &idx,
                &tree,
                ModuleRegistration::new("events").with_subdir("evt")
            ),
            Some(("events".to_string(), RootSource::BareName))
        );
    }

    #[test]
    fn unresolved_registrations_are_reported_in_order() {
        let idx = index(&[("common/proto", None)]);
        let tree = MemoryTree::new(["billing/proto/a.proto"]);
        let regs = vec![
            ModuleRegistration::new("ghost"),
            ModuleRegistration::new("common"),
            ModuleRegistration::new("phantom"),
            ModuleRegistration::new("billing"),
        ];

        let res = ModulePathResolver::new(&idx, &tree, "proto").resolve(&regs);
        assert_eq!(res.root_paths(), vec!["common/proto", "billing/proto"]);
        assert_eq!(res.unresolved, vec!["ghost", "phantom"]);
    }

    #[test]
    fn duplicate_roots_are_kept_per_registration() {
        let idx = index(&[("common/proto", Some("acme/shared"))]);
        let tree = MemoryTree::default();
        let regs = vec![
            ModuleRegistration::new("common"),
            ModuleRegistration::new("shared"),
        ];

        let res = ModulePathResolver::new(&idx, &tree, "proto").resolve(&regs);
        assert_eq!(res.root_paths(), vec!["common/proto", "common/proto"]);
        assert_eq!(res.roots[1].registration_name, "shared");
    }
}
