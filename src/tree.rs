// src/tree.rs
//
// Read-only view of the workspace. Every path crossing this boundary is
// workspace-relative and forward-slash separated.

use std::{collections::BTreeSet, fs, path::PathBuf};

use tracing::warn;

use crate::error::{ResolveError, ResolveResult};

pub trait WorkspaceTree {
    /// True if `rel` names an existing directory under the workspace root.
    fn is_dir(&self, rel: &str) -> bool;

    /// Schema files under `rel_root`, relative to `rel_root`.
    ///
    /// A missing `rel_root` yields an empty list.
    fn schema_files(&self, rel_root: &str, extension: &str) -> ResolveResult<Vec<String>>;
}

/// Collapses `\`, `./` and doubled or trailing slashes. The workspace root
/// itself normalizes to "".
pub fn normalize_rel(p: &str) -> String {
    p.split(['/', '\\'])
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins two workspace-relative fragments into one normalized path.
pub fn join_rel(base: &str, rel: &str) -> String {
    let base = normalize_rel(base);
    let rel = normalize_rel(rel);
    match (base.is_empty(), rel.is_empty()) {
        (true, _) => rel,
        (_, true) => base,
        _ => format!("{base}/{rel}"),
    }
}

// -------------------- disk --------------------

#[derive(Debug, Clone)]
pub struct DiskTree {
    root: PathBuf,
}

impl DiskTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, rel: &str) -> PathBuf {
        let rel = normalize_rel(rel);
        if rel.is_empty() {
            return self.root.clone();
        }
        rel.split('/').fold(self.root.clone(), |acc, seg| acc.join(seg))
    }
}

impl WorkspaceTree for DiskTree {
    fn is_dir(&self, rel: &str) -> bool {
        self.abs(rel).is_dir()
    }

    /// Walks real directories only. Symlinked directories are not entered,
    /// so a link back into the tree cannot repeat files under new names;
    /// symlinked files are kept.
    fn schema_files(&self, rel_root: &str, extension: &str) -> ResolveResult<Vec<String>> {
        let base = self.abs(rel_root);
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let walk_err = |message: String| ResolveError::Walk {
            root: rel_root.to_string(),
            message,
        };

        let pattern = glob::Pattern::new(&format!("*.{}", glob::Pattern::escape(extension)))
            .map_err(|e| walk_err(e.to_string()))?;

        let mut out = Vec::new();
        let mut pending = vec![base.clone()];

        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(e) => e,
                Err(e) if dir == base => return Err(walk_err(e.to_string())),
                Err(e) => {
                    warn!(root = %rel_root, dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };

            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                let Ok(ft) = entry.file_type() else { continue; };

                let is_file = if ft.is_dir() {
                    pending.push(path);
                    continue;
                } else if ft.is_symlink() {
                    path.is_file()
                } else {
                    ft.is_file()
                };

                if !is_file || !pattern.matches(&entry.file_name().to_string_lossy()) {
                    continue;
                }

                let Ok(rel) = path.strip_prefix(&base) else { continue; };
                out.push(rel.to_string_lossy().to_string());
            }
        }

        Ok(out)
    }
}

// -------------------- memory --------------------

/// A workspace described by its file listing alone. Directories exist
/// implicitly as ancestors of listed files.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    files: BTreeSet<String>,
}

impl MemoryTree {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            files: files
                .into_iter()
                .map(|f| normalize_rel(f.as_ref()))
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    fn under<'a>(&'a self, rel: &str) -> impl Iterator<Item = &'a str> + 'a {
        let prefix = match normalize_rel(rel) {
            r if r.is_empty() => String::new(),
            r => format!("{r}/"),
        };
        self.files
            .iter()
            .filter_map(move |f| f.strip_prefix(prefix.as_str()))
    }
}

impl WorkspaceTree for MemoryTree {
    fn is_dir(&self, rel: &str) -> bool {
        self.under(rel).next().is_some()
    }

    fn schema_files(&self, rel_root: &str, extension: &str) -> ResolveResult<Vec<String>> {
        let suffix = format!(".{extension}");
        Ok(self
            .under(rel_root)
            .filter(|f| f.ends_with(&suffix))
            .map(str::to_string)
            .collect())
    }
}
