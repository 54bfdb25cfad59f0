use std::collections::BTreeSet;

use crate::{
    error::ResolveResult,
    resolve::ResolvedModuleRoot,
    tree::{join_rel, WorkspaceTree},
};

/// Every schema file under the given roots, workspace-relative, sorted by
/// path string and deduplicated. Roots that no longer exist add nothing.
pub fn enumerate_schema_files<T: WorkspaceTree + ?Sized>(
    tree: &T,
    roots: &[ResolvedModuleRoot],
    extension: &str,
) -> ResolveResult<Vec<String>> {
    let mut files: BTreeSet<String> = BTreeSet::new();

    for root in roots {
        for rel in tree.schema_files(&root.root_path, extension)? {
            files.insert(join_rel(&root.root_path, &rel));
        }
    }

    Ok(files.into_iter().collect())
}
