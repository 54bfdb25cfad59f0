use std::path::PathBuf;

use thiserror::Error;

/// Fatal outcomes of a resolution pass.
///
/// None of these are retryable: the same manifest, registrations and
/// workspace tree always produce the same error.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(
        "no module paths resolved (manifest: {manifest}; registrations tried: [{}])",
        registrations.join(", ")
    )]
    NoModulePathsResolved {
        manifest: String,
        registrations: Vec<String>,
    },

    #[error("no schema files found under resolved paths: [{}]", roots.join(", "))]
    NoSchemaFiles { roots: Vec<String> },

    #[error("registrations could not be mapped to a directory: [{}]", names.join(", "))]
    UnresolvedModules { names: Vec<String> },

    #[error("manifest entry starting at line {line} has no path")]
    MalformedManifestEntry { line: usize },

    #[error("manifest declares absolute module path '{path}'")]
    AbsoluteManifestPath { path: String },

    #[error("manifest identifier '{id}' declared by both '{first}' and '{second}'")]
    IdentifierCollision {
        id: String,
        first: String,
        second: String,
    },

    #[error("failed to read manifest at {}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {root}: {message}")]
    Walk { root: String, message: String },
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
