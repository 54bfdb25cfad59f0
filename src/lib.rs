pub mod cli;
pub mod config;
pub mod context;
pub mod enumerate;
pub mod error;
pub mod invoke;
pub mod manifest;
pub mod report;
pub mod resolve;
pub mod tree;
pub mod workspace;

pub use config::{Config, GenerateConfig};
pub use context::RunContext;
pub use enumerate::enumerate_schema_files;
pub use error::{ResolveError, ResolveResult};
pub use invoke::GenerateCommand;
pub use manifest::{load_manifest, parse_manifest, ManifestEntry, ManifestIndex, ManifestMode};
pub use resolve::{ModulePathResolver, ModuleRegistration, Resolution, ResolvedModuleRoot, RootSource};
pub use tree::{DiskTree, MemoryTree, WorkspaceTree};
pub use workspace::{resolve_proto_paths, ProtoPaths, ResolveOptions, Workspace};
