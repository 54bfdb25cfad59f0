use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{
    manifest::ManifestMode,
    resolve::ModuleRegistration,
    workspace::{ResolveOptions, DEFAULT_EXTENSION, DEFAULT_MANIFEST, DEFAULT_SCHEMA_DIR},
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Registrations, in the order they are declared.
    #[serde(default)]
    pub modules: Vec<ModuleRegistration>,

    #[serde(default)]
    pub generate: Option<GenerateConfig>,
}

impl Config {
    /// Loads a config file and anchors its relative paths at the file's directory.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let mut cfg: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        cfg.anchor(base);
        Ok(cfg)
    }

    fn anchor(&mut self, base: &Path) {
        if self.workspace.root.is_relative() {
            self.workspace.root = base.join(&self.workspace.root);
        }

        // bare binary names are looked up on PATH; anything with a directory is anchored
        if let Some(gen) = self.generate.as_mut() {
            if gen.binary.is_relative() && gen.binary.components().count() > 1 {
                gen.binary = base.join(&gen.binary);
            }
        }
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        let ws = &self.workspace;
        ResolveOptions {
            manifest: ws.manifest.clone(),
            schema_dir: ws.schema_dir.clone(),
            extension: ws.extension.trim_start_matches('.').to_string(),
            mode: if ws.strict_manifest {
                ManifestMode::Strict
            } else {
                ManifestMode::Lenient
            },
            require_all: ws.require_all,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Conventional schema folder inside a module, e.g. `common/proto`.
    #[serde(default = "default_schema_dir")]
    pub schema_dir: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default)]
    pub strict_manifest: bool,

    #[serde(default)]
    pub require_all: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            manifest: default_manifest(),
            schema_dir: default_schema_dir(),
            extension: default_extension(),
            strict_manifest: false,
            require_all: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_manifest() -> String {
    DEFAULT_MANIFEST.to_string()
}

fn default_schema_dir() -> String {
    DEFAULT_SCHEMA_DIR.to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    /// Already-downloaded executable, or a name on PATH.
    pub binary: PathBuf,

    #[serde(default = "default_generate_args")]
    pub args: Vec<String>,

    /// Passed as `--template <file>`; relative to the workspace root.
    #[serde(default)]
    pub template: Option<String>,

    #[serde(default = "default_path_flag")]
    pub path_flag: String,

    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_generate_args() -> Vec<String> {
    vec!["generate".to_string()]
}

fn default_path_flag() -> String {
    "--path".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let cfg: Config = toml::from_str("").unwrap();
        let opts = cfg.resolve_options();
        assert_eq!(opts, ResolveOptions::default());
        assert!(cfg.modules.is_empty());
        assert!(cfg.generate.is_none());
    }

    #[test]
    fn full_config() {
        let text = r#"
[workspace]
root = "schemas"
manifest = "buf.work.yaml"
schema_dir = "protos"
extension = ".proto"
strict_manifest = true
require_all = true

[[modules]]
name = "common"

[[modules]]
name = "config"
subdir = "cfg"

[generate]
binary = "bin/buf"
template = "buf.gen.yaml"
extra_args = ["--include-imports"]
"#;
        let mut cfg: Config = toml::from_str(text).unwrap();
        cfg.anchor(Path::new("/repo"));

        assert_eq!(cfg.workspace.root, PathBuf::from("/repo/schemas"));
        assert_eq!(
            cfg.modules,
            vec![
                ModuleRegistration::new("common"),
                ModuleRegistration::new("config").with_subdir("cfg"),
            ]
        );

        let opts = cfg.resolve_options();
        assert_eq!(opts.manifest, "buf.work.yaml");
        assert_eq!(opts.schema_dir, "protos");
        assert_eq!(opts.extension, "proto");
        assert_eq!(opts.mode, ManifestMode::Strict);
        assert!(opts.require_all);

        let gen = cfg.generate.unwrap();
        assert_eq!(gen.binary, PathBuf::from("/repo/bin/buf"));
        assert_eq!(gen.args, vec!["generate"]);
        assert_eq!(gen.path_flag, "--path");
        assert_eq!(gen.template.as_deref(), Some("buf.gen.yaml"));
    }

    #[test]
    fn bare_binary_name_is_left_for_path_lookup() {
        let mut cfg: Config = toml::from_str("[generate]\nbinary = \"buf\"\n").unwrap();
        cfg.anchor(Path::new("/repo"));
        assert_eq!(cfg.generate.unwrap().binary, PathBuf::from("buf"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[workspace]\nrooot = \"x\"\n").is_err());
    }
}
