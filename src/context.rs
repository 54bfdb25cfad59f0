use anyhow::{anyhow, bail, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{
    cli::Args,
    config::{Config, GenerateConfig},
    manifest::ManifestMode,
    resolve::ModuleRegistration,
    workspace::Workspace,
};

pub const CONFIG_ENV: &str = "PROTOPATH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "protopath.toml";

/// Everything one invocation needs, after config and CLI overrides are merged.
#[derive(Debug)]
pub struct RunContext {
    pub config_path: Option<PathBuf>,
    pub workspace: Workspace,
    pub registrations: Vec<ModuleRegistration>,
    pub generate: Option<GenerateConfig>,
}

impl RunContext {
    pub fn from_args(args: &Args) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let env_config = std::env::var(CONFIG_ENV).ok();
        Self::build(args, env_config.as_deref(), &cwd)
    }

    pub fn build(args: &Args, env_config: Option<&str>, cwd: &Path) -> Result<Self> {
        let config_path = locate_config(args.config.as_deref(), env_config, cwd)?;

        let mut cfg = match config_path.as_ref() {
            Some(p) => {
                debug!(config = %p.display(), "loading config");
                Config::load_from_path(p)?
            }
            None if args.workspace.is_some() => Config::default(),
            None => bail!(
                "no config found: pass --config, set {CONFIG_ENV}, create {}, or pass --workspace",
                cwd.join(DEFAULT_CONFIG_FILE).display()
            ),
        };

        // CLI overrides
        if let Some(ws) = args.workspace.as_ref() {
            cfg.workspace.root = cwd.join(ws);
        }
        if !args.modules.is_empty() {
            cfg.modules = parse_module_args(&args.modules)?;
        }
        if args.strict_manifest {
            cfg.workspace.strict_manifest = true;
        }
        if args.require_all {
            cfg.workspace.require_all = true;
        }

        if cfg.modules.is_empty() {
            bail!("no modules registered: add [[modules]] to the config or pass --module");
        }

        let opts = cfg.resolve_options();
        if opts.mode == ManifestMode::Strict {
            debug!("strict manifest parsing enabled");
        }

        Ok(Self {
            config_path,
            workspace: Workspace::new(cfg.workspace.root.clone(), opts),
            registrations: cfg.modules,
            generate: cfg.generate,
        })
    }
}

/// Config path precedence:
/// 1) --config (must exist)
/// 2) PROTOPATH_CONFIG (must exist)
/// 3) ./protopath.toml (optional)
pub fn locate_config(
    cli_config: Option<&Path>,
    env_config: Option<&str>,
    cwd: &Path,
) -> Result<Option<PathBuf>> {
    if let Some(p) = cli_config {
        let p = cwd.join(p);
        if !p.is_file() {
            bail!("--config was provided but file does not exist: {}", p.display());
        }
        return Ok(Some(p));
    }

    if let Some(raw) = env_config.map(str::trim).filter(|s| !s.is_empty()) {
        let p = cwd.join(raw);
        if !p.is_file() {
            bail!("{CONFIG_ENV} is set but file does not exist: {}", p.display());
        }
        return Ok(Some(p));
    }

    let p = cwd.join(DEFAULT_CONFIG_FILE);
    Ok(p.is_file().then_some(p))
}

fn parse_module_args(raw: &[String]) -> Result<Vec<ModuleRegistration>> {
    raw.iter()
        .map(|r| {
            ModuleRegistration::parse(r)
                .ok_or_else(|| anyhow!("invalid --module '{r}': expected NAME or NAME:SUBDIR"))
        })
        .collect()
}
