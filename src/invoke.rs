use anyhow::{bail, Context as _, Result};
use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};
use tracing::info;

use crate::config::GenerateConfig;

/// The external generate step: one run, from the workspace root, with one
/// path filter per schema file.
#[derive(Debug, Clone)]
pub struct GenerateCommand {
    binary: PathBuf,
    args: Vec<String>,
    template: Option<String>,
    path_flag: String,
    extra_args: Vec<String>,
}

impl From<&GenerateConfig> for GenerateCommand {
    fn from(cfg: &GenerateConfig) -> Self {
        Self {
            binary: cfg.binary.clone(),
            args: cfg.args.clone(),
            template: cfg.template.clone(),
            path_flag: cfg.path_flag.clone(),
            extra_args: cfg.extra_args.clone(),
        }
    }
}

impl GenerateCommand {
    /// Arguments after the binary.
    pub fn argv(&self, files: &[String]) -> Vec<String> {
        let mut out = self.args.clone();

        if let Some(t) = self.template.as_ref() {
            out.push("--template".to_string());
            out.push(t.clone());
        }

        for f in files {
            out.push(self.path_flag.clone());
            out.push(f.clone());
        }

        out.extend(self.extra_args.iter().cloned());
        out
    }

    /// Shell-style rendering for dry runs.
    pub fn render(&self, files: &[String]) -> String {
        let mut words = vec![quote(&self.binary.to_string_lossy())];
        words.extend(self.argv(files).iter().map(|a| quote(a)));
        words.join(" ")
    }

    pub fn run(&self, workspace_root: &Path, files: &[String]) -> Result<()> {
        info!(
            binary = %self.binary.display(),
            cwd = %workspace_root.display(),
            paths = files.len(),
            "running generate"
        );

        let out = Command::new(&self.binary)
            .args(self.argv(files))
            .current_dir(workspace_root)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to launch {}", self.binary.display()))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            bail!(
                "{} exited with {}: {}",
                self.binary.display(),
                out.status,
                stderr.trim()
            );
        }

        Ok(())
    }
}

fn quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@+".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(binary: &str, args: &[&str]) -> GenerateCommand {
        GenerateCommand {
            binary: PathBuf::from(binary),
            args: args.iter().map(|s| s.to_string()).collect(),
            template: None,
            path_flag: "--path".to_string(),
            extra_args: Vec::new(),
        }
    }

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn argv_repeats_path_flag_per_file() {
        let mut cmd = command("buf", &["generate"]);
        cmd.template = Some("buf.gen.yaml".to_string());
        cmd.extra_args = vec!["--include-imports".to_string()];

        assert_eq!(
            cmd.argv(&files(&["a/proto/x.proto", "b/proto/y.proto"])),
            vec![
                "generate",
                "--template",
                "buf.gen.yaml",
                "--path",
                "a/proto/x.proto",
                "--path",
                "b/proto/y.proto",
                "--include-imports",
            ]
        );
    }

    #[test]
    fn render_quotes_unusual_words() {
        let cmd = command("/opt/buf tools/buf", &["generate"]);
        assert_eq!(
            cmd.render(&files(&["it's/a.proto"])),
            r#"'/opt/buf tools/buf' generate --path 'it'\''s/a.proto'"#
        );
    }

    #[test]
    fn missing_binary_is_reported() {
        let cmd = command("protopath-definitely-not-installed", &[]);
        let err = cmd.run(&std::env::temp_dir(), &[]).unwrap_err();
        assert!(err
            .to_string()
            .contains("failed to launch protopath-definitely-not-installed"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_surfaces_stderr() {
        let cmd = command("sh", &["-c", "echo boom >&2; exit 3"]);
        let err = cmd.run(&std::env::temp_dir(), &files(&["a.proto"])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("boom"), "{msg}");
        assert!(msg.contains('3'), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn successful_command_runs_in_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = command("sh", &["-c", "test -f marker.txt"]);

        assert!(cmd.run(dir.path(), &[]).is_err());
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        cmd.run(dir.path(), &[]).unwrap();
    }
}
