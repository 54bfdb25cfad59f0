use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::{
    cli::OutputFormat,
    resolve::ResolvedModuleRoot,
    workspace::ProtoPaths,
};

#[derive(Debug, Serialize)]
struct ReportDoc<'a> {
    workspace: String,
    modules: &'a [ResolvedModuleRoot],
    unresolved: &'a [String],
    file_count: usize,
    files: &'a [String],
}

pub fn build_report(workspace: &Path, paths: &ProtoPaths, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(summary(workspace, paths)),
        OutputFormat::Json => {
            let doc = ReportDoc {
                workspace: workspace.display().to_string(),
                modules: &paths.resolution.roots,
                unresolved: &paths.resolution.unresolved,
                file_count: paths.files.len(),
                files: &paths.files,
            };
            Ok(serde_json::to_string_pretty(&doc)?)
        }
    }
}

pub fn render_paths(paths: &ProtoPaths, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = paths.files.join("\n");
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&paths.files)?),
    }
}

fn summary(workspace: &Path, paths: &ProtoPaths) -> String {
    let mut out = String::new();

    out.push_str("protopath report\n");
    out.push_str("================\n");
    out.push_str(&format!("workspace: {}\n", workspace.display()));

    out.push_str(&format!("\nmodules ({})\n", paths.resolution.roots.len()));
    for r in &paths.resolution.roots {
        out.push_str(&format!(
            "  - {} -> {} [{}]\n",
            r.registration_name, r.root_path, r.source
        ));
    }

    if !paths.resolution.unresolved.is_empty() {
        out.push_str(&format!(
            "\nunresolved ({})\n",
            paths.resolution.unresolved.len()
        ));
        for name in &paths.resolution.unresolved {
            out.push_str(&format!("  - {name}\n"));
        }
    }

    out.push_str(&format!("\nfiles: {}\n", paths.files.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{Resolution, RootSource};

    fn sample() -> ProtoPaths {
        ProtoPaths {
            resolution: Resolution {
                roots: vec![ResolvedModuleRoot {
                    registration_name: "common".to_string(),
                    root_path: "common/proto".to_string(),
                    source: RootSource::ManifestName,
                }],
                unresolved: vec!["ghost".to_string()],
            },
            files: vec![
                "common/proto/a.proto".to_string(),
                "common/proto/sub/b.proto".to_string(),
            ],
        }
    }

    #[test]
    fn text_summary_lists_modules_and_unresolved() {
        let text = build_report(Path::new("/ws"), &sample(), OutputFormat::Text).unwrap();
        assert!(text.contains("  - common -> common/proto [manifest (name)]\n"));
        assert!(text.contains("unresolved (1)\n  - ghost\n"));
        assert!(text.ends_with("files: 2\n"));
    }

    #[test]
    fn json_report_shape() {
        let json = build_report(Path::new("/ws"), &sample(), OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["file_count"], 2);
        assert_eq!(v["modules"][0]["source"], "manifest_name");
        assert_eq!(v["modules"][0]["root_path"], "common/proto");
        assert_eq!(v["unresolved"][0], "ghost");
    }

    #[test]
    fn paths_one_per_line() {
        let text = render_paths(&sample(), OutputFormat::Text).unwrap();
        assert_eq!(text, "common/proto/a.proto\ncommon/proto/sub/b.proto\n");

        let json = render_paths(&sample(), OutputFormat::Json).unwrap();
        let v: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(v, sample().files);
    }
}
