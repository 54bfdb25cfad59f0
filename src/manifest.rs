// src/manifest.rs
//
// Reader for the workspace manifest (buf.yaml style). Only the module list is
// understood; everything else in the file is skipped.

use std::{collections::BTreeMap, fs, io, path::Path};
use tracing::{debug, warn};

use crate::{
    error::{ResolveError, ResolveResult},
    tree::normalize_rel,
};

pub const MODULE_LIST_KEY: &str = "modules:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestEntry {
    pub declared_path: String,
    pub declared_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ManifestMode {
    /// Skip entries without a path and let later identifiers shadow earlier ones.
    #[default]
    Lenient,
    /// Fail on entries without a path and on identifier collisions.
    Strict,
}

/// One manifest line, classified without any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestLine<'a> {
    Blank,
    Comment,
    ModuleListStart,
    /// A column-zero `key:` other than the module list.
    SectionStart,
    /// `- ` list item, possibly carrying its first field inline.
    EntryStart(Option<Field<'a>>),
    Field(Field<'a>),
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    Path(&'a str),
    Name(&'a str),
}

pub fn classify(raw: &str) -> ManifestLine<'_> {
    let line = raw.trim_start();
    if line.trim_end().is_empty() {
        return ManifestLine::Blank;
    }
    if line.starts_with('#') {
        return ManifestLine::Comment;
    }
    if line.trim_end() == MODULE_LIST_KEY {
        return ManifestLine::ModuleListStart;
    }

    if line.trim_end() == "-" {
        return ManifestLine::EntryStart(None);
    }
    if let Some(rest) = line.strip_prefix("- ") {
        return ManifestLine::EntryStart(field(rest.trim_start()));
    }

    if let Some(f) = field(line) {
        return ManifestLine::Field(f);
    }

    let column_zero = !raw.starts_with([' ', '\t']);
    if column_zero {
        if let Some((key, _)) = line.split_once(':') {
            if !key.is_empty() && !key.contains(char::is_whitespace) {
                return ManifestLine::SectionStart;
            }
        }
    }

    ManifestLine::Unrecognized
}

fn field(s: &str) -> Option<Field<'_>> {
    if let Some(v) = s.strip_prefix("path:") {
        return Some(Field::Path(scalar(v)));
    }
    if let Some(v) = s.strip_prefix("name:") {
        return Some(Field::Name(scalar(v)));
    }
    None
}

/// Unquotes a scalar value, or cuts a trailing ` # comment` from a bare one.
fn scalar(v: &str) -> &str {
    let v = v.trim();
    for q in ['"', '\''] {
        if let Some(inner) = v.strip_prefix(q) {
            return match inner.find(q) {
                Some(end) => &inner[..end],
                None => inner,
            };
        }
    }
    match v.find(" #") {
        Some(i) => v[..i].trim_end(),
        None => v,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InModuleList,
}

#[derive(Debug)]
struct OpenEntry {
    line: usize,
    path: Option<String>,
    name: Option<String>,
}

impl OpenEntry {
    fn new(line: usize) -> Self {
        Self {
            line,
            path: None,
            name: None,
        }
    }

    fn apply(&mut self, f: Field<'_>) {
        match f {
            Field::Path(v) => self.path = Some(v.to_string()),
            Field::Name(v) => self.name = Some(v.to_string()).filter(|s| !s.is_empty()),
        }
    }
}

/// Parses manifest text into module declarations, in file order.
///
/// In lenient mode this never fails.
pub fn parse_manifest(text: &str, mode: ManifestMode) -> ResolveResult<Vec<ManifestEntry>> {
    let mut out = Vec::new();
    let mut state = State::Outside;
    let mut open: Option<OpenEntry> = None;
    // indentation of module items, taken from the first `- ` in the list
    let mut item_indent: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;

        match classify(raw) {
            ManifestLine::Blank | ManifestLine::Comment | ManifestLine::Unrecognized => {}

            ManifestLine::ModuleListStart => {
                flush(open.take(), &mut out, mode)?;
                state = State::InModuleList;
                item_indent = None;
            }

            ManifestLine::SectionStart => {
                if state == State::InModuleList {
                    flush(open.take(), &mut out, mode)?;
                    state = State::Outside;
                }
            }

            ManifestLine::EntryStart(inline) => {
                if state != State::InModuleList {
                    continue;
                }
                // deeper items belong to a nested list such as `excludes:`
                let indent = indent_of(raw);
                if indent > *item_indent.get_or_insert(indent) {
                    continue;
                }
                flush(open.take(), &mut out, mode)?;
                let mut entry = OpenEntry::new(line_no);
                if let Some(f) = inline {
                    entry.apply(f);
                }
                open = Some(entry);
            }

            ManifestLine::Field(f) => {
                if state != State::InModuleList {
                    continue;
                }
                if let Some(entry) = open.as_mut() {
                    entry.apply(f);
                }
            }
        }
    }

    flush(open.take(), &mut out, mode)?;
    Ok(out)
}

fn indent_of(raw: &str) -> usize {
    raw.len() - raw.trim_start().len()
}

fn flush(
    open: Option<OpenEntry>,
    out: &mut Vec<ManifestEntry>,
    mode: ManifestMode,
) -> ResolveResult<()> {
    let Some(entry) = open else { return Ok(()); };

    match entry.path.filter(|p| !p.is_empty()) {
        Some(path) => {
            out.push(ManifestEntry {
                declared_path: path,
                declared_name: entry.name,
            });
            Ok(())
        }
        None if mode == ManifestMode::Strict => {
            Err(ResolveError::MalformedManifestEntry { line: entry.line })
        }
        None => {
            warn!(line = entry.line, "skipping manifest entry without a path");
            Ok(())
        }
    }
}

/// Reads and parses the manifest. A missing file is an empty manifest.
pub fn load_manifest(path: &Path, mode: ManifestMode) -> ResolveResult<Vec<ManifestEntry>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(manifest = %path.display(), "no manifest; using directory conventions only");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ResolveError::ManifestRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_manifest(&text, mode)
}

/// Derived identifier -> declared root path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestIndex {
    ids: BTreeMap<String, String>,
}

impl ManifestIndex {
    /// Each entry contributes the last segment of its path (with the schema
    /// suffix stripped) and the last segment of its name. Later entries win.
    pub fn build(
        entries: &[ManifestEntry],
        schema_dir: &str,
        mode: ManifestMode,
    ) -> ResolveResult<Self> {
        let mut ids: BTreeMap<String, String> = BTreeMap::new();

        for entry in entries {
            if is_absolute(&entry.declared_path) {
                if mode == ManifestMode::Strict {
                    return Err(ResolveError::AbsoluteManifestPath {
                        path: entry.declared_path.clone(),
                    });
                }
                warn!(path = %entry.declared_path, "skipping absolute manifest path");
                continue;
            }

            let path = normalize_rel(&entry.declared_path);

            let keys = path_identifier(&path, schema_dir)
                .into_iter()
                .chain(entry.declared_name.as_deref().and_then(name_identifier));

            for id in keys {
                if let Some(prev) = ids.get(&id) {
                    if *prev != path {
                        if mode == ManifestMode::Strict {
                            return Err(ResolveError::IdentifierCollision {
                                id,
                                first: prev.clone(),
                                second: path.clone(),
                            });
                        }
                        warn!(%id, shadowed = %prev, by = %path, "manifest identifier collision");
                    }
                }
                ids.insert(id, path.clone());
            }
        }

        Ok(Self { ids })
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.ids.get(id).map(String::as_str)
    }

}
/// Module paths are workspace-relative; `/x`, `\x` and `C:\x` are not.
/// Module paths are workspace-relative; `/x`, `\\x` and `C:\\x` are not.
fn is_absolute(p: &str) -> bool {
    let p = p.trim();
    p.starts_with(['/', '\\']) || Path::new(p).is_absolute()
}

fn path_identifier(path: &str, schema_dir: &str) -> Option<String> {
    let suffix = format!("/{schema_dir}");
    let base = path.strip_suffix(&suffix).unwrap_or(path);
    base.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn name_identifier(name: &str) -> Option<String> {
    name.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
