//! Rendering collaborator: turns a template package plus resolved variables
//! into output files, in memory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info};
use walkdir::WalkDir;

use plate_spec::ResolvedVariableMap;

use crate::error::{TemplateError, TemplateResult};
use crate::library::MANIFEST_FILES;

/// Suffixes marking files whose contents get placeholders substituted.
pub const TEMPLATE_SUFFIXES: [&str; 2] = [".j2", ".tmpl"];

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").unwrap()
});

/// A file produced by rendering, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    /// Whether placeholders were substituted (as opposed to a verbatim copy).
    pub rendered: bool,
}

impl RenderedFile {
    pub fn contents_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }
}

/// Anything that can render a template package.
pub trait Renderer {
    fn render(
        &self,
        package_root: &Path,
        variables: &ResolvedVariableMap,
    ) -> TemplateResult<Vec<RenderedFile>>;
}

/// Substitutes `{{ name }}` placeholders in `.j2` / `.tmpl` files.
///
/// Other files are copied verbatim. Unknown placeholders are left untouched;
/// absent values render as empty text.
#[derive(Debug, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Substitute placeholders in a string.
    pub fn render_content(&self, content: &str, variables: &ResolvedVariableMap) -> String {
        PLACEHOLDER_RE
            .replace_all(content, |caps: &Captures| match variables.get(&caps[1]) {
                Some(value) => value.render(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Strip a template suffix, returning `None` for plain files.
    fn template_target(relative: &Path) -> Option<PathBuf> {
        let name = relative.file_name()?.to_str()?;
        TEMPLATE_SUFFIXES.iter().find_map(|suffix| {
            name.strip_suffix(suffix)
                .filter(|stem| !stem.is_empty())
                .map(|stem| relative.with_file_name(stem))
        })
    }
}

impl Renderer for PlaceholderRenderer {
    fn render(
        &self,
        package_root: &Path,
        variables: &ResolvedVariableMap,
    ) -> TemplateResult<Vec<RenderedFile>> {
        info!("Rendering template package {:?}", package_root);
        let mut files = Vec::new();

        for entry in WalkDir::new(package_root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| TemplateError::RenderingFailed {
                path: e.path().unwrap_or(package_root).to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let source = entry.path();
            let Ok(relative) = source.strip_prefix(package_root) else {
                continue;
            };

            if MANIFEST_FILES
                .iter()
                .any(|file| relative == Path::new(file))
            {
                continue;
            }

            match Self::template_target(relative) {
                Some(target) => {
                    let content =
                        fs::read_to_string(source).map_err(|e| TemplateError::RenderingFailed {
                            path: relative.to_path_buf(),
                            message: e.to_string(),
                        })?;
                    let rendered = self.render_content(&content, variables);
                    debug!("Rendered: {:?}", target);
                    files.push(RenderedFile {
                        path: target,
                        contents: rendered.into_bytes(),
                        rendered: true,
                    });
                }
                None => {
                    debug!("Copied: {:?}", relative);
                    files.push(RenderedFile {
                        path: relative.to_path_buf(),
                        contents: fs::read(source)?,
                        rendered: false,
                    });
                }
            }
        }

        Ok(files)
    }
}
