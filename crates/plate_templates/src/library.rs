//! Template libraries: named, prioritized template sources.
//!
//! A library root contains one directory per module, each holding one
//! directory per template:
//!
//! ```text
//! <root>/<module>/<template>/template.yaml
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};

/// Manifest file names, in lookup order.
pub const MANIFEST_FILES: [&str; 2] = ["template.yaml", "template.yml"];

const DEFAULT_BRANCH: &str = "main";
const DEFAULT_DIRECTORY: &str = "library";

/// How a library is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    Git,
    Static,
}

impl LibraryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Static => "static",
        }
    }
}

/// A library entry as written in the user configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LibraryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Templates directory inside a git checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Root of a static library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl LibraryConfig {
    pub fn git(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LibraryKind::Git,
            url: Some(url.into()),
            branch: None,
            directory: None,
            path: None,
        }
    }

    pub fn static_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: LibraryKind::Static,
            url: None,
            branch: None,
            directory: None,
            path: Some(path.into()),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    pub fn directory(&self) -> &str {
        self.directory.as_deref().unwrap_or(DEFAULT_DIRECTORY)
    }

    /// Check that the entry carries what its kind needs.
    pub fn validate(&self) -> TemplateResult<()> {
        let invalid = |message: &str| TemplateError::InvalidLibrary {
            library: self.name.clone(),
            message: message.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.name.contains('/') {
            return Err(invalid("name must not contain '/'"));
        }
        match self.kind {
            LibraryKind::Git => {
                if self.url.as_deref().map_or(true, str::is_empty) {
                    return Err(invalid("git libraries need a url"));
                }
            }
            LibraryKind::Static => {
                if self.path.is_none() {
                    return Err(invalid("static libraries need a path"));
                }
            }
        }
        Ok(())
    }
}

/// Where a library's files come from.
#[derive(Debug, Clone, PartialEq)]
pub enum LibrarySource {
    Git {
        url: String,
        branch: String,
        checkout: PathBuf,
    },
    Static,
}

/// A configured library with its on-disk template root resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Library {
    pub name: String,
    pub root: PathBuf,
    pub source: LibrarySource,
}

impl Library {
    /// A static library rooted at `root`.
    pub fn at(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            source: LibrarySource::Static,
        }
    }

    /// Resolve a configuration entry.
    ///
    /// Relative static paths are taken relative to `base_dir` (the config
    /// file's directory); git libraries are checked out under
    /// `checkouts_dir/<name>`.
    pub fn from_config(
        config: &LibraryConfig,
        base_dir: &Path,
        checkouts_dir: &Path,
    ) -> TemplateResult<Self> {
        config.validate()?;

        match config.kind {
            LibraryKind::Static => {
                let path = config.path.clone().unwrap_or_default();
                let root = if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                };
                Ok(Self::at(&config.name, root))
            }
            LibraryKind::Git => {
                let checkout = checkouts_dir.join(&config.name);
                Ok(Self {
                    name: config.name.clone(),
                    root: checkout.join(config.directory()),
                    source: LibrarySource::Git {
                        url: config.url.clone().unwrap_or_default(),
                        branch: config.branch().to_string(),
                        checkout,
                    },
                })
            }
        }
    }

    pub fn kind(&self) -> LibraryKind {
        match self.source {
            LibrarySource::Git { .. } => LibraryKind::Git,
            LibrarySource::Static => LibraryKind::Static,
        }
    }

    /// Whether the library root is present on disk.
    pub fn is_available(&self) -> bool {
        self.root.is_dir()
    }

    pub fn module_dir(&self, module: &str) -> PathBuf {
        self.root.join(module)
    }

    /// Manifest path of `template` in `module`, if this library has it.
    pub fn manifest_path(&self, module: &str, template: &str) -> Option<PathBuf> {
        let dir = self.module_dir(module).join(template);
        MANIFEST_FILES
            .iter()
            .map(|file| dir.join(file))
            .find(|path| path.is_file())
    }

    /// Template names in `module`, sorted.
    pub fn templates(&self, module: &str) -> TemplateResult<Vec<String>> {
        let dir = self.module_dir(module);
        if !dir.is_dir() {
            debug!("Library '{}' has no module directory {:?}", self.name, dir);
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if MANIFEST_FILES.iter().any(|file| path.join(file).is_file()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Resolve configuration entries in priority order, rejecting duplicate names.
pub fn resolve_libraries(
    configs: &[LibraryConfig],
    base_dir: &Path,
    checkouts_dir: &Path,
) -> TemplateResult<Vec<Library>> {
    let mut seen = HashSet::new();
    let mut libraries = Vec::with_capacity(configs.len());

    for config in configs {
        if !seen.insert(config.name.as_str()) {
            return Err(TemplateError::InvalidLibrary {
                library: config.name.clone(),
                message: "library name is configured more than once".to_string(),
            });
        }
        libraries.push(Library::from_config(config, base_dir, checkouts_dir)?);
    }

    Ok(libraries)
}
