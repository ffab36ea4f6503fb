//! Git synchronization of template libraries.
//!
//! Runs before resolution; the resolver itself only reads local files.

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::{TemplateError, TemplateResult};
use crate::library::{Library, LibrarySource};

/// What happened to one library during a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated,
    /// Nothing to do (static library)
    Skipped(String),
    Failed(String),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloned => write!(f, "cloned"),
            Self::Updated => write!(f, "updated"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Per-library result of [`LibrarySync::sync_all`].
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub library: String,
    pub outcome: SyncOutcome,
}

/// Clones or fast-forwards git libraries using the `git` executable.
#[derive(Debug, Default)]
pub struct LibrarySync;

impl LibrarySync {
    pub fn new() -> Self {
        Self
    }

    /// Check if Git is available on the system.
    pub fn is_git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Sync every library; failures are reported, not propagated.
    pub fn sync_all(&self, libraries: &[Library]) -> Vec<SyncReport> {
        libraries
            .iter()
            .map(|library| {
                let outcome = match self.sync(library) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Sync of library '{}' failed: {}", library.name, e);
                        SyncOutcome::Failed(e.to_string())
                    }
                };
                SyncReport {
                    library: library.name.clone(),
                    outcome,
                }
            })
            .collect()
    }

    /// Sync one library.
    pub fn sync(&self, library: &Library) -> TemplateResult<SyncOutcome> {
        let LibrarySource::Git {
            url,
            branch,
            checkout,
        } = &library.source
        else {
            return Ok(SyncOutcome::Skipped("static library".to_string()));
        };

        if checkout.join(".git").exists() {
            info!("Updating library '{}' in {}", library.name, checkout.display());
            self.git(&library.name, checkout, &["pull", "--ff-only"])?;
            Ok(SyncOutcome::Updated)
        } else {
            info!("Cloning library '{}' from {}", library.name, url);
            if let Some(parent) = checkout.parent() {
                fs::create_dir_all(parent)?;
            }
            let target = checkout.to_string_lossy();
            let parent = checkout.parent().unwrap_or_else(|| Path::new("."));
            self.git(
                &library.name,
                parent,
                &["clone", "--depth", "1", "--branch", branch.as_str(), url.as_str(), &*target],
            )?;
            Ok(SyncOutcome::Cloned)
        }
    }

    fn git(&self, library: &str, dir: &Path, args: &[&str]) -> TemplateResult<()> {
        debug!("Running git {:?} in {}", args, dir.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| TemplateError::SyncFailed {
                library: library.to_string(),
                message: format!("Failed to run git: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TemplateError::SyncFailed {
                library: library.to_string(),
                message: format!("git {} failed: {}", args[0], stderr.trim()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_libraries_are_skipped() {
        let reports = LibrarySync::new().sync_all(&[Library::at("local", "/nonexistent")]);
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].outcome, SyncOutcome::Skipped(_)));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(SyncOutcome::Cloned.to_string(), "cloned");
        assert_eq!(
            SyncOutcome::Failed("no network".into()).to_string(),
            "failed: no network"
        );
        assert!(SyncOutcome::Failed(String::new()).is_failure());
    }
}
