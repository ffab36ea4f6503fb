//! User configuration: template libraries and per-module variable defaults.
//!
//! Stored as YAML at `<config_dir>/plate/config.yaml`:
//!
//! ```yaml
//! libraries:
//!   - name: default
//!     type: git
//!     url: https://github.com/plate-templates/library.git
//!   - name: local
//!     type: static
//!     path: ~/templates
//! defaults:
//!   compose:
//!     container_timezone: Europe/Brussels
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use plate_spec::RawValue;
use plate_templates::{resolve_libraries, Library, LibraryConfig};

use crate::error::{CoreError, CoreResult};

/// Name of the library present when no configuration file exists.
pub const DEFAULT_LIBRARY: &str = "default";
pub const DEFAULT_LIBRARY_URL: &str = "https://github.com/plate-templates/library.git";

/// Contents of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Libraries in priority order (first wins)
    #[serde(default)]
    pub libraries: Vec<LibraryConfig>,
    /// module → variable → value
    #[serde(default)]
    pub defaults: BTreeMap<String, BTreeMap<String, RawValue>>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            libraries: vec![LibraryConfig::git(DEFAULT_LIBRARY, DEFAULT_LIBRARY_URL)],
            defaults: BTreeMap::new(),
        }
    }
}

impl UserConfig {
    /// Empty configuration without any library.
    pub fn empty() -> Self {
        Self {
            libraries: Vec::new(),
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_library(mut self, library: LibraryConfig) -> Self {
        self.libraries.push(library);
        self
    }

    pub fn with_default(
        mut self,
        module: impl Into<String>,
        variable: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        self.set_default(module, variable, value);
        self
    }

    /// The user configuration precedence layer for `module`.
    pub fn defaults_for(&self, module: &str) -> HashMap<String, RawValue> {
        self.defaults
            .get(module)
            .map(|vars| vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    pub fn set_default(
        &mut self,
        module: impl Into<String>,
        variable: impl Into<String>,
        value: impl Into<RawValue>,
    ) {
        self.defaults
            .entry(module.into())
            .or_default()
            .insert(variable.into(), value.into());
    }

    /// Remove a default; returns whether it existed. Empty modules are dropped.
    pub fn remove_default(&mut self, module: &str, variable: &str) -> bool {
        let Some(vars) = self.defaults.get_mut(module) else {
            return false;
        };
        let removed = vars.remove(variable).is_some();
        if vars.is_empty() {
            self.defaults.remove(module);
        }
        removed
    }

    /// Defaults of one module, sorted by variable name.
    pub fn list_defaults(&self, module: &str) -> Vec<(&str, &RawValue)> {
        self.defaults
            .get(module)
            .map(|vars| vars.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default()
    }
}

/// A configuration file on disk. The only writer of that file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: UserConfig,
}

impl ConfigStore {
    /// Default configuration file location.
    pub fn default_path() -> CoreResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("plate").join("config.yaml"))
            .ok_or_else(|| CoreError::Config {
                path: PathBuf::from("config.yaml"),
                message: "no configuration directory available on this platform".to_string(),
            })
    }

    /// Where git libraries are checked out.
    pub fn default_checkouts_dir() -> CoreResult<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("plate").join("libraries"))
            .ok_or_else(|| CoreError::Config {
                path: PathBuf::from("libraries"),
                message: "no data directory available on this platform".to_string(),
            })
    }

    /// Load the file at `path`, or the default location. A missing file
    /// yields the built-in configuration.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            debug!("No configuration at {:?}; using built-in defaults", path);
            return Ok(Self {
                path,
                config: UserConfig::default(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let config: UserConfig = if content.trim().is_empty() {
            UserConfig::empty()
        } else {
            serde_yaml::from_str(&content).map_err(|e| CoreError::Config {
                path: path.clone(),
                message: e.to_string(),
            })?
        };

        for library in &config.libraries {
            library.validate().map_err(|e| CoreError::Config {
                path: path.clone(),
                message: e.to_string(),
            })?;
        }

        info!("Loaded configuration from {:?}", path);
        Ok(Self { path, config })
    }

    pub fn new(path: impl Into<PathBuf>, config: UserConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    /// Directory relative static library paths are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Write the configuration back, creating parent directories.
    pub fn save(&self) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(&self.config)?;
        fs::write(&self.path, content)?;
        debug!("Saved configuration to {:?}", self.path);
        Ok(())
    }

    pub fn set_default(
        &mut self,
        module: &str,
        variable: &str,
        value: impl Into<RawValue>,
    ) -> CoreResult<()> {
        self.config.set_default(module, variable, value);
        self.save()
    }

    pub fn remove_default(&mut self, module: &str, variable: &str) -> CoreResult<bool> {
        let removed = self.config.remove_default(module, variable);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn list_defaults(&self, module: &str) -> Vec<(&str, &RawValue)> {
        self.config.list_defaults(module)
    }

    /// Configured libraries with their roots resolved.
    pub fn libraries(&self, checkouts_dir: &Path) -> CoreResult<Vec<Library>> {
        resolve_libraries(&self.config.libraries, &self.base_dir(), checkouts_dir).map_err(|e| {
            CoreError::Config {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_builtin_library() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::load(Some(&temp.path().join("config.yaml"))).unwrap();
        assert_eq!(store.config().libraries.len(), 1);
        assert_eq!(store.config().libraries[0].name, DEFAULT_LIBRARY);
        assert!(store.config().defaults.is_empty());
    }

    #[test]
    fn test_defaults_round_trip_through_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("config.yaml");

        let mut store = ConfigStore::load(Some(&path)).unwrap();
        store.set_default("compose", "container_timezone", "Europe/Brussels").unwrap();
        store.set_default("compose", "ports_http", 9000i64).unwrap();
        assert!(path.exists());

        let mut reloaded = ConfigStore::load(Some(&path)).unwrap();
        assert_eq!(
            reloaded.list_defaults("compose"),
            vec![
                ("container_timezone", &RawValue::from("Europe/Brussels")),
                ("ports_http", &RawValue::Integer(9000)),
            ]
        );

        assert!(reloaded.remove_default("compose", "ports_http").unwrap());
        assert!(!reloaded.remove_default("compose", "ports_http").unwrap());
        assert!(!reloaded.remove_default("kubernetes", "namespace").unwrap());

        let reloaded = ConfigStore::load(Some(&path)).unwrap();
        assert_eq!(reloaded.config().defaults_for("compose").len(), 1);
    }

    #[test]
    fn test_invalid_library_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "libraries:\n  - name: broken\n    type: git\n").unwrap();

        let err = ConfigStore::load(Some(&path)).unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn test_static_paths_resolve_against_config_dir() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            "libraries:\n  - name: local\n    type: static\n    path: templates\n",
        )
        .unwrap();

        let store = ConfigStore::load(Some(&path)).unwrap();
        let libraries = store.libraries(&temp.path().join("checkouts")).unwrap();
        assert_eq!(libraries[0].root, temp.path().join("templates"));
    }
}
