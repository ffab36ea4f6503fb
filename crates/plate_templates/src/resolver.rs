//! Library resolver: maps template identifiers to template packages.
//!
//! Libraries are searched in configured priority order (index 0 highest).
//! A bare identifier resolves to the first library that has the template;
//! same-named templates in later libraries are shadowed, never merged. A
//! qualified identifier (`nginx.my-library`) only looks in the named library.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use plate_spec::SchemaVersion;

use crate::error::{TemplateError, TemplateResult};
use crate::identifier::TemplateId;
use crate::library::Library;
use crate::manifest::{TemplateDocument, TemplateMetadata};

/// A template located in a library.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    /// Bare template name
    pub id: String,
    /// Owning library
    pub library: String,
    /// Package directory
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    /// Unparsed `template.yaml`
    pub raw: String,
}

/// A resolved template with its manifest parsed.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub template: ResolvedTemplate,
    pub document: TemplateDocument,
}

/// One row of a multi-library listing.
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    pub id: String,
    pub library: String,
    pub root: PathBuf,
    pub metadata: TemplateMetadata,
    pub schema: SchemaVersion,
    /// A higher-priority library has a template with the same id.
    pub shadowed: bool,
}

impl TemplateEntry {
    /// Identifier that always resolves to this entry.
    pub fn qualified_id(&self) -> String {
        TemplateId::qualified(&self.id, &self.library).to_string()
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.id.to_lowercase().contains(&query)
            || self.metadata.name.to_lowercase().contains(&query)
            || self.metadata.description.to_lowercase().contains(&query)
            || self
                .metadata
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&query))
    }
}

/// Resolves template identifiers against an ordered list of libraries.
#[derive(Debug, Clone, Default)]
pub struct LibraryResolver {
    libraries: Vec<Library>,
}

impl LibraryResolver {
    pub fn new(libraries: Vec<Library>) -> Self {
        Self { libraries }
    }

    /// Libraries in priority order.
    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.name == name)
    }

    /// Libraries that exist on disk; missing roots are skipped with a warning.
    fn available(&self) -> impl Iterator<Item = &Library> {
        self.libraries.iter().filter(|library| {
            let available = library.is_available();
            if !available {
                warn!(
                    "Library '{}' not found at {:?}; skipping (run `plate repo sync`?)",
                    library.name, library.root
                );
            }
            available
        })
    }

    /// Locate `identifier` within `module` and read its manifest.
    pub fn resolve(&self, module: &str, identifier: &str) -> TemplateResult<ResolvedTemplate> {
        let id: TemplateId = identifier.parse()?;

        if let Some(library_name) = &id.library {
            let library = self
                .library(library_name)
                .ok_or_else(|| TemplateError::UnknownLibrary(library_name.clone()))?;
            return match library.manifest_path(module, &id.template) {
                Some(manifest_path) => Self::read(library, &id.template, manifest_path),
                None => Err(TemplateError::NotFoundInLibrary {
                    identifier: identifier.to_string(),
                    library: library_name.clone(),
                }),
            };
        }

        let mut searched = Vec::new();
        for library in self.available() {
            searched.push(library.name.clone());
            if let Some(manifest_path) = library.manifest_path(module, &id.template) {
                return Self::read(library, &id.template, manifest_path);
            }
            debug!("Template '{}' not in library '{}'", id.template, library.name);
        }

        Err(TemplateError::NotFound {
            identifier: identifier.to_string(),
            searched,
        })
    }

    fn read(library: &Library, id: &str, manifest_path: PathBuf) -> TemplateResult<ResolvedTemplate> {
        let raw = fs::read_to_string(&manifest_path)?;
        let root = manifest_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| library.root.clone());
        info!("Resolved template: {} (library: {})", id, library.name);
        Ok(ResolvedTemplate {
            id: id.to_string(),
            library: library.name.clone(),
            root,
            manifest_path,
            raw,
        })
    }

    /// Resolve and parse; the manifest `kind` must name `module`.
    pub fn load(&self, module: &str, identifier: &str) -> TemplateResult<LoadedTemplate> {
        let template = self.resolve(module, identifier)?;
        let document = TemplateDocument::parse(&template.id, &template.raw)?;

        if document.kind != module {
            return Err(TemplateError::InvalidManifest {
                template: template.id,
                message: format!(
                    "kind '{}' does not match module '{}'",
                    document.kind, module
                ),
            });
        }

        Ok(LoadedTemplate { template, document })
    }

    /// Every template of `module` in every library, in priority order.
    ///
    /// Unparseable manifests are skipped with a warning.
    pub fn list(&self, module: &str) -> TemplateResult<Vec<TemplateEntry>> {
        let mut entries: Vec<TemplateEntry> = Vec::new();

        for library in self.available() {
            for id in library.templates(module)? {
                let Some(manifest_path) = library.manifest_path(module, &id) else {
                    continue;
                };
                let document = match fs::read_to_string(&manifest_path)
                    .map_err(TemplateError::from)
                    .and_then(|raw| TemplateDocument::parse(&id, &raw))
                {
                    Ok(document) => document,
                    Err(e) => {
                        warn!("Failed to load template from {:?}: {}", manifest_path, e);
                        continue;
                    }
                };

                let shadowed = entries.iter().any(|e| e.id == id);
                if shadowed {
                    debug!("Template '{}' in library '{}' is shadowed", id, library.name);
                }
                entries.push(TemplateEntry {
                    root: library.module_dir(module).join(&id),
                    library: library.name.clone(),
                    schema: document.schema_version(),
                    metadata: document.metadata,
                    shadowed,
                    id,
                });
            }
        }

        Ok(entries)
    }

    /// `list` filtered by a case-insensitive substring on id, name, description and tags.
    pub fn search(&self, module: &str, query: &str) -> TemplateResult<Vec<TemplateEntry>> {
        Ok(self
            .list(module)?
            .into_iter()
            .filter(|entry| entry.matches(query))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_template(root: &std::path::Path, module: &str, id: &str, name: &str) {
        let dir = root.join(module).join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("template.yaml"),
            format!("kind: {module}\nmetadata:\n  name: {name}\n  tags: [web]\n"),
        )
        .unwrap();
    }

    #[test]
    fn test_qualified_identifier_bypasses_priority() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        write_template(a.path(), "compose", "nginx", "Nginx A");
        write_template(b.path(), "compose", "nginx", "Nginx B");

        let resolver = LibraryResolver::new(vec![
            Library::at("a", a.path()),
            Library::at("b", b.path()),
        ]);

        assert_eq!(resolver.resolve("compose", "nginx").unwrap().library, "a");
        assert_eq!(resolver.resolve("compose", "nginx.b").unwrap().library, "b");
    }

    #[test]
    fn test_unknown_library_in_qualified_identifier() {
        let resolver = LibraryResolver::new(vec![]);
        let err = resolver.resolve("compose", "nginx.nowhere").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownLibrary(_)));
    }

    #[test]
    fn test_missing_library_root_is_skipped() {
        let a = tempdir().unwrap();
        write_template(a.path(), "compose", "redis", "Redis");
        let resolver = LibraryResolver::new(vec![
            Library::at("missing", a.path().join("does-not-exist")),
            Library::at("a", a.path()),
        ]);

        assert_eq!(resolver.resolve("compose", "redis").unwrap().library, "a");
        match resolver.resolve("compose", "postgres").unwrap_err() {
            TemplateError::NotFound { searched, .. } => assert_eq!(searched, vec!["a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_rejects_kind_mismatch() {
        let a = tempdir().unwrap();
        write_template(a.path(), "compose", "nginx", "Nginx");
        fs::create_dir_all(a.path().join("kubernetes/nginx")).unwrap();
        fs::copy(
            a.path().join("compose/nginx/template.yaml"),
            a.path().join("kubernetes/nginx/template.yaml"),
        )
        .unwrap();

        let resolver = LibraryResolver::new(vec![Library::at("a", a.path())]);
        assert!(resolver.load("compose", "nginx").is_ok());
        let err = resolver.load("kubernetes", "nginx").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidManifest { .. }));
    }
}
