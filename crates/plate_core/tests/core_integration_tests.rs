//! Integration tests for the resolution pipeline over on-disk libraries.

use std::fs;
use std::path::Path;

use plate_core::{
    ConfigStore, CoreError, GenerationContext, ModuleRegistry, Pipeline, RandomValueGenerator,
    ResolveRequest,
};
use plate_spec::{SpecError, TypedValue};
use plate_templates::{LibraryResolver, PlaceholderRenderer, Renderer, TemplateError};
use tempfile::{tempdir, TempDir};

fn write_template(root: &Path, module: &str, id: &str, manifest: &str, files: &[(&str, &str)]) {
    let dir = root.join(module).join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("template.yaml"), manifest).unwrap();
    for (name, contents) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}

const WEB_APP: &str = r#"
kind: kubernetes
schema: "1.1"
metadata:
  name: Web App
  description: Stateless web deployment
  version: 2.0.0
  tags: [web]
  next_steps: kubectl apply -f deployment.yaml
spec:
  general:
    vars:
      release_name:
        default: web
      container_port:
        type: int
        default: 8080
"#;

const DEPLOYMENT: &str = "name: {{ release_name }}\nnamespace: {{ namespace }}\nreplicas: {{ replicas }}\nport: {{ container_port }}\n";

/// Config file with two static libraries, `team` ahead of `shared`.
fn setup() -> (TempDir, ConfigStore) {
    let temp = tempdir().unwrap();
    let team = temp.path().join("team");
    let shared = temp.path().join("shared");

    write_template(&team, "kubernetes", "web-app", WEB_APP, &[("deployment.yaml.j2", DEPLOYMENT)]);
    write_template(
        &shared,
        "kubernetes",
        "web-app",
        &WEB_APP.replace("default: web", "default: shared-web"),
        &[("deployment.yaml.j2", DEPLOYMENT)],
    );
    write_template(
        &shared,
        "kubernetes",
        "experimental",
        "kind: kubernetes\nmetadata:\n  name: Experimental\n  draft: true\n",
        &[],
    );

    let config_path = temp.path().join("config.yaml");
    fs::write(
        &config_path,
        r#"
libraries:
  - name: team
    type: static
    path: team
  - name: shared
    type: static
    path: shared
defaults:
  kubernetes:
    namespace: apps
"#,
    )
    .unwrap();

    let store = ConfigStore::load(Some(&config_path)).unwrap();
    (temp, store)
}

fn resolver(temp: &TempDir, store: &ConfigStore) -> LibraryResolver {
    LibraryResolver::new(store.libraries(&temp.path().join("checkouts")).unwrap())
}

#[test]
fn test_generate_resolves_layers_and_renders() {
    let (temp, store) = setup();
    let resolver = resolver(&temp, &store);
    let registry = ModuleRegistry::builtin().unwrap();
    let generator = RandomValueGenerator::new();
    let context = GenerationContext {
        registry: &registry,
        resolver: &resolver,
        config: store.config(),
        generator: &generator,
    };

    let request = ResolveRequest::new("kubernetes", "web-app").with_override("replicas", "3");
    let resolution = Pipeline::resolve(&context, request).unwrap();

    assert_eq!(resolution.template.library, "team");
    // template override, user config, CLI override and module default (1.1)
    assert_eq!(resolution.variables.get("release_name"), Some(&TypedValue::String("web".into())));
    assert_eq!(resolution.variables.get("namespace"), Some(&TypedValue::String("apps".into())));
    assert_eq!(resolution.variables.get("replicas"), Some(&TypedValue::Integer(3)));
    assert_eq!(resolution.variables.get("container_port"), Some(&TypedValue::Integer(8080)));

    let files = PlaceholderRenderer::new()
        .render(&resolution.template.root, &resolution.variables)
        .unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(
        files[0].contents_str(),
        Some("name: web\nnamespace: apps\nreplicas: 3\nport: 8080\n")
    );
}

#[test]
fn test_qualified_identifier_picks_lower_priority_library() {
    let (temp, store) = setup();
    let resolver = resolver(&temp, &store);
    let registry = ModuleRegistry::builtin().unwrap();
    let generator = RandomValueGenerator::new();
    let context = GenerationContext {
        registry: &registry,
        resolver: &resolver,
        config: store.config(),
        generator: &generator,
    };

    let resolution =
        Pipeline::resolve(&context, ResolveRequest::new("kubernetes", "web-app.shared")).unwrap();
    assert_eq!(resolution.template.library, "shared");
    assert_eq!(
        resolution.variables.get("release_name"),
        Some(&TypedValue::String("shared-web".into()))
    );
}

#[test]
fn test_draft_template_resolves_with_warning() {
    let (temp, store) = setup();
    let resolver = resolver(&temp, &store);
    let registry = ModuleRegistry::builtin().unwrap();
    let generator = RandomValueGenerator::new();
    let context = GenerationContext {
        registry: &registry,
        resolver: &resolver,
        config: store.config(),
        generator: &generator,
    };

    let request = ResolveRequest::new("kubernetes", "experimental").with_override("release_name", "x");
    let resolution = Pipeline::resolve(&context, request).unwrap();
    assert_eq!(resolution.warnings.len(), 1);
    assert!(resolution.warnings[0].contains("draft"));
    // declared no schema, so 1.0: the 1.1 override of replicas does not apply
    assert_eq!(resolution.variables.get("replicas"), Some(&TypedValue::Integer(1)));
}

#[test]
fn test_missing_required_value_fails() {
    let (temp, store) = setup();
    let resolver = resolver(&temp, &store);
    let registry = ModuleRegistry::builtin().unwrap();
    let generator = RandomValueGenerator::new();
    let context = GenerationContext {
        registry: &registry,
        resolver: &resolver,
        config: store.config(),
        generator: &generator,
    };

    let err = Pipeline::resolve(&context, ResolveRequest::new("kubernetes", "experimental")).unwrap_err();
    let CoreError::Spec(spec_err) = err else {
        panic!("expected a spec error");
    };
    let errors = spec_err.validation_errors().unwrap();
    assert!(errors.for_variable("release_name").is_some());
}

#[test]
fn test_unsupported_and_circular_templates() {
    let temp = tempdir().unwrap();
    write_template(
        temp.path(),
        "compose",
        "future",
        "kind: compose\nschema: \"2.0\"\nmetadata:\n  name: Future\n",
        &[],
    );
    write_template(
        temp.path(),
        "compose",
        "loop",
        r#"
kind: compose
metadata:
  name: Loop
spec:
  alpha:
    needs: beta
  beta:
    needs: alpha
"#,
        &[],
    );

    let resolver = LibraryResolver::new(vec![plate_templates::Library::at("local", temp.path())]);
    let registry = ModuleRegistry::builtin().unwrap();
    let config = plate_core::UserConfig::empty();
    let generator = RandomValueGenerator::new();
    let context = GenerationContext {
        registry: &registry,
        resolver: &resolver,
        config: &config,
        generator: &generator,
    };

    let err = Pipeline::resolve(&context, ResolveRequest::new("compose", "future")).unwrap_err();
    assert!(matches!(err, CoreError::Spec(SpecError::UnsupportedSchema { .. })));

    let err = Pipeline::resolve(&context, ResolveRequest::new("compose", "loop")).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Spec(SpecError::CircularSectionDependency { .. })
    ));

    let err = Pipeline::resolve(&context, ResolveRequest::new("compose", "missing")).unwrap_err();
    assert!(matches!(err, CoreError::Template(TemplateError::NotFound { .. })));
}
