//! The generate/validate pipeline.
//!
//! ```text
//! library load → schema resolve → template merge → activation (pass 1)
//!   → prompting → activation (pass 2) → precedence → autogeneration
//!   → validation
//! ```
//!
//! Every call builds fresh state from the [`GenerationContext`] it is given;
//! nothing is cached between calls. The pipeline never writes files.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use plate_spec::{
    Activation, ActivationEngine, Collection, OrderedMap, PrecedenceResolver, RawValue,
    ResolvedVariableMap, SchemaResolver, SectionPatch, Validator, ValueLayers,
};
use plate_templates::{LibraryResolver, ResolvedTemplate, TemplateDocument};

use crate::config::UserConfig;
use crate::error::{CoreError, CoreResult};
use crate::generate::ValueGenerator;
use crate::module::{Module, ModuleRegistry};
use crate::prompt::Prompter;

/// Everything a resolution reads, passed explicitly.
pub struct GenerationContext<'a> {
    pub registry: &'a ModuleRegistry,
    pub resolver: &'a LibraryResolver,
    pub config: &'a UserConfig,
    pub generator: &'a dyn ValueGenerator,
}

/// What to resolve.
pub struct ResolveRequest<'p> {
    pub module: String,
    /// Bare or qualified template identifier
    pub template: String,
    /// `--var key=value` values, the highest precedence layer
    pub cli_overrides: HashMap<String, RawValue>,
    /// Asked between the activation passes when set
    pub prompter: Option<&'p mut dyn Prompter>,
}

impl<'p> ResolveRequest<'p> {
    pub fn new(module: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            template: template.into(),
            cli_overrides: HashMap::new(),
            prompter: None,
        }
    }

    pub fn with_override(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.cli_overrides.insert(name.into(), value.into());
        self
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, RawValue>) -> Self {
        self.cli_overrides.extend(overrides);
        self
    }

    pub fn with_prompter(mut self, prompter: &'p mut dyn Prompter) -> Self {
        self.prompter = Some(prompter);
        self
    }
}

/// Result of a successful resolution, ready for rendering.
#[derive(Debug)]
pub struct Resolution {
    pub template: ResolvedTemplate,
    pub document: TemplateDocument,
    /// Effective collection after layering and the template merge
    pub collection: Collection,
    /// Final (second pass) activation
    pub activation: Activation,
    pub variables: ResolvedVariableMap,
    pub warnings: Vec<String>,
}

/// Runs the resolution pipeline.
pub struct Pipeline;

impl Pipeline {
    pub fn resolve(context: &GenerationContext<'_>, request: ResolveRequest<'_>) -> CoreResult<Resolution> {
        let ResolveRequest {
            module: module_name,
            template: identifier,
            cli_overrides,
            prompter,
        } = request;

        let module = context.registry.get_required(&module_name)?;
        let loaded = context.resolver.load(&module_name, &identifier)?;
        let mut warnings = Vec::new();

        if loaded.document.metadata.draft {
            let message = format!(
                "Template '{}' is a draft and may not be ready for use",
                loaded.template.id
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let (collection, mut layers) = Self::build(module.as_ref(), &loaded.document, context.config)?;

        let mut unknown: Vec<&String> = cli_overrides
            .keys()
            .filter(|name| collection.variable(name).is_none())
            .collect();
        unknown.sort();
        for name in unknown {
            warnings.push(format!("Ignoring value for unknown variable '{}'", name));
        }
        layers.cli_overrides = cli_overrides;

        let known = PrecedenceResolver::known_values(&collection, &layers);
        let first_pass = ActivationEngine::activate(&collection, &known)?;
        debug!("First pass active sections: {:?}", first_pass.active);

        let activation = match prompter {
            Some(prompter) => {
                let answers = prompter.prompt(&collection, &first_pass, &known)?;
                debug!("Prompter supplied {} answer(s)", answers.len());
                layers.cli_overrides.extend(answers);
                let known = PrecedenceResolver::known_values(&collection, &layers);
                ActivationEngine::activate(&collection, &known)?
            }
            None => first_pass,
        };

        let mut resolved = PrecedenceResolver::resolve(&collection, &activation, &layers);

        let pending: Vec<String> = resolved
            .pending_generation()
            .into_iter()
            .map(String::from)
            .collect();
        for name in pending {
            let variable = collection.variable(&name).ok_or_else(|| CoreError::Generation {
                variable: name.clone(),
                message: "variable is not declared".to_string(),
            })?;
            let value = context.generator.generate(variable)?;
            debug!("Generated value for '{}'", name);
            resolved.fill_generated(&name, value);
        }

        let variables = Validator::validate_all(&collection, &activation, &resolved)?;

        info!(
            "Resolved {} variable(s) in {} active section(s) for {}",
            variables.len(),
            activation.active.len(),
            loaded.template.id
        );

        Ok(Resolution {
            template: loaded.template,
            document: loaded.document,
            collection,
            activation,
            variables,
            warnings,
        })
    }

    /// Schema resolution and template merge, plus the three lower value layers.
    fn build(
        module: &dyn Module,
        document: &TemplateDocument,
        config: &UserConfig,
    ) -> CoreResult<(Collection, ValueLayers)> {
        let declared = document.schema_version();
        let mut collection = SchemaResolver::new(module.schema()).resolve(declared)?;

        let mut layers = ValueLayers::new();
        layers.module_defaults = collection.defaults();
        layers.template_overrides = template_defaults(&document.spec);
        layers.user_config = config.defaults_for(module.name());

        collection.merge(&document.spec)?;
        collection.validate_structure()?;

        Ok((collection, layers))
    }

    /// The module's own collection at its highest version, without a template.
    pub fn module_collection(module: &dyn Module) -> CoreResult<Collection> {
        Ok(SchemaResolver::new(module.schema()).resolve(module.schema_version())?)
    }

    /// Effective collection of a template, without resolving any value.
    pub fn template_collection(module: &dyn Module, document: &TemplateDocument) -> CoreResult<Collection> {
        let (collection, _) = Self::build(module, document, &UserConfig::empty())?;
        Ok(collection)
    }
}

/// Defaults declared in a template's `spec` block.
fn template_defaults(spec: &OrderedMap<SectionPatch>) -> HashMap<String, RawValue> {
    spec.iter()
        .flat_map(|(_, section)| section.vars.iter())
        .filter_map(|(name, var)| var.default.clone().map(|value| (name.to_string(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::MockValueGenerator;
    use crate::prompt::ScriptedPrompter;
    use plate_spec::{SpecError, TypedValue};
    use plate_templates::Library;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const NGINX: &str = r#"
kind: compose
schema: "1.1"
metadata:
  name: Nginx
  description: Web server
  next_steps: Open http://localhost:{{ ports_http }}
spec:
  general:
    vars:
      service_name:
        default: nginx
      container_timezone:
        default: America/New_York
"#;

    fn library() -> (TempDir, LibraryResolver) {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("compose/nginx");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("template.yaml"), NGINX).unwrap();
        let resolver = LibraryResolver::new(vec![Library::at("local", temp.path())]);
        (temp, resolver)
    }

    fn never_generates() -> MockValueGenerator {
        let mut generator = MockValueGenerator::new();
        generator.expect_generate().never();
        generator
    }

    #[test]
    fn test_template_override_beats_module_default() {
        let (_temp, resolver) = library();
        let registry = ModuleRegistry::builtin().unwrap();
        let config = UserConfig::empty();
        let generator = never_generates();
        let context = GenerationContext {
            registry: &registry,
            resolver: &resolver,
            config: &config,
            generator: &generator,
        };

        let resolution = Pipeline::resolve(&context, ResolveRequest::new("compose", "nginx")).unwrap();
        assert_eq!(
            resolution.variables.get("container_timezone"),
            Some(&TypedValue::String("America/New_York".into()))
        );
        assert_eq!(
            resolution.variables.get("service_name"),
            Some(&TypedValue::String("nginx".into()))
        );
        assert!(!resolution.variables.is_section_active("database"));
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_autogeneration_fills_pending_secret() {
        let (_temp, resolver) = library();
        let registry = ModuleRegistry::builtin().unwrap();
        let config = UserConfig::empty();
        let mut generator = MockValueGenerator::new();
        generator
            .expect_generate()
            .withf(|var| var.name == "database_password")
            .times(1)
            .returning(|_| Ok(RawValue::from("s3cret")));
        let context = GenerationContext {
            registry: &registry,
            resolver: &resolver,
            config: &config,
            generator: &generator,
        };

        let request = ResolveRequest::new("compose", "nginx").with_override("database_enabled", "yes");
        let resolution = Pipeline::resolve(&context, request).unwrap();
        assert_eq!(
            resolution.variables.get("database_password"),
            Some(&TypedValue::String("s3cret".into()))
        );
        assert!(resolution.variables.is_sensitive("database_password"));
    }

    #[test]
    fn test_prompt_answers_enable_sections() {
        let (_temp, resolver) = library();
        let registry = ModuleRegistry::builtin().unwrap();
        let config = UserConfig::empty().with_default("compose", "network_name", "proxy");
        let generator = never_generates();
        let context = GenerationContext {
            registry: &registry,
            resolver: &resolver,
            config: &config,
            generator: &generator,
        };

        let mut prompter = ScriptedPrompter::new()
            .answer("network_enabled", true)
            .answer("traefik_enabled", true)
            .answer("traefik_host", "web.example.com");
        let request = ResolveRequest::new("compose", "nginx").with_prompter(&mut prompter);
        let resolution = Pipeline::resolve(&context, request).unwrap();

        assert!(resolution.activation.is_active("traefik"));
        assert_eq!(
            resolution.variables.get("network_name"),
            Some(&TypedValue::String("proxy".into()))
        );
        assert_eq!(prompter.asked.len(), 3);
    }

    #[test]
    fn test_validation_failures_abort_before_rendering() {
        let (_temp, resolver) = library();
        let registry = ModuleRegistry::builtin().unwrap();
        let config = UserConfig::empty();
        let generator = never_generates();
        let context = GenerationContext {
            registry: &registry,
            resolver: &resolver,
            config: &config,
            generator: &generator,
        };

        let request = ResolveRequest::new("compose", "nginx")
            .with_override("restart_policy", "sometimes")
            .with_override("ports_http", "eighty");
        let err = Pipeline::resolve(&context, request).unwrap_err();
        match err {
            CoreError::Spec(SpecError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_module() {
        let (_temp, resolver) = library();
        let registry = ModuleRegistry::builtin().unwrap();
        let config = UserConfig::empty();
        let generator = never_generates();
        let context = GenerationContext {
            registry: &registry,
            resolver: &resolver,
            config: &config,
            generator: &generator,
        };

        let err = Pipeline::resolve(&context, ResolveRequest::new("terraform", "nginx")).unwrap_err();
        assert!(matches!(err, CoreError::ModuleNotFound(_)));
    }
}
