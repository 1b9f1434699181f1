//! The agent definition aggregate.
//!
//! [`AgentDefinition`] holds intents, custom entities and contexts in
//! memory, guards name uniqueness at registration time, and validates
//! referential integrity: every context or custom entity referenced by an
//! intent must be declared in the agent.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::language::LanguageCode;
use crate::model::context::Context;
use crate::model::entity::{CustomEntity, EntityRef};
use crate::model::intent::Intent;

/// Serializable shape of an agent definition, as written in `agent.toml`.
///
/// The manifest is plain data; building an [`AgentDefinition`] from it runs
/// all registration checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentManifest {
    pub name: String,
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageCode>,
    #[serde(default)]
    pub intents: Vec<Intent>,
    #[serde(default)]
    pub entities: Vec<CustomEntity>,
    #[serde(default)]
    pub contexts: Vec<Context>,
}

fn default_languages() -> Vec<LanguageCode> {
    vec![LanguageCode::En]
}

/// In-memory agent definition with by-name lookups.
///
/// Intents keep their insertion order, which is also the order they appear
/// in exports.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    name: String,
    languages: Vec<LanguageCode>,
    intents: Vec<Intent>,
    intents_by_name: HashMap<String, usize>,
    intents_by_event: HashMap<String, String>,
    entities: HashMap<String, CustomEntity>,
    contexts: HashMap<String, Context>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            languages: default_languages(),
            intents: Vec::new(),
            intents_by_name: HashMap::new(),
            intents_by_event: HashMap::new(),
            entities: HashMap::new(),
            contexts: HashMap::new(),
        }
    }

    /// Build a definition from a manifest, running all registration checks.
    pub fn from_manifest(manifest: AgentManifest) -> Result<Self, ApiError> {
        let mut agent = Self::new(manifest.name);
        if !manifest.languages.is_empty() {
            agent.languages = manifest.languages;
        }
        for context in manifest.contexts {
            agent.register_context(context)?;
        }
        for entity in manifest.entities {
            agent.register_entity(entity)?;
        }
        for intent in manifest.intents {
            agent.register_intent(intent)?;
        }
        Ok(agent)
    }

    /// Load a manifest from a TOML file and build the definition.
    pub fn from_toml_file(path: &Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let manifest: AgentManifest = toml::from_str(&content).map_err(|e| {
            ApiError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Self::from_manifest(manifest)
    }

    /// Turn the definition back into its serializable manifest shape.
    pub fn to_manifest(&self) -> AgentManifest {
        let mut entities: Vec<CustomEntity> = self.entities.values().cloned().collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));
        let mut contexts: Vec<Context> = self.contexts.values().cloned().collect();
        contexts.sort_by(|a, b| a.name.cmp(&b.name));
        AgentManifest {
            name: self.name.clone(),
            languages: self.languages.clone(),
            intents: self.intents.clone(),
            entities,
            contexts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn languages(&self) -> &[LanguageCode] {
        &self.languages
    }

    pub fn set_languages(&mut self, languages: Vec<LanguageCode>) {
        if !languages.is_empty() {
            self.languages = languages;
        }
    }

    /// Register an intent. Rejects duplicate intent names and duplicate
    /// event associations (one intent per event). Output contexts are
    /// registered as agent contexts as a side effect.
    pub fn register_intent(&mut self, intent: Intent) -> Result<(), ApiError> {
        intent.validate()?;

        if self.intents_by_name.contains_key(&intent.name) {
            return Err(ApiError::ValidationError(format!(
                "Another intent exists with name '{}'",
                intent.name
            )));
        }

        for event in intent.all_events() {
            if let Some(existing) = self.intents_by_event.get(&event) {
                return Err(ApiError::ValidationError(format!(
                    "Event '{}' is already associated to intent '{}'; an event can only trigger one intent",
                    event, existing
                )));
            }
        }

        for context in &intent.output_contexts {
            self.register_context(context.clone())?;
        }

        debug!(intent = %intent.name, "registering intent");
        for event in intent.all_events() {
            self.intents_by_event.insert(event, intent.name.clone());
        }
        self.intents_by_name
            .insert(intent.name.clone(), self.intents.len());
        self.intents.push(intent);
        Ok(())
    }

    /// Register a custom entity. Re-registering an identical definition is
    /// a no-op; a different definition under the same name is an error.
    pub fn register_entity(&mut self, entity: CustomEntity) -> Result<(), ApiError> {
        if entity.name.is_empty() {
            return Err(ApiError::ValidationError(
                "Entity name cannot be empty".to_string(),
            ));
        }
        if let Some(existing) = self.entities.get(&entity.name) {
            if *existing != entity {
                return Err(ApiError::ValidationError(format!(
                    "Two different entities exist with the same name: '{}'",
                    entity.name
                )));
            }
            return Ok(());
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Register a context. Same idempotency rule as entities.
    pub fn register_context(&mut self, context: Context) -> Result<(), ApiError> {
        if context.name.is_empty() {
            return Err(ApiError::ValidationError(
                "Context name cannot be empty".to_string(),
            ));
        }
        if let Some(existing) = self.contexts.get(&context.name) {
            if *existing != context {
                return Err(ApiError::ValidationError(format!(
                    "Two different contexts exist with the same name: '{}'",
                    context.name
                )));
            }
            return Ok(());
        }
        self.contexts.insert(context.name.clone(), context);
        Ok(())
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn intent_by_name(&self, name: &str) -> Option<&Intent> {
        self.intents_by_name.get(name).map(|&i| &self.intents[i])
    }

    pub fn intent_by_event(&self, event: &str) -> Option<&Intent> {
        self.intents_by_event
            .get(event)
            .and_then(|name| self.intent_by_name(name))
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&CustomEntity> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &CustomEntity> {
        self.entities.values()
    }

    pub fn context_by_name(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    /// Validate referential integrity across the whole agent.
    ///
    /// Collects every violation rather than stopping at the first one, so
    /// editing tools can show a full report.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.name.clone());

        for intent in &self.intents {
            for context_name in &intent.input_contexts {
                if !self.contexts.contains_key(context_name) {
                    report.add_error(format!(
                        "Intent '{}' requires input context '{}', which is not declared in the agent",
                        intent.name, context_name
                    ));
                }
            }

            for param in &intent.parameters {
                if let EntityRef::Custom(entity_name) = &param.entity {
                    if !self.entities.contains_key(entity_name) {
                        report.add_error(format!(
                            "Parameter '{}' of intent '{}' references entity '{}', which is not declared in the agent",
                            param.name, intent.name, entity_name
                        ));
                    }
                }

                if param.is_list {
                    if let Some(default) = &param.default {
                        if !default.trim_start().starts_with('[') {
                            report.add_error(format!(
                                "List parameter '{}' of intent '{}' has non-list default value '{}'",
                                param.name, intent.name, default
                            ));
                        }
                    }
                }
            }
        }

        report
    }
}

/// Outcome of agent validation: the list of integrity violations found.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub agent_name: String,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn new(agent_name: String) -> Self {
        Self {
            agent_name,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert the report into a hard error when invalid.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(format!(
                "Agent '{}' failed validation: {}",
                self.agent_name,
                self.errors.join("; ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::SystemEntity;
    use crate::model::intent::Parameter;

    fn toy_agent() -> AgentDefinition {
        AgentDefinition::new("toy_agent")
    }

    #[test]
    fn test_register_intent_rejects_duplicates() {
        let mut agent = toy_agent();
        agent.register_intent(Intent::new("order_pizza")).unwrap();
        let err = agent.register_intent(Intent::new("order_pizza"));
        assert!(err.is_err());
    }

    #[test]
    fn test_register_intent_rejects_event_clash() {
        let mut agent = toy_agent();
        agent.register_intent(Intent::new("order_pizza")).unwrap();

        // Distinct name, but derives the same E_ORDER_PIZZA event.
        let clashing = Intent::new("order.pizza");
        assert!(agent.register_intent(clashing).is_err());
    }

    #[test]
    fn test_output_contexts_are_registered() {
        let mut agent = toy_agent();
        let intent = Intent::new("order_pizza")
            .with_output_contexts(vec![Context::with_default_lifespan("order_followup")]);
        agent.register_intent(intent).unwrap();
        assert!(agent.context_by_name("order_followup").is_some());
    }

    #[test]
    fn test_context_registration_is_idempotent() {
        let mut agent = toy_agent();
        agent
            .register_context(Context::new("order_followup", 2))
            .unwrap();
        agent
            .register_context(Context::new("order_followup", 2))
            .unwrap();
        assert!(agent
            .register_context(Context::new("order_followup", 5))
            .is_err());
    }

    #[test]
    fn test_validate_missing_input_context() {
        let mut agent = toy_agent();
        let intent =
            Intent::new("confirm_order").with_input_contexts(vec!["order_followup".to_string()]);
        agent.register_intent(intent).unwrap();

        let report = agent.validate();
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("order_followup"));
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_validate_missing_custom_entity() {
        let mut agent = toy_agent();
        let intent = Intent::new("order_pizza").with_parameters(vec![Parameter::new(
            "pizza_type",
            EntityRef::Custom("pizza_type".to_string()),
        )]);
        agent.register_intent(intent).unwrap();

        let report = agent.validate();
        assert!(!report.is_valid());
    }

    #[test]
    fn test_validate_complete_agent() {
        let mut agent = toy_agent();
        agent
            .register_entity(CustomEntity::new("pizza_type"))
            .unwrap();
        let order = Intent::new("order_pizza")
            .with_parameters(vec![
                Parameter::new("pizza_type", EntityRef::Custom("pizza_type".to_string())),
                Parameter::new("user_name", EntityRef::System(SystemEntity::Person))
                    .with_default("friend"),
            ])
            .with_output_contexts(vec![Context::with_default_lifespan("order_followup")]);
        agent.register_intent(order).unwrap();
        let confirm =
            Intent::new("confirm_order").with_input_contexts(vec!["order_followup".to_string()]);
        agent.register_intent(confirm).unwrap();

        assert!(agent.validate().is_valid());
        assert!(agent.intent_by_event("E_ORDER_PIZZA").is_some());
        assert_eq!(
            agent.intent_by_event("E_CONFIRM_ORDER").unwrap().name,
            "confirm_order"
        );
    }

    #[test]
    fn test_manifest_roundtrip() {
        let mut agent = toy_agent();
        agent
            .register_entity(CustomEntity::new("pizza_type"))
            .unwrap();
        agent
            .register_intent(Intent::new("order_pizza").with_parameters(vec![Parameter::new(
                "pizza_type",
                EntityRef::Custom("pizza_type".to_string()),
            )]))
            .unwrap();

        let manifest = agent.to_manifest();
        let rebuilt = AgentDefinition::from_manifest(manifest.clone()).unwrap();
        assert_eq!(rebuilt.to_manifest(), manifest);
    }

    #[test]
    fn test_manifest_from_toml() {
        let toml_src = r#"
            name = "toy_agent"
            languages = ["en", "it"]

            [[contexts]]
            name = "order_followup"

            [[entities]]
            name = "pizza_type"

            [[intents]]
            name = "order_pizza"

            [[intents.parameters]]
            name = "pizza_type"
            entity = "pizza_type"

            [[intents.parameters]]
            name = "user_name"
            entity = "sys.person"
            default = "friend"
        "#;
        let manifest: AgentManifest = toml::from_str(toml_src).unwrap();
        let agent = AgentDefinition::from_manifest(manifest).unwrap();
        assert_eq!(agent.languages(), &[LanguageCode::En, LanguageCode::It]);
        assert!(agent.validate().is_valid());
        let intent = agent.intent_by_name("order_pizza").unwrap();
        assert!(intent.parameter("pizza_type").unwrap().required());
        assert!(!intent.parameter("user_name").unwrap().required());
    }
}
