//! Intent definitions.
//!
//! An intent is a categorical representation of what the user wants in a
//! single conversation turn: utterances like "I want a pizza" and "I'd like
//! to order a pizza" both map to an `order_pizza` intent. Each intent
//! declares the parameters it extracts, the contexts it requires and spawns,
//! and the events that can trigger it without NLU matching.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::context::Context;
use crate::model::entity::EntityRef;

static RE_INVALID_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z_.]").expect("invalid name charset regex"));

/// Check an intent name against the platform naming rules.
///
/// Valid names contain only letters, underscores and dots, start with a
/// letter, and never repeat underscores (repeated underscores collide when
/// names are mapped to event identifiers).
pub fn validate_intent_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("must not be empty".to_string());
    }
    if RE_INVALID_NAME_CHARS.is_match(name) {
        return Err("must only contain letters, underscore or dot".to_string());
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err("must start with a letter".to_string());
    }
    if name.contains("__") {
        return Err("must not contain __".to_string());
    }
    Ok(())
}

/// Derive the event identifier associated with every intent.
///
/// `order.pizza` becomes `E_ORDER_PIZZA`. Triggering this event forces the
/// intent without NLU matching.
pub fn event_name(intent_name: &str) -> String {
    format!("E_{}", intent_name.to_uppercase().replace('.', "_"))
}

/// A parameter extracted from the user utterance when the intent matches.
///
/// A parameter is required when it has no default value; the platform will
/// run slot filling to ask the user for missing required parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub entity: EntityRef,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, entity: EntityRef) -> Self {
        Self {
            name: name.into(),
            entity,
            is_list: false,
            default: None,
        }
    }

    pub fn list(name: impl Into<String>, entity: EntityRef) -> Self {
        Self {
            is_list: true,
            ..Self::new(name, entity)
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn required(&self) -> bool {
        self.default.is_none()
    }
}

/// An intent definition: name, parameters, context wiring and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Names of contexts that must be active for this intent to match.
    #[serde(default)]
    pub input_contexts: Vec<String>,

    /// Contexts this intent spawns when it matches, with their lifespans.
    #[serde(default)]
    pub output_contexts: Vec<Context>,

    /// Additional trigger events, beyond the derived one.
    #[serde(default)]
    pub events: Vec<String>,
}

impl Intent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            input_contexts: Vec::new(),
            output_contexts: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_input_contexts(mut self, contexts: Vec<String>) -> Self {
        self.input_contexts = contexts;
        self
    }

    pub fn with_output_contexts(mut self, contexts: Vec<Context>) -> Self {
        self.output_contexts = contexts;
        self
    }

    /// The derived event identifier for this intent.
    pub fn event_name(&self) -> String {
        event_name(&self.name)
    }

    /// All events that can trigger this intent: the derived one first, then
    /// any explicitly declared ones.
    pub fn all_events(&self) -> Vec<String> {
        let mut result = vec![self.event_name()];
        for event in &self.events {
            if !result.contains(event) {
                result.push(event.clone());
            }
        }
        result
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check the intent definition in isolation (name rules, parameter
    /// uniqueness). Cross-references to contexts and entities are checked by
    /// the owning agent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Err(reason) = validate_intent_name(&self.name) {
            return Err(ApiError::ValidationError(format!(
                "Invalid intent name '{}': {}",
                self.name, reason
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for param in &self.parameters {
            if param.name.is_empty() {
                return Err(ApiError::ValidationError(format!(
                    "Intent '{}' has a parameter with an empty name",
                    self.name
                )));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(ApiError::ValidationError(format!(
                    "Intent '{}' declares parameter '{}' more than once",
                    self.name, param.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::SystemEntity;
    use proptest::prelude::*;

    #[test]
    fn test_validate_intent_name_accepts_dotted_names() {
        assert!(validate_intent_name("smalltalk.user_name_give").is_ok());
        assert!(validate_intent_name("order_pizza").is_ok());
    }

    #[test]
    fn test_validate_intent_name_rejects_bad_names() {
        assert!(validate_intent_name("").is_err());
        assert!(validate_intent_name("order pizza").is_err());
        assert!(validate_intent_name("order-pizza").is_err());
        assert!(validate_intent_name(".order").is_err());
        assert!(validate_intent_name("_order").is_err());
        assert!(validate_intent_name("order__pizza").is_err());
        assert!(validate_intent_name("order2").is_err());
    }

    #[test]
    fn test_event_name_derivation() {
        assert_eq!(event_name("test.intent_name"), "E_TEST_INTENT_NAME");
        assert_eq!(event_name("order_pizza"), "E_ORDER_PIZZA");
    }

    #[test]
    fn test_required_follows_default() {
        let required = Parameter::new("user_name", EntityRef::System(SystemEntity::Person));
        assert!(required.required());

        let optional = required.clone().with_default("John");
        assert!(!optional.required());
    }

    #[test]
    fn test_all_events_dedups_derived_event() {
        let mut intent = Intent::new("order_pizza");
        intent.events = vec!["E_ORDER_PIZZA".to_string(), "WELCOME".to_string()];
        assert_eq!(intent.all_events(), vec!["E_ORDER_PIZZA", "WELCOME"]);
    }

    #[test]
    fn test_validate_rejects_duplicate_parameters() {
        let intent = Intent::new("order_pizza").with_parameters(vec![
            Parameter::new("size", EntityRef::System(SystemEntity::Any)),
            Parameter::new("size", EntityRef::System(SystemEntity::Any)),
        ]);
        assert!(intent.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_names_pass(name in "[a-zA-Z][a-zA-Z_.]{0,30}") {
            prop_assume!(!name.contains("__"));
            prop_assert!(validate_intent_name(&name).is_ok());
        }

        #[test]
        fn prop_event_names_are_valid_identifiers(name in "[a-z][a-z_.]{0,30}") {
            let event = event_name(&name);
            prop_assert!(event.starts_with("E_"));
            prop_assert!(!event.contains('.'));
        }
    }
}
