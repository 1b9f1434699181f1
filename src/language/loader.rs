//! Loading language resources from YAML files.
//!
//! An agent project keeps a `language/` folder with one subdirectory per
//! locale. Each intent has a `<intent-name>.yaml` file with three sections:
//!
//! ```yaml
//! examples:
//!   - I want a $pizza_type{margherita} pizza
//!
//! slot_filling_prompts:
//!   pizza_type:
//!     - What type of pizza?
//!
//! responses:
//!   default:
//!     - text:
//!       - On its way!
//!   rich:
//!     - quick_replies:
//!       - Order another
//! ```
//!
//! Custom entities keep their entries in `ENTITY_<entity-name>.yaml` files
//! in the same locale folders.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::ApiError;
use crate::language::codes::LanguageCode;
use crate::language::response::{IntentResponse, ResponseGroup};
use crate::language::utterance::ExampleUtterance;
use crate::model::agent::AgentDefinition;
use crate::model::entity::EntityEntry;
use crate::model::intent::Intent;

/// Language data for one intent in one locale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntentLanguageData {
    pub example_utterances: Vec<ExampleUtterance>,
    pub slot_filling_prompts: HashMap<String, Vec<String>>,
    pub responses: HashMap<ResponseGroup, Vec<IntentResponse>>,
}

impl IntentLanguageData {
    /// Messages for a group, with rich-to-default fallback.
    pub fn messages_for(&self, group: ResponseGroup) -> &[IntentResponse] {
        crate::language::response::messages_for_group(&self.responses, group)
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawLanguageFile {
    #[serde(default)]
    examples: Vec<String>,
    #[serde(default)]
    slot_filling_prompts: HashMap<String, Vec<String>>,
    #[serde(default)]
    responses: HashMap<String, Vec<serde_yaml::Value>>,
}

/// Load one intent's language bundle from `<dir>/<code>/<intent>.yaml`.
///
/// The file must exist even when the intent needs no language data (use an
/// empty file for trigger-only intents).
pub fn intent_language_data(
    language_dir: &Path,
    intent: &Intent,
    code: LanguageCode,
) -> Result<IntentLanguageData, ApiError> {
    let file = language_dir
        .join(code.as_str())
        .join(format!("{}.yaml", intent.name));
    if !file.is_file() {
        return Err(ApiError::LanguageError(format!(
            "Language file not found for intent '{}' (expected: {})",
            intent.name,
            file.display()
        )));
    }

    let content = std::fs::read_to_string(&file)?;
    parse_intent_language(&content, intent).map_err(|e| {
        ApiError::LanguageError(format!("In {}: {}", file.display(), e))
    })
}

/// Parse a language file body against an intent's parameter schema.
pub fn parse_intent_language(
    content: &str,
    intent: &Intent,
) -> Result<IntentLanguageData, ApiError> {
    if content.trim().is_empty() {
        return Ok(IntentLanguageData::default());
    }

    let raw: RawLanguageFile = serde_yaml::from_str(content)?;

    let mut example_utterances = Vec::with_capacity(raw.examples.len());
    for example in &raw.examples {
        example_utterances.push(ExampleUtterance::parse(example, intent)?);
    }

    for parameter_name in raw.slot_filling_prompts.keys() {
        if intent.parameter(parameter_name).is_none() {
            return Err(ApiError::LanguageError(format!(
                "Slot-filling prompts reference parameter '{}', but intent '{}' does not define such parameter",
                parameter_name, intent.name
            )));
        }
    }

    let mut responses = HashMap::new();
    for (group_name, entries) in &raw.responses {
        let group = match group_name.as_str() {
            "default" => ResponseGroup::Default,
            "rich" => ResponseGroup::Rich,
            other => {
                return Err(ApiError::LanguageError(format!(
                    "Unsupported response group '{}'; only 'default' and 'rich' are supported",
                    other
                )))
            }
        };

        let mut messages = Vec::with_capacity(entries.len());
        for entry in entries {
            let mapping = entry.as_mapping().ok_or_else(|| {
                ApiError::LanguageError(
                    "Each response entry must be a mapping with a single type key".to_string(),
                )
            })?;
            if mapping.len() != 1 {
                return Err(ApiError::LanguageError(format!(
                    "Each response entry must have exactly one type key; found {}",
                    mapping.len()
                )));
            }
            let (kind, value) = mapping.iter().next().expect("checked length above");
            let kind = kind.as_str().ok_or_else(|| {
                ApiError::LanguageError("Response type key must be a string".to_string())
            })?;
            let message = IntentResponse::from_yaml(kind, value)?;
            if group == ResponseGroup::Default && !message.allowed_in_default_group() {
                return Err(ApiError::LanguageError(format!(
                    "Message type '{}' found in response group 'default'; only 'text' is allowed there, use the 'rich' group for rich responses",
                    kind
                )));
            }
            messages.push(message);
        }
        responses.insert(group, messages);
    }

    Ok(IntentLanguageData {
        example_utterances,
        slot_filling_prompts: raw.slot_filling_prompts,
        responses,
    })
}

#[derive(Debug, Deserialize)]
struct RawEntityFile {
    #[serde(default)]
    entries: Vec<RawEntityEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntityEntry {
    Bare(String),
    Full {
        value: String,
        #[serde(default)]
        synonyms: Vec<String>,
    },
}

/// Load a custom entity's entries from `<dir>/<code>/ENTITY_<name>.yaml`.
pub fn entity_language_data(
    language_dir: &Path,
    entity_name: &str,
    code: LanguageCode,
) -> Result<Vec<EntityEntry>, ApiError> {
    let file = language_dir
        .join(code.as_str())
        .join(format!("ENTITY_{}.yaml", entity_name));
    if !file.is_file() {
        return Err(ApiError::LanguageError(format!(
            "Language file not found for entity '{}' (expected: {})",
            entity_name,
            file.display()
        )));
    }

    let content = std::fs::read_to_string(&file)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: RawEntityFile = serde_yaml::from_str(&content)
        .map_err(|e| ApiError::LanguageError(format!("In {}: {}", file.display(), e)))?;

    Ok(raw
        .entries
        .into_iter()
        .map(|entry| match entry {
            RawEntityEntry::Bare(value) => EntityEntry::new(value, Vec::new()),
            RawEntityEntry::Full { value, synonyms } => EntityEntry::new(value, synonyms),
        })
        .collect())
}

/// Discover the locales a language folder provides.
///
/// Hidden and underscore-prefixed directories are skipped; unknown codes
/// are skipped with a warning.
pub fn supported_languages(language_dir: &Path) -> Result<Vec<LanguageCode>, ApiError> {
    if !language_dir.is_dir() {
        return Err(ApiError::LanguageError(format!(
            "No language folder found (expected: {})",
            language_dir.display()
        )));
    }

    let mut result = Vec::new();
    for entry in WalkDir::new(language_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        match name.parse::<LanguageCode>() {
            Ok(code) => result.push(code),
            Err(_) => {
                warn!(folder = %name, "unrecognized language code, skipping folder");
            }
        }
    }
    result.sort_by_key(|code| code.as_str());
    Ok(result)
}

/// All language resources of an agent, loaded in memory and keyed by
/// intent/entity name and locale.
#[derive(Debug, Clone, Default)]
pub struct AgentResources {
    intents: HashMap<(String, LanguageCode), IntentLanguageData>,
    entities: HashMap<(String, LanguageCode), Vec<EntityEntry>>,
}

impl AgentResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load resources for every intent and entity of the agent, in every
    /// language the agent supports.
    pub fn load(language_dir: &Path, agent: &AgentDefinition) -> Result<Self, ApiError> {
        let mut resources = Self::new();
        for &code in agent.languages() {
            for intent in agent.intents() {
                let data = intent_language_data(language_dir, intent, code)?;
                resources.insert_intent(intent.name.clone(), code, data);
            }
            for entity in agent.entities() {
                let entries = entity_language_data(language_dir, &entity.name, code)?;
                resources.insert_entity(entity.name.clone(), code, entries);
            }
        }
        Ok(resources)
    }

    pub fn insert_intent(&mut self, intent: String, code: LanguageCode, data: IntentLanguageData) {
        self.intents.insert((intent, code), data);
    }

    pub fn insert_entity(&mut self, entity: String, code: LanguageCode, entries: Vec<EntityEntry>) {
        self.entities.insert((entity, code), entries);
    }

    pub fn intent_data(&self, intent: &str, code: LanguageCode) -> Option<&IntentLanguageData> {
        self.intents.get(&(intent.to_string(), code))
    }

    pub fn entity_entries(&self, entity: &str, code: LanguageCode) -> Option<&[EntityEntry]> {
        self.entities
            .get(&(entity.to_string(), code))
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{EntityRef, SystemEntity};
    use crate::model::intent::Parameter;

    fn greet_intent() -> Intent {
        Intent::new("user_says_hello").with_parameters(vec![Parameter::new(
            "user_name",
            EntityRef::System(SystemEntity::Person),
        )])
    }

    #[test]
    fn test_parse_full_language_file() {
        let src = r#"
examples:
  - Hi
  - Hello, my name is $user_name{Guido}

slot_filling_prompts:
  user_name:
    - What is your name?

responses:
  default:
    - text:
      - "Greetings, human :)"
      - Hi human!
  rich:
    - quick_replies:
      - Tell me more
"#;
        let data = parse_intent_language(src, &greet_intent()).unwrap();
        assert_eq!(data.example_utterances.len(), 2);
        assert_eq!(data.example_utterances[0].text(), "Hi");
        assert_eq!(data.slot_filling_prompts["user_name"].len(), 1);
        assert_eq!(data.responses[&ResponseGroup::Default].len(), 1);
        assert_eq!(data.responses[&ResponseGroup::Rich].len(), 1);
    }

    #[test]
    fn test_empty_file_yields_empty_bundle() {
        let data = parse_intent_language("", &greet_intent()).unwrap();
        assert_eq!(data, IntentLanguageData::default());
        let data = parse_intent_language("\n\n", &greet_intent()).unwrap();
        assert!(data.example_utterances.is_empty());
    }

    #[test]
    fn test_rich_type_rejected_in_default_group() {
        let src = r#"
responses:
  default:
    - quick_replies:
      - Not allowed here
"#;
        assert!(parse_intent_language(src, &greet_intent()).is_err());
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let src = r#"
responses:
  fancy:
    - text: nope
"#;
        assert!(parse_intent_language(src, &greet_intent()).is_err());
    }

    #[test]
    fn test_prompts_for_unknown_parameter_rejected() {
        let src = r#"
slot_filling_prompts:
  pizza_type:
    - What type of pizza?
"#;
        assert!(parse_intent_language(src, &greet_intent()).is_err());
    }
}
