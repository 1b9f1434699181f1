//! Wire schema of the export archive.
//!
//! These structs marshal the JSON files inside an export archive, in the
//! format the remote platform's console produces from Settings > Export:
//! `agent.json` and `package.json` at the root, two files per intent under
//! `intents/` (definition and usersays), and two files per entity under
//! `entities/` (definition and entries). Field names are lowerCamelCase on
//! the wire.

use serde::{Deserialize, Serialize};

pub const PACKAGE_VERSION: &str = "1.0.0";
pub const DEFAULT_INTENT_PRIORITY: i64 = 500_000;

/// Message type discriminators used in intent response messages.
pub mod message_type {
    pub const TEXT: &str = "0";
    pub const CARD: &str = "1";
    pub const QUICK_REPLIES: &str = "2";
    pub const IMAGE: &str = "3";
    pub const CUSTOM_PAYLOAD: &str = "4";
}

/// `agent.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentFile {
    pub display_name: String,
    pub language: String,
    pub supported_languages: Vec<String>,
    pub webhook: WebhookFile,
    pub is_private: bool,
    pub ml_min_confidence: f64,
}

impl Default for AgentFile {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            language: "en".to_string(),
            supported_languages: Vec::new(),
            webhook: WebhookFile::default(),
            is_private: true,
            ml_min_confidence: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookFile {
    pub url: String,
    pub available: bool,
}

/// `package.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageFile {
    pub version: String,
}

impl Default for PackageFile {
    fn default() -> Self {
        Self {
            version: PACKAGE_VERSION.to_string(),
        }
    }
}

/// `entities/<name>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityFile {
    pub id: String,
    pub name: String,
    pub is_overridable: bool,
    pub is_enum: bool,
    pub is_regexp: bool,
    pub automated_expansion: bool,
    pub allow_fuzzy_extraction: bool,
}

impl Default for EntityFile {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            is_overridable: true,
            is_enum: false,
            is_regexp: false,
            automated_expansion: false,
            allow_fuzzy_extraction: false,
        }
    }
}

/// One element of `entities/<name>_entries_<lang>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEntryFile {
    pub value: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// `intents/<name>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentFile {
    pub id: String,
    pub name: String,
    pub auto: bool,
    pub contexts: Vec<String>,
    pub responses: Vec<ResponseFile>,
    pub priority: i64,
    pub webhook_used: bool,
    pub webhook_for_slot_filling: bool,
    pub fallback_intent: bool,
    pub events: Vec<EventFile>,
}

impl Default for IntentFile {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            auto: true,
            contexts: Vec::new(),
            responses: Vec::new(),
            priority: DEFAULT_INTENT_PRIORITY,
            webhook_used: false,
            webhook_for_slot_filling: false,
            fallback_intent: false,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFile {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseFile {
    pub affected_contexts: Vec<AffectedContextFile>,
    pub parameters: Vec<ParameterFile>,
    pub messages: Vec<MessageFile>,
    pub reset_contexts: bool,
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedContextFile {
    pub name: String,
    pub lifespan: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterFile {
    pub id: String,
    pub name: String,
    pub required: bool,
    pub data_type: String,
    pub value: String,
    pub default_value: String,
    pub is_list: bool,
    pub prompts: Vec<PromptFile>,
}

impl Default for ParameterFile {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            required: false,
            data_type: String::new(),
            value: String::new(),
            default_value: String::new(),
            is_list: false,
            prompts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFile {
    pub value: String,
    pub lang: String,
}

/// One response message. The `type` discriminator decides which of the
/// optional fields are meaningful; see [`message_type`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageFile {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub lang: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub speech: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ButtonFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Default for MessageFile {
    fn default() -> Self {
        Self {
            message_type: message_type::TEXT.to_string(),
            platform: None,
            lang: "en".to_string(),
            speech: Vec::new(),
            replies: Vec::new(),
            title: None,
            subtitle: None,
            image_url: None,
            buttons: Vec::new(),
            payload: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonFile {
    pub text: String,
    #[serde(default)]
    pub postback: String,
}

/// One element of `intents/<name>_usersays_<lang>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsersaysFile {
    pub id: String,
    pub data: Vec<UsersaysChunkFile>,
    pub is_template: bool,
    pub count: i64,
    pub lang: String,
    pub updated: i64,
}

impl Default for UsersaysFile {
    fn default() -> Self {
        Self {
            id: String::new(),
            data: Vec::new(),
            is_template: false,
            count: 0,
            lang: "en".to_string(),
            updated: 0,
        }
    }
}

/// A chunk of a usersays entry: plain text, or a tagged entity when `meta`
/// and `alias` are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsersaysChunkFile {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub user_defined: bool,
}

impl Default for UsersaysChunkFile {
    fn default() -> Self {
        Self {
            text: String::new(),
            meta: None,
            alias: None,
            user_defined: false,
        }
    }
}
