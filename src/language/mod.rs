//! Language Resources
//!
//! Per-locale bundles of example utterances, slot-filling prompts and
//! response messages, keyed by intent and locale. Resources live in YAML
//! files under a `language/` folder, one subdirectory per locale.

pub mod codes;
pub mod loader;
pub mod response;
pub mod utterance;

pub use codes::LanguageCode;
pub use loader::{
    entity_language_data, intent_language_data, parse_intent_language, supported_languages,
    AgentResources, IntentLanguageData,
};
pub use response::{IntentResponse, ResponseGroup, MAX_QUICK_REPLY_CHARS};
pub use utterance::{ExampleUtterance, UtteranceChunk};
