//! Example utterances and their chunked form.
//!
//! An example utterance is a template string where entity parameters appear
//! as `$parameter_name{sample value}`, e.g. `"My name is $user_name{Guido}!"`.
//! Parsing splits the template into chunks of plain text and tagged
//! entities, validating every referenced parameter against the owning
//! intent's schema.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::intent::Intent;

static RE_EXAMPLE_PARAMETERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?P<parameter_name>\w+)\{(?P<sample_value>[^}]+)\}")
        .expect("utterance parameter regex")
});

/// One chunk of an example utterance: plain text, or a tagged entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UtteranceChunk {
    Text { text: String },
    Entity {
        parameter_name: String,
        sample_value: String,
    },
}

/// One of the example utterances of a given intent.
///
/// Keeps both the raw template and its parsed chunks; the raw form is what
/// language files carry, the chunked form is what exports consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleUtterance {
    text: String,
    chunks: Vec<UtteranceChunk>,
}

impl ExampleUtterance {
    /// Parse a template against an intent's parameter schema.
    ///
    /// Fails when the template references a parameter the intent does not
    /// declare.
    pub fn parse(text: &str, intent: &Intent) -> Result<Self, ApiError> {
        let mut chunks = Vec::new();
        let mut last_end = 0;

        for captures in RE_EXAMPLE_PARAMETERS.captures_iter(text) {
            let whole = captures.get(0).expect("capture group 0 always present");
            let parameter_name = &captures["parameter_name"];
            let sample_value = &captures["sample_value"];

            if intent.parameter(parameter_name).is_none() {
                return Err(ApiError::LanguageError(format!(
                    "Example '{}' references parameter ${}, but intent '{}' does not define such parameter",
                    text, parameter_name, intent.name
                )));
            }

            if whole.start() > last_end {
                chunks.push(UtteranceChunk::Text {
                    text: text[last_end..whole.start()].to_string(),
                });
            }
            chunks.push(UtteranceChunk::Entity {
                parameter_name: parameter_name.to_string(),
                sample_value: sample_value.to_string(),
            });
            last_end = whole.end();
        }

        if last_end < text.len() {
            chunks.push(UtteranceChunk::Text {
                text: text[last_end..].to_string(),
            });
        }

        Ok(Self {
            text: text.to_string(),
            chunks,
        })
    }

    /// Rebuild an utterance from chunks, e.g. when importing an archive.
    pub fn from_chunks(chunks: Vec<UtteranceChunk>) -> Self {
        let mut text = String::new();
        for chunk in &chunks {
            match chunk {
                UtteranceChunk::Text { text: t } => text.push_str(t),
                UtteranceChunk::Entity {
                    parameter_name,
                    sample_value,
                } => {
                    text.push('$');
                    text.push_str(parameter_name);
                    text.push('{');
                    text.push_str(sample_value);
                    text.push('}');
                }
            }
        }
        Self { text, chunks }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunks(&self) -> &[UtteranceChunk] {
        &self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{EntityRef, SystemEntity};
    use crate::model::intent::Parameter;
    use proptest::prelude::*;

    fn name_intent() -> Intent {
        Intent::new("user_gives_name").with_parameters(vec![Parameter::new(
            "user_name",
            EntityRef::System(SystemEntity::Person),
        )])
    }

    #[test]
    fn test_chunks_text_and_entity() {
        let intent = name_intent();
        let utterance = ExampleUtterance::parse("My name is $user_name{Guido}!", &intent).unwrap();
        assert_eq!(
            utterance.chunks(),
            &[
                UtteranceChunk::Text {
                    text: "My name is ".to_string()
                },
                UtteranceChunk::Entity {
                    parameter_name: "user_name".to_string(),
                    sample_value: "Guido".to_string()
                },
                UtteranceChunk::Text {
                    text: "!".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_plain_text_is_single_chunk() {
        let intent = name_intent();
        let utterance = ExampleUtterance::parse("Hello there", &intent).unwrap();
        assert_eq!(
            utterance.chunks(),
            &[UtteranceChunk::Text {
                text: "Hello there".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        let intent = name_intent();
        let result = ExampleUtterance::parse("I am $nick_name{Gui}", &intent);
        assert!(matches!(result, Err(ApiError::LanguageError(_))));
    }

    #[test]
    fn test_leading_entity() {
        let intent = name_intent();
        let utterance = ExampleUtterance::parse("$user_name{Guido} is my name", &intent).unwrap();
        assert!(matches!(
            utterance.chunks()[0],
            UtteranceChunk::Entity { .. }
        ));
    }

    #[test]
    fn test_from_chunks_rebuilds_template() {
        let intent = name_intent();
        let parsed = ExampleUtterance::parse("My name is $user_name{Guido}!", &intent).unwrap();
        let rebuilt = ExampleUtterance::from_chunks(parsed.chunks().to_vec());
        assert_eq!(rebuilt.text(), parsed.text());
        assert_eq!(rebuilt, parsed);
    }

    proptest! {
        #[test]
        fn prop_chunks_roundtrip(
            prefix in "[a-zA-Z ]{0,20}",
            value in "[a-zA-Z ]{1,10}",
            suffix in "[a-zA-Z ]{0,20}",
        ) {
            let intent = name_intent();
            let template = format!("{}$user_name{{{}}}{}", prefix, value, suffix);
            let parsed = ExampleUtterance::parse(&template, &intent).unwrap();
            let rebuilt = ExampleUtterance::from_chunks(parsed.chunks().to_vec());
            prop_assert_eq!(rebuilt.text(), template.as_str());
        }
    }
}
