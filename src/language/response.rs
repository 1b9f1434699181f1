//! Response messages an agent sends when an intent matches.
//!
//! Responses are divided in groups: `default` may only carry plain text
//! (for voice and other text-only surfaces), `rich` adds quick replies,
//! images, cards and custom payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Quick replies render as tappable chips; platforms cap their length.
pub const MAX_QUICK_REPLY_CHARS: usize = 20;

/// Response group: plain-text fallback or rich content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseGroup {
    Default,
    Rich,
}

/// A single response message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentResponse {
    /// Plain text; the platform picks one choice at random.
    Text { choices: Vec<String> },
    /// Reply chips, each at most [`MAX_QUICK_REPLY_CHARS`] characters.
    QuickReplies { replies: Vec<String> },
    Image {
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
    Card {
        title: String,
        #[serde(default)]
        subtitle: Option<String>,
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        link: Option<String>,
        /// Label of the link button; the URL itself when unset.
        #[serde(default)]
        link_title: Option<String>,
    },
    /// Named free-form JSON payload, passed through to the client verbatim.
    Custom {
        name: String,
        payload: serde_json::Value,
    },
}

impl IntentResponse {
    pub fn text(choices: Vec<String>) -> Self {
        IntentResponse::Text { choices }
    }

    /// Build a quick-replies response, enforcing the length cap.
    pub fn quick_replies(replies: Vec<String>) -> Result<Self, ApiError> {
        for reply in &replies {
            if reply.chars().count() > MAX_QUICK_REPLY_CHARS {
                return Err(ApiError::LanguageError(format!(
                    "Quick replies must be shorter than {} chars; '{}' is {} chars long",
                    MAX_QUICK_REPLY_CHARS,
                    reply,
                    reply.chars().count()
                )));
            }
        }
        Ok(IntentResponse::QuickReplies { replies })
    }

    /// Parse one `<type>: <value>` entry from a language YAML file.
    ///
    /// `text` and `quick_replies` accept a single string or a list; `image`
    /// accepts a bare URL string or a mapping with `url` and `title`.
    pub fn from_yaml(kind: &str, value: &serde_yaml::Value) -> Result<Self, ApiError> {
        match kind {
            "text" => Ok(IntentResponse::Text {
                choices: string_or_list(value, "text")?,
            }),
            "quick_replies" => Self::quick_replies(string_or_list(value, "quick_replies")?),
            "image" => match value {
                serde_yaml::Value::String(url) => Ok(IntentResponse::Image {
                    url: url.clone(),
                    title: None,
                }),
                serde_yaml::Value::Mapping(_) => {
                    #[derive(Deserialize)]
                    struct RawImage {
                        url: String,
                        #[serde(default)]
                        title: Option<String>,
                    }
                    let raw: RawImage = serde_yaml::from_value(value.clone())?;
                    Ok(IntentResponse::Image {
                        url: raw.url,
                        title: raw.title,
                    })
                }
                _ => Err(ApiError::LanguageError(
                    "An image response must be a URL string or a mapping with 'url'".to_string(),
                )),
            },
            "card" => {
                #[derive(Deserialize)]
                struct RawCard {
                    title: String,
                    #[serde(default)]
                    subtitle: Option<String>,
                    #[serde(default)]
                    image: Option<String>,
                    #[serde(default)]
                    link: Option<String>,
                    #[serde(default)]
                    link_title: Option<String>,
                }
                let raw: RawCard = serde_yaml::from_value(value.clone())?;
                Ok(IntentResponse::Card {
                    title: raw.title,
                    subtitle: raw.subtitle,
                    image: raw.image,
                    link: raw.link,
                    link_title: raw.link_title,
                })
            }
            "custom" => {
                let mapping = value.as_mapping().ok_or_else(|| {
                    ApiError::LanguageError(
                        "A custom payload must be a mapping of payload name to content"
                            .to_string(),
                    )
                })?;
                if mapping.len() != 1 {
                    return Err(ApiError::LanguageError(format!(
                        "A custom payload must contain a single key naming the payload; found {} keys",
                        mapping.len()
                    )));
                }
                let (name, payload) = mapping.iter().next().expect("checked length above");
                let name = name.as_str().ok_or_else(|| {
                    ApiError::LanguageError("Custom payload name must be a string".to_string())
                })?;
                if !payload.is_mapping() {
                    return Err(ApiError::LanguageError(format!(
                        "Custom payload '{}' must map to a dictionary",
                        name
                    )));
                }
                let payload_json: serde_json::Value =
                    serde_yaml::from_value(payload.clone())?;
                Ok(IntentResponse::Custom {
                    name: name.to_string(),
                    payload: payload_json,
                })
            }
            other => Err(ApiError::LanguageError(format!(
                "Unsupported response type '{}'; expected one of text, quick_replies, image, card, custom",
                other
            ))),
        }
    }

    /// Whether this message is allowed in the `default` group.
    pub fn allowed_in_default_group(&self) -> bool {
        matches!(self, IntentResponse::Text { .. })
    }
}

fn string_or_list(value: &serde_yaml::Value, kind: &str) -> Result<Vec<String>, ApiError> {
    match value {
        serde_yaml::Value::String(s) => Ok(vec![s.clone()]),
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ApiError::LanguageError(format!(
                        "Entries of a '{}' response must be strings",
                        kind
                    ))
                })
            })
            .collect(),
        _ => Err(ApiError::LanguageError(format!(
            "A '{}' response must be a string or a list of strings",
            kind
        ))),
    }
}

/// Pick the message list for a group, falling back from `Rich` to `Default`
/// when no rich message exists.
pub fn messages_for_group(
    messages: &HashMap<ResponseGroup, Vec<IntentResponse>>,
    group: ResponseGroup,
) -> &[IntentResponse] {
    if group == ResponseGroup::Rich {
        if let Some(rich) = messages.get(&ResponseGroup::Rich) {
            if !rich.is_empty() {
                return rich;
            }
        }
        return messages
            .get(&ResponseGroup::Default)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
    }
    messages.get(&group).map(Vec::as_slice).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> serde_yaml::Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_text_from_string() {
        let response = IntentResponse::from_yaml("text", &yaml("ciao")).unwrap();
        assert_eq!(
            response,
            IntentResponse::text(vec!["ciao".to_string()])
        );
    }

    #[test]
    fn test_text_from_list() {
        let response = IntentResponse::from_yaml("text", &yaml("[pippo, franco]")).unwrap();
        assert_eq!(
            response,
            IntentResponse::text(vec!["pippo".to_string(), "franco".to_string()])
        );
    }

    #[test]
    fn test_quick_replies_too_long() {
        assert!(IntentResponse::quick_replies(vec![
            "pippo".to_string(),
            "chi chi chi, co co co".to_string()
        ])
        .is_err());
        assert!(IntentResponse::from_yaml("quick_replies", &yaml("chi chi chi, co co co")).is_err());
    }

    #[test]
    fn test_image_from_string_and_mapping() {
        let from_string =
            IntentResponse::from_yaml("image", &yaml("https://example.com/image.png")).unwrap();
        assert_eq!(
            from_string,
            IntentResponse::Image {
                url: "https://example.com/image.png".to_string(),
                title: None
            }
        );

        let from_mapping = IntentResponse::from_yaml(
            "image",
            &yaml("{url: \"https://example.com/image.png\", title: \"A title\"}"),
        )
        .unwrap();
        assert_eq!(
            from_mapping,
            IntentResponse::Image {
                url: "https://example.com/image.png".to_string(),
                title: Some("A title".to_string())
            }
        );
    }

    #[test]
    fn test_card_requires_title() {
        assert!(IntentResponse::from_yaml("card", &yaml("{subtitle: nope}")).is_err());
        let card = IntentResponse::from_yaml(
            "card",
            &yaml("{title: Hotel, subtitle: Cheap, link: \"https://example.com\", link_title: Book now}"),
        )
        .unwrap();
        match card {
            IntentResponse::Card {
                title,
                link,
                link_title,
                ..
            } => {
                assert_eq!(title, "Hotel");
                assert_eq!(link.as_deref(), Some("https://example.com"));
                assert_eq!(link_title.as_deref(), Some("Book now"));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_custom_payload_single_key() {
        let response = IntentResponse::from_yaml(
            "custom",
            &yaml("{custom_location: {latitude: 45.48, longitude: 9.20}}"),
        )
        .unwrap();
        match response {
            IntentResponse::Custom { name, payload } => {
                assert_eq!(name, "custom_location");
                assert!(payload.get("latitude").is_some());
            }
            other => panic!("unexpected response: {:?}", other),
        }

        assert!(IntentResponse::from_yaml("custom", &yaml("{a: {}, b: {}}")).is_err());
        assert!(IntentResponse::from_yaml("custom", &yaml("{a: just a string}")).is_err());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(IntentResponse::from_yaml("carousel", &yaml("x")).is_err());
    }

    #[test]
    fn test_rich_group_falls_back_to_default() {
        let mut messages = HashMap::new();
        messages.insert(
            ResponseGroup::Default,
            vec![IntentResponse::text(vec!["plain".to_string()])],
        );

        let rich = messages_for_group(&messages, ResponseGroup::Rich);
        assert_eq!(rich.len(), 1);

        messages.insert(
            ResponseGroup::Rich,
            vec![IntentResponse::quick_replies(vec!["Order Pizza".to_string()]).unwrap()],
        );
        let rich = messages_for_group(&messages, ResponseGroup::Rich);
        assert!(matches!(rich[0], IntentResponse::QuickReplies { .. }));
    }
}
