//! Rendering the in-memory model into wire-schema structs.
//!
//! Element ids in exported files are fresh v4 UUIDs; they are presentation
//! detail, regenerated on every export and discarded on import.

use uuid::Uuid;

use crate::error::ApiError;
use crate::export::schema::{
    message_type, AffectedContextFile, AgentFile, ButtonFile, EntityEntryFile, EntityFile,
    EventFile, IntentFile, MessageFile, ParameterFile, PromptFile, ResponseFile, UsersaysChunkFile,
    UsersaysFile,
};
use crate::language::{
    IntentLanguageData, IntentResponse, LanguageCode, ResponseGroup, UtteranceChunk,
};
use crate::model::{AgentDefinition, CustomEntity, EntityEntry, Intent};

/// Platforms the remote service can deliver rich messages to.
pub const RICH_RESPONSE_PLATFORMS: [&str; 5] =
    ["telegram", "facebook", "slack", "line", "hangouts"];

/// Export tuning: which platforms receive rich messages.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub rich_platforms: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            rich_platforms: vec!["telegram".to_string()],
        }
    }
}

pub fn render_agent(agent: &AgentDefinition) -> AgentFile {
    let default_language = agent
        .languages()
        .first()
        .copied()
        .unwrap_or(LanguageCode::En);
    AgentFile {
        display_name: agent.name().to_string(),
        language: default_language.as_str().to_string(),
        supported_languages: agent
            .languages()
            .iter()
            .skip(1)
            .map(|code| code.as_str().to_string())
            .collect(),
        ..Default::default()
    }
}

/// Render an intent definition. `language_data` pairs each agent locale
/// with the intent's bundle in that locale; messages and slot-filling
/// prompts of every locale land in the same intent file.
pub fn render_intent(
    intent: &Intent,
    language_data: &[(LanguageCode, &IntentLanguageData)],
    options: &ExportOptions,
) -> IntentFile {
    let mut messages = Vec::new();
    for (code, data) in language_data {
        for response in data.responses.get(&ResponseGroup::Default).into_iter().flatten() {
            messages.push(render_message(response, *code, None));
        }
        for response in data.responses.get(&ResponseGroup::Rich).into_iter().flatten() {
            for platform in &options.rich_platforms {
                messages.push(render_message(response, *code, Some(platform.clone())));
            }
        }
    }

    let response = ResponseFile {
        affected_contexts: intent
            .output_contexts
            .iter()
            .map(|ctx| AffectedContextFile {
                name: ctx.name.clone(),
                lifespan: ctx.lifespan,
            })
            .collect(),
        parameters: render_parameters(intent, language_data),
        messages,
        ..Default::default()
    };

    IntentFile {
        id: Uuid::new_v4().to_string(),
        name: intent.name.clone(),
        contexts: intent.input_contexts.clone(),
        responses: vec![response],
        events: intent
            .all_events()
            .into_iter()
            .map(|name| EventFile { name })
            .collect(),
        ..Default::default()
    }
}

fn render_parameters(
    intent: &Intent,
    language_data: &[(LanguageCode, &IntentLanguageData)],
) -> Vec<ParameterFile> {
    intent
        .parameters
        .iter()
        .map(|param| {
            let mut prompts = Vec::new();
            if param.required() {
                for (code, data) in language_data {
                    for prompt in data
                        .slot_filling_prompts
                        .get(&param.name)
                        .into_iter()
                        .flatten()
                    {
                        prompts.push(PromptFile {
                            value: prompt.clone(),
                            lang: code.as_str().to_string(),
                        });
                    }
                }
            }
            ParameterFile {
                id: Uuid::new_v4().to_string(),
                name: param.name.clone(),
                required: param.required(),
                data_type: format!("@{}", param.entity.name()),
                value: format!("${}", param.name),
                default_value: param.default.clone().unwrap_or_default(),
                is_list: param.is_list,
                prompts,
            }
        })
        .collect()
}

fn render_message(
    response: &IntentResponse,
    code: LanguageCode,
    platform: Option<String>,
) -> MessageFile {
    let lang = code.as_str().to_string();
    match response {
        IntentResponse::Text { choices } => MessageFile {
            message_type: message_type::TEXT.to_string(),
            platform,
            lang,
            speech: choices.clone(),
            ..Default::default()
        },
        IntentResponse::QuickReplies { replies } => MessageFile {
            message_type: message_type::QUICK_REPLIES.to_string(),
            platform,
            lang,
            replies: replies.clone(),
            ..Default::default()
        },
        IntentResponse::Image { url, title } => MessageFile {
            message_type: message_type::IMAGE.to_string(),
            platform,
            lang,
            image_url: Some(url.clone()),
            title: title.clone(),
            ..Default::default()
        },
        IntentResponse::Card {
            title,
            subtitle,
            image,
            link,
            link_title,
        } => MessageFile {
            message_type: message_type::CARD.to_string(),
            platform,
            lang,
            title: Some(title.clone()),
            subtitle: subtitle.clone(),
            image_url: image.clone(),
            buttons: link
                .iter()
                .map(|url| ButtonFile {
                    text: link_title.clone().unwrap_or_else(|| url.clone()),
                    postback: url.clone(),
                })
                .collect(),
            ..Default::default()
        },
        IntentResponse::Custom { name, payload } => MessageFile {
            message_type: message_type::CUSTOM_PAYLOAD.to_string(),
            platform,
            lang,
            payload: Some(serde_json::json!({ name.clone(): payload.clone() })),
            ..Default::default()
        },
    }
}

/// Decode one message file back into a model response. Unrecognized message
/// types yield `Ok(None)`; quick replies go through the checked constructor
/// so the length cap holds for imported archives too.
pub fn message_to_response(message: &MessageFile) -> Result<Option<IntentResponse>, ApiError> {
    let response = match message.message_type.as_str() {
        message_type::TEXT => Some(IntentResponse::Text {
            choices: message.speech.clone(),
        }),
        message_type::QUICK_REPLIES => {
            Some(IntentResponse::quick_replies(message.replies.clone())?)
        }
        message_type::IMAGE => Some(IntentResponse::Image {
            url: message.image_url.clone().unwrap_or_default(),
            title: message.title.clone(),
        }),
        message_type::CARD => {
            let button = message.buttons.first();
            Some(IntentResponse::Card {
                title: message.title.clone().unwrap_or_default(),
                subtitle: message.subtitle.clone(),
                image: message.image_url.clone(),
                link: button.map(|b| b.postback.clone()),
                link_title: button.and_then(|b| {
                    if b.text.is_empty() || b.text == b.postback {
                        None
                    } else {
                        Some(b.text.clone())
                    }
                }),
            })
        }
        message_type::CUSTOM_PAYLOAD => match message.payload.clone() {
            Some(payload) => match payload.as_object() {
                Some(object) if object.len() == 1 => {
                    object.iter().next().map(|(name, content)| {
                        IntentResponse::Custom {
                            name: name.clone(),
                            payload: content.clone(),
                        }
                    })
                }
                _ => Some(IntentResponse::Custom {
                    name: "payload".to_string(),
                    payload,
                }),
            },
            None => None,
        },
        _ => None,
    };
    Ok(response)
}

/// Render the example utterances of one locale. Entity chunks carry the
/// entity name of the referenced parameter in their `meta` field.
pub fn render_usersays_for_intent(
    intent: &Intent,
    data: &IntentLanguageData,
    code: LanguageCode,
) -> Vec<UsersaysFile> {
    data.example_utterances
        .iter()
        .map(|utterance| UsersaysFile {
            id: Uuid::new_v4().to_string(),
            data: utterance
                .chunks()
                .iter()
                .map(|chunk| match chunk {
                    UtteranceChunk::Text { text } => UsersaysChunkFile {
                        text: text.clone(),
                        ..Default::default()
                    },
                    UtteranceChunk::Entity {
                        parameter_name,
                        sample_value,
                    } => {
                        let entity_name = intent
                            .parameter(parameter_name)
                            .map(|param| param.entity.name().to_string())
                            .unwrap_or_else(|| parameter_name.clone());
                        UsersaysChunkFile {
                            text: sample_value.clone(),
                            meta: Some(format!("@{}", entity_name)),
                            alias: Some(parameter_name.clone()),
                            user_defined: true,
                        }
                    }
                })
                .collect(),
            lang: code.as_str().to_string(),
            ..Default::default()
        })
        .collect()
}

pub fn render_entity(entity: &CustomEntity) -> EntityFile {
    EntityFile {
        id: Uuid::new_v4().to_string(),
        name: entity.name.clone(),
        is_enum: !entity.use_synonyms,
        is_regexp: entity.regexp_entity,
        automated_expansion: entity.automated_expansion,
        allow_fuzzy_extraction: entity.fuzzy_matching,
        ..Default::default()
    }
}

pub fn render_entity_entries(entries: &[EntityEntry]) -> Vec<EntityEntryFile> {
    entries
        .iter()
        .map(|entry| EntityEntryFile {
            value: entry.value.clone(),
            synonyms: entry.synonyms.clone(),
        })
        .collect()
}
