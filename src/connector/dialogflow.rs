//! Dialogflow ES connector.
//!
//! Implements [`ServiceConnector`] against the Dialogflow ES REST API:
//! agent restore for uploads, `detectIntent` with a text query for
//! predictions, and `detectIntent` with an event query for triggers. Calls
//! are direct request/response with no batching or retry.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ConnectorConfig;
use crate::connector::prediction::Prediction;
use crate::connector::ServiceConnector;
use crate::error::ApiError;
use crate::export::{self, ExportOptions, RICH_RESPONSE_PLATFORMS};
use crate::language::{AgentResources, IntentResponse, LanguageCode, ResponseGroup};
use crate::model::{AgentDefinition, Context};

/// Connector for agents hosted on Dialogflow ES.
pub struct DialogflowConnector {
    config: ConnectorConfig,
    agent: AgentDefinition,
    resources: AgentResources,
    client: reqwest::Client,
    default_session: String,
}

impl DialogflowConnector {
    /// Build a connector for a validated agent definition.
    ///
    /// Fails when the agent has integrity violations or the config names an
    /// unsupported rich platform.
    pub fn new(
        config: ConnectorConfig,
        agent: AgentDefinition,
        resources: AgentResources,
    ) -> Result<Self, ApiError> {
        agent.validate().into_result()?;

        if config.project_id.is_empty() {
            return Err(ApiError::ConfigError(
                "Connector requires a project_id".to_string(),
            ));
        }
        for platform in &config.rich_platforms {
            if !RICH_RESPONSE_PLATFORMS.contains(&platform.as_str()) {
                return Err(ApiError::ConfigError(format!(
                    "Unsupported rich platform '{}' (must be one of: {})",
                    platform,
                    RICH_RESPONSE_PLATFORMS.join(", ")
                )));
            }
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let default_session = config
            .default_session
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            config,
            agent,
            resources,
            client,
            default_session,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            rich_platforms: self.config.rich_platforms.clone(),
        }
    }

    fn auth_header(&self) -> Result<String, ApiError> {
        let token = self
            .config
            .access_token
            .clone()
            .or_else(|| std::env::var("PARLEY_ACCESS_TOKEN").ok())
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "No access token configured (set connector.access_token or PARLEY_ACCESS_TOKEN)"
                        .to_string(),
                )
            })?;
        Ok(format!("Bearer {}", token))
    }

    fn detect_intent_url(&self, session: &str) -> String {
        format!(
            "{}/v2/projects/{}/agent/sessions/{}:detectIntent",
            self.config.endpoint, self.config.project_id, session
        )
    }

    async fn detect_intent(
        &self,
        session: &str,
        query_input: QueryInput,
    ) -> Result<Prediction, ApiError> {
        let url = self.detect_intent_url(session);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header()?)
            .json(&DetectIntentRequest { query_input })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        let decoded: DetectIntentResponse = response.json().await?;
        let prediction = decode_query_result(decoded.query_result)?;

        // A prediction naming an intent we don't know means the remote
        // agent is out of sync with this definition.
        if self.agent.intent_by_name(&prediction.intent_name).is_none() {
            return Err(ApiError::IntentNotFound(format!(
                "Service returned intent '{}', which is not in the agent definition; upload a fresh export and retry",
                prediction.intent_name
            )));
        }
        Ok(prediction)
    }

    fn resolve_session<'a>(&'a self, session: Option<&'a str>) -> &'a str {
        session.unwrap_or(&self.default_session)
    }

    fn resolve_language(&self, language: Option<LanguageCode>) -> LanguageCode {
        language.unwrap_or(self.config.default_language)
    }
}

#[async_trait]
impl ServiceConnector for DialogflowConnector {
    fn agent(&self) -> &AgentDefinition {
        &self.agent
    }

    fn export(&self, destination: &Path) -> Result<(), ApiError> {
        export::export_to_file(&self.agent, &self.resources, &self.export_options(), destination)
    }

    async fn upload(&self) -> Result<(), ApiError> {
        let archive = export::export_to_vec(&self.agent, &self.resources, &self.export_options())?;
        info!(
            agent = %self.agent.name(),
            project = %self.config.project_id,
            bytes = archive.len(),
            "uploading agent archive"
        );

        let url = format!(
            "{}/v2/projects/{}/agent:restore",
            self.config.endpoint, self.config.project_id
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header()?)
            .json(&RestoreAgentRequest {
                agent_content: BASE64.encode(&archive),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }
        Ok(())
    }

    async fn predict(
        &self,
        message: &str,
        session: Option<&str>,
        language: Option<LanguageCode>,
    ) -> Result<Prediction, ApiError> {
        let session = self.resolve_session(session);
        let language = self.resolve_language(language);
        debug!(%session, %language, "predicting intent");

        self.detect_intent(
            session,
            QueryInput {
                text: Some(TextInput {
                    text: message.to_string(),
                    language_code: language.as_str().to_string(),
                }),
                event: None,
            },
        )
        .await
    }

    async fn trigger(
        &self,
        intent_name: &str,
        parameters: serde_json::Map<String, serde_json::Value>,
        session: Option<&str>,
        language: Option<LanguageCode>,
    ) -> Result<Prediction, ApiError> {
        let intent = self
            .agent
            .intent_by_name(intent_name)
            .ok_or_else(|| ApiError::IntentNotFound(intent_name.to_string()))?;

        let session = self.resolve_session(session);
        let language = self.resolve_language(language);
        let event = intent.event_name();
        info!(%event, %session, "triggering intent");

        self.detect_intent(
            session,
            QueryInput {
                text: None,
                event: Some(EventInput {
                    name: event,
                    parameters,
                    language_code: language.as_str().to_string(),
                }),
            },
        )
        .await
    }
}

//
// Wire format
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentRequest {
    query_input: QueryInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<EventInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextInput {
    text: String,
    language_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventInput {
    name: String,
    parameters: serde_json::Map<String, serde_json::Value>,
    language_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RestoreAgentRequest {
    agent_content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DetectIntentResponse {
    query_result: QueryResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryResult {
    intent: Option<WireIntent>,
    intent_detection_confidence: f32,
    parameters: serde_json::Map<String, serde_json::Value>,
    fulfillment_text: String,
    fulfillment_messages: Vec<WireMessage>,
    output_contexts: Vec<WireContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireIntent {
    display_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireContext {
    name: String,
    lifespan_count: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireMessage {
    platform: Option<String>,
    text: Option<WireText>,
    quick_replies: Option<WireQuickReplies>,
    image: Option<WireImage>,
    card: Option<WireCard>,
    payload: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireText {
    text: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireQuickReplies {
    quick_replies: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireImage {
    image_uri: String,
    accessibility_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireCard {
    title: Option<String>,
    subtitle: Option<String>,
    image_uri: Option<String>,
    buttons: Vec<WireCardButton>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireCardButton {
    text: String,
    postback: String,
}

fn decode_query_result(result: QueryResult) -> Result<Prediction, ApiError> {
    let mut fulfillment_messages: HashMap<ResponseGroup, Vec<IntentResponse>> = HashMap::new();
    for message in &result.fulfillment_messages {
        let group = match message.platform.as_deref() {
            None | Some("PLATFORM_UNSPECIFIED") => ResponseGroup::Default,
            Some(_) => ResponseGroup::Rich,
        };
        if let Some(decoded) = decode_message(message)? {
            fulfillment_messages.entry(group).or_default().push(decoded);
        }
    }

    Ok(Prediction {
        intent_name: result
            .intent
            .map(|intent| intent.display_name)
            .unwrap_or_default(),
        confidence: result.intent_detection_confidence,
        parameters: result.parameters,
        contexts: result
            .output_contexts
            .iter()
            .map(|ctx| Context::new(context_short_name(&ctx.name), ctx.lifespan_count))
            .collect(),
        fulfillment_text: result.fulfillment_text,
        fulfillment_messages,
    })
}

fn decode_message(message: &WireMessage) -> Result<Option<IntentResponse>, ApiError> {
    if let Some(text) = &message.text {
        return Ok(Some(IntentResponse::Text {
            choices: text.text.clone(),
        }));
    }
    if let Some(quick_replies) = &message.quick_replies {
        return Ok(Some(IntentResponse::quick_replies(
            quick_replies.quick_replies.clone(),
        )?));
    }
    if let Some(image) = &message.image {
        return Ok(Some(IntentResponse::Image {
            url: image.image_uri.clone(),
            title: image.accessibility_text.clone(),
        }));
    }
    if let Some(card) = &message.card {
        let button = card.buttons.first();
        return Ok(Some(IntentResponse::Card {
            title: card.title.clone().unwrap_or_default(),
            subtitle: card.subtitle.clone(),
            image: card.image_uri.clone(),
            link: button.map(|b| b.postback.clone()),
            link_title: button.and_then(|b| {
                if b.text.is_empty() || b.text == b.postback {
                    None
                } else {
                    Some(b.text.clone())
                }
            }),
        }));
    }
    if let Some(payload) = &message.payload {
        return Ok(Some(IntentResponse::Custom {
            name: "payload".to_string(),
            payload: payload.clone(),
        }));
    }
    Ok(None)
}

/// Context names come back as full resource paths
/// (`projects/<p>/agent/sessions/<s>/contexts/<name>`); keep the last
/// segment.
fn context_short_name(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Intent;

    fn toy_connector() -> DialogflowConnector {
        let mut agent = AgentDefinition::new("toy_agent");
        agent.register_intent(Intent::new("user_says_hello")).unwrap();
        let config = ConnectorConfig {
            project_id: "toy-project".to_string(),
            ..Default::default()
        };
        DialogflowConnector::new(config, agent, AgentResources::new()).unwrap()
    }

    #[test]
    fn test_new_rejects_missing_project() {
        let agent = AgentDefinition::new("toy_agent");
        let result =
            DialogflowConnector::new(ConnectorConfig::default(), agent, AgentResources::new());
        assert!(matches!(result, Err(ApiError::ConfigError(_))));
    }

    #[test]
    fn test_new_rejects_unknown_rich_platform() {
        let agent = AgentDefinition::new("toy_agent");
        let config = ConnectorConfig {
            project_id: "toy-project".to_string(),
            rich_platforms: vec!["carrier-pigeon".to_string()],
            ..Default::default()
        };
        let result = DialogflowConnector::new(config, agent, AgentResources::new());
        assert!(matches!(result, Err(ApiError::ConfigError(_))));
    }

    #[test]
    fn test_new_rejects_invalid_agent() {
        let mut agent = AgentDefinition::new("toy_agent");
        agent
            .register_intent(
                Intent::new("confirm_order")
                    .with_input_contexts(vec!["missing_context".to_string()]),
            )
            .unwrap();
        let config = ConnectorConfig {
            project_id: "toy-project".to_string(),
            ..Default::default()
        };
        let result = DialogflowConnector::new(config, agent, AgentResources::new());
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_detect_intent_url() {
        let connector = toy_connector();
        assert_eq!(
            connector.detect_intent_url("session-1"),
            "https://dialogflow.googleapis.com/v2/projects/toy-project/agent/sessions/session-1:detectIntent"
        );
    }

    #[test]
    fn test_default_session_is_generated() {
        let connector = toy_connector();
        assert!(!connector.default_session.is_empty());
        assert_eq!(connector.resolve_session(Some("custom")), "custom");
    }

    #[test]
    fn test_decode_query_result() {
        let json = serde_json::json!({
            "intent": {"displayName": "user_says_hello"},
            "intentDetectionConfidence": 0.87,
            "parameters": {"user_name": "Guido"},
            "fulfillmentText": "Hi Guido!",
            "fulfillmentMessages": [
                {"text": {"text": ["Hi Guido!"]}},
                {"platform": "TELEGRAM", "quickReplies": {"quickReplies": ["Say hi back"]}}
            ],
            "outputContexts": [
                {"name": "projects/p/agent/sessions/s/contexts/greeted", "lifespanCount": 2}
            ]
        });
        let result: QueryResult = serde_json::from_value(json).unwrap();
        let prediction = decode_query_result(result).unwrap();

        assert_eq!(prediction.intent_name, "user_says_hello");
        assert!((prediction.confidence - 0.87).abs() < f32::EPSILON);
        assert_eq!(
            prediction.parameter("user_name"),
            Some(&serde_json::json!("Guido"))
        );
        assert_eq!(prediction.contexts[0], Context::new("greeted", 2));
        assert_eq!(prediction.fulfillment_text, "Hi Guido!");
        assert_eq!(
            prediction.messages(ResponseGroup::Default),
            &[IntentResponse::text(vec!["Hi Guido!".to_string()])]
        );
        assert!(matches!(
            prediction.messages(ResponseGroup::Rich)[0],
            IntentResponse::QuickReplies { .. }
        ));
    }

    #[test]
    fn test_decode_rejects_overlong_quick_replies() {
        let json = serde_json::json!({
            "fulfillmentMessages": [
                {
                    "platform": "TELEGRAM",
                    "quickReplies": {"quickReplies": ["a reply well beyond the platform cap"]}
                }
            ]
        });
        let result: QueryResult = serde_json::from_value(json).unwrap();
        assert!(matches!(
            decode_query_result(result),
            Err(ApiError::LanguageError(_))
        ));
    }

    #[test]
    fn test_query_input_serializes_one_variant() {
        let input = QueryInput {
            text: Some(TextInput {
                text: "hello".to_string(),
                language_code: "en".to_string(),
            }),
            event: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("text").is_some());
        assert!(json.get("event").is_none());
        assert_eq!(json["text"]["languageCode"], "en");
    }
}
