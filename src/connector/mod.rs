//! Service Connectors
//!
//! A connector binds an [`AgentDefinition`](crate::model::AgentDefinition)
//! to a remote NLU platform. It can export the agent in the platform's
//! archive format, upload it, and run predict and trigger requests against
//! the hosted agent.

pub mod dialogflow;
pub mod prediction;

use std::path::Path;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::language::LanguageCode;
use crate::model::AgentDefinition;

pub use dialogflow::DialogflowConnector;
pub use prediction::Prediction;

/// Operations every NLU platform connector supports.
///
/// `session` and `language` parameters default to the connector's configured
/// session and language when `None`.
#[async_trait]
pub trait ServiceConnector {
    /// The agent definition this connector serves.
    fn agent(&self) -> &AgentDefinition;

    /// Write the agent in the platform's import format to `destination`.
    fn export(&self, destination: &Path) -> Result<(), ApiError>;

    /// Upload the agent to the remote platform, replacing what is deployed.
    async fn upload(&self) -> Result<(), ApiError>;

    /// Ask the platform to match `message` against the agent's intents.
    async fn predict(
        &self,
        message: &str,
        session: Option<&str>,
        language: Option<LanguageCode>,
    ) -> Result<Prediction, ApiError>;

    /// Trigger a specific intent by its derived event, passing parameter
    /// values along.
    async fn trigger(
        &self,
        intent_name: &str,
        parameters: serde_json::Map<String, serde_json::Value>,
        session: Option<&str>,
        language: Option<LanguageCode>,
    ) -> Result<Prediction, ApiError>;
}
