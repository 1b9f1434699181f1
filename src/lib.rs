//! Parley: define conversational agents as data, export them to NLU
//! platforms, and talk to them.
//!
//! An agent is a set of intents, parameters, entities and contexts
//! ([`model`]), plus per-language resources: example utterances, slot
//! filling prompts and responses ([`language`]). The definition can be
//! serialized into a Dialogflow ES import archive ([`export`]) and served
//! through a [`connector`] that predicts intents from user messages or
//! triggers them directly.
//!
//! ```no_run
//! use std::path::Path;
//! use parley::{load_agent_project, DialogflowConnector, ServiceConnector};
//! use parley::config::ConnectorConfig;
//!
//! # async fn run() -> Result<(), parley::ApiError> {
//! let (agent, resources) = load_agent_project(Path::new("my_agent"))?;
//! let config = ConnectorConfig {
//!     project_id: "my-gcp-project".to_string(),
//!     ..Default::default()
//! };
//! let connector = DialogflowConnector::new(config, agent, resources)?;
//! connector.upload().await?;
//! let prediction = connector.predict("I want a pizza", None, None).await?;
//! println!("{} ({})", prediction.intent_name, prediction.confidence);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

pub mod cli;
pub mod config;
pub mod connector;
pub mod error;
pub mod export;
pub mod language;
pub mod logging;
pub mod model;

pub use config::{ConnectorConfig, ParleyConfig};
pub use connector::{DialogflowConnector, Prediction, ServiceConnector};
pub use error::ApiError;
pub use language::{AgentResources, IntentResponse, LanguageCode, ResponseGroup};
pub use model::{AgentDefinition, Context, CustomEntity, EntityRef, Intent, Parameter};

/// Load an agent project directory.
///
/// The directory holds an `agent.toml` manifest and a `language/` tree with
/// one folder per language. Every language folder found on disk must be
/// declared in the manifest; every intent needs language data in every
/// declared language.
pub fn load_agent_project(dir: &Path) -> Result<(AgentDefinition, AgentResources), ApiError> {
    let manifest_path = dir.join("agent.toml");
    let agent = AgentDefinition::from_toml_file(&manifest_path)?;

    let language_dir = dir.join("language");
    for code in language::supported_languages(&language_dir)? {
        if !agent.languages().contains(&code) {
            return Err(ApiError::LanguageError(format!(
                "Language folder '{}' exists but is not declared in {}",
                code,
                manifest_path.display()
            )));
        }
    }
    let resources = AgentResources::load(&language_dir, &agent)?;
    Ok((agent, resources))
}
