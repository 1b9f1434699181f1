//! CLI Tooling
//!
//! Command-line interface over an agent project directory: validate the
//! definition, export it as an import archive, upload it, and run predict
//! or trigger queries against the deployed agent.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use crate::config::ParleyConfig;
use crate::connector::{DialogflowConnector, Prediction, ServiceConnector};
use crate::error::ApiError;
use crate::language::{LanguageCode, ResponseGroup};
use crate::load_agent_project;
use crate::logging;

/// Parley CLI - Conversational agents as data
#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Define conversational agents, export them and talk to them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Agent project directory (contains agent.toml and language/)
    #[arg(long, default_value = ".")]
    pub agent_dir: PathBuf,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the agent definition and its language resources
    Validate,
    /// Write the agent as a platform import archive
    Export {
        /// Output zip path
        #[arg(long, default_value = "agent.zip")]
        output: PathBuf,
    },
    /// Upload the agent to the configured project, replacing what is deployed
    Upload,
    /// Send a message to the deployed agent and print the matched intent
    Predict {
        /// The user message
        message: String,
        /// Session id (defaults to the configured or a random session)
        #[arg(long)]
        session: Option<String>,
        /// Language code, e.g. "en" or "it"
        #[arg(long)]
        language: Option<LanguageCode>,
    },
    /// Trigger an intent directly by name
    Trigger {
        /// Intent name
        intent: String,
        /// Parameter values as a JSON object
        #[arg(long, default_value = "{}")]
        parameters: String,
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        language: Option<LanguageCode>,
    },
}

/// Holds the loaded configuration and drives command execution.
pub struct CliContext {
    config: ParleyConfig,
    agent_dir: PathBuf,
}

impl CliContext {
    pub fn new(cli: &Cli) -> Result<Self, ApiError> {
        let mut config = ParleyConfig::load(cli.config.as_deref())?;
        if let Some(level) = &cli.log_level {
            config.logging.level = level.clone();
        }
        logging::init_logging(&config.logging)?;
        Ok(Self {
            config,
            agent_dir: cli.agent_dir.clone(),
        })
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Validate => self.validate(),
            Commands::Export { output } => self.export(output),
            Commands::Upload => {
                self.connector()?.upload().await?;
                Ok(format!(
                    "Uploaded agent to project '{}'",
                    self.config.connector.project_id
                ))
            }
            Commands::Predict {
                message,
                session,
                language,
            } => {
                let prediction = self
                    .connector()?
                    .predict(message, session.as_deref(), *language)
                    .await?;
                Ok(format_prediction(&prediction))
            }
            Commands::Trigger {
                intent,
                parameters,
                session,
                language,
            } => {
                let parameters: serde_json::Map<String, serde_json::Value> =
                    serde_json::from_str(parameters).map_err(|e| {
                        ApiError::ValidationError(format!("Invalid parameters JSON: {}", e))
                    })?;
                let prediction = self
                    .connector()?
                    .trigger(intent, parameters, session.as_deref(), *language)
                    .await?;
                Ok(format_prediction(&prediction))
            }
        }
    }

    fn validate(&self) -> Result<String, ApiError> {
        let (agent, _resources) = load_agent_project(&self.agent_dir)?;
        agent.validate().into_result()?;
        Ok(format!(
            "Agent '{}' is valid: {} intents, {} entities, {} languages",
            agent.name(),
            agent.intents().len(),
            agent.entities().count(),
            agent.languages().len()
        ))
    }

    fn export(&self, output: &PathBuf) -> Result<String, ApiError> {
        let connector = self.connector_for_export()?;
        connector.export(output)?;
        Ok(format!("Wrote {}", output.display()))
    }

    fn connector(&self) -> Result<DialogflowConnector, ApiError> {
        let (agent, resources) = load_agent_project(&self.agent_dir)?;
        DialogflowConnector::new(self.config.connector.clone(), agent, resources)
    }

    /// Export needs no project credentials; substitute a placeholder project
    /// id when none is configured.
    fn connector_for_export(&self) -> Result<DialogflowConnector, ApiError> {
        let (agent, resources) = load_agent_project(&self.agent_dir)?;
        let mut config = self.config.connector.clone();
        if config.project_id.is_empty() {
            config.project_id = agent.name().to_string();
        }
        DialogflowConnector::new(config, agent, resources)
    }
}

fn format_prediction(prediction: &Prediction) -> String {
    let messages: Vec<serde_json::Value> = prediction
        .messages(ResponseGroup::Rich)
        .iter()
        .map(|m| serde_json::to_value(m).unwrap_or_default())
        .collect();
    json!({
        "intent": prediction.intent_name,
        "confidence": prediction.confidence,
        "parameters": prediction.parameters,
        "contexts": prediction.contexts,
        "fulfillment_text": prediction.fulfillment_text,
        "messages": messages,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_predict() {
        let cli = Cli::parse_from(["parley", "predict", "hello there", "--language", "it"]);
        match cli.command {
            Commands::Predict {
                message, language, ..
            } => {
                assert_eq!(message, "hello there");
                assert_eq!(language, Some(LanguageCode::It));
            }
            _ => panic!("expected predict command"),
        }
    }

    #[test]
    fn test_cli_parses_trigger_parameters() {
        let cli = Cli::parse_from([
            "parley",
            "trigger",
            "order_pizza",
            "--parameters",
            r#"{"pizza_type": "margherita"}"#,
        ]);
        match cli.command {
            Commands::Trigger { parameters, .. } => {
                let parsed: serde_json::Map<String, serde_json::Value> =
                    serde_json::from_str(&parameters).unwrap();
                assert_eq!(parsed["pizza_type"], "margherita");
            }
            _ => panic!("expected trigger command"),
        }
    }

    #[test]
    fn test_format_prediction_is_json() {
        let prediction = Prediction {
            intent_name: "user_says_hello".to_string(),
            confidence: 0.9,
            ..Default::default()
        };
        let rendered = format_prediction(&prediction);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["intent"], "user_says_hello");
    }
}
