//! Conversational contexts.
//!
//! A context is a named token with a lifespan, measured in conversation
//! turns. One intent spawns it as an output context, another consumes it as
//! an input context; chaining contexts this way is what orders intents in a
//! conversation.

use serde::{Deserialize, Serialize};

/// Lifespan assigned to output contexts that don't specify one.
pub const DEFAULT_CONTEXT_LIFESPAN: u32 = 2;

/// A named conversational context with a lifespan in turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    #[serde(default = "default_lifespan")]
    pub lifespan: u32,
}

fn default_lifespan() -> u32 {
    DEFAULT_CONTEXT_LIFESPAN
}

impl Context {
    pub fn new(name: impl Into<String>, lifespan: u32) -> Self {
        Self {
            name: name.into(),
            lifespan,
        }
    }

    /// Context with the default lifespan of two turns.
    pub fn with_default_lifespan(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_CONTEXT_LIFESPAN)
    }
}
