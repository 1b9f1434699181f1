//! Prediction results.
//!
//! A [`Prediction`] abstracts the result of a predict or trigger call from
//! the remote service: the matched intent, the confidence, the parameters
//! resolved from recognized entities, the contexts left active, and the
//! fulfillment messages the agent answers with.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::language::{IntentResponse, ResponseGroup};
use crate::model::Context;

/// Result of a single predict or trigger request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prediction {
    /// Name of the matched intent.
    pub intent_name: String,

    /// Detection confidence in `[0, 1]`. Triggered intents report 1.0.
    pub confidence: f32,

    /// Parameters filled from recognized entities, keyed by parameter name.
    pub parameters: serde_json::Map<String, serde_json::Value>,

    /// Contexts active after this turn, with their remaining lifespans.
    pub contexts: Vec<Context>,

    /// Plain-text fulfillment, when the service rendered one.
    pub fulfillment_text: String,

    /// Fulfillment messages, grouped by response group.
    pub fulfillment_messages: HashMap<ResponseGroup, Vec<IntentResponse>>,
}

impl Prediction {
    /// Messages suitable for the given group. Asking for `Rich` falls back
    /// to `Default` when no rich message was returned.
    pub fn messages(&self, group: ResponseGroup) -> &[IntentResponse] {
        crate::language::response::messages_for_group(&self.fulfillment_messages, group)
    }

    /// The value of one resolved parameter, if present and non-empty.
    pub fn parameter(&self, name: &str) -> Option<&serde_json::Value> {
        self.parameters.get(name).filter(|value| {
            !matches!(value, serde_json::Value::String(s) if s.is_empty())
                && !value.is_null()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_parameters_are_filtered() {
        let mut prediction = Prediction::default();
        prediction
            .parameters
            .insert("user_name".to_string(), serde_json::json!("Guido"));
        prediction
            .parameters
            .insert("pizza_type".to_string(), serde_json::json!(""));
        prediction
            .parameters
            .insert("toppings".to_string(), serde_json::Value::Null);

        assert_eq!(
            prediction.parameter("user_name"),
            Some(&serde_json::json!("Guido"))
        );
        assert!(prediction.parameter("pizza_type").is_none());
        assert!(prediction.parameter("toppings").is_none());
        assert!(prediction.parameter("missing").is_none());
    }

    #[test]
    fn test_rich_messages_fall_back_to_default() {
        let mut prediction = Prediction::default();
        prediction.fulfillment_messages.insert(
            ResponseGroup::Default,
            vec![IntentResponse::text(vec!["plain".to_string()])],
        );
        let messages = prediction.messages(ResponseGroup::Rich);
        assert_eq!(messages.len(), 1);
    }
}
