//! Response descriptor handed to channel adapters.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::FlowError;

/// Outcome of one turn, ready for a channel adapter to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    pub success: bool,
    pub current_state: String,
    pub response_text: Option<String>,
    pub error: Option<String>,

    /// Intent recognized for the turn, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    /// Quick replies or menu items to offer with the text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ResponseDescriptor {
    pub fn success(current_state: impl Into<String>, response_text: Option<String>) -> Self {
        Self {
            success: true,
            current_state: current_state.into(),
            response_text,
            error: None,
            intent: None,
            options: Vec::new(),
        }
    }

    /// Failed turn. `error` carries the stable code only; the user sees
    /// `response_text`.
    pub fn failure(
        current_state: impl Into<String>,
        error: &FlowError,
        response_text: Option<String>,
    ) -> Self {
        Self {
            success: false,
            current_state: current_state.into(),
            response_text,
            error: Some(error.code().to_string()),
            intent: None,
            options: Vec::new(),
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}
