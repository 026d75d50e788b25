//! HTTP DTOs for conversation endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::application::handlers::InboundMessageResult;
use crate::domain::conversation::{ConversationState, ResponseDescriptor};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/business-units/:bu/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessageRequest {
    pub person_id: String,
    pub text: String,
    /// Channel to deliver the response through.
    #[serde(default)]
    pub channel: Option<String>,
}

/// Body of `PATCH .../context`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContextRequest {
    pub updates: BTreeMap<String, Value>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Descriptor plus the delivery outcome, when one was requested.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    #[serde(flatten)]
    pub descriptor: ResponseDescriptor,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryStatus {
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<InboundMessageResult> for MessageResponse {
    fn from(result: InboundMessageResult) -> Self {
        let delivery = result.delivery.map(|outcome| match outcome {
            Ok(report) => DeliveryStatus {
                delivered: true,
                channel: Some(report.channel),
                attempts: Some(report.attempts),
                used_fallback: report.used_fallback,
                error: None,
            },
            Err(e) => DeliveryStatus {
                delivered: false,
                channel: None,
                attempts: None,
                used_fallback: false,
                error: Some(e.to_string()),
            },
        });
        Self {
            descriptor: result.descriptor,
            delivery,
        }
    }
}

/// View of a stored conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub person_id: String,
    pub business_unit: String,
    pub current_state: String,
    pub menu_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_menu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_submenu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    pub context: BTreeMap<String, Value>,
    pub turn_count: u64,
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ConversationState> for ConversationView {
    fn from(state: ConversationState) -> Self {
        Self {
            person_id: state.person_id.to_string(),
            business_unit: state.business_unit.to_string(),
            current_state: state.current_state,
            menu_page: state.menu_page,
            last_menu: state.last_menu,
            last_submenu: state.last_submenu,
            search_term: state.search_term,
            context: state.context.into_map(),
            turn_count: state.turn_count,
            version: state.version,
            created_at: state.created_at,
            updated_at: state.updated_at,
        }
    }
}

/// Error body for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
