//! HTTP handlers for conversation endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, Secret};
use serde_json::json;
use thiserror::Error;

use crate::adapters::http::signature::{operator_payload, verify_signature, SIGNATURE_HEADER};
use crate::application::handlers::{
    InboundMessageCommand, InboundMessageHandler, ProcessMessageCommand,
};
use crate::domain::foundation::{
    BusinessUnitId, ConversationKey, FlowError, PersonId, ValidationError,
};

use super::dto::{
    ConversationView, ErrorResponse, InboundMessageRequest, MessageResponse, UpdateContextRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ConversationAppState {
    inbound: Arc<InboundMessageHandler>,
    signing_secret: Option<Arc<Secret<String>>>,
}

impl ConversationAppState {
    pub fn new(inbound: Arc<InboundMessageHandler>) -> Self {
        Self {
            inbound,
            signing_secret: None,
        }
    }

    /// Require `X-Flow-Signature` on every conversation endpoint.
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(Arc::new(Secret::new(secret.into())));
        self
    }

    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), ApiError> {
        let Some(secret) = &self.signing_secret else {
            return Ok(());
        };
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        verify_signature(secret.expose_secret().as_bytes(), body, header)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))
    }

    fn verify_operator(&self, headers: &HeaderMap, uri: &Uri, body: &[u8]) -> Result<(), ApiError> {
        if self.signing_secret.is_none() {
            return Ok(());
        }
        self.verify(headers, &operator_payload(uri.path(), body))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::StorageTransient(reason) => ApiError::Unavailable(reason),
            err @ FlowError::UnknownBusinessUnit { .. } => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }
        (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
    }
}

fn conversation_key(business_unit: &str, person_id: &str) -> Result<ConversationKey, ApiError> {
    Ok(ConversationKey::new(
        PersonId::new(person_id)?,
        BusinessUnitId::new(business_unit)?,
    ))
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/business-units/:bu/messages - Process one inbound message
pub async fn receive_message(
    State(state): State<ConversationAppState>,
    Path(business_unit): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    state.verify(&headers, &body)?;

    let req: InboundMessageRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?;
    let key = conversation_key(&business_unit, &req.person_id)?;

    let cmd = InboundMessageCommand {
        message: ProcessMessageCommand::new(key.person_id, key.business_unit, req.text),
        channel: req.channel,
    };
    let result = state.inbound.handle(cmd).await?;
    Ok(Json(result.into()))
}

/// GET /api/business-units/:bu/conversations/:person_id - Stored conversation
pub async fn get_conversation(
    State(state): State<ConversationAppState>,
    Path((business_unit, person_id)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<ConversationView>, ApiError> {
    state.verify_operator(&headers, &uri, &[])?;
    let key = conversation_key(&business_unit, &person_id)?;
    match state.inbound.manager().conversation(&key).await? {
        Some(conversation) => Ok(Json(conversation.into())),
        None => Err(ApiError::NotFound(format!("Conversation not found: {}", key))),
    }
}

/// PATCH /api/business-units/:bu/conversations/:person_id/context - Merge context
pub async fn update_context(
    State(state): State<ConversationAppState>,
    Path((business_unit, person_id)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    state.verify_operator(&headers, &uri, &body)?;

    let req: UpdateContextRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?;
    let key = conversation_key(&business_unit, &person_id)?;
    state.inbound.manager().update_context(&key, req.updates).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/business-units/:bu/conversations/:person_id/reset - Back to `initial`
pub async fn reset_conversation(
    State(state): State<ConversationAppState>,
    Path((business_unit, person_id)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<ConversationView>, ApiError> {
    state.verify_operator(&headers, &uri, &[])?;
    let key = conversation_key(&business_unit, &person_id)?;
    let conversation = state.inbound.manager().reset_conversation(&key).await?;
    Ok(Json(conversation.into()))
}

/// GET /health
pub async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_transient_maps_to_503() {
        let response = ApiError::from(FlowError::StorageTransient("timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn validation_error_maps_to_400() {
        let response = ApiError::from(ValidationError::empty_field("person_id")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn configuration_error_maps_to_500() {
        let response =
            ApiError::from(FlowError::Configuration("no intents".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_business_unit_maps_to_404() {
        let response = ApiError::from(FlowError::UnknownBusinessUnit {
            business_unit: "acme".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_references_are_rejected() {
        assert!(matches!(
            conversation_key("huntred", "   "),
            Err(ApiError::BadRequest(_))
        ));
        assert!(conversation_key("huntred", "p-1").is_ok());
    }
}
