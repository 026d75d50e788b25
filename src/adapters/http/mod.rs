//! HTTP adapters - REST API implementations.
//!
//! A thin axum surface so channel gateways can push messages and operators
//! can inspect or nudge conversations.

pub mod conversation;
pub mod signature;

pub use conversation::{conversation_routes, ApiError, ConversationAppState};
pub use signature::{operator_payload, sign, verify_signature, SignatureError, SIGNATURE_HEADER};

use std::time::Duration;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Full application router: health check, conversation endpoints, request
/// tracing and a per-request timeout.
pub fn app_router(state: ConversationAppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(conversation::health))
        .merge(conversation_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}
