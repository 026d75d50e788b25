//! HTTP routes for conversation endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    get_conversation, receive_message, reset_conversation, update_context, ConversationAppState,
};

/// Creates the business unit router with all conversation endpoints.
pub fn conversation_routes(state: ConversationAppState) -> Router {
    Router::new()
        .route("/api/business-units/:bu/messages", post(receive_message))
        .route(
            "/api/business-units/:bu/conversations/:person_id",
            get(get_conversation),
        )
        .route(
            "/api/business-units/:bu/conversations/:person_id/context",
            patch(update_context),
        )
        .route(
            "/api/business-units/:bu/conversations/:person_id/reset",
            post(reset_conversation),
        )
        .with_state(state)
}
