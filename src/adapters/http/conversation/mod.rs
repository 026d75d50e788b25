//! HTTP adapter for conversation endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ConversationView, DeliveryStatus, ErrorResponse, InboundMessageRequest, MessageResponse,
    UpdateContextRequest,
};
pub use handlers::{health, ApiError, ConversationAppState};
pub use routes::conversation_routes;
