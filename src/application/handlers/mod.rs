//! Application handlers.
//!
//! Command handlers that orchestrate the domain through the ports.

mod conversation_admin;
mod flow_manager;
mod inbound_message;

pub use flow_manager::{
    FlowManager, FlowPolicy, ProcessMessageCommand, DEFAULT_FALLBACK_RESPONSE,
    DEFAULT_MISSING_CONTEXT_RESPONSE, DEFAULT_RESET_RESPONSE,
};
pub(crate) use flow_manager::object_entries;
pub use inbound_message::{InboundMessageCommand, InboundMessageHandler, InboundMessageResult};
