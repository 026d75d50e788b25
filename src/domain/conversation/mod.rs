//! Conversation domain module.
//!
//! The persistent conversation record, the descriptor returned for each
//! turn and the template renderer used to build response text.

mod response;
mod state;
mod template;

pub use response::ResponseDescriptor;
pub use state::ConversationState;
pub use template::{render_template, TemplateScope};
