//! Domain layer containing the conversational flow logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, timestamps, errors)
//! - `context` - Conversation context bag and context conditions
//! - `intent` - Intent patterns and the intent matcher
//! - `transition` - State transition rules and the transition table
//! - `conversation` - Conversation record, response descriptors, templates
//! - `flow` - Flow catalog and compiled per business unit flows

pub mod context;
pub mod conversation;
pub mod flow;
pub mod foundation;
pub mod intent;
pub mod transition;
