//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and error types that form the
//! vocabulary of the conversational flow domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{FlowError, ValidationError};
pub use ids::{BusinessUnitId, ConversationKey, PersonId, TurnId, MAX_REFERENCE_LENGTH};
pub use timestamp::Timestamp;
