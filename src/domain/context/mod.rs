//! Conversation context and the conditions evaluated against it.

mod bag;
mod condition;

pub use bag::{ConversationContext, LAST_INTENT_KEY, LAST_INTERACTION_KEY};
pub(crate) use bag::render_value;
pub use condition::{ComparisonOp, ConditionKind, ContextCondition};
