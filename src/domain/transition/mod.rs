//! State transitions: rules and the per business unit table that selects
//! the next state for a turn.

mod rule;
mod table;

pub use rule::{PageMove, StateTransition, TransitionConditions, TransitionEffects};
pub use table::{TransitionLookup, TransitionTable};

/// Universal start state of every conversation.
pub const INITIAL_STATE: &str = "initial";
