//! Intent recognition: per business unit pattern sets and the matcher
//! that classifies free text.

mod matcher;
mod pattern;

pub use matcher::{
    normalize_text, BuiltinCommands, IntentMatch, IntentMatcher, DEFAULT_RESET_COMMANDS,
    RESET_INTENT,
};
pub use pattern::IntentPattern;
