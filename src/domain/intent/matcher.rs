//! Intent matching over free text.
//!
//! Matching is plain case-insensitive substring containment. Intents are
//! tried by descending priority; within a priority tier the registration
//! order decides, and the first matching pattern wins.

use serde::{Deserialize, Serialize};

use super::IntentPattern;

/// Name of the built-in intent that forces a conversation back to `initial`.
pub const RESET_INTENT: &str = "reset";

/// Commands that trigger [`RESET_INTENT`] when no configuration overrides them.
pub const DEFAULT_RESET_COMMANDS: &[&str] = &[
    "cancel", "cancelar", "menu", "menú", "reset", "reiniciar", "inicio",
];

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub intent_name: String,
    pub matched_pattern: String,
    pub priority: i32,
}

/// Lowercases, trims and collapses inner whitespace.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
struct CompiledIntent {
    name: String,
    priority: i32,
    /// (original, normalized) pairs; empty patterns are dropped.
    patterns: Vec<(String, String)>,
}

/// Matcher over the enabled intents of one business unit.
#[derive(Debug, Clone, Default)]
pub struct IntentMatcher {
    intents: Vec<CompiledIntent>,
}

impl IntentMatcher {
    /// Builds a matcher from intents in registration order. Disabled
    /// intents are skipped.
    pub fn new<'a, I>(intents: I) -> Self
    where
        I: IntoIterator<Item = &'a IntentPattern>,
    {
        let mut compiled: Vec<CompiledIntent> = intents
            .into_iter()
            .filter(|intent| intent.enabled)
            .map(|intent| CompiledIntent {
                name: intent.name.clone(),
                priority: intent.priority,
                patterns: intent
                    .patterns
                    .iter()
                    .map(|p| (p.clone(), normalize_text(p)))
                    .filter(|(_, normalized)| !normalized.is_empty())
                    .collect(),
            })
            .collect();

        // Stable: equal priorities keep registration order.
        compiled.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self { intents: compiled }
    }

    /// Number of enabled intents.
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Finds the best intent for `text`, or `None` for unrecognized input.
    pub fn find_intent(&self, text: &str) -> Option<IntentMatch> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return None;
        }

        self.intents.iter().find_map(|intent| {
            intent
                .patterns
                .iter()
                .find(|(_, pattern)| normalized.contains(pattern.as_str()))
                .map(|(original, _)| IntentMatch {
                    intent_name: intent.name.clone(),
                    matched_pattern: original.clone(),
                    priority: intent.priority,
                })
        })
    }
}

/// Built-in commands handled before configured intents.
#[derive(Debug, Clone)]
pub struct BuiltinCommands {
    reset: Vec<String>,
}

impl BuiltinCommands {
    pub fn new<I, S>(reset_commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            reset: reset_commands
                .into_iter()
                .map(|c| normalize_text(c.as_ref()))
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// Returns the reset match when the whole input is a reset command.
    pub fn match_reset(&self, text: &str) -> Option<IntentMatch> {
        let normalized = normalize_text(text);
        self.reset
            .iter()
            .find(|command| **command == normalized)
            .map(|command| IntentMatch {
                intent_name: RESET_INTENT.to_string(),
                matched_pattern: command.clone(),
                priority: i32::MAX,
            })
    }
}

impl Default for BuiltinCommands {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_COMMANDS.iter().copied())
    }
}
