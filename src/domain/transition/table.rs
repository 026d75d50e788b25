//! Declarative transition table for one business unit.

use std::collections::BTreeSet;

use super::{StateTransition, INITIAL_STATE};
use crate::domain::context::{ContextCondition, ConversationContext};

/// Outcome of evaluating the table for one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionLookup<'a> {
    /// The first transition whose conditions all hold.
    Selected(&'a StateTransition),

    /// Candidates accepted the intent but none had its conditions satisfied.
    /// Carries the first candidate and the condition that stopped it.
    Blocked {
        transition: &'a StateTransition,
        failed: &'a ContextCondition,
    },

    /// No transition leaves the state for this intent.
    NoCandidates,
}

impl<'a> TransitionLookup<'a> {
    pub fn selected(&self) -> Option<&'a StateTransition> {
        match self {
            TransitionLookup::Selected(t) => Some(t),
            _ => None,
        }
    }
}

/// Transitions ordered by descending priority, then definition order.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    transitions: Vec<StateTransition>,
    known_states: BTreeSet<String>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TransitionTable {
    pub fn new(mut transitions: Vec<StateTransition>) -> Self {
        // Stable sort keeps definition order inside a priority tier.
        transitions.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut known_states = BTreeSet::new();
        known_states.insert(INITIAL_STATE.to_string());
        for t in &transitions {
            known_states.insert(t.current_state.clone());
            known_states.insert(t.next_state.clone());
        }

        Self {
            transitions,
            known_states,
        }
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// `initial` plus every state a transition leaves from or goes to.
    pub fn known_states(&self) -> &BTreeSet<String> {
        &self.known_states
    }

    pub fn is_known_state(&self, state: &str) -> bool {
        self.known_states.contains(state)
    }

    /// Next state for the turn, or `None` when nothing applies.
    pub fn find_transition(
        &self,
        current_state: &str,
        intent_name: &str,
        context: &ConversationContext,
    ) -> Option<&str> {
        self.evaluate(current_state, intent_name, context)
            .selected()
            .map(|t| t.next_state.as_str())
    }

    /// Like [`find_transition`](Self::find_transition) but explains failures.
    pub fn evaluate(
        &self,
        current_state: &str,
        intent_name: &str,
        context: &ConversationContext,
    ) -> TransitionLookup<'_> {
        let mut first_blocked: Option<(&StateTransition, &ContextCondition)> = None;

        let candidates = self
            .transitions
            .iter()
            .filter(|t| t.current_state == current_state && t.accepts_intent(intent_name));

        for transition in candidates {
            match transition.first_failing_condition(context) {
                None => return TransitionLookup::Selected(transition),
                Some(failed) => {
                    if first_blocked.is_none() {
                        first_blocked = Some((transition, failed));
                    }
                }
            }
        }

        match first_blocked {
            Some((transition, failed)) => TransitionLookup::Blocked { transition, failed },
            None => TransitionLookup::NoCandidates,
        }
    }
}
