//! State transition rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::context::{ContextCondition, ConversationContext};
use crate::domain::foundation::BusinessUnitId;

/// What has to hold for a transition to fire, besides its source state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionConditions {
    /// Required intent. `None` accepts any recognized intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    /// All must hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextCondition>,
}

/// Menu page movement applied when a transition commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMove {
    Next,
    Previous,
    First,
}

/// Navigation side effects of a transition on the conversation record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEffects {
    /// Enter this menu: sets `last_menu`, clears the submenu, rewinds paging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submenu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMove>,

    /// Store the raw input as the conversation's search term.
    #[serde(default)]
    pub capture_search_term: bool,
}

impl TransitionEffects {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A rule moving a conversation from one state to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub business_unit: BusinessUnitId,
    pub current_state: String,
    pub next_state: String,

    #[serde(default)]
    pub conditions: TransitionConditions,

    /// Higher priority transitions are evaluated first.
    #[serde(default)]
    pub priority: i32,

    /// Response template overriding the intent's responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Prompt shown when the intent matched but the context conditions did not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_context_response: Option<String>,

    /// Quick replies or menu items offered with the response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context_updates: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "TransitionEffects::is_empty")]
    pub effects: TransitionEffects,
}

impl StateTransition {
    pub fn new(
        business_unit: BusinessUnitId,
        current_state: impl Into<String>,
        next_state: impl Into<String>,
    ) -> Self {
        Self {
            business_unit,
            current_state: current_state.into(),
            next_state: next_state.into(),
            conditions: TransitionConditions::default(),
            priority: 0,
            response: None,
            missing_context_response: None,
            options: Vec::new(),
            context_updates: BTreeMap::new(),
            effects: TransitionEffects::default(),
        }
    }

    pub fn on_intent(mut self, intent: impl Into<String>) -> Self {
        self.conditions.intent = Some(intent.into());
        self
    }

    pub fn when(mut self, condition: ContextCondition) -> Self {
        self.conditions.context.push(condition);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_response(mut self, template: impl Into<String>) -> Self {
        self.response = Some(template.into());
        self
    }

    pub fn with_missing_context_response(mut self, template: impl Into<String>) -> Self {
        self.missing_context_response = Some(template.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context_update(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context_updates.insert(key.into(), value.into());
        self
    }

    pub fn with_effects(mut self, effects: TransitionEffects) -> Self {
        self.effects = effects;
        self
    }

    /// True when the transition's intent constraint admits `intent_name`.
    pub fn accepts_intent(&self, intent_name: &str) -> bool {
        self.conditions
            .intent
            .as_deref()
            .map_or(true, |required| required == intent_name)
    }

    /// First context condition that does not hold, if any.
    pub fn first_failing_condition(&self, context: &ConversationContext) -> Option<&ContextCondition> {
        self.conditions
            .context
            .iter()
            .find(|condition| !condition.evaluate(context))
    }
}
