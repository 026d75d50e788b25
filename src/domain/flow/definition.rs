//! Compiled, immutable flow for one business unit.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BusinessUnitId, FlowError};
use crate::domain::intent::{IntentMatch, IntentMatcher, IntentPattern};
use crate::domain::transition::{StateTransition, TransitionTable};

/// Per business unit response texts. Unset texts fall back to the engine
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessUnitSettings {
    pub business_unit: BusinessUnitId,

    #[serde(default)]
    pub fallback_response: Option<String>,

    #[serde(default)]
    pub missing_context_response: Option<String>,

    #[serde(default)]
    pub reset_response: Option<String>,
}

impl BusinessUnitSettings {
    pub fn new(business_unit: BusinessUnitId) -> Self {
        Self {
            business_unit,
            fallback_response: None,
            missing_context_response: None,
            reset_response: None,
        }
    }
}

/// Matcher, intent lookup and transition table for one business unit.
#[derive(Debug, Clone)]
pub struct BusinessUnitFlow {
    settings: BusinessUnitSettings,
    intents: Vec<IntentPattern>,
    matcher: IntentMatcher,
    table: TransitionTable,
}

impl BusinessUnitFlow {
    /// Intents and transitions must already be scoped to the unit named by
    /// `settings`.
    pub fn new(
        settings: BusinessUnitSettings,
        intents: Vec<IntentPattern>,
        transitions: Vec<StateTransition>,
    ) -> Self {
        let matcher = IntentMatcher::new(&intents);
        Self {
            settings,
            intents,
            matcher,
            table: TransitionTable::new(transitions),
        }
    }

    pub fn business_unit(&self) -> &BusinessUnitId {
        &self.settings.business_unit
    }

    pub fn settings(&self) -> &BusinessUnitSettings {
        &self.settings
    }

    /// Every intent scoped to the unit, enabled or not, in registration order.
    pub fn intents(&self) -> &[IntentPattern] {
        &self.intents
    }

    pub fn intent(&self, name: &str) -> Option<&IntentPattern> {
        self.intents.iter().find(|i| i.name == name)
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn match_intent(&self, text: &str) -> Option<IntentMatch> {
        self.matcher.find_intent(text)
    }

    /// Reports a unit that cannot recognize anything.
    pub fn configuration_issue(&self) -> Option<FlowError> {
        self.matcher.is_empty().then(|| {
            FlowError::Configuration(format!(
                "business unit '{}' has no enabled intents",
                self.settings.business_unit
            ))
        })
    }
}
