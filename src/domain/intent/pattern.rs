//! Intent pattern definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::foundation::BusinessUnitId;

/// A named user purpose and the phrases that reveal it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPattern {
    /// Unique intent token.
    pub name: String,

    /// Match strings, tested in order, case-insensitively.
    pub patterns: Vec<String>,

    /// Higher priority intents are tested first.
    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Business units this intent is active in.
    #[serde(default)]
    pub business_units: BTreeSet<BusinessUnitId>,

    /// Response templates; rotated across turns.
    #[serde(default)]
    pub responses: Vec<String>,

    /// Facts merged into the context when a turn driven by this intent commits.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context_updates: BTreeMap<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl IntentPattern {
    /// Creates an enabled intent with no business units yet.
    pub fn new<I, S>(name: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            priority: 0,
            enabled: true,
            business_units: BTreeSet::new(),
            responses: Vec::new(),
            context_updates: BTreeMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn for_business_unit(mut self, business_unit: BusinessUnitId) -> Self {
        self.business_units.insert(business_unit);
        self
    }

    pub fn with_response(mut self, template: impl Into<String>) -> Self {
        self.responses.push(template.into());
        self
    }

    pub fn with_context_update(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context_updates.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// True when the intent is enabled and scoped to `business_unit`.
    pub fn is_active_for(&self, business_unit: &BusinessUnitId) -> bool {
        self.enabled && self.business_units.contains(business_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(code: &str) -> BusinessUnitId {
        BusinessUnitId::new(code).unwrap()
    }

    #[test]
    fn yaml_defaults_apply() {
        let yaml = "name: greeting\npatterns: [hola]\nbusiness_units: [huntred]\n";
        let intent: IntentPattern = serde_yaml::from_str(yaml).unwrap();
        assert!(intent.enabled);
        assert_eq!(intent.priority, 0);
        assert!(intent.responses.is_empty());
        assert!(intent.is_active_for(&unit("huntred")));
    }

    #[test]
    fn disabled_intent_is_not_active() {
        let intent = IntentPattern::new("greeting", ["hola"])
            .for_business_unit(unit("huntred"))
            .disabled();
        assert!(!intent.is_active_for(&unit("huntred")));
    }

    #[test]
    fn intent_is_scoped_to_its_units() {
        let intent = IntentPattern::new("greeting", ["hola"]).for_business_unit(unit("huntred"));
        assert!(!intent.is_active_for(&unit("amigro")));
    }
}
