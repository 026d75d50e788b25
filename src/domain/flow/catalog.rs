//! Flow catalog: every configuration row for every business unit, as
//! maintained by administrators, plus validation and compilation into
//! per business unit flows.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::BusinessUnitId;
use crate::domain::intent::{IntentPattern, RESET_INTENT};
use crate::domain::transition::StateTransition;

use super::{BusinessUnitFlow, BusinessUnitSettings};

/// Errors raised while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// Raw configuration rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowCatalog {
    #[serde(default)]
    pub business_units: Vec<BusinessUnitSettings>,

    #[serde(default)]
    pub intents: Vec<IntentPattern>,

    #[serde(default)]
    pub transitions: Vec<StateTransition>,
}

impl FlowCatalog {
    /// Parses a YAML catalog document.
    pub fn from_yaml(source: &str) -> Result<Self, CatalogError> {
        serde_yaml::from_str(source).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Appends another catalog's rows after this one's, preserving order.
    pub fn extend(&mut self, other: FlowCatalog) {
        self.business_units.extend(other.business_units);
        self.intents.extend(other.intents);
        self.transitions.extend(other.transitions);
    }

    /// Every business unit mentioned anywhere in the catalog.
    pub fn business_unit_ids(&self) -> BTreeSet<BusinessUnitId> {
        let mut units: BTreeSet<BusinessUnitId> = self
            .business_units
            .iter()
            .map(|s| s.business_unit.clone())
            .collect();
        for intent in &self.intents {
            units.extend(intent.business_units.iter().cloned());
        }
        units.extend(self.transitions.iter().map(|t| t.business_unit.clone()));
        units
    }

    /// Checks structural rules that the storage layer never enforced.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen_units = HashSet::new();
        for settings in &self.business_units {
            if !seen_units.insert(&settings.business_unit) {
                return Err(invalid(format!(
                    "business unit '{}' is configured twice",
                    settings.business_unit
                )));
            }
        }

        let mut seen_intents = HashSet::new();
        for intent in &self.intents {
            let name = intent.name.trim();
            if name.is_empty() {
                return Err(invalid("intent name cannot be empty"));
            }
            if name == RESET_INTENT {
                return Err(invalid(format!("intent name '{}' is reserved", RESET_INTENT)));
            }
            if !seen_intents.insert(name) {
                return Err(invalid(format!("intent '{}' is defined twice", name)));
            }
            if intent.business_units.is_empty() {
                return Err(invalid(format!(
                    "intent '{}' is not scoped to any business unit",
                    name
                )));
            }
            if intent.enabled && intent.patterns.iter().all(|p| p.trim().is_empty()) {
                return Err(invalid(format!("intent '{}' has no usable patterns", name)));
            }
        }

        for (index, transition) in self.transitions.iter().enumerate() {
            let label = format!(
                "transition #{} ({} -> {})",
                index + 1,
                transition.current_state,
                transition.next_state
            );
            if transition.current_state.trim().is_empty() || transition.next_state.trim().is_empty() {
                return Err(invalid(format!("{}: states cannot be empty", label)));
            }
            if let Some(intent_name) = &transition.conditions.intent {
                let scoped = self.intents.iter().any(|i| {
                    &i.name == intent_name && i.business_units.contains(&transition.business_unit)
                });
                if !scoped {
                    return Err(invalid(format!(
                        "{}: intent '{}' is not defined for business unit '{}'",
                        label, intent_name, transition.business_unit
                    )));
                }
            }
            for condition in &transition.conditions.context {
                condition
                    .validate()
                    .map_err(|reason| invalid(format!("{}: {}", label, reason)))?;
            }
        }

        Ok(())
    }

    /// Validates and splits the catalog into one immutable flow per
    /// business unit.
    pub fn compile(&self) -> Result<HashMap<BusinessUnitId, Arc<BusinessUnitFlow>>, CatalogError> {
        self.validate()?;

        let flows = self
            .business_unit_ids()
            .into_iter()
            .map(|unit| {
                let settings = self
                    .business_units
                    .iter()
                    .find(|s| s.business_unit == unit)
                    .cloned()
                    .unwrap_or_else(|| BusinessUnitSettings::new(unit.clone()));

                let intents: Vec<IntentPattern> = self
                    .intents
                    .iter()
                    .filter(|i| i.business_units.contains(&unit))
                    .cloned()
                    .collect();

                let transitions: Vec<StateTransition> = self
                    .transitions
                    .iter()
                    .filter(|t| t.business_unit == unit)
                    .cloned()
                    .collect();

                let flow = BusinessUnitFlow::new(settings, intents, transitions);
                (unit, Arc::new(flow))
            })
            .collect();

        Ok(flows)
    }
}

fn invalid(reason: impl Into<String>) -> CatalogError {
    CatalogError::Invalid(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
business_units:
  - business_unit: huntred
    fallback_response: "No entendí, escribe 'menu'."
intents:
  - name: greeting
    patterns: [hola, buenos dias]
    business_units: [huntred, amigro]
    responses: ["¡Hola {{name|}}!"]
  - name: profile
    patterns: [perfil]
    business_units: [huntred]
transitions:
  - business_unit: huntred
    current_state: initial
    next_state: greeting
    conditions:
      intent: greeting
  - business_unit: huntred
    current_state: greeting
    next_state: profile
    conditions:
      intent: profile
      context:
        - name: has_profile
          type: equals
          value: true
"#;

    fn unit(code: &str) -> BusinessUnitId {
        BusinessUnitId::new(code).unwrap()
    }

    #[test]
    fn parses_and_compiles_per_unit() {
        let catalog = FlowCatalog::from_yaml(CATALOG).unwrap();
        let flows = catalog.compile().unwrap();

        assert_eq!(flows.len(), 2);
        let huntred = &flows[&unit("huntred")];
        assert_eq!(huntred.intents().len(), 2);
        assert_eq!(huntred.table().len(), 2);

        let amigro = &flows[&unit("amigro")];
        assert_eq!(amigro.intents().len(), 1);
        assert!(amigro.table().is_empty());
    }

    #[test]
    fn rejects_duplicate_intent_names() {
        let mut catalog = FlowCatalog::from_yaml(CATALOG).unwrap();
        let dup = catalog.intents[0].clone();
        catalog.intents.push(dup);
        assert!(matches!(catalog.validate(), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn rejects_reserved_reset_intent() {
        let mut catalog = FlowCatalog::default();
        catalog
            .intents
            .push(IntentPattern::new("reset", ["reinicia"]).for_business_unit(unit("huntred")));
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn rejects_unscoped_intent() {
        let mut catalog = FlowCatalog::default();
        catalog.intents.push(IntentPattern::new("greeting", ["hola"]));
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn rejects_transition_on_foreign_intent() {
        let mut catalog = FlowCatalog::from_yaml(CATALOG).unwrap();
        catalog.transitions.push(
            StateTransition::new(unit("amigro"), "initial", "profile").on_intent("profile"),
        );
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("not defined for business unit 'amigro'"));
    }

    #[test]
    fn rejects_malformed_condition() {
        let yaml = r#"
intents:
  - name: age_check
    patterns: [edad]
    business_units: [amigro]
transitions:
  - business_unit: amigro
    current_state: initial
    next_state: eligible
    conditions:
      intent: age_check
      context:
        - name: age
          type: compare
          value: 18
"#;
        let catalog = FlowCatalog::from_yaml(yaml).unwrap();
        assert!(catalog.compile().is_err());
    }

    #[test]
    fn extend_keeps_registration_order() {
        let mut first = FlowCatalog::default();
        first
            .intents
            .push(IntentPattern::new("a", ["x"]).for_business_unit(unit("huntred")));
        let mut second = FlowCatalog::default();
        second
            .intents
            .push(IntentPattern::new("b", ["x"]).for_business_unit(unit("huntred")));

        first.extend(second);
        let flows = first.compile().unwrap();
        let found = flows[&unit("huntred")].match_intent("x").unwrap();
        assert_eq!(found.intent_name, "a");
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            FlowCatalog::from_yaml("intents: [: oops"),
            Err(CatalogError::Parse(_))
        ));
    }
}
