//! Context conditions: predicates over the conversation context that guard
//! state transitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::ConversationContext;

/// How a condition inspects its context key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// `context[name] == value`
    Equals,
    /// `name in context`
    Exists,
    /// `context[name] <op> value` on numbers.
    Compare,
    /// `context[name] in value` where value is a list.
    OneOf,
}

/// Numeric comparison operator for [`ConditionKind::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "<", alias = "lt")]
    LessThan,
    #[serde(rename = "<=", alias = "lte")]
    LessOrEqual,
    #[serde(rename = ">", alias = "gt")]
    GreaterThan,
    #[serde(rename = ">=", alias = "gte")]
    GreaterOrEqual,
}

impl ComparisonOp {
    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            ComparisonOp::LessThan => left < right,
            ComparisonOp::LessOrEqual => left <= right,
            ComparisonOp::GreaterThan => left > right,
            ComparisonOp::GreaterOrEqual => left >= right,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A single predicate over one context key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextCondition {
    /// Context key the condition reads.
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ConditionKind,

    /// Operator, required for `compare`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<ComparisonOp>,

    /// Comparison operand. Ignored by `exists`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl ContextCondition {
    pub fn equals(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind: ConditionKind::Equals,
            op: None,
            value: value.into(),
        }
    }

    pub fn exists(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ConditionKind::Exists,
            op: None,
            value: Value::Null,
        }
    }

    pub fn compare(name: impl Into<String>, op: ComparisonOp, value: f64) -> Self {
        Self {
            name: name.into(),
            kind: ConditionKind::Compare,
            op: Some(op),
            value: Value::from(value),
        }
    }

    pub fn one_of<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            kind: ConditionKind::OneOf,
            op: None,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Checks the condition is well formed. Returns a human readable reason
    /// when it is not.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("condition name cannot be empty".to_string());
        }
        match self.kind {
            ConditionKind::Equals | ConditionKind::Exists => Ok(()),
            ConditionKind::Compare => {
                if self.op.is_none() {
                    return Err(format!("compare condition '{}' has no op", self.name));
                }
                if numeric(&self.value).is_none() {
                    return Err(format!(
                        "compare condition '{}' needs a numeric value",
                        self.name
                    ));
                }
                Ok(())
            }
            ConditionKind::OneOf => {
                if !self.value.is_array() {
                    return Err(format!(
                        "one_of condition '{}' needs a list value",
                        self.name
                    ));
                }
                Ok(())
            }
        }
    }

    /// Evaluates the condition against a context. Malformed conditions and
    /// non-numeric operands evaluate to false.
    pub fn evaluate(&self, context: &ConversationContext) -> bool {
        match self.kind {
            ConditionKind::Exists => context.contains(&self.name),
            ConditionKind::Equals => context.get(&self.name) == Some(&self.value),
            ConditionKind::Compare => {
                let (Some(op), Some(expected)) = (self.op, numeric(&self.value)) else {
                    return false;
                };
                context
                    .get(&self.name)
                    .and_then(numeric)
                    .map(|actual| op.apply(actual, expected))
                    .unwrap_or(false)
            }
            ConditionKind::OneOf => match (&self.value, context.get(&self.name)) {
                (Value::Array(allowed), Some(actual)) => allowed.contains(actual),
                _ => false,
            },
        }
    }
}

impl fmt::Display for ContextCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConditionKind::Exists => write!(f, "{} exists", self.name),
            ConditionKind::Equals => write!(f, "{} == {}", self.name, self.value),
            ConditionKind::Compare => match self.op {
                Some(op) => write!(f, "{} {} {}", self.name, op, self.value),
                None => write!(f, "{} ? {}", self.name, self.value),
            },
            ConditionKind::OneOf => write!(f, "{} in {}", self.name, self.value),
        }
    }
}

/// Numbers and numeric strings both count as numeric context values.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
