//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Longest identifier accepted from channel adapters.
pub const MAX_REFERENCE_LENGTH: usize = 128;

fn validate_reference(field: &str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if trimmed.len() > MAX_REFERENCE_LENGTH {
        return Err(ValidationError::too_long(field, MAX_REFERENCE_LENGTH, trimmed.len()));
    }
    if trimmed.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
        return Err(ValidationError::invalid_format(
            field,
            "must not contain control characters or path separators",
        ));
    }
    // Identifiers double as file names in the file store.
    if trimmed.starts_with('.') {
        return Err(ValidationError::invalid_format(field, "must not start with '.'"));
    }
    Ok(trimmed.to_string())
}

/// Reference to the person on the other side of a conversation.
///
/// Channel adapters hand us whatever identifies the sender on their
/// platform (phone number, chat id, email address), so this is an opaque
/// string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonId(String);

impl PersonId {
    /// Creates a validated PersonId.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        validate_reference("person_id", raw.as_ref()).map(Self)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PersonId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PersonId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PersonId> for String {
    fn from(id: PersonId) -> Self {
        id.0
    }
}

/// Business unit code (`huntred`, `amigro`, ...).
///
/// Codes are case-insensitive and stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BusinessUnitId(String);

impl BusinessUnitId {
    /// Creates a validated, lowercased BusinessUnitId.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        validate_reference("business_unit", raw.as_ref()).map(|s| Self(s.to_lowercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BusinessUnitId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BusinessUnitId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BusinessUnitId> for String {
    fn from(id: BusinessUnitId) -> Self {
        id.0
    }
}

/// Identity of one conversation: a person talking to one business unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey {
    pub person_id: PersonId,
    pub business_unit: BusinessUnitId,
}

impl ConversationKey {
    pub fn new(person_id: PersonId, business_unit: BusinessUnitId) -> Self {
        Self {
            person_id,
            business_unit,
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.business_unit, self.person_id)
    }
}

/// Correlation id for a single processed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    /// Creates a new random TurnId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
