//! Conversation Store Port - Interface for persisting conversation records.
//!
//! One record per (person, business unit). Saves are whole-record and
//! version checked: a save succeeds only when the stored version is exactly
//! one behind the record being written, so concurrent writers from other
//! processes surface as [`StoreError::Conflict`] instead of lost updates.

use async_trait::async_trait;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ConversationKey;

/// Errors that can occur during conversation store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Storage operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Version conflict for {key}: expected stored version {expected}, found {found}")]
    Conflict {
        key: String,
        expected: u64,
        found: u64,
    },

    #[error("Failed to (de)serialize conversation: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Key cannot be stored: {0}")]
    InvalidKey(String),
}

impl StoreError {
    /// True when the same operation may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Timeout(_)
                | StoreError::Unavailable(_)
                | StoreError::Conflict { .. }
                | StoreError::Io(_)
                | StoreError::Database(_)
        )
    }
}

/// Port for loading and saving conversation records.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Loads the record for `key`, or `None` if the person has never
    /// talked to this business unit.
    async fn load(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StoreError>;

    /// Writes the whole record atomically.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` when the stored version is not
    /// `state.version - 1`.
    async fn save(&self, state: &ConversationState) -> Result<(), StoreError>;

    /// Removes the record. Missing records are not an error.
    async fn delete(&self, key: &ConversationKey) -> Result<(), StoreError>;
}

/// Checks the optimistic concurrency rule shared by every store.
pub fn check_version(
    key: &ConversationKey,
    stored: Option<u64>,
    incoming: u64,
) -> Result<(), StoreError> {
    let found = stored.unwrap_or(0);
    let expected = incoming.saturating_sub(1);
    if incoming == 0 || found != expected {
        return Err(StoreError::Conflict {
            key: key.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
