//! Out-of-band conversation operations: context reads and writes, resets
//! and inspection. Writes take the same per-conversation lock as turns.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::context::ConversationContext;
use crate::domain::conversation::ConversationState;
use crate::domain::foundation::{ConversationKey, FlowError, Timestamp};

use super::FlowManager;

impl FlowManager {
    /// Current context, or an empty one for a conversation that has never
    /// been saved.
    pub async fn get_context(&self, key: &ConversationKey) -> Result<ConversationContext, FlowError> {
        Ok(self
            .load(key)
            .await?
            .map(|state| state.context)
            .unwrap_or_default())
    }

    /// Shallow merge of `updates` into the context; last write wins. The
    /// conversation is created if needed.
    ///
    /// # Errors
    ///
    /// `FlowError::UnknownBusinessUnit` when the unit has no flow; nothing
    /// is stored.
    pub async fn update_context(
        &self,
        key: &ConversationKey,
        updates: BTreeMap<String, Value>,
    ) -> Result<ConversationContext, FlowError> {
        self.ensure_configured(&key.business_unit).await?;
        let _guard = self.locks().acquire(key).await;

        let mut state = self.load_or_create(key).await?;
        let keys: Vec<String> = updates.keys().cloned().collect();
        state.context.merge(updates);
        state.updated_at = Timestamp::now();
        self.commit(&mut state).await?;

        tracing::info!(conversation = %key, keys = ?keys, "Context updated");
        Ok(state.context)
    }

    /// Forces the conversation back to `initial`, keeping its context.
    pub async fn reset_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<ConversationState, FlowError> {
        self.ensure_configured(&key.business_unit).await?;
        let _guard = self.locks().acquire(key).await;

        let mut state = self.load_or_create(key).await?;
        state.reset_to_initial();
        state.updated_at = Timestamp::now();
        self.commit(&mut state).await?;

        tracing::info!(conversation = %key, "Conversation reset by operator");
        Ok(state)
    }

    /// Stored conversation, if any.
    pub async fn conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<ConversationState>, FlowError> {
        self.load(key).await
    }
}
