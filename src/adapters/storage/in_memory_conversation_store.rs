//! In-Memory Conversation Store Adapter
//!
//! Keeps conversation records in a map. Used for development and tests;
//! supports injected failures and latency so callers can exercise their
//! timeout and error paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ConversationKey;
use crate::ports::{check_version, ConversationStore, StoreError};

#[derive(Debug, Default)]
struct Faults {
    failure: Option<StoreError>,
    latency: Option<Duration>,
}

/// In-memory storage for conversation records
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    records: Arc<RwLock<HashMap<ConversationKey, ConversationState>>>,
    faults: Arc<RwLock<Faults>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with `error` until cleared.
    pub async fn fail_with(&self, error: Option<StoreError>) {
        self.faults.write().await.failure = error;
    }

    /// Delays every subsequent operation by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.faults.write().await.latency = latency;
    }

    /// Number of stored conversations.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Removes every record (useful for tests).
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    async fn apply_faults(&self) -> Result<(), StoreError> {
        let (failure, latency) = {
            let faults = self.faults.read().await;
            (faults.failure.clone(), faults.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StoreError> {
        self.apply_faults().await?;
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn save(&self, state: &ConversationState) -> Result<(), StoreError> {
        self.apply_faults().await?;
        let key = state.key();
        let mut records = self.records.write().await;
        check_version(&key, records.get(&key).map(|r| r.version), state.version)?;
        records.insert(key, state.clone());
        Ok(())
    }

    async fn delete(&self, key: &ConversationKey) -> Result<(), StoreError> {
        self.apply_faults().await?;
        self.records.write().await.remove(key);
        Ok(())
    }
}
