//! Per-conversation turn serialization.
//!
//! Each (person, business unit) gets its own async mutex. Tokio mutexes
//! are fair, so waiters are served in arrival order. Entries are removed
//! when the last holder or waiter releases them, including waiters whose
//! request was cancelled before the lock was granted.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::ConversationKey;

type LockMap = HashMap<ConversationKey, Arc<AsyncMutex<()>>>;

/// Registry of per-conversation locks.
#[derive(Debug, Clone, Default)]
pub struct ConversationLocks {
    entries: Arc<Mutex<LockMap>>,
}

/// Exclusive access to one conversation; released on drop.
#[derive(Debug)]
pub struct ConversationGuard {
    key: ConversationKey,
    guard: Option<OwnedMutexGuard<()>>,
    entries: Arc<Mutex<LockMap>>,
}

type PendingLock = Pin<Box<dyn Future<Output = OwnedMutexGuard<()>> + Send>>;

/// A queued acquisition. Dropped before completion, it releases its place
/// and prunes the entry if nobody else uses it.
struct Waiting {
    key: ConversationKey,
    pending: Option<PendingLock>,
    entries: Arc<Mutex<LockMap>>,
}

impl Future for Waiting {
    type Output = OwnedMutexGuard<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let Some(pending) = this.pending.as_mut() else {
            return Poll::Pending;
        };
        let guard = std::task::ready!(pending.as_mut().poll(cx));
        this.pending = None;
        Poll::Ready(guard)
    }
}

impl Drop for Waiting {
    fn drop(&mut self) {
        if self.pending.take().is_some() {
            prune_idle(&self.entries, &self.key);
        }
    }
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn acquire(&self, key: &ConversationKey) -> ConversationGuard {
        let lock = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(key.clone()).or_default())
        };

        let guard = Waiting {
            key: key.clone(),
            pending: Some(Box::pin(lock.lock_owned())),
            entries: Arc::clone(&self.entries),
        }
        .await;

        ConversationGuard {
            key: key.clone(),
            guard: Some(guard),
            entries: Arc::clone(&self.entries),
        }
    }

    /// Number of conversations currently held or waited on.
    pub fn active(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        self.guard.take();
        prune_idle(&self.entries, &self.key);
    }
}

fn prune_idle(entries: &Mutex<LockMap>, key: &ConversationKey) {
    let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
    // Only the map still references the mutex: nobody holds or awaits it.
    let idle = entries
        .get(key)
        .map(|lock| Arc::strong_count(lock) == 1)
        .unwrap_or(false);
    if idle {
        entries.remove(key);
    }
}
