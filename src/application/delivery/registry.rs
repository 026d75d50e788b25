//! Explicit channel registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ports::{ChannelError, MessageChannel};

/// Channels addressable by name.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, Arc<dyn MessageChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `channel` under its own name, replacing any previous one.
    pub fn register(&mut self, channel: Arc<dyn MessageChannel>) {
        self.channels.insert(channel.name().to_string(), channel);
    }

    pub fn with(mut self, channel: Arc<dyn MessageChannel>) -> Self {
        self.register(channel);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn MessageChannel>, ChannelError> {
        self.channels
            .get(name)
            .cloned()
            .ok_or_else(|| ChannelError::UnknownChannel(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.names())
            .finish()
    }
}
