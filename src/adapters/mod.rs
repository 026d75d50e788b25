//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `storage` - Conversation stores (in-memory, YAML files)
//! - `postgres` - PostgreSQL conversation store
//! - `flows` - YAML flow catalog loading
//! - `channels` - Messaging channels (webhook gateway, recording)
//! - `http` - axum REST surface

pub mod channels;
pub mod flows;
pub mod http;
pub mod postgres;
pub mod storage;

pub use channels::{RecordingChannel, WebhookChannel, WebhookChannelConfig};
pub use flows::{CatalogFlowRepository, YamlFlowSource};
pub use postgres::PostgresConversationStore;
pub use storage::{FileConversationStore, InMemoryConversationStore};
