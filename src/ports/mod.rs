//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the flow engine and the outside world. Adapters implement these ports.
//!
//! - `ConversationStore` - Per (person, business unit) conversation records
//! - `FlowRepository` - Compiled business unit flows
//! - `MessageChannel` - Outbound delivery to a person

mod conversation_store;
mod flow_repository;
mod message_channel;

pub use conversation_store::{check_version, ConversationStore, StoreError};
pub use flow_repository::{FlowRepository, FlowRepositoryError};
pub use message_channel::{ChannelError, MenuPayload, MessageChannel};
