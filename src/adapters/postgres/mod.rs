//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresConversationStore` - Conversation records with a JSONB context

mod conversation_store;

pub use conversation_store::PostgresConversationStore;
