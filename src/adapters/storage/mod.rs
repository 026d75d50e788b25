//! Storage Adapters
//!
//! Implementations of the ConversationStore port.
//!
//! ## Available Adapters
//!
//! - **FileConversationStore** - One YAML file per conversation
//! - **InMemoryConversationStore** - In memory (testing/development)
//!
//! The PostgreSQL store lives in `adapters::postgres`.

mod file_conversation_store;
mod in_memory_conversation_store;

pub use file_conversation_store::FileConversationStore;
pub use in_memory_conversation_store::InMemoryConversationStore;
