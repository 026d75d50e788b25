//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports:
//! the flow manager runs turns, the delivery module hands responses to
//! channels.

pub mod delivery;
pub mod handlers;
pub mod locks;

pub use delivery::{ChannelRegistry, DeliveryReport, ResponseDispatcher, RetryPolicy};
pub use handlers::{
    FlowManager, FlowPolicy, InboundMessageCommand, InboundMessageHandler, InboundMessageResult,
    ProcessMessageCommand,
};
pub use locks::{ConversationGuard, ConversationLocks};
