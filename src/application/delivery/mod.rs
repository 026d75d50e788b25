//! Response delivery: channel registry, retry policy and dispatcher.

mod dispatcher;
mod registry;
mod retry;

pub use dispatcher::{DeliveryReport, ResponseDispatcher, MAX_QUICK_REPLIES};
pub use registry::ChannelRegistry;
pub use retry::RetryPolicy;
