//! Channel Adapters
//!
//! Implementations of the MessageChannel port.
//!
//! - **WebhookChannel** - Posts deliveries to an HTTP channel gateway
//! - **RecordingChannel** - Captures deliveries in memory (testing/development)

mod recording_channel;
mod webhook_channel;

pub use recording_channel::{Delivery, RecordingChannel};
pub use webhook_channel::{WebhookChannel, WebhookChannelConfig};
