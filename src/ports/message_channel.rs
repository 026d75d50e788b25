//! Message Channel Port - Interface for delivering responses to a person.
//!
//! Channel adapters (WhatsApp, Telegram, web chat and so on) implement this
//! trait. The flow manager never calls a channel; the response dispatcher
//! turns a response descriptor into one of these calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{BusinessUnitId, PersonId};

/// Errors reported by channel adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Worth retrying: timeouts, rate limits, upstream 5xx.
    #[error("Transient channel failure: {0}")]
    Transient(String),

    /// Retrying will not help: rejected payload, unknown recipient.
    #[error("Channel rejected the message: {0}")]
    Permanent(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}

impl ChannelError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ChannelError::Transient(_))
    }
}

/// A titled list of selectable items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuPayload {
    pub title: String,
    pub items: Vec<String>,
}

/// Port for a single outbound messaging channel.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Stable channel name used for routing and fallback, e.g. `whatsapp`.
    fn name(&self) -> &str;

    async fn send_message(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        text: &str,
    ) -> Result<(), ChannelError>;

    async fn send_menu(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        menu: &MenuPayload,
    ) -> Result<(), ChannelError>;

    /// Sends `text` with a short list of quick-reply options.
    async fn send_options(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        text: &str,
        options: &[String],
    ) -> Result<(), ChannelError>;

    /// Profile data the channel knows about the person, used to seed the
    /// conversation context.
    async fn fetch_user_data(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
    ) -> Result<Option<Value>, ChannelError>;
}
