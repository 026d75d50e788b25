//! ResponseDispatcher - turns a response descriptor into channel calls.
//!
//! No options: `send_message`. One to three options: `send_options`, the
//! usual quick-reply button limit. More: `send_menu`. Transient failures
//! are retried per [`RetryPolicy`]; when the primary channel gives up, the
//! fallback channel gets one full retry cycle.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::conversation::ResponseDescriptor;
use crate::domain::foundation::{BusinessUnitId, PersonId};
use crate::ports::{ChannelError, MenuPayload, MessageChannel};

use super::{ChannelRegistry, RetryPolicy};

/// Most options that still fit as quick-reply buttons.
pub const MAX_QUICK_REPLIES: usize = 3;

/// Where and how a descriptor ended up being delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub channel: String,
    pub attempts: u32,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryKind {
    Message,
    Options,
    Menu,
}

fn delivery_kind(options: &[String]) -> DeliveryKind {
    match options.len() {
        0 => DeliveryKind::Message,
        n if n <= MAX_QUICK_REPLIES => DeliveryKind::Options,
        _ => DeliveryKind::Menu,
    }
}

/// Delivers descriptors through registered channels.
#[derive(Debug, Clone)]
pub struct ResponseDispatcher {
    registry: Arc<ChannelRegistry>,
    policy: RetryPolicy,
}

impl ResponseDispatcher {
    pub fn new(registry: Arc<ChannelRegistry>, policy: RetryPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Delivers `descriptor` via `channel_name`. Descriptors with neither
    /// text nor options are skipped and reported with zero attempts.
    pub async fn deliver(
        &self,
        channel_name: &str,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        descriptor: &ResponseDescriptor,
    ) -> Result<DeliveryReport, ChannelError> {
        if descriptor.response_text.is_none() && descriptor.options.is_empty() {
            return Ok(DeliveryReport {
                channel: channel_name.to_string(),
                attempts: 0,
                used_fallback: false,
            });
        }

        let primary = self.registry.get(channel_name)?;
        let (result, attempts) = self
            .attempt(&primary, business_unit, person_id, descriptor)
            .await;

        let error = match result {
            Ok(()) => {
                return Ok(DeliveryReport {
                    channel: channel_name.to_string(),
                    attempts,
                    used_fallback: false,
                })
            }
            Err(e) => e,
        };

        let fallback_name = match &self.policy.fallback_channel {
            Some(name) if error.is_transient() && name != channel_name => name,
            _ => return Err(error),
        };

        tracing::warn!(
            channel = %channel_name,
            fallback = %fallback_name,
            error = %error,
            "Primary channel gave up, using fallback"
        );
        let fallback = self.registry.get(fallback_name)?;
        let (result, fallback_attempts) = self
            .attempt(&fallback, business_unit, person_id, descriptor)
            .await;
        result.map(|()| DeliveryReport {
            channel: fallback_name.clone(),
            attempts: attempts + fallback_attempts,
            used_fallback: true,
        })
    }

    /// Profile data from `channel_name`, retried like deliveries.
    pub async fn fetch_user_data(
        &self,
        channel_name: &str,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
    ) -> Result<Option<Value>, ChannelError> {
        let channel = self.registry.get(channel_name)?;
        let channel = &channel;
        let (result, _) = self
            .policy
            .run(move || channel.fetch_user_data(business_unit, person_id))
            .await;
        result
    }

    async fn attempt(
        &self,
        channel: &Arc<dyn MessageChannel>,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        descriptor: &ResponseDescriptor,
    ) -> (Result<(), ChannelError>, u32) {
        let text = descriptor.response_text.as_deref().unwrap_or_default();
        let options = &descriptor.options;

        match delivery_kind(options) {
            DeliveryKind::Message => {
                self.policy
                    .run(move || channel.send_message(business_unit, person_id, text))
                    .await
            }
            DeliveryKind::Options => {
                self.policy
                    .run(move || channel.send_options(business_unit, person_id, text, options))
                    .await
            }
            DeliveryKind::Menu => {
                let menu = MenuPayload {
                    title: text.to_string(),
                    items: options.clone(),
                };
                let menu = &menu;
                self.policy
                    .run(move || channel.send_menu(business_unit, person_id, menu))
                    .await
            }
        }
    }
}
