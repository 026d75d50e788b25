//! InboundMessageHandler - processes a message arriving from a channel and
//! optionally delivers the response back through it.
//!
//! On the first message of a conversation the channel's profile data (a
//! JSON object) is merged into the context before the turn runs. Delivery
//! problems are logged and reported; they never undo a committed turn.

use std::sync::Arc;

use crate::application::delivery::{DeliveryReport, ResponseDispatcher};
use crate::domain::conversation::ResponseDescriptor;
use crate::domain::foundation::FlowError;
use crate::ports::ChannelError;

use super::{object_entries, FlowManager, ProcessMessageCommand};

/// Command for a message received on a channel.
#[derive(Debug, Clone)]
pub struct InboundMessageCommand {
    pub message: ProcessMessageCommand,
    /// Channel to answer on; `None` returns the descriptor only.
    pub channel: Option<String>,
}

/// Result of handling an inbound message.
#[derive(Debug)]
pub struct InboundMessageResult {
    pub descriptor: ResponseDescriptor,
    pub delivery: Option<Result<DeliveryReport, ChannelError>>,
}

/// Handler wiring the flow manager to the response dispatcher.
pub struct InboundMessageHandler {
    manager: Arc<FlowManager>,
    dispatcher: Option<Arc<ResponseDispatcher>>,
}

impl InboundMessageHandler {
    pub fn new(manager: Arc<FlowManager>, dispatcher: Option<Arc<ResponseDispatcher>>) -> Self {
        Self {
            manager,
            dispatcher,
        }
    }

    pub fn manager(&self) -> &Arc<FlowManager> {
        &self.manager
    }

    pub async fn handle(&self, cmd: InboundMessageCommand) -> Result<InboundMessageResult, FlowError> {
        let target = match (&cmd.channel, &self.dispatcher) {
            (Some(channel), Some(dispatcher)) => Some((channel.as_str(), dispatcher)),
            (Some(channel), None) => {
                tracing::warn!(channel = %channel, "No dispatcher configured, skipping delivery");
                None
            }
            _ => None,
        };

        if let Some((channel, dispatcher)) = target {
            self.seed_profile(channel, dispatcher, &cmd.message).await?;
        }

        let descriptor = self.manager.process_message(cmd.message.clone()).await?;

        let delivery = match target {
            Some((channel, dispatcher)) => {
                let outcome = dispatcher
                    .deliver(
                        channel,
                        &cmd.message.business_unit,
                        &cmd.message.person_id,
                        &descriptor,
                    )
                    .await;
                if let Err(e) = &outcome {
                    tracing::error!(channel = %channel, error = %e, "Response not delivered");
                }
                Some(outcome)
            }
            None => None,
        };

        Ok(InboundMessageResult {
            descriptor,
            delivery,
        })
    }

    async fn seed_profile(
        &self,
        channel: &str,
        dispatcher: &ResponseDispatcher,
        message: &ProcessMessageCommand,
    ) -> Result<(), FlowError> {
        let key = message.key();
        if let Err(e) = self.manager.ensure_configured(&message.business_unit).await {
            tracing::debug!(error = %e, "Profile not seeded");
            return Ok(());
        }
        if self.manager.conversation(&key).await?.is_some() {
            return Ok(());
        }

        let profile = match dispatcher
            .fetch_user_data(channel, &message.business_unit, &message.person_id)
            .await
        {
            Ok(Some(profile)) => profile,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "Could not fetch profile data");
                return Ok(());
            }
        };

        match object_entries(profile) {
            Some(entries) if !entries.is_empty() => {
                self.manager
                    .update_context(&key, entries.into_iter().collect())
                    .await?;
            }
            _ => tracing::debug!(channel = %channel, "Profile data is not an object, ignored"),
        }
        Ok(())
    }
}
