//! FlowManager - processes one inbound message per call.
//!
//! A turn loads (or lazily creates) the conversation, repairs it when its
//! state is unknown or stale, checks the built-in reset commands, matches an
//! intent, selects a transition and commits the new state with a single
//! store write. Turns on the same conversation are serialized by
//! [`ConversationLocks`]; every store call is bounded by the policy's
//! storage timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::Instrument;

use crate::application::locks::ConversationLocks;
use crate::domain::context::{LAST_INTENT_KEY, LAST_INTERACTION_KEY};
use crate::domain::conversation::{
    render_template, ConversationState, ResponseDescriptor, TemplateScope,
};
use crate::domain::flow::BusinessUnitFlow;
use crate::domain::foundation::{
    BusinessUnitId, ConversationKey, FlowError, PersonId, Timestamp, TurnId,
};
use crate::domain::intent::{BuiltinCommands, RESET_INTENT};
use crate::domain::transition::TransitionLookup;
use crate::ports::{ConversationStore, FlowRepository, StoreError};

pub const DEFAULT_FALLBACK_RESPONSE: &str =
    "Lo siento, no entendí tu mensaje. Escribe 'menu' para ver las opciones.";
pub const DEFAULT_MISSING_CONTEXT_RESPONSE: &str =
    "Necesito un poco más de información antes de continuar.";
pub const DEFAULT_RESET_RESPONSE: &str = "Listo, empecemos de nuevo. ¿En qué te puedo ayudar?";

/// Command to process one inbound message.
#[derive(Debug, Clone)]
pub struct ProcessMessageCommand {
    pub person_id: PersonId,
    pub business_unit: BusinessUnitId,
    pub text: String,
}

impl ProcessMessageCommand {
    pub fn new(person_id: PersonId, business_unit: BusinessUnitId, text: impl Into<String>) -> Self {
        Self {
            person_id,
            business_unit,
            text: text.into(),
        }
    }

    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(self.person_id.clone(), self.business_unit.clone())
    }
}

/// Engine behaviour knobs.
#[derive(Debug, Clone)]
pub struct FlowPolicy {
    pub builtins: BuiltinCommands,

    /// Record `last_intent`/`last_interaction` and count the turn even when
    /// the turn fails.
    pub persist_context_on_failure: bool,

    /// Write `last_interaction` on every committed turn.
    pub record_turn_timestamp: bool,

    /// Conversations idle longer than this are reset before matching.
    pub stale_after: Option<Duration>,

    pub storage_timeout: Duration,

    pub fallback_response: String,
    pub missing_context_response: String,
    pub reset_response: String,
}

impl Default for FlowPolicy {
    fn default() -> Self {
        Self {
            builtins: BuiltinCommands::default(),
            persist_context_on_failure: false,
            record_turn_timestamp: true,
            stale_after: None,
            storage_timeout: Duration::from_secs(2),
            fallback_response: DEFAULT_FALLBACK_RESPONSE.to_string(),
            missing_context_response: DEFAULT_MISSING_CONTEXT_RESPONSE.to_string(),
            reset_response: DEFAULT_RESET_RESPONSE.to_string(),
        }
    }
}

impl From<StoreError> for FlowError {
    fn from(err: StoreError) -> Self {
        FlowError::StorageTransient(err.to_string())
    }
}

/// Orchestrates conversational turns.
pub struct FlowManager {
    store: Arc<dyn ConversationStore>,
    flows: Arc<dyn FlowRepository>,
    locks: ConversationLocks,
    policy: FlowPolicy,
}

impl FlowManager {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        flows: Arc<dyn FlowRepository>,
        policy: FlowPolicy,
    ) -> Self {
        Self {
            store,
            flows,
            locks: ConversationLocks::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &FlowPolicy {
        &self.policy
    }

    pub(crate) fn locks(&self) -> &ConversationLocks {
        &self.locks
    }

    /// Processes one message.
    ///
    /// # Errors
    ///
    /// Only `FlowError::StorageTransient` is returned as an error; nothing
    /// was committed and the caller may retry. Every other outcome is a
    /// descriptor.
    pub async fn process_message(
        &self,
        cmd: ProcessMessageCommand,
    ) -> Result<ResponseDescriptor, FlowError> {
        let turn_id = TurnId::new();
        let span = tracing::info_span!(
            "turn",
            turn_id = %turn_id,
            business_unit = %cmd.business_unit,
            person_id = %cmd.person_id,
        );
        self.run_turn(cmd).instrument(span).await
    }

    async fn run_turn(&self, cmd: ProcessMessageCommand) -> Result<ResponseDescriptor, FlowError> {
        let key = cmd.key();
        let _guard = self.locks.acquire(&key).await;

        let mut state = self.load_or_create(&key).await?;
        let now = Timestamp::now();

        let flow = match self.resolve_flow(&cmd.business_unit).await {
            Some(flow) => flow,
            None => {
                return Ok(ResponseDescriptor::failure(
                    state.current_state,
                    &FlowError::UnrecognizedIntent,
                    Some(self.policy.fallback_response.clone()),
                ));
            }
        };

        let repaired = self.repair(&mut state, &flow, &now);

        if let Some(reset) = self.policy.builtins.match_reset(&cmd.text) {
            tracing::info!(command = %reset.matched_pattern, "Reset command received");
            state.reset_to_initial();
            self.stamp(&mut state, Some(RESET_INTENT), &now);
            let template = flow
                .settings()
                .reset_response
                .clone()
                .unwrap_or_else(|| self.policy.reset_response.clone());
            let text = render_template(&template, &TemplateScope::new(&state, Some(RESET_INTENT)));
            state.record_turn(now);
            self.commit(&mut state).await?;
            return Ok(ResponseDescriptor::success(state.current_state, Some(text))
                .with_intent(RESET_INTENT));
        }

        let Some(intent_match) = flow.match_intent(&cmd.text) else {
            tracing::debug!(state = %state.current_state, "No intent matched");
            let text = flow
                .settings()
                .fallback_response
                .clone()
                .unwrap_or_else(|| self.policy.fallback_response.clone());
            let text = render_template(&text, &TemplateScope::new(&state, None));
            self.finish_failed_turn(&mut state, None, repaired, now).await?;
            return Ok(ResponseDescriptor::failure(
                state.current_state,
                &FlowError::UnrecognizedIntent,
                Some(text),
            ));
        };

        let intent_name = intent_match.intent_name.as_str();
        tracing::debug!(
            intent = %intent_name,
            pattern = %intent_match.matched_pattern,
            state = %state.current_state,
            "Intent matched"
        );

        match flow
            .table()
            .evaluate(&state.current_state, intent_name, &state.context)
        {
            TransitionLookup::Selected(transition) => {
                let from = state.current_state.clone();
                let rotation = state.turn_count;

                if let Some(intent) = flow.intent(intent_name) {
                    state.context.merge(intent.context_updates.clone());
                }
                state.context.merge(transition.context_updates.clone());
                self.stamp(&mut state, Some(intent_name), &now);
                state.move_to(transition.next_state.clone());
                state.apply_effects(&transition.effects, &cmd.text);

                let template = transition.response.clone().or_else(|| {
                    flow.intent(intent_name).and_then(|intent| {
                        let responses = &intent.responses;
                        (!responses.is_empty())
                            .then(|| responses[(rotation % responses.len() as u64) as usize].clone())
                    })
                });
                let text = template.map(|t| {
                    render_template(&t, &TemplateScope::new(&state, Some(intent_name)))
                });

                state.record_turn(now);
                self.commit(&mut state).await?;

                tracing::info!(
                    intent = %intent_name,
                    from = %from,
                    to = %state.current_state,
                    "Transition committed"
                );

                Ok(ResponseDescriptor::success(state.current_state, text)
                    .with_intent(intent_name)
                    .with_options(transition.options.clone()))
            }
            lookup => {
                let (condition, prompt) = match lookup {
                    TransitionLookup::Blocked { transition, failed } => (
                        Some(failed.name.clone()),
                        transition.missing_context_response.clone(),
                    ),
                    _ => (None, None),
                };
                tracing::debug!(
                    intent = %intent_name,
                    state = %state.current_state,
                    condition = condition.as_deref().unwrap_or("-"),
                    "No transition applies"
                );

                let error = FlowError::RequiredContextMissing {
                    intent: intent_name.to_string(),
                    condition,
                };
                let template = prompt
                    .or_else(|| flow.settings().missing_context_response.clone())
                    .unwrap_or_else(|| self.policy.missing_context_response.clone());
                let text = render_template(&template, &TemplateScope::new(&state, Some(intent_name)));

                self.finish_failed_turn(&mut state, Some(intent_name), repaired, now)
                    .await?;
                Ok(ResponseDescriptor::failure(state.current_state, &error, Some(text))
                    .with_intent(intent_name))
            }
        }
    }

    /// Looks up the business unit's flow. Missing or unusable flows are
    /// configuration problems for operators, not for the person chatting.
    async fn resolve_flow(&self, business_unit: &BusinessUnitId) -> Option<Arc<BusinessUnitFlow>> {
        let flow = match self.flows.flow_for(business_unit).await {
            Ok(Some(flow)) => flow,
            Ok(None) => {
                let err = FlowError::Configuration(format!(
                    "business unit '{}' is not configured",
                    business_unit
                ));
                tracing::error!(error = %err, "Cannot process message");
                return None;
            }
            Err(e) => {
                let err = FlowError::Configuration(e.to_string());
                tracing::error!(error = %err, "Cannot load business unit flow");
                return None;
            }
        };

        if let Some(err) = flow.configuration_issue() {
            tracing::error!(error = %err, "Cannot process message");
            return None;
        }
        Some(flow)
    }

    /// Fails unless `business_unit` has a configured flow. Operator writes
    /// check this so unknown units never get stored records.
    pub(crate) async fn ensure_configured(
        &self,
        business_unit: &BusinessUnitId,
    ) -> Result<(), FlowError> {
        match self.flows.flow_for(business_unit).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(FlowError::UnknownBusinessUnit {
                business_unit: business_unit.to_string(),
            }),
            Err(e) => Err(FlowError::Configuration(e.to_string())),
        }
    }

    /// Resets unknown or stale conversations. Returns true when the record
    /// changed.
    fn repair(&self, state: &mut ConversationState, flow: &BusinessUnitFlow, now: &Timestamp) -> bool {
        if !flow.table().is_known_state(&state.current_state) {
            let err = FlowError::UnknownState {
                state: state.current_state.clone(),
            };
            tracing::warn!(error = %err, "Resetting conversation to initial");
            state.reset_to_initial();
            return true;
        }

        if let Some(ttl) = self.policy.stale_after {
            if state.is_stale(now, ttl.as_secs()) {
                tracing::info!(
                    state = %state.current_state,
                    idle_secs = now.duration_since(&state.updated_at).num_seconds(),
                    "Stale conversation reset"
                );
                state.reset_to_initial();
                return true;
            }
        }

        false
    }

    /// Records `last_intent` and, if enabled, `last_interaction`.
    fn stamp(&self, state: &mut ConversationState, intent: Option<&str>, now: &Timestamp) {
        if let Some(intent) = intent {
            state.context.set(LAST_INTENT_KEY, intent);
        }
        if self.policy.record_turn_timestamp {
            state.context.set(LAST_INTERACTION_KEY, now.to_rfc3339());
        }
    }

    async fn finish_failed_turn(
        &self,
        state: &mut ConversationState,
        intent: Option<&str>,
        repaired: bool,
        now: Timestamp,
    ) -> Result<(), FlowError> {
        if self.policy.persist_context_on_failure {
            self.stamp(state, intent, &now);
            state.record_turn(now);
            return self.commit(state).await;
        }
        if repaired {
            state.updated_at = now;
            return self.commit(state).await;
        }
        Ok(())
    }

    pub(crate) async fn load_or_create(
        &self,
        key: &ConversationKey,
    ) -> Result<ConversationState, FlowError> {
        let loaded = self.bounded(self.store.load(key)).await?;
        Ok(loaded.unwrap_or_else(|| ConversationState::new(key.clone())))
    }

    pub(crate) async fn load(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<ConversationState>, FlowError> {
        self.bounded(self.store.load(key)).await
    }

    /// Saves the record as the next version. On failure the in-memory
    /// version is rolled back so the caller can retry with the same record.
    pub(crate) async fn commit(&self, state: &mut ConversationState) -> Result<(), FlowError> {
        state.version += 1;
        if let Err(e) = self.bounded(self.store.save(state)).await {
            state.version -= 1;
            tracing::warn!(error = %e, "Conversation not committed");
            return Err(e);
        }
        Ok(())
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, FlowError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let timeout = self.policy.storage_timeout;
        match tokio::time::timeout(timeout, op).await {
            Ok(result) => result.map_err(FlowError::from),
            Err(_) => Err(StoreError::Timeout(timeout.as_millis() as u64).into()),
        }
    }
}

/// Entries of a JSON object; `None` for any other value.
pub(crate) fn object_entries(value: Value) -> Option<Vec<(String, Value)>> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}
