//! Recording Message Channel for testing.
//!
//! Captures every delivery instead of sending it, and can be scripted to
//! fail so retry and fallback paths can be exercised.
//!
//! # Example
//!
//! ```ignore
//! let channel = RecordingChannel::new("whatsapp")
//!     .failing_with(ChannelError::Transient("503".into()), 2);
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{BusinessUnitId, PersonId};
use crate::ports::{ChannelError, MenuPayload, MessageChannel};

/// One captured delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Message {
        business_unit: BusinessUnitId,
        person_id: PersonId,
        text: String,
    },
    Menu {
        business_unit: BusinessUnitId,
        person_id: PersonId,
        menu: MenuPayload,
    },
    Options {
        business_unit: BusinessUnitId,
        person_id: PersonId,
        text: String,
        options: Vec<String>,
    },
}

/// Channel that records deliveries in memory.
#[derive(Debug, Clone)]
pub struct RecordingChannel {
    name: String,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    failures: Arc<Mutex<VecDeque<ChannelError>>>,
    attempts: Arc<Mutex<u32>>,
    profiles: Arc<Mutex<HashMap<(BusinessUnitId, PersonId), Value>>>,
}

impl RecordingChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deliveries: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            attempts: Arc::new(Mutex::new(0)),
            profiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fails the next `times` delivery attempts with `error`.
    pub fn failing_with(self, error: ChannelError, times: usize) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.extend(std::iter::repeat(error).take(times));
        }
        self
    }

    /// Registers profile data returned by `fetch_user_data`.
    pub fn with_profile(self, business_unit: BusinessUnitId, person_id: PersonId, data: Value) -> Self {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert((business_unit, person_id), data);
        }
        self
    }

    /// Successful deliveries so far.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// Delivery attempts so far, failed ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts.lock().map(|a| *a).unwrap_or_default()
    }

    fn record(&self, delivery: Delivery) -> Result<(), ChannelError> {
        if let Ok(mut attempts) = self.attempts.lock() {
            *attempts += 1;
        }
        let scripted = self.failures.lock().ok().and_then(|mut f| f.pop_front());
        if let Some(error) = scripted {
            return Err(error);
        }
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.push(delivery);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_message(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        text: &str,
    ) -> Result<(), ChannelError> {
        self.record(Delivery::Message {
            business_unit: business_unit.clone(),
            person_id: person_id.clone(),
            text: text.to_string(),
        })
    }

    async fn send_menu(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        menu: &MenuPayload,
    ) -> Result<(), ChannelError> {
        self.record(Delivery::Menu {
            business_unit: business_unit.clone(),
            person_id: person_id.clone(),
            menu: menu.clone(),
        })
    }

    async fn send_options(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        text: &str,
        options: &[String],
    ) -> Result<(), ChannelError> {
        self.record(Delivery::Options {
            business_unit: business_unit.clone(),
            person_id: person_id.clone(),
            text: text.to_string(),
            options: options.to_vec(),
        })
    }

    async fn fetch_user_data(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
    ) -> Result<Option<Value>, ChannelError> {
        Ok(self
            .profiles
            .lock()
            .ok()
            .and_then(|p| p.get(&(business_unit.clone(), person_id.clone())).cloned()))
    }
}
