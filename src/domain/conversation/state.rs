//! Conversation record: where one person stands in a business unit's
//! dialogue graph.

use serde::{Deserialize, Serialize};

use crate::domain::context::ConversationContext;
use crate::domain::foundation::{BusinessUnitId, ConversationKey, PersonId, Timestamp};
use crate::domain::transition::{PageMove, TransitionEffects, INITIAL_STATE};

/// Persistent state of one (person, business unit) conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub person_id: PersonId,
    pub business_unit: BusinessUnitId,

    /// Current node in the business unit's dialogue graph.
    pub current_state: String,

    /// Pagination cursor while browsing menus.
    #[serde(default)]
    pub menu_page: u32,

    #[serde(default)]
    pub last_menu: Option<String>,

    #[serde(default)]
    pub last_submenu: Option<String>,

    #[serde(default)]
    pub search_term: Option<String>,

    #[serde(default)]
    pub context: ConversationContext,

    /// Committed turns so far.
    #[serde(default)]
    pub turn_count: u64,

    /// Incremented on every save; 0 means never persisted.
    #[serde(default)]
    pub version: u64,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ConversationState {
    /// Fresh conversation in the `initial` state with an empty context.
    pub fn new(key: ConversationKey) -> Self {
        let now = Timestamp::now();
        Self {
            person_id: key.person_id,
            business_unit: key.business_unit,
            current_state: INITIAL_STATE.to_string(),
            menu_page: 0,
            last_menu: None,
            last_submenu: None,
            search_term: None,
            context: ConversationContext::new(),
            turn_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(self.person_id.clone(), self.business_unit.clone())
    }

    /// True until the record has been saved once.
    pub fn is_new(&self) -> bool {
        self.version == 0
    }

    /// Returns to `initial` and clears menu navigation. Context facts are kept.
    pub fn reset_to_initial(&mut self) {
        self.current_state = INITIAL_STATE.to_string();
        self.menu_page = 0;
        self.last_menu = None;
        self.last_submenu = None;
        self.search_term = None;
    }

    pub fn move_to(&mut self, next_state: impl Into<String>) {
        self.current_state = next_state.into();
    }

    /// Applies a transition's navigation effects. `raw_text` is the turn's
    /// input, used when the search term is captured.
    pub fn apply_effects(&mut self, effects: &TransitionEffects, raw_text: &str) {
        if let Some(menu) = &effects.menu {
            self.last_menu = Some(menu.clone());
            self.last_submenu = None;
            self.menu_page = 0;
        }
        if let Some(submenu) = &effects.submenu {
            self.last_submenu = Some(submenu.clone());
            self.menu_page = 0;
        }
        match effects.page {
            Some(PageMove::Next) => self.menu_page = self.menu_page.saturating_add(1),
            Some(PageMove::Previous) => self.menu_page = self.menu_page.saturating_sub(1),
            Some(PageMove::First) => self.menu_page = 0,
            None => {}
        }
        if effects.capture_search_term {
            let term = raw_text.trim();
            self.search_term = (!term.is_empty()).then(|| term.to_string());
        }
    }

    /// True when the last update is older than `ttl_secs` at `now`.
    pub fn is_stale(&self, now: &Timestamp, ttl_secs: u64) -> bool {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        !self.is_new() && now.duration_since(&self.updated_at).num_seconds() > ttl
    }

    /// Marks one committed turn.
    pub fn record_turn(&mut self, now: Timestamp) {
        self.turn_count = self.turn_count.saturating_add(1);
        self.updated_at = now;
    }
}
