//! Flow engine and catalog configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::FlowPolicy;
use crate::domain::intent::{BuiltinCommands, DEFAULT_RESET_COMMANDS};

/// Where the flow catalog lives
#[derive(Debug, Clone, Deserialize)]
pub struct FlowsConfig {
    /// YAML file or directory of YAML files
    #[serde(default = "default_flows_path")]
    pub path: PathBuf,
}

impl Default for FlowsConfig {
    fn default() -> Self {
        Self {
            path: default_flows_path(),
        }
    }
}

fn default_flows_path() -> PathBuf {
    PathBuf::from("./flows")
}

/// Engine behaviour
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Reset commands, comma-separated; the built-in list when unset
    pub reset_commands: Option<String>,

    #[serde(default)]
    pub persist_context_on_failure: bool,

    #[serde(default = "default_true")]
    pub record_turn_timestamp: bool,

    /// Idle seconds after which a conversation starts over; never when unset
    pub stale_after_secs: Option<u64>,

    pub fallback_response: Option<String>,
    pub missing_context_response: Option<String>,
    pub reset_response: Option<String>,
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Reset commands as a list.
    pub fn reset_commands_list(&self) -> Vec<String> {
        match &self.reset_commands {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_RESET_COMMANDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Builds the flow policy, with `storage_timeout` from the storage section.
    pub fn policy(&self, storage_timeout: Duration) -> FlowPolicy {
        let defaults = FlowPolicy::default();
        FlowPolicy {
            builtins: BuiltinCommands::new(self.reset_commands_list()),
            persist_context_on_failure: self.persist_context_on_failure,
            record_turn_timestamp: self.record_turn_timestamp,
            stale_after: self.stale_after_secs.map(Duration::from_secs),
            storage_timeout,
            fallback_response: self
                .fallback_response
                .clone()
                .unwrap_or(defaults.fallback_response),
            missing_context_response: self
                .missing_context_response
                .clone()
                .unwrap_or(defaults.missing_context_response),
            reset_response: self.reset_response.clone().unwrap_or(defaults.reset_response),
        }
    }
}
