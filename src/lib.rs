//! huntred-flow - Business unit scoped conversational flow engine
//!
//! Recognizes intents in free text, keeps per-person context, and moves each
//! (person, business unit) conversation through a configurable state graph.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
