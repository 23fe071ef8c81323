//! Core triage domain: request model, classification, field extraction,
//! risk scoring, decision policy, conversation tracking and audit records.
//!
//! Everything here is synchronous and transport-agnostic; the Slack-facing
//! crates sit on top of [`engine::TriageEngine`].

pub mod audit;
pub mod classify;
pub mod config;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod policy;
pub mod requests;
pub mod risk;
pub mod tracker;

#[cfg(test)]
pub mod testing;

pub use audit::{AuditSink, Decision, InMemoryAuditSink, JsonLinesAuditSink};
pub use classify::Classifier;
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use engine::{derive_ticket_id, ThreadOrigin, TriageEngine, TriageRound};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use extract::FieldExtractor;
pub use policy::{DecisionPolicy, Outcome};
pub use requests::{FieldSpec, FieldSummary, FieldValue, RequestKind, SecurityRequest};
pub use risk::RiskScorer;
pub use tracker::ConversationTracker;
