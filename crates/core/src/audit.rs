//! Immutable decision records and the audit sinks that receive them.
//!
//! Recording is fire-and-forget from the engine's perspective: a sink that
//! cannot persist a record logs the failure and moves on, it never reverses
//! or blocks the decision itself.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::policy::Outcome;
use crate::requests::{RequestKind, SecurityRequest};

/// One decision as taken, with enough context to audit it later.
#[derive(Clone, Debug, Serialize)]
pub struct Decision {
    pub decision_id: Uuid,
    pub ticket_id: String,
    pub created_at: DateTime<Utc>,
    pub request_kind: RequestKind,
    pub risk_score: u8,
    pub outcome: Outcome,
    pub mandatory_fields: Vec<String>,
    pub fields_provided: Vec<String>,
}

impl Decision {
    pub fn new(
        ticket_id: impl Into<String>,
        request: &SecurityRequest,
        risk_score: u8,
        outcome: Outcome,
    ) -> Self {
        Self {
            decision_id: Uuid::new_v4(),
            ticket_id: ticket_id.into(),
            created_at: Utc::now(),
            request_kind: request.kind(),
            risk_score,
            outcome,
            mandatory_fields: request.mandatory_fields(),
            fields_provided: request.provided_fields(),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, decision: &Decision);
}

/// Collects records in memory. Default wiring and the test double.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<Decision>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Decision> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, decision: &Decision) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(decision.clone());
    }
}

/// Appends one JSON object per decision to a log file.
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
}

impl JsonLinesAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, decision: &Decision) -> std::io::Result<()> {
        let line = serde_json::to_string(decision)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, decision: &Decision) {
        if let Err(error) = self.append(decision) {
            tracing::warn!(
                event_name = "audit.record_failed",
                decision_id = %decision.decision_id,
                path = %self.path.display(),
                %error,
                "failed to append audit record"
            );
        }
    }
}
