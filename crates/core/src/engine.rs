//! Orchestration: one inbound message in, one decided round out.

use std::sync::Arc;

use crate::audit::{AuditSink, Decision};
use crate::classify::Classifier;
use crate::errors::DomainError;
use crate::extract::FieldExtractor;
use crate::policy::{DecisionPolicy, Outcome};
use crate::requests::SecurityRequest;
use crate::risk::RiskScorer;
use crate::tracker::ConversationTracker;

/// Who posted the root of the thread a reply landed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadOrigin {
    Ours,
    NotOurs,
    /// Lookup failed or was skipped; treated like a foreign thread.
    Unresolved,
}

/// The result of one triage round: the request as understood after this
/// message, and the decision taken on it.
#[derive(Clone, Debug)]
pub struct TriageRound {
    pub request: SecurityRequest,
    pub decision: Decision,
}

impl TriageRound {
    pub fn outcome(&self) -> Outcome {
        self.decision.outcome
    }
}

pub struct TriageEngine {
    classifier: Classifier,
    extractor: FieldExtractor,
    scorer: RiskScorer,
    policy: DecisionPolicy,
    tracker: ConversationTracker,
    audit: Arc<dyn AuditSink>,
}

impl TriageEngine {
    pub fn new(
        policy: DecisionPolicy,
        tracker: ConversationTracker,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            classifier: Classifier::new(),
            extractor: FieldExtractor::new(),
            scorer: RiskScorer::new(),
            policy,
            tracker,
            audit,
        }
    }

    /// Classifies and decides a fresh message. The caller supplies the
    /// conversation id it will answer under; the round is tracked
    /// separately via [`track`](Self::track) once the reply is posted and
    /// the thread key actually exists.
    pub fn evaluate_message(&self, text: &str, conversation_id: &str) -> TriageRound {
        let kind = self.classifier.classify(text);
        let request = self.extractor.extract(kind, text);
        self.decide_and_record(conversation_id, request)
    }

    /// Applies a finished round's outcome to the tracker.
    pub fn track(&self, key: &str, round: &TriageRound) {
        self.tracker.upsert_on_outcome(key, round.request.clone(), round.outcome());
    }

    /// Handles a reply in an existing thread. Replies in threads we did not
    /// start, or in conversations that were closed or expired, come back as
    /// an `Irrelevant` round and leave all state untouched.
    pub fn continue_thread(
        &self,
        key: &str,
        text: &str,
        origin: ThreadOrigin,
    ) -> Result<TriageRound, DomainError> {
        if origin != ThreadOrigin::Ours {
            tracing::debug!(event_name = "engine.foreign_thread", key, "ignoring reply");
            return Ok(self.irrelevant_round(key));
        }
        self.tracker.apply_round(key, |pending| {
            let Some(pending) = pending else {
                tracing::debug!(event_name = "engine.no_pending", key, "no open conversation");
                return (
                    Ok(self.irrelevant_round(key)),
                    SecurityRequest::Unidentified,
                    Outcome::Irrelevant,
                );
            };
            let update = self.extractor.extract(pending.kind(), text);
            let merged = match pending.merge_with(&update) {
                Ok(merged) => merged,
                Err(error) => {
                    return (Err(error), SecurityRequest::Unidentified, Outcome::Irrelevant)
                }
            };
            let round = self.decide_and_record(key, merged.clone());
            let outcome = round.outcome();
            (Ok(round), merged, outcome)
        })
    }

    pub fn open_conversations(&self) -> usize {
        self.tracker.len()
    }

    fn decide_and_record(&self, conversation_id: &str, request: SecurityRequest) -> TriageRound {
        let risk = self.scorer.score(&request);
        let outcome = self.policy.decide(&request, risk);
        let decision = Decision::new(derive_ticket_id(conversation_id), &request, risk, outcome);
        tracing::info!(
            event_name = "engine.decision",
            ticket_id = %decision.ticket_id,
            kind = request.kind().label(),
            risk,
            outcome = outcome.label(),
            "triage round decided"
        );
        self.audit.record(&decision);
        TriageRound { request, decision }
    }

    // Uncorrelated replies still yield a round for the transport to act on,
    // but it is never audited and never touches the tracker.
    fn irrelevant_round(&self, conversation_id: &str) -> TriageRound {
        let request = SecurityRequest::Unidentified;
        let risk = self.scorer.score(&request);
        let decision =
            Decision::new(derive_ticket_id(conversation_id), &request, risk, Outcome::Irrelevant);
        TriageRound { request, decision }
    }
}

/// Ticket ids are derived from the conversation key, so round one and every
/// follow-up in the same thread carry the same ticket.
pub fn derive_ticket_id(conversation_id: &str) -> String {
    format!("SEC-{}", conversation_id.replace('.', "-"))
}
