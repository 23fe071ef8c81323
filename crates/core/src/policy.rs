//! Four-outcome decision policy over validity and risk.

use serde::{Deserialize, Serialize};

use crate::requests::SecurityRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Accept,
    Reject,
    RequestFurtherDetails,
    Irrelevant,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accept => "accepted",
            Self::Reject => "rejected",
            Self::RequestFurtherDetails => "needs further details",
            Self::Irrelevant => "irrelevant",
        }
    }

    /// Terminal outcomes close the conversation; only a follow-up request
    /// keeps it open.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::RequestFurtherDetails)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DecisionPolicy {
    pub approval_threshold: u8,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self { approval_threshold: 75 }
    }
}

impl DecisionPolicy {
    pub fn new(approval_threshold: u8) -> Self {
        Self { approval_threshold }
    }

    /// Accept a valid request under the threshold, ask for details on a
    /// recognized but incomplete one, reject everything else. `Irrelevant`
    /// is never produced here; only the orchestration layer can tell that a
    /// message belongs to no tracked conversation.
    pub fn decide(&self, request: &SecurityRequest, risk: u8) -> Outcome {
        if request.is_valid() && risk < self.approval_threshold {
            return Outcome::Accept;
        }
        if request.kind().is_known() && !request.is_valid() {
            return Outcome::RequestFurtherDetails;
        }
        Outcome::Reject
    }
}
