//! The typed security-request model.
//!
//! Every request variant carries a static field table (`FieldSpec`) plus one
//! optional slot per field. Validity, missing-field reporting and the
//! cross-turn merge are all driven by that table through an explicit
//! accessor (`field`), never by reflection.

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Static metadata for one field of a request variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// An extracted field value. Fields are either free text or an attestation
/// flag derived from the message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Text(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Unidentified,
    CloudResourceAccess,
    DataExport,
    DevToolInstall,
    FirewallChange,
    NetworkAccess,
    PermissionsChange,
    VendorApproval,
}

impl RequestKind {
    /// The seven concrete request kinds, excluding `Unidentified`.
    pub const KNOWN: &'static [RequestKind] = &[
        Self::CloudResourceAccess,
        Self::DataExport,
        Self::DevToolInstall,
        Self::FirewallChange,
        Self::NetworkAccess,
        Self::PermissionsChange,
        Self::VendorApproval,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unidentified => "unidentified",
            Self::CloudResourceAccess => "cloud resource access",
            Self::DataExport => "data export",
            Self::DevToolInstall => "devtool install",
            Self::FirewallChange => "firewall change",
            Self::NetworkAccess => "network access",
            Self::PermissionsChange => "permissions change",
            Self::VendorApproval => "vendor approval",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unidentified)
    }
}

const JUSTIFICATION: FieldSpec = FieldSpec {
    name: "business_justification",
    description: "The reason for this request.",
    required: true,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudResourceAccess {
    pub business_justification: Option<String>,
    pub sensitivity: Option<String>,
}

impl CloudResourceAccess {
    pub const FIELDS: &'static [FieldSpec] = &[
        JUSTIFICATION,
        FieldSpec {
            name: "sensitivity",
            description: "How sensitive the data being accessed is.",
            required: true,
        },
    ];

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "business_justification" => {
                self.business_justification.clone().map(FieldValue::Text)
            }
            "sensitivity" => self.sensitivity.clone().map(FieldValue::Text),
            _ => None,
        }
    }

    fn merged(&self, newer: &Self) -> Self {
        Self {
            business_justification: pick(&newer.business_justification, &self.business_justification),
            sensitivity: pick(&newer.sensitivity, &self.sensitivity),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataExport {
    pub business_justification: Option<String>,
    pub pii_involved: Option<bool>,
    pub destination: Option<String>,
}

impl DataExport {
    pub const FIELDS: &'static [FieldSpec] = &[
        JUSTIFICATION,
        FieldSpec {
            name: "pii_involved",
            description: "Whether personally identifiable customer data is involved.",
            required: true,
        },
        FieldSpec {
            name: "destination",
            description: "Where the data should be exported.",
            required: true,
        },
    ];

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "business_justification" => {
                self.business_justification.clone().map(FieldValue::Text)
            }
            "pii_involved" => self.pii_involved.map(FieldValue::Flag),
            "destination" => self.destination.clone().map(FieldValue::Text),
            _ => None,
        }
    }

    fn merged(&self, newer: &Self) -> Self {
        Self {
            business_justification: pick(&newer.business_justification, &self.business_justification),
            pii_involved: newer.pii_involved.or(self.pii_involved),
            destination: pick(&newer.destination, &self.destination),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevToolInstall {
    pub business_justification: Option<String>,
    pub team_leader_approval: Option<String>,
}

impl DevToolInstall {
    pub const FIELDS: &'static [FieldSpec] = &[
        JUSTIFICATION,
        FieldSpec {
            name: "team_leader_approval",
            description: "A Jira ticket recording your team leader's approval.",
            required: true,
        },
    ];

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "business_justification" => {
                self.business_justification.clone().map(FieldValue::Text)
            }
            "team_leader_approval" => self.team_leader_approval.clone().map(FieldValue::Text),
            _ => None,
        }
    }

    fn merged(&self, newer: &Self) -> Self {
        Self {
            business_justification: pick(&newer.business_justification, &self.business_justification),
            team_leader_approval: pick(&newer.team_leader_approval, &self.team_leader_approval),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallChange {
    pub business_justification: Option<String>,
    pub destination: Option<String>,
    pub source_system: Option<String>,
}

impl FirewallChange {
    pub const FIELDS: &'static [FieldSpec] = &[
        JUSTIFICATION,
        FieldSpec {
            name: "destination",
            description: "The IP address and port the rule should open access to.",
            required: true,
        },
        FieldSpec {
            name: "source_system",
            description: "The system network access should be granted for.",
            required: false,
        },
    ];

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "business_justification" => {
                self.business_justification.clone().map(FieldValue::Text)
            }
            "destination" => self.destination.clone().map(FieldValue::Text),
            "source_system" => self.source_system.clone().map(FieldValue::Text),
            _ => None,
        }
    }

    fn merged(&self, newer: &Self) -> Self {
        Self {
            business_justification: pick(&newer.business_justification, &self.business_justification),
            destination: pick(&newer.destination, &self.destination),
            source_system: pick(&newer.source_system, &self.source_system),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAccess {
    pub business_justification: Option<String>,
    pub source_cidr: Option<String>,
    pub engineering_approval: Option<String>,
}

impl NetworkAccess {
    pub const FIELDS: &'static [FieldSpec] = &[
        JUSTIFICATION,
        FieldSpec {
            name: "source_cidr",
            description: "The IP segment (CIDR) that requires network access.",
            required: true,
        },
        FieldSpec {
            name: "engineering_approval",
            description: "A Jira ticket recording the engineering team's approval.",
            required: true,
        },
    ];

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "business_justification" => {
                self.business_justification.clone().map(FieldValue::Text)
            }
            "source_cidr" => self.source_cidr.clone().map(FieldValue::Text),
            "engineering_approval" => self.engineering_approval.clone().map(FieldValue::Text),
            _ => None,
        }
    }

    fn merged(&self, newer: &Self) -> Self {
        Self {
            business_justification: pick(&newer.business_justification, &self.business_justification),
            source_cidr: pick(&newer.source_cidr, &self.source_cidr),
            engineering_approval: pick(&newer.engineering_approval, &self.engineering_approval),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsChange {
    pub business_justification: Option<String>,
    pub duration: Option<String>,
    pub manager_approval: Option<String>,
    pub aws_account: Option<String>,
    pub role_requested: Option<String>,
}

impl PermissionsChange {
    pub const FIELDS: &'static [FieldSpec] = &[
        JUSTIFICATION,
        FieldSpec {
            name: "duration",
            description: "How long access should be granted for.",
            required: true,
        },
        FieldSpec {
            name: "manager_approval",
            description: "A Jira ticket recording your manager's approval.",
            required: true,
        },
        FieldSpec {
            name: "aws_account",
            description: "The AWS account in which permissions should change.",
            required: false,
        },
        FieldSpec {
            name: "role_requested",
            description: "The role that should temporarily be granted.",
            required: false,
        },
    ];

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "business_justification" => {
                self.business_justification.clone().map(FieldValue::Text)
            }
            "duration" => self.duration.clone().map(FieldValue::Text),
            "manager_approval" => self.manager_approval.clone().map(FieldValue::Text),
            "aws_account" => self.aws_account.clone().map(FieldValue::Text),
            "role_requested" => self.role_requested.clone().map(FieldValue::Text),
            _ => None,
        }
    }

    fn merged(&self, newer: &Self) -> Self {
        Self {
            business_justification: pick(&newer.business_justification, &self.business_justification),
            duration: pick(&newer.duration, &self.duration),
            manager_approval: pick(&newer.manager_approval, &self.manager_approval),
            aws_account: pick(&newer.aws_account, &self.aws_account),
            role_requested: pick(&newer.role_requested, &self.role_requested),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorApproval {
    pub vendor_name: Option<String>,
    pub security_questionnaire_completed: Option<bool>,
    pub data_classification: Option<String>,
    pub legal_review_completed: Option<bool>,
}

impl VendorApproval {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "vendor_name",
            description: "The vendor that requires onboarding.",
            required: false,
        },
        FieldSpec {
            name: "security_questionnaire_completed",
            description: "Whether the vendor completed our security questionnaire.",
            required: true,
        },
        FieldSpec {
            name: "data_classification",
            description: "How sensitive the data shared with the vendor is.",
            required: true,
        },
        FieldSpec {
            name: "legal_review_completed",
            description: "Whether the vendor passed the required legal review.",
            required: true,
        },
    ];

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "vendor_name" => self.vendor_name.clone().map(FieldValue::Text),
            "security_questionnaire_completed" => {
                self.security_questionnaire_completed.map(FieldValue::Flag)
            }
            "data_classification" => self.data_classification.clone().map(FieldValue::Text),
            "legal_review_completed" => self.legal_review_completed.map(FieldValue::Flag),
            _ => None,
        }
    }

    fn merged(&self, newer: &Self) -> Self {
        Self {
            vendor_name: pick(&newer.vendor_name, &self.vendor_name),
            security_questionnaire_completed: newer
                .security_questionnaire_completed
                .or(self.security_questionnaire_completed),
            data_classification: pick(&newer.data_classification, &self.data_classification),
            legal_review_completed: newer
                .legal_review_completed
                .or(self.legal_review_completed),
        }
    }
}

/// One user security request, possibly partially filled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecurityRequest {
    Unidentified,
    CloudResourceAccess(CloudResourceAccess),
    DataExport(DataExport),
    DevToolInstall(DevToolInstall),
    FirewallChange(FirewallChange),
    NetworkAccess(NetworkAccess),
    PermissionsChange(PermissionsChange),
    VendorApproval(VendorApproval),
}

/// A field spec together with its current value, for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSummary {
    pub spec: FieldSpec,
    pub value: Option<FieldValue>,
}

impl SecurityRequest {
    /// An all-absent request of the given kind.
    pub fn empty(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Unidentified => Self::Unidentified,
            RequestKind::CloudResourceAccess => {
                Self::CloudResourceAccess(CloudResourceAccess::default())
            }
            RequestKind::DataExport => Self::DataExport(DataExport::default()),
            RequestKind::DevToolInstall => Self::DevToolInstall(DevToolInstall::default()),
            RequestKind::FirewallChange => Self::FirewallChange(FirewallChange::default()),
            RequestKind::NetworkAccess => Self::NetworkAccess(NetworkAccess::default()),
            RequestKind::PermissionsChange => {
                Self::PermissionsChange(PermissionsChange::default())
            }
            RequestKind::VendorApproval => Self::VendorApproval(VendorApproval::default()),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Unidentified => RequestKind::Unidentified,
            Self::CloudResourceAccess(_) => RequestKind::CloudResourceAccess,
            Self::DataExport(_) => RequestKind::DataExport,
            Self::DevToolInstall(_) => RequestKind::DevToolInstall,
            Self::FirewallChange(_) => RequestKind::FirewallChange,
            Self::NetworkAccess(_) => RequestKind::NetworkAccess,
            Self::PermissionsChange(_) => RequestKind::PermissionsChange,
            Self::VendorApproval(_) => RequestKind::VendorApproval,
        }
    }

    /// The static field table for this variant, in declaration order.
    pub fn field_specs(&self) -> &'static [FieldSpec] {
        match self {
            Self::Unidentified => &[],
            Self::CloudResourceAccess(_) => CloudResourceAccess::FIELDS,
            Self::DataExport(_) => DataExport::FIELDS,
            Self::DevToolInstall(_) => DevToolInstall::FIELDS,
            Self::FirewallChange(_) => FirewallChange::FIELDS,
            Self::NetworkAccess(_) => NetworkAccess::FIELDS,
            Self::PermissionsChange(_) => PermissionsChange::FIELDS,
            Self::VendorApproval(_) => VendorApproval::FIELDS,
        }
    }

    /// Looks up one field by name. Unknown names resolve to `None`.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            Self::Unidentified => None,
            Self::CloudResourceAccess(request) => request.field(name),
            Self::DataExport(request) => request.field(name),
            Self::DevToolInstall(request) => request.field(name),
            Self::FirewallChange(request) => request.field(name),
            Self::NetworkAccess(request) => request.field(name),
            Self::PermissionsChange(request) => request.field(name),
            Self::VendorApproval(request) => request.field(name),
        }
    }

    /// True iff every required field has a value. `Unidentified` is never
    /// valid.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Unidentified => false,
            _ => self
                .field_specs()
                .iter()
                .filter(|spec| spec.required)
                .all(|spec| self.field(spec.name).is_some()),
        }
    }

    /// All fields (required or not) without a value, in declaration order.
    pub fn missing_fields(&self) -> Vec<FieldSpec> {
        self.field_specs()
            .iter()
            .filter(|spec| self.field(spec.name).is_none())
            .copied()
            .collect()
    }

    pub fn mandatory_fields(&self) -> Vec<String> {
        self.field_specs()
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.name.to_owned())
            .collect()
    }

    pub fn provided_fields(&self) -> Vec<String> {
        self.field_specs()
            .iter()
            .filter(|spec| self.field(spec.name).is_some())
            .map(|spec| spec.name.to_owned())
            .collect()
    }

    /// Every field with its current value, for the formatting layer.
    pub fn describe(&self) -> Vec<FieldSummary> {
        self.field_specs()
            .iter()
            .map(|spec| FieldSummary { spec: *spec, value: self.field(spec.name) })
            .collect()
    }

    /// Folds `other` into `self`, producing a new request. Present fields
    /// of `other` win; absent fields keep `self`'s value. Neither operand
    /// is mutated.
    ///
    /// Merging into `Unidentified` adopts `other` unchanged; any other kind
    /// mismatch indicates a stale tracker entry and fails loudly.
    pub fn merge_with(&self, other: &SecurityRequest) -> Result<SecurityRequest, DomainError> {
        if matches!(self, Self::Unidentified) {
            return Ok(other.clone());
        }

        match (self, other) {
            (Self::CloudResourceAccess(older), Self::CloudResourceAccess(newer)) => {
                Ok(Self::CloudResourceAccess(older.merged(newer)))
            }
            (Self::DataExport(older), Self::DataExport(newer)) => {
                Ok(Self::DataExport(older.merged(newer)))
            }
            (Self::DevToolInstall(older), Self::DevToolInstall(newer)) => {
                Ok(Self::DevToolInstall(older.merged(newer)))
            }
            (Self::FirewallChange(older), Self::FirewallChange(newer)) => {
                Ok(Self::FirewallChange(older.merged(newer)))
            }
            (Self::NetworkAccess(older), Self::NetworkAccess(newer)) => {
                Ok(Self::NetworkAccess(older.merged(newer)))
            }
            (Self::PermissionsChange(older), Self::PermissionsChange(newer)) => {
                Ok(Self::PermissionsChange(older.merged(newer)))
            }
            (Self::VendorApproval(older), Self::VendorApproval(newer)) => {
                Ok(Self::VendorApproval(older.merged(newer)))
            }
            _ => Err(DomainError::MergeKindMismatch {
                expected: self.kind(),
                found: other.kind(),
            }),
        }
    }
}

fn pick(newer: &Option<String>, older: &Option<String>) -> Option<String> {
    newer.clone().or_else(|| older.clone())
}

#[cfg(test)]
mod tests {
    use super::{
        CloudResourceAccess, FieldValue, FirewallChange, RequestKind, SecurityRequest,
    };
    use crate::errors::DomainError;

    fn filled_firewall() -> SecurityRequest {
        SecurityRequest::FirewallChange(FirewallChange {
            business_justification: Some("scheduled support session".to_owned()),
            destination: Some("196.181.12.201:22".to_owned()),
            source_system: Some("bastion".to_owned()),
        })
    }

    #[test]
    fn attribute_names_match_the_field_table_exactly() {
        for kind in RequestKind::KNOWN {
            let request = SecurityRequest::empty(*kind);
            for spec in request.field_specs() {
                // The accessor knows every declared name, and an empty
                // request resolves each one to an absent value.
                assert!(request.field(spec.name).is_none());
            }
            assert!(request.field("no_such_field").is_none());
        }
    }

    #[test]
    fn empty_request_of_every_kind_is_invalid() {
        for kind in RequestKind::KNOWN {
            assert!(!SecurityRequest::empty(*kind).is_valid(), "{kind:?}");
        }
        assert!(!SecurityRequest::Unidentified.is_valid());
    }

    #[test]
    fn validity_holds_iff_all_required_fields_are_present() {
        // All 2^3 presence combinations over FirewallChange's fields; only
        // the two required ones gate validity.
        for bits in 0u8..8 {
            let request = SecurityRequest::FirewallChange(FirewallChange {
                business_justification: (bits & 1 != 0).then(|| "reason".to_owned()),
                destination: (bits & 2 != 0).then(|| "10.0.0.1:22".to_owned()),
                source_system: (bits & 4 != 0).then(|| "bastion".to_owned()),
            });
            let required_present = bits & 1 != 0 && bits & 2 != 0;
            assert_eq!(request.is_valid(), required_present, "bits={bits:#05b}");
        }
    }

    #[test]
    fn missing_fields_lists_absent_fields_in_declaration_order() {
        let request = SecurityRequest::FirewallChange(FirewallChange {
            business_justification: None,
            destination: Some("10.0.0.1:22".to_owned()),
            source_system: None,
        });
        let missing: Vec<&str> =
            request.missing_fields().iter().map(|spec| spec.name).collect();
        assert_eq!(missing, vec!["business_justification", "source_system"]);
    }

    #[test]
    fn fully_filled_request_has_no_missing_fields() {
        assert!(filled_firewall().missing_fields().is_empty());
        assert!(filled_firewall().is_valid());
    }

    #[test]
    fn merge_is_right_biased() {
        let older = SecurityRequest::FirewallChange(FirewallChange {
            business_justification: Some("old reason".to_owned()),
            destination: None,
            source_system: Some("bastion".to_owned()),
        });
        let newer = SecurityRequest::FirewallChange(FirewallChange {
            business_justification: Some("new reason".to_owned()),
            destination: Some("10.0.0.1:443".to_owned()),
            source_system: None,
        });

        let merged = older.merge_with(&newer).expect("same kind merges");
        assert_eq!(
            merged,
            SecurityRequest::FirewallChange(FirewallChange {
                business_justification: Some("new reason".to_owned()),
                destination: Some("10.0.0.1:443".to_owned()),
                source_system: Some("bastion".to_owned()),
            })
        );
        // The merge is copy-producing; the original operand is untouched.
        assert_eq!(
            older.field("business_justification"),
            Some(FieldValue::Text("old reason".to_owned()))
        );
    }

    #[test]
    fn merging_an_empty_request_into_a_filled_one_changes_nothing() {
        let filled = filled_firewall();
        let empty = SecurityRequest::empty(RequestKind::FirewallChange);
        assert_eq!(filled.merge_with(&empty).expect("same kind merges"), filled);
    }

    #[test]
    fn merging_distinct_kinds_fails_for_every_pair() {
        for older_kind in RequestKind::KNOWN {
            for newer_kind in RequestKind::KNOWN {
                if older_kind == newer_kind {
                    continue;
                }
                let older = SecurityRequest::empty(*older_kind);
                let newer = SecurityRequest::empty(*newer_kind);
                let error = older.merge_with(&newer).expect_err("kind mismatch");
                assert_eq!(
                    error,
                    DomainError::MergeKindMismatch {
                        expected: *older_kind,
                        found: *newer_kind
                    }
                );
            }
        }
    }

    #[test]
    fn merging_into_unidentified_adopts_the_incoming_request() {
        let incoming = filled_firewall();
        let merged = SecurityRequest::Unidentified.merge_with(&incoming).expect("pass-through");
        assert_eq!(merged, incoming);
    }

    #[test]
    fn unidentified_has_no_fields_and_no_missing_fields() {
        assert!(SecurityRequest::Unidentified.field_specs().is_empty());
        assert!(SecurityRequest::Unidentified.missing_fields().is_empty());
        assert!(SecurityRequest::Unidentified.provided_fields().is_empty());
    }

    #[test]
    fn describe_pairs_every_spec_with_its_value() {
        let request = SecurityRequest::CloudResourceAccess(CloudResourceAccess {
            business_justification: Some("quarterly audit".to_owned()),
            sensitivity: None,
        });
        let summaries = request.describe();
        assert_eq!(summaries.len(), 2);
        assert_eq!(
            summaries[0].value,
            Some(FieldValue::Text("quarterly audit".to_owned()))
        );
        assert!(summaries[1].value.is_none());
        assert!(summaries[1].spec.required);
    }
}
