//! Per-kind field extraction from raw message text.
//!
//! Each field has an independent pattern; a miss leaves the field absent
//! and is never an error. The attestation flags (PII involvement, vendor
//! questionnaire/legal review) come from a negation-marker scan near a
//! keyword — a documented heuristic, not a guaranteed-correct parse.

use regex::Regex;

use crate::requests::{
    CloudResourceAccess, DataExport, DevToolInstall, FirewallChange, NetworkAccess,
    PermissionsChange, RequestKind, SecurityRequest, VendorApproval,
};

#[derive(Debug)]
pub struct FieldExtractor {
    justification: Regex,
    sensitivity: Regex,
    duration: Regex,
    approval_ticket: Regex,
    firewall_destination: Regex,
    firewall_source: Regex,
    export_destination: Regex,
    source_cidr: Regex,
    aws_account: Regex,
    requested_role: Regex,
    vendor_name: Regex,
    pii_phrase: Regex,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self {
            justification: Regex::new(r"\b(?:for|to)\b (?P<justification>\w+(?: +\w+)*)")
                .expect("justification pattern is valid"),
            sensitivity: Regex::new(
                r"Data classification:\s*(?P<sensitivity>[\w.]+(?: +[\w.]+)*)",
            )
            .expect("sensitivity pattern is valid"),
            duration: Regex::new(r"(?P<duration>\d+\s*(?:days?|hours?|minutes?|seconds?))")
                .expect("duration pattern is valid"),
            approval_ticket: Regex::new(r"Jira ticket:\s*(?P<ticket>[A-Za-z]+-\d+)")
                .expect("approval ticket pattern is valid"),
            // The gap is capped so the match anchors on the "to" nearest the
            // address ("to vendor IP x.x.x.x"), not an earlier clause.
            firewall_destination: Regex::new(
                r"to (?:\w+ ){0,3}(?P<ip>(?:\d{1,3}\.){3}\d{1,3}) on port (?P<port>\d+)",
            )
            .expect("firewall destination pattern is valid"),
            firewall_source: Regex::new(r"\bfrom (?P<source>\w+(?: +\w+)*)")
                .expect("firewall source pattern is valid"),
            export_destination: Regex::new(
                r"(?i)\bexport(?:ed)?(?: \w+)*? to (?P<destination>[\w-]+(?: +[\w-]+)*)",
            )
            .expect("export destination pattern is valid"),
            source_cidr: Regex::new(
                r"\bfrom (?:internal subnet )?(?P<cidr>(?:\d{1,3}\.){3}\d{1,3}/\d{1,2})",
            )
            .expect("source cidr pattern is valid"),
            aws_account: Regex::new(r"AWS account (?P<account>[\w-]+)")
                .expect("aws account pattern is valid"),
            requested_role: Regex::new(r"Requesting (?:the )?(?P<role>\w+) role")
                .expect("requested role pattern is valid"),
            vendor_name: Regex::new(r"(?m)^(?P<vendor>[A-Z][\w,.&' ]*?) provides? ")
                .expect("vendor name pattern is valid"),
            pii_phrase: Regex::new(
                r"(?i)(?P<classification>(?:no )?(?:customer )?pii(?: is)?(?: not)? (?:involved|present|at risk))",
            )
            .expect("pii phrase pattern is valid"),
        }
    }

    /// Builds a (possibly partial) request of the tagged kind from raw text.
    /// `Unidentified` short-circuits without attempting extraction.
    pub fn extract(&self, kind: RequestKind, text: &str) -> SecurityRequest {
        match kind {
            RequestKind::Unidentified => SecurityRequest::Unidentified,
            RequestKind::CloudResourceAccess => {
                SecurityRequest::CloudResourceAccess(self.cloud_resource_access(text))
            }
            RequestKind::DataExport => SecurityRequest::DataExport(self.data_export(text)),
            RequestKind::DevToolInstall => {
                SecurityRequest::DevToolInstall(self.devtool_install(text))
            }
            RequestKind::FirewallChange => {
                SecurityRequest::FirewallChange(self.firewall_change(text))
            }
            RequestKind::NetworkAccess => {
                SecurityRequest::NetworkAccess(self.network_access(text))
            }
            RequestKind::PermissionsChange => {
                SecurityRequest::PermissionsChange(self.permissions_change(text))
            }
            RequestKind::VendorApproval => {
                SecurityRequest::VendorApproval(self.vendor_approval(text))
            }
        }
    }

    fn cloud_resource_access(&self, text: &str) -> CloudResourceAccess {
        CloudResourceAccess {
            business_justification: self.justification(text),
            sensitivity: self.capture(&self.sensitivity, "sensitivity", text),
        }
    }

    fn data_export(&self, text: &str) -> DataExport {
        DataExport {
            business_justification: self.justification(text),
            pii_involved: pii_involved(text),
            destination: self.capture(&self.export_destination, "destination", text),
        }
    }

    fn devtool_install(&self, text: &str) -> DevToolInstall {
        DevToolInstall {
            business_justification: self.justification(text),
            team_leader_approval: self.capture(&self.approval_ticket, "ticket", text),
        }
    }

    fn firewall_change(&self, text: &str) -> FirewallChange {
        let captures = self.firewall_destination.captures(text);
        let destination =
            captures.as_ref().map(|c| format!("{}:{}", &c["ip"], &c["port"]));

        // The destination clause also begins with "to"; cut it out so the
        // justification and source searches cannot swallow the IP.
        let remainder = match captures.as_ref().and_then(|c| c.get(0)) {
            Some(span) => format!("{}{}", &text[..span.start()], &text[span.end()..]),
            None => text.to_owned(),
        };

        FirewallChange {
            business_justification: self.justification(&remainder),
            destination,
            source_system: self.capture(&self.firewall_source, "source", &remainder),
        }
    }

    fn network_access(&self, text: &str) -> NetworkAccess {
        NetworkAccess {
            business_justification: self.justification(text),
            source_cidr: self.capture(&self.source_cidr, "cidr", text),
            engineering_approval: self.capture(&self.approval_ticket, "ticket", text),
        }
    }

    fn permissions_change(&self, text: &str) -> PermissionsChange {
        PermissionsChange {
            business_justification: self.justification(text),
            duration: self.capture(&self.duration, "duration", text),
            manager_approval: self.capture(&self.approval_ticket, "ticket", text),
            aws_account: self.capture(&self.aws_account, "account", text),
            role_requested: self.capture(&self.requested_role, "role", text),
        }
    }

    fn vendor_approval(&self, text: &str) -> VendorApproval {
        let data_classification = self
            .capture(&self.pii_phrase, "classification", text)
            .or_else(|| self.capture(&self.sensitivity, "sensitivity", text));

        VendorApproval {
            vendor_name: self
                .capture(&self.vendor_name, "vendor", text)
                .map(|name| name.trim().to_owned()),
            security_questionnaire_completed: attestation(text, &["questionnaire"]),
            data_classification,
            legal_review_completed: attestation(text, &["soc 2", "legal review"]),
        }
    }

    fn justification(&self, text: &str) -> Option<String> {
        self.capture(&self.justification, "justification", text)
    }

    fn capture(&self, pattern: &Regex, group: &str, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|captures| captures.name(group))
            .map(|found| found.as_str().to_owned())
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// PII involvement for data exports: present iff the text mentions PII or
/// direct identifiers, negated by the usual markers.
fn pii_involved(text: &str) -> Option<bool> {
    let lowered = text.to_lowercase();
    if !lowered.contains("pii") && !lowered.contains("direct identifiers") {
        return None;
    }
    let negated = lowered.contains("no pii")
        || lowered.contains("no direct identifiers")
        || lowered.contains("anonymized");
    Some(!negated)
}

/// Sentence-scoped attestation scan: the first sentence mentioning one of
/// `keywords` yields `true` unless it carries a negation marker. No
/// keyword, no value.
fn attestation(text: &str, keywords: &[&str]) -> Option<bool> {
    for sentence in text.split(['.', ';', '\n']) {
        let lowered = sentence.to_lowercase();
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            let negated = ["don't", "do not", "not ", "failing", "invalid", "no "]
                .iter()
                .any(|marker| lowered.contains(marker));
            return Some(!negated);
        }
    }
    None
}
