//! Risk scoring for classified requests.
//!
//! Scores are deterministic and side-effect free: a per-kind base plus
//! fixed increments for content signals, clamped to `[0, 100]`. A request
//! missing any mandatory field scores exactly 100 before kind dispatch,
//! which keeps the decision policy's reject path independent of content.

use crate::requests::{
    CloudResourceAccess, DataExport, DevToolInstall, FirewallChange, NetworkAccess,
    PermissionsChange, SecurityRequest, VendorApproval,
};

pub const MAX_RISK: u8 = 100;

#[derive(Clone, Copy, Debug, Default)]
pub struct RiskScorer;

impl RiskScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, request: &SecurityRequest) -> u8 {
        if !request.is_valid() {
            return MAX_RISK;
        }
        let raw = match request {
            SecurityRequest::Unidentified => f64::from(MAX_RISK),
            SecurityRequest::CloudResourceAccess(inner) => cloud_resource_access(inner),
            SecurityRequest::DataExport(inner) => data_export(inner),
            SecurityRequest::DevToolInstall(inner) => devtool_install(inner),
            SecurityRequest::FirewallChange(inner) => firewall_change(inner),
            SecurityRequest::NetworkAccess(inner) => network_access(inner),
            SecurityRequest::PermissionsChange(inner) => permissions_change(inner),
            SecurityRequest::VendorApproval(inner) => vendor_approval(inner),
        };
        raw.clamp(0.0, f64::from(MAX_RISK)).round() as u8
    }
}

fn cloud_resource_access(request: &CloudResourceAccess) -> f64 {
    let mut score = 30.0;
    if let Some(sensitivity) = lowered(&request.sensitivity) {
        if sensitivity.contains("high") {
            score += 25.0;
        }
        if sensitivity.contains("pii") || sensitivity.contains("confidential") {
            score += 15.0;
        }
    }
    if mentions_third_party(&request.business_justification) {
        score += 10.0;
    }
    score
}

fn data_export(request: &DataExport) -> f64 {
    let mut score = 40.0;
    if request.pii_involved == Some(true) {
        score += 20.0;
    }
    if lowered(&request.destination).is_some_and(|d| d.contains("external")) {
        score += 20.0;
    }
    if mentions_third_party(&request.business_justification)
        || lowered(&request.business_justification).is_some_and(|j| j.contains("partner"))
    {
        score += 10.0;
    }
    score
}

fn devtool_install(request: &DevToolInstall) -> f64 {
    let mut score = 20.0;
    if let Some(justification) = lowered(&request.business_justification) {
        if justification.contains("custom") || justification.contains("unvetted") {
            score += 10.0;
        }
        if justification.contains("plugin") || justification.contains("extension") {
            score += 5.0;
        }
    }
    score
}

fn firewall_change(request: &FirewallChange) -> f64 {
    let mut score = 35.0;
    if destination_port(&request.destination).is_some_and(|port| port != 22) {
        score += 20.0;
    }
    let external = lowered(&request.destination).is_some_and(|d| d.contains("external"))
        || lowered(&request.source_system).is_some_and(|s| s.contains("external"));
    if external {
        score += 15.0;
    }
    if mentions_third_party(&request.business_justification) {
        score += 10.0;
    }
    score
}

fn network_access(request: &NetworkAccess) -> f64 {
    let mut score = 30.0;
    match prefix_bits(&request.source_cidr) {
        Some(bits) => score += f64::from(32u8.saturating_sub(bits)),
        None => score += 15.0,
    }
    if mentions_third_party(&request.business_justification) {
        score += 10.0;
    }
    score
}

fn permissions_change(request: &PermissionsChange) -> f64 {
    let mut score = 30.0;
    if lowered(&request.role_requested).is_some_and(|r| r.contains("admin")) {
        score += 20.0;
    }
    if lowered(&request.aws_account).is_some_and(|a| a.contains("prod")) {
        score += 15.0;
    }
    match request.duration.as_deref().and_then(duration_hours) {
        // Floor at one hour so short grants never score below the base.
        Some(hours) => score += hours.max(1.0).ln().min(20.0),
        None => score += 20.0,
    }
    score
}

fn vendor_approval(request: &VendorApproval) -> f64 {
    let mut score = 25.0;
    if lowered(&request.data_classification).is_some_and(|c| c.contains("confidential")) {
        score += 20.0;
    }
    if request.security_questionnaire_completed == Some(false) {
        score += 15.0;
    }
    if request.legal_review_completed == Some(false) {
        score += 15.0;
    }
    score
}

fn lowered(field: &Option<String>) -> Option<String> {
    field.as_deref().map(str::to_lowercase)
}

fn mentions_third_party(field: &Option<String>) -> bool {
    lowered(field).is_some_and(|text| text.contains("third party") || text.contains("third-party"))
}

fn destination_port(destination: &Option<String>) -> Option<u16> {
    destination.as_deref()?.rsplit_once(':')?.1.parse().ok()
}

fn prefix_bits(cidr: &Option<String>) -> Option<u8> {
    let bits: u8 = cidr.as_deref()?.rsplit_once('/')?.1.parse().ok()?;
    (bits <= 32).then_some(bits)
}

/// Parses a free-text grant duration ("3 hours", "2 days") into hours.
/// Anything that does not lead with an integer and a known unit is
/// unbounded and left to the caller's penalty.
fn duration_hours(duration: &str) -> Option<f64> {
    let trimmed = duration.trim();
    let digits_end = trimmed.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let value: f64 = trimmed[..digits_end].parse().ok()?;
    let unit = trimmed[digits_end..].trim_start();
    let per_hour = if unit.starts_with("second") {
        1.0 / 3600.0
    } else if unit.starts_with("minute") {
        1.0 / 60.0
    } else if unit.starts_with("hour") {
        1.0
    } else if unit.starts_with("day") {
        24.0
    } else {
        return None;
    };
    Some(value * per_hour)
}
