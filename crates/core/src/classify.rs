//! Keyword/pattern classification of raw message text.

use regex::Regex;

use crate::requests::RequestKind;

/// Ordered first-match-wins classifier. Patterns are compiled once at
/// construction; classification itself is pure and case-insensitive.
///
/// The rule order is load-bearing: firewall phrasing must be checked before
/// the generic `access` cue, and the substring cues before the looser
/// traffic/services patterns.
#[derive(Debug)]
pub struct Classifier {
    firewall_trigger: Regex,
    allow_traffic: Regex,
    provide_services: Regex,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            firewall_trigger: Regex::new(r"allow ssh to external ip")
                .expect("firewall trigger pattern is valid"),
            allow_traffic: Regex::new(r"allow\s*\w*\s*traffic")
                .expect("allow-traffic pattern is valid"),
            provide_services: Regex::new(r"provides?\s+(\w+\s+)*services")
                .expect("provide-services pattern is valid"),
        }
    }

    pub fn classify(&self, text: &str) -> RequestKind {
        let lowered = text.to_lowercase();

        if lowered.contains("firewall") || self.firewall_trigger.is_match(&lowered) {
            return RequestKind::FirewallChange;
        }
        if lowered.contains("install") {
            return RequestKind::DevToolInstall;
        }
        if lowered.contains("role") {
            return RequestKind::PermissionsChange;
        }
        if lowered.contains("export") {
            return RequestKind::DataExport;
        }
        if lowered.contains("access") {
            return RequestKind::CloudResourceAccess;
        }
        if self.allow_traffic.is_match(&lowered) {
            return RequestKind::NetworkAccess;
        }
        if self.provide_services.is_match(&lowered) {
            return RequestKind::VendorApproval;
        }
        RequestKind::Unidentified
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
