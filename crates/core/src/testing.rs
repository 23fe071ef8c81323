//! Shared fixture texts for unit tests: one fully-specified message per
//! request kind, phrased the way requesters actually write them.

pub const FULL_FIREWALL_CHANGE_REQUEST: &str = "Requesting temporary firewall rule to allow outbound SSH from bastion to vendor IP 196.181.12.201 on port 22.\nThis is for scheduled support session during the upcoming patch window.";

pub const FULL_DEVTOOL_INSTALL_REQUEST: &str = "Requesting installation of extension 'hold' from official VSCode marketplace.\nTool will be used by dev team for shared debugging and code review sessions.";

pub const FULL_PERMISSION_CHANGE_REQUEST: &str = "Requesting AdministratorAccess role for AWS account acme-prod to handle production incident.\nAccess needed for 3 hours. Related Jira ticket: INFRA-2171.";

pub const FULL_DATA_EXPORT_REQUEST: &str = "Request to export anonymized user event data (~43GB) for ML model training.\nData to be exported to secure S3 bucket acme-stage-medical. No direct identifiers present.";

pub const FULL_CLOUD_ACCESS_REQUEST: &str = "Access requested for S3 bucket acme-stage-radio to troubleshoot log ingestion failures.\nData classification: Internal. No customer PII involved.";

pub const FULL_NETWORK_ACCESS_REQUEST: &str = "Request to allow MySQL traffic from internal subnet 10.7.69.0/24 to RDS cluster rds-acme-dev.\nThis is needed for data sync during migration. Approved change window is 02:00\u{2013}04:00 UTC.";

pub const FULL_VENDOR_APPROVAL_REQUEST: &str = "Flores, Garcia and Abbott provides marketing analytics services.\nThey completed ACME's security questionnaire with a passing score and have a valid SOC 2 Type II report. No PII involved.";
