//! Compliance results: the fresh verdict of one check and the cached record
//! of the last completed cycle.

use serde::{Deserialize, Serialize};

/// Message cached whenever a cycle finds the deployment out of compliance.
pub const REMEDIATION_MESSAGE: &str = "You are working against a service that is not licensed or \
    wrongly licensed. Please contact your system administrator.";

/// Outcome of one authoritative compliance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceVerdict {
    /// Activated users above the licensed maximum.
    pub exceeded_users: u64,
    /// Names of reachable services whose license id is not granted.
    pub unlicensed_services: Vec<String>,
    /// Result of the expiration-date comparison.
    pub date_exceeded: bool,
    /// License/tenant identifier of the checked grant.
    pub tpld: String,
}

impl ComplianceVerdict {
    /// Returns true if no check reported a violation.
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.exceeded_users == 0 && self.unlicensed_services.is_empty() && !self.date_exceeded
    }
}

/// The cached result of the most recently completed cycle.
///
/// The default value (timestamp 0) means no cycle has completed yet, which is
/// distinct from a completed cycle that found the license invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCycleResult {
    /// Whether the deployment was compliant.
    pub is_valid: bool,
    /// Completion time, epoch milliseconds.
    #[serde(rename = "timeStamp")]
    pub timestamp: i64,
    /// Remediation text when invalid, empty otherwise.
    pub message: String,
    /// License/tenant identifier, empty when the cycle failed.
    pub tpld: String,
}

impl CachedCycleResult {
    /// Builds the record for a cycle that produced a verdict.
    #[must_use]
    pub fn from_verdict(verdict: &ComplianceVerdict, timestamp: i64) -> Self {
        let is_valid = verdict.is_compliant();
        Self {
            is_valid,
            timestamp,
            message: if is_valid {
                String::new()
            } else {
                REMEDIATION_MESSAGE.to_string()
            },
            tpld: verdict.tpld.clone(),
        }
    }

    /// Builds the conservative record for a cycle that errored.
    #[must_use]
    pub fn failed(timestamp: i64) -> Self {
        Self {
            is_valid: false,
            timestamp,
            message: REMEDIATION_MESSAGE.to_string(),
            tpld: String::new(),
        }
    }

    /// Returns true once any cycle has written this record.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.timestamp > 0
    }
}
