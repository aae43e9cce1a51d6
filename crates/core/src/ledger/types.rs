//! Types for the status ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// The ledger offers no internal retry; callers decide whether a failed
/// write is fatal to the current code or merely logged.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Acquisition status of a code. A code absent from the ledger is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    /// A worker currently holds the code (or crashed while holding it).
    Processing,
    /// All discovered documents were extracted. Terminal.
    Completed,
    /// Acquisition or extraction failed; eligible for retry on the next run.
    Failed,
}

impl CodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStatus::Processing => "processing",
            CodeStatus::Completed => "completed",
            CodeStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(CodeStatus::Processing),
            "completed" => Some(CodeStatus::Completed),
            "failed" => Some(CodeStatus::Failed),
            _ => None,
        }
    }
}

/// One ledger row. Timestamps are monotonic non-decreasing per code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRecord {
    pub code: String,
    pub status: CodeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            CodeStatus::Processing,
            CodeStatus::Completed,
            CodeStatus::Failed,
        ] {
            assert_eq!(CodeStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CodeStatus::parse("pending"), None);
    }
}
