//! Types for the acquisition worker.

use thiserror::Error;

use crate::browser::BrowserError;
use crate::ledger::LedgerError;

/// Errors that can occur during acquisition.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out waiting for a download to settle in {0}")]
    DownloadTimeout(String),
}

/// Classification of a discovered document, derived from the row text
/// adjacent to its download link. Determines the destination subdirectory
/// and is not revisited after relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Quarterly,
    SemiAnnual,
    Annual,
    Unknown,
}

impl ReportKind {
    /// Classify a document from its adjacent row text (case-insensitive).
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("quarter") {
            ReportKind::Quarterly
        } else if text.contains("semi") || text.contains("interim") {
            ReportKind::SemiAnnual
        } else if text.contains("annual") || text.contains("financial") {
            ReportKind::Annual
        } else {
            ReportKind::Unknown
        }
    }

    /// Destination subdirectory name.
    pub fn as_dir_name(&self) -> &'static str {
        match self {
            ReportKind::Quarterly => "Quarterly",
            ReportKind::SemiAnnual => "SemiAnnual",
            ReportKind::Annual => "Annual",
            ReportKind::Unknown => "Unknown",
        }
    }
}

/// Strip filesystem-illegal and control characters from a document label.
pub fn sanitize_label(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quarterly() {
        assert_eq!(
            ReportKind::classify("Quarterly Report Q3"),
            ReportKind::Quarterly
        );
        assert_eq!(ReportKind::classify("QUARTER results"), ReportKind::Quarterly);
    }

    #[test]
    fn test_classify_semi_annual() {
        assert_eq!(
            ReportKind::classify("Semi-Annual Report"),
            ReportKind::SemiAnnual
        );
        assert_eq!(ReportKind::classify("Interim Report"), ReportKind::SemiAnnual);
    }

    #[test]
    fn test_classify_annual() {
        assert_eq!(ReportKind::classify("Annual Report"), ReportKind::Annual);
        assert_eq!(
            ReportKind::classify("Financial Statement"),
            ReportKind::Annual
        );
    }

    #[test]
    fn test_classify_quarter_wins_over_financial() {
        // Keyword rules apply in order; "quarter" takes precedence.
        assert_eq!(
            ReportKind::classify("Quarterly Financial Report"),
            ReportKind::Quarterly
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(ReportKind::classify("Press Release"), ReportKind::Unknown);
        assert_eq!(ReportKind::classify(""), ReportKind::Unknown);
    }

    #[test]
    fn test_sanitize_label_strips_illegal_chars() {
        assert_eq!(
            sanitize_label(r#"Annual Report: Q1/Q2 <2024>?"#),
            "Annual Report Q1Q2 2024"
        );
    }

    #[test]
    fn test_sanitize_label_trims() {
        assert_eq!(sanitize_label("  report \t"), "report");
    }
}
