//! Ledger trait definition.

use super::{CodeRecord, CodeStatus, LedgerError};

/// Durable key/value record of per-code acquisition status.
///
/// Implementations must be safe for concurrent access from the acquisition
/// and extraction workers; each method is a single short durable operation.
pub trait Ledger: Send + Sync {
    /// True iff a record exists for `code` with status `completed`.
    fn is_completed(&self, code: &str) -> Result<bool, LedgerError>;

    /// Upsert: sets `updated_at` to now, sets `created_at` only on first
    /// insert. Replays with the same status are harmless.
    fn mark(&self, code: &str, status: CodeStatus) -> Result<(), LedgerError>;

    /// Update `updated_at` without changing status. Used to record liveness
    /// during long external interactions. A no-op for unknown codes.
    fn touch(&self, code: &str) -> Result<(), LedgerError>;

    /// Fetch the full record for a code, if any.
    fn get(&self, code: &str) -> Result<Option<CodeRecord>, LedgerError>;
}
