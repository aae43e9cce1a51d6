//! Durable per-code acquisition status ledger.
//!
//! The ledger is the single source of truth for how far each reporting-entity
//! code has progressed. Both the acquisition and extraction workers write to
//! it; every operation is a self-contained read-modify-write against durable
//! storage, so no cross-operation locking is needed.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteLedger;
pub use store::Ledger;
pub use types::{CodeRecord, CodeStatus, LedgerError};
