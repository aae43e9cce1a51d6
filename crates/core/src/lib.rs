pub mod acquisition;
pub mod browser;
pub mod config;
pub mod extraction;
pub mod ledger;
pub mod orchestrator;
pub mod queue;
pub mod registry;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError,
};
pub use ledger::{CodeRecord, CodeStatus, Ledger, LedgerError, SqliteLedger};
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use registry::{CodeRegistry, HttpCodeRegistry};
