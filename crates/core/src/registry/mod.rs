//! Remote code registry and result-reporting client.

mod http;
mod types;

pub use http::HttpCodeRegistry;
pub use types::{CodeOutcome, CodeRegistry, RegistryError};
