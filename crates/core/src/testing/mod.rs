//! Mock implementations of the external service traits.
//!
//! The browser mock simulates the whole portal interaction, including
//! writing archive bytes into the download directory when a document link
//! is clicked, so the full pipeline can be exercised without a browser.
//!
//! # Example
//!
//! ```rust,ignore
//! use kessan_core::testing::{MockBrowser, MockConnector, MockRegistry, MockRow};
//!
//! let browser = MockBrowser::new(download_dir);
//! browser
//!     .set_rows("1301", vec![MockRow::with_archive("Quarterly Report", b"zipbytes")])
//!     .await;
//!
//! let connector = MockConnector::new(browser);
//! let registry = MockRegistry::with_codes(vec!["1301"]);
//! ```

mod mock_browser;
mod mock_registry;

pub use mock_browser::{MockBrowser, MockConnector, MockRow};
pub use mock_registry::MockRegistry;
