//! Browser automation interface.
//!
//! The acquisition worker drives the disclosure portal through the
//! [`BrowserDriver`] trait; [`WebDriverSession`] is the concrete backend
//! speaking the W3C WebDriver protocol against a local chromedriver.
//! [`pacing`] holds the human-like pacing simulation.

mod pacing;
mod types;
mod webdriver;

pub use pacing::{Pacer, PacingConfig};
pub use types::{BrowserConnector, BrowserDriver, BrowserError, ElementHandle};
pub use webdriver::{WebDriverConnector, WebDriverSession};
