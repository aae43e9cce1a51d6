//! Human-like pacing for portal interactions.
//!
//! Randomized pauses and scroll simulation are a required behavioral
//! property of the acquisition step (automated-traffic mitigation), so all
//! delay ranges are explicit configuration knobs rather than inline
//! constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::debug;

use super::{BrowserDriver, BrowserError};

/// Selector used to pick hover targets for pointer drift.
const ANY_ELEMENT: &str = "*";

/// Pacing knobs. All ranges are inclusive; a zero maximum disables the
/// corresponding pause entirely (used by tests).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PacingConfig {
    /// Short pause between in-page interactions.
    #[serde(default = "default_pause_min")]
    pub pause_min_ms: u64,
    #[serde(default = "default_pause_max")]
    pub pause_max_ms: u64,
    /// Longer pause after a page load, while "reading".
    #[serde(default = "default_read_min")]
    pub read_pause_min_ms: u64,
    #[serde(default = "default_read_max")]
    pub read_pause_max_ms: u64,
    /// Pause between codes.
    #[serde(default = "default_code_min")]
    pub code_pause_min_ms: u64,
    #[serde(default = "default_code_max")]
    pub code_pause_max_ms: u64,
    /// Every Nth code gets the long pause instead.
    #[serde(default = "default_long_every")]
    pub long_pause_every: usize,
    #[serde(default = "default_long_min")]
    pub long_pause_min_ms: u64,
    #[serde(default = "default_long_max")]
    pub long_pause_max_ms: u64,
    /// Scroll simulation distance, in pixels.
    #[serde(default = "default_scroll_min")]
    pub scroll_min_px: u32,
    #[serde(default = "default_scroll_max")]
    pub scroll_max_px: u32,
    /// How many random pointer hovers to perform per page view.
    #[serde(default = "default_pointer_min")]
    pub pointer_moves_min: u32,
    #[serde(default = "default_pointer_max")]
    pub pointer_moves_max: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            pause_min_ms: default_pause_min(),
            pause_max_ms: default_pause_max(),
            read_pause_min_ms: default_read_min(),
            read_pause_max_ms: default_read_max(),
            code_pause_min_ms: default_code_min(),
            code_pause_max_ms: default_code_max(),
            long_pause_every: default_long_every(),
            long_pause_min_ms: default_long_min(),
            long_pause_max_ms: default_long_max(),
            scroll_min_px: default_scroll_min(),
            scroll_max_px: default_scroll_max(),
            pointer_moves_min: default_pointer_min(),
            pointer_moves_max: default_pointer_max(),
        }
    }
}

fn default_pause_min() -> u64 {
    800
}
fn default_pause_max() -> u64 {
    2000
}
fn default_read_min() -> u64 {
    3000
}
fn default_read_max() -> u64 {
    6000
}
fn default_code_min() -> u64 {
    4000
}
fn default_code_max() -> u64 {
    10_000
}
fn default_long_every() -> usize {
    10
}
fn default_long_min() -> u64 {
    30_000
}
fn default_long_max() -> u64 {
    60_000
}
fn default_scroll_min() -> u32 {
    100
}
fn default_scroll_max() -> u32 {
    800
}
fn default_pointer_min() -> u32 {
    1
}
fn default_pointer_max() -> u32 {
    2
}

impl PacingConfig {
    /// A configuration with every pause and scroll disabled.
    pub fn none() -> Self {
        Self {
            pause_min_ms: 0,
            pause_max_ms: 0,
            read_pause_min_ms: 0,
            read_pause_max_ms: 0,
            code_pause_min_ms: 0,
            code_pause_max_ms: 0,
            long_pause_every: default_long_every(),
            long_pause_min_ms: 0,
            long_pause_max_ms: 0,
            scroll_min_px: 0,
            scroll_max_px: 0,
            pointer_moves_min: 0,
            pointer_moves_max: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, min, max) in [
            ("pause", self.pause_min_ms, self.pause_max_ms),
            ("read_pause", self.read_pause_min_ms, self.read_pause_max_ms),
            ("code_pause", self.code_pause_min_ms, self.code_pause_max_ms),
            ("long_pause", self.long_pause_min_ms, self.long_pause_max_ms),
        ] {
            if min > max {
                return Err(format!("{name}_min_ms > {name}_max_ms"));
            }
        }
        if self.scroll_min_px > self.scroll_max_px {
            return Err("scroll_min_px > scroll_max_px".into());
        }
        if self.pointer_moves_min > self.pointer_moves_max {
            return Err("pointer_moves_min > pointer_moves_max".into());
        }
        if self.long_pause_every == 0 {
            return Err("long_pause_every must be > 0".into());
        }
        Ok(())
    }
}

/// Applies randomized pacing derived from a [`PacingConfig`].
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// Short pause between in-page interactions.
    pub async fn short_pause(&self) {
        Self::sleep_range(self.config.pause_min_ms, self.config.pause_max_ms).await;
    }

    /// Simulate reading a freshly loaded page: pause, scroll a random
    /// amount in a random direction, drift the pointer over a few random
    /// elements, pause again.
    pub async fn simulate_reading(&self, driver: &dyn BrowserDriver) -> Result<(), BrowserError> {
        Self::sleep_range(self.config.read_pause_min_ms, self.config.read_pause_max_ms).await;

        if self.config.scroll_max_px > 0 {
            // ThreadRng is not Send; draw everything before the awaits.
            let dy = {
                use rand::Rng;
                let mut rng = rand::rng();
                let distance =
                    rng.random_range(self.config.scroll_min_px..=self.config.scroll_max_px) as i64;
                if rng.random_bool(0.5) {
                    distance
                } else {
                    -distance
                }
            };
            driver.scroll_by(0, dy).await?;
        }

        if self.config.pointer_moves_max > 0 {
            let moves = {
                use rand::Rng;
                rand::rng()
                    .random_range(self.config.pointer_moves_min..=self.config.pointer_moves_max)
            };
            let elements = driver.find_elements(ANY_ELEMENT).await?;
            if !elements.is_empty() {
                for _ in 0..moves {
                    let idx = {
                        use rand::Rng;
                        rand::rng().random_range(0..elements.len())
                    };
                    driver.hover(&elements[idx]).await?;
                    self.short_pause().await;
                }
            }
        }

        self.short_pause().await;
        Ok(())
    }

    /// Inter-code pacing: a short randomized pause after most codes, a
    /// longer one after every `long_pause_every`th code (0-based `index`).
    pub async fn between_codes(&self, index: usize) {
        if (index + 1) % self.config.long_pause_every == 0 {
            debug!("Taking a longer pause between codes");
            Self::sleep_range(self.config.long_pause_min_ms, self.config.long_pause_max_ms).await;
        } else {
            Self::sleep_range(self.config.code_pause_min_ms, self.config.code_pause_max_ms).await;
        }
    }

    async fn sleep_range(min_ms: u64, max_ms: u64) {
        if max_ms == 0 {
            return;
        }
        let ms = {
            use rand::Rng;
            rand::rng().random_range(min_ms..=max_ms)
        };
        sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PacingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_none_config_is_valid() {
        assert!(PacingConfig::none().validate().is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = PacingConfig {
            pause_min_ms: 100,
            pause_max_ms: 10,
            ..PacingConfig::none()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_pointer_range_rejected() {
        let config = PacingConfig {
            pointer_moves_min: 3,
            pointer_moves_max: 1,
            ..PacingConfig::none()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_reading_simulation_drifts_the_pointer() {
        let config = PacingConfig {
            scroll_min_px: 10,
            scroll_max_px: 10,
            pointer_moves_min: 2,
            pointer_moves_max: 2,
            ..PacingConfig::none()
        };
        let browser = crate::testing::MockBrowser::new("/tmp");

        Pacer::new(config).simulate_reading(&browser).await.unwrap();

        assert_eq!(browser.pointer_moves().await, 2);
    }

    #[tokio::test]
    async fn test_zero_pointer_moves_skips_hovering() {
        let browser = crate::testing::MockBrowser::new("/tmp");

        let pacer = Pacer::new(PacingConfig::none());
        pacer.simulate_reading(&browser).await.unwrap();

        assert_eq!(browser.pointer_moves().await, 0);
    }

    #[tokio::test]
    async fn test_disabled_pauses_return_immediately() {
        let pacer = Pacer::new(PacingConfig::none());
        let start = std::time::Instant::now();
        pacer.short_pause().await;
        pacer.between_codes(0).await;
        pacer.between_codes(9).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
