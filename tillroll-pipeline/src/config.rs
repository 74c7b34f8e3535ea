//! Pipeline configuration
//!
//! All knobs can be overridden through environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | TILLROLL_PAPER_WIDTH | 32 | Characters per line (32 = 58mm roll) |
//! | TILLROLL_SETTLE_DELAY_MS | 1000 | Delay between load-complete and print |
//! | TILLROLL_LOAD_TIMEOUT_MS | 5000 | Hard cap on waiting for content load |
//! | TILLROLL_VIEWER_GRACE_SECS | 30 | Temp PDF lifetime for the external viewer |
//! | TILLROLL_CURRENCY_PREFIX | Rp | Currency symbol on amounts |

use crate::render::CurrencyFormat;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Characters per line; 32 for 58mm paper, 48 for 80mm
    pub paper_width: usize,
    /// Rendering engines can report load-complete before paint settles
    pub settle_delay_ms: u64,
    /// Print is forced after this, even without a load signal
    pub load_timeout_ms: u64,
    /// How long an external-viewer temp file outlives the request
    pub viewer_grace_secs: u64,
    pub currency_prefix: String,
    pub thousands_separator: char,
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable
    pub fn from_env() -> Self {
        Self {
            paper_width: std::env::var("TILLROLL_PAPER_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(32),
            settle_delay_ms: std::env::var("TILLROLL_SETTLE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            load_timeout_ms: std::env::var("TILLROLL_LOAD_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            viewer_grace_secs: std::env::var("TILLROLL_VIEWER_GRACE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            currency_prefix: std::env::var("TILLROLL_CURRENCY_PREFIX")
                .unwrap_or_else(|_| "Rp".into()),
            thousands_separator: '.',
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn viewer_grace(&self) -> Duration {
        Duration::from_secs(self.viewer_grace_secs)
    }

    pub fn currency(&self) -> CurrencyFormat {
        CurrencyFormat {
            prefix: self.currency_prefix.clone(),
            thousands_separator: self.thousands_separator,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
