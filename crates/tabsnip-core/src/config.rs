//! Runtime tuning knobs, loadable from a TOML config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_reply_timeout_ms() -> u64 {
    100
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    100
}

/// How the launcher retries a tab that has no overlay listener yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra forward attempts after injecting the overlay
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,
    /// Fixed delay before each retry, in milliseconds, giving the freshly
    /// injected listener time to register
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Tunable timings for the capture runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// How long a forwarded command may wait for an ack before the tab
    /// counts as having no listener, in milliseconds
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
    /// Retry behavior after injecting the overlay script
    #[serde(default)]
    pub inject_retry: RetryPolicy,
}

impl RuntimeConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: default_reply_timeout_ms(),
            inject_retry: RetryPolicy::default(),
        }
    }
}
