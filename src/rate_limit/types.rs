use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of admissions allowed inside one window
pub const DEFAULT_MAX_REQUESTS: u32 = 300;

/// Default trailing window length in seconds
pub const DEFAULT_WINDOW_SECS: u64 = 300;

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Enable admission control
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum number of requests admitted inside the window
    #[serde(default = "default_requests")]
    pub requests: u32,
    /// Length of the trailing window (in seconds)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            requests: default_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limit result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Remaining admissions in the current window
    pub remaining: u32,
    /// Total limit
    pub limit: u32,
    /// Seconds until the oldest in-window admission expires
    pub reset_after: u64,
    /// Retry after duration (for 429 responses)
    pub retry_after: Option<u64>,
}

impl RateLimitResult {
    /// Create an allowed result
    pub fn allowed(remaining: u32, limit: u32, reset_after: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            limit,
            reset_after,
            retry_after: None,
        }
    }

    /// Create a denied result
    pub fn denied(limit: u32, retry_after: u64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            limit,
            reset_after: retry_after,
            retry_after: Some(retry_after),
        }
    }
}
