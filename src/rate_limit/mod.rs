//! Rate limiting module
//!
//! Global admission control in front of the generation backend. Admissions are
//! logged in a trailing window and counted exactly on every check:
//!
//! - **Global**: one budget shared by all clients, every request weighs the same
//! - **Exact**: stale entries are pruned before counting, no approximation
//! - **Hard cutoff**: no queueing or smoothing, over-limit requests are rejected
//!
//! # Example
//!
//! ```rust
//! use genai_gateway::rate_limit::RateLimiter;
//! use std::time::{Duration, Instant};
//!
//! let limiter = RateLimiter::new(2, Duration::from_secs(60));
//! let now = Instant::now();
//!
//! assert!(limiter.try_admit(now));
//! assert!(limiter.try_admit(now));
//! assert!(!limiter.try_admit(now));
//! assert!(limiter.try_admit(now + Duration::from_secs(60)));
//! ```

pub mod middleware;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use middleware::{add_rate_limit_headers, rate_limit_middleware};
pub use types::{RateLimitConfig, RateLimitResult, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS};
pub use window::RateLimiter;
