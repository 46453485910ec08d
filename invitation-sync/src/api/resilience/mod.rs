//! Concurrency limiting for outbound API calls
//!
//! Per-row link writes fan out through a [`ConcurrencyLimiter`] so the number
//! of in-flight Sheets requests stays bounded.

pub mod concurrency;
pub mod config;

pub use concurrency::ConcurrencyLimiter;
pub use config::ConcurrencyConfig;
