//! Google Sheets and Firebase Realtime Database clients
//!
//! Both services are reached through small traits so the sync pipeline can be
//! driven by any implementation. The production clients talk REST over
//! `reqwest` and share one service account token provider.

pub mod auth;
pub mod database;
pub mod range;
pub mod resilience;
pub mod sheets;

pub use auth::{ServiceAccountAuth, ServiceAccountKey};
pub use database::RealtimeDatabaseClient;
pub use range::ColumnRef;
pub use resilience::{ConcurrencyConfig, ConcurrencyLimiter};
pub use sheets::GoogleSheetsClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::sync::GuestRow;

/// Source spreadsheet: reads the guest range and accepts link cell writes
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Fetch every row of an A1 range as text cells
    async fn fetch_rows(&self, range: &str) -> Result<Vec<GuestRow>, ApiError>;

    /// Overwrite `range` with `values` (row major), values are written raw
    async fn update_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), ApiError>;
}

/// Hierarchical document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace whatever lives at `path` with `value`
    async fn set(&self, path: &str, value: &Value) -> Result<(), ApiError>;
}

/// Errors from the remote services
#[derive(Debug)]
pub enum ApiError {
    /// Transport level failure
    Http(reqwest::Error),
    /// Remote answered with a non-success status
    Status { status: u16, body: String },
    /// Service account or token exchange problem
    Auth(String),
    /// Response body did not have the expected shape
    InvalidResponse(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "HTTP: {}", e),
            ApiError::Status { status, body } => write!(f, "API error {}: {}", status, body),
            ApiError::Auth(msg) => write!(f, "authentication failed: {}", msg),
            ApiError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Http(e)
    }
}

/// Turn a non-success response into [`ApiError::Status`]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}
