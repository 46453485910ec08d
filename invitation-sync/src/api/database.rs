//! Firebase Realtime Database REST client

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, DocumentStore, ServiceAccountAuth, check_status};

/// Writes JSON documents into a realtime database
#[derive(Debug, Clone)]
pub struct RealtimeDatabaseClient {
    http: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    database_url: String,
}

impl RealtimeDatabaseClient {
    pub fn new(http: reqwest::Client, auth: Arc<ServiceAccountAuth>, database_url: impl Into<String>) -> Self {
        Self {
            http,
            auth,
            database_url: database_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// REST endpoint for a database path, e.g. `invitation/guest` →
    /// `https://db.firebaseio.com/invitation/guest.json`
    pub fn path_url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{}/.json", self.database_url)
        } else {
            format!("{}/{}.json", self.database_url, path)
        }
    }
}

#[async_trait]
impl DocumentStore for RealtimeDatabaseClient {
    async fn set(&self, path: &str, value: &Value) -> Result<(), ApiError> {
        let url = self.path_url(path);
        debug!("PUT {}", url);

        let token = self.auth.access_token().await?;
        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .query(&[("print", "silent")])
            .json(value)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}
