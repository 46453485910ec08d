//! Google Sheets API v4 client
//!
//! Covers the two calls the sync makes: `values.get` for the guest range and
//! `values.update` for link cells.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, ServiceAccountAuth, SpreadsheetService, check_status};
use crate::sync::GuestRow;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

/// Render a cell the way it reads in the sheet
fn cell_to_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// REST client for one spreadsheet
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    pub fn new(http: reqwest::Client, auth: Arc<ServiceAccountAuth>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            http,
            auth,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_BASE_URL,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        )
    }
}

#[async_trait]
impl SpreadsheetService for GoogleSheetsClient {
    async fn fetch_rows(&self, range: &str) -> Result<Vec<GuestRow>, ApiError> {
        let url = self.values_url(range);
        debug!("GET {}", url);

        let token = self.auth.access_token().await?;
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;

        let body: ValueRangeResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("values.get: {}", e)))?;

        Ok(body
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_text).collect())
            .collect())
    }

    async fn update_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), ApiError> {
        let url = self.values_url(range);
        debug!("PUT {} ({} rows)", url, values.len());

        let token = self.auth.access_token().await?;
        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values,
        };

        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}
