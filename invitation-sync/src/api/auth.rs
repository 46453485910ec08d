//! Service account authentication
//!
//! Exchanges a signed JWT for an OAuth2 access token (the JWT bearer grant
//! Google uses for service accounts) and caches it until shortly before it
//! expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

use super::{ApiError, check_status};

/// Scopes needed to read/write the sheet and write the realtime database
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/firebase.database",
    "https://www.googleapis.com/auth/userinfo.email",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion; Google caps it at one hour
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they actually expire
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The JSON key file downloaded for a service account
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Read a key file from disk
    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::Auth(format!("cannot read credentials {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ApiError::Auth(format!("invalid credentials {}: {}", path.display(), e))
        })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

/// Hands out access tokens for a service account
#[derive(Debug)]
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    scopes: Vec<String>,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            http,
            cached: Mutex::new(None),
        }
    }

    /// Service account email, handy for "share the sheet with ..." messages
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Sign the JWT assertion sent to the token endpoint
    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, ApiError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: self.scopes.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| ApiError::Auth(format!("invalid private key: {}", e)))?;

        jsonwebtoken::encode(&header, &claims, &encoding_key)
            .map_err(|e| ApiError::Auth(format!("cannot sign assertion: {}", e)))
    }

    /// Return a valid access token, exchanging a new assertion when needed
    pub async fn access_token(&self) -> Result<String, ApiError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        debug!("Requesting access token for {}", self.key.client_email);

        let assertion = self.sign_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let body: TokenResponse = check_status(response)
            .await
            .map_err(|e| ApiError::Auth(format!("token exchange rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("token response: {}", e)))?;

        let token = CachedToken {
            value: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS)),
        };
        let value = token.value.clone();
        *cached = Some(token);

        Ok(value)
    }
}
