//! Environment-driven configuration
//!
//! Every setting comes from the process environment, optionally seeded from a
//! dotenv file. Values are validated up front so a bad variable fails the run
//! before any remote call is made.

use log::debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{ColumnRef, range};
use crate::sync::{LinkSettings, LinkWriteMode, PublishPaths};

pub const DEFAULT_LINK_CONCURRENCY: usize = 8;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration problems, all fatal at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is unset or blank
    Missing(&'static str),
    /// Variable is set but unusable
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    /// The dotenv file could not be loaded
    EnvFile { path: PathBuf, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "environment variable {} is not set", var),
            ConfigError::Invalid { var, value, reason } => {
                write!(f, "environment variable {}={:?} is invalid: {}", var, value, reason)
            }
            ConfigError::EnvFile { path, message } => {
                write!(f, "cannot load env file {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything one sync run needs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub credentials_path: PathBuf,
    pub sheet_id: String,
    pub sheet_range: String,
    /// Sheet row number of the first row in `sheet_range`
    pub data_start_row: usize,
    /// Present when link regeneration is enabled
    pub links: Option<LinkSettings>,
    pub link_concurrency: usize,
    pub detail_file: PathBuf,
    pub paths: PublishPaths,
    pub http_timeout: Duration,
}

/// Load a dotenv file into the process environment.
///
/// With no explicit path a missing `./.env` is fine; a malformed one is not.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|_| debug!("Loaded environment from {}", path.display()))
            .map_err(|e| ConfigError::EnvFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        None => match dotenvy::dotenv() {
            Ok(path) => {
                debug!("Loaded environment from {}", path.display());
                Ok(())
            }
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                message: e.to_string(),
            }),
        },
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env(force_links: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), force_links)
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, force_links: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());
        let required = |var: &'static str| optional(var).ok_or(ConfigError::Missing(var));

        let parse_number = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match optional(var) {
                None => Ok(default),
                Some(value) => value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    var,
                    value,
                    reason: e.to_string(),
                }),
            }
        };

        let database_url = required("FIREBASE_DB_URL")?;
        let credentials_path = PathBuf::from(required("GOOGLE_APPLICATION_CREDENTIALS")?);
        let sheet_id = required("SHEET_ID")?;
        let sheet_range = required("SHEET_RANGE")?;
        let detail_file = PathBuf::from(required("DETAIL_FILE_URL")?);

        let data_start_row = match optional("SHEET_DATA_START_ROW") {
            Some(_) => {
                let row = parse_number("SHEET_DATA_START_ROW", 1)?;
                if row == 0 {
                    return Err(ConfigError::Invalid {
                        var: "SHEET_DATA_START_ROW",
                        value: row.to_string(),
                        reason: "sheet rows start at 1".to_string(),
                    });
                }
                row as usize
            }
            None => range::start_row(&sheet_range).unwrap_or(1),
        };

        let regenerate = force_links || optional("REGENERATE_LINK").is_some_and(|v| is_truthy(&v));
        let links = if regenerate {
            let base_url = required("INVITATION_BASE_URL")?;
            let raw_column = required("LINK_SHEET_COL")?;
            let column = ColumnRef::parse(&raw_column).ok_or_else(|| ConfigError::Invalid {
                var: "LINK_SHEET_COL",
                value: raw_column.clone(),
                reason: "expected a column such as Guests!G".to_string(),
            })?;
            let mode = match optional("LINK_WRITE_MODE") {
                None => LinkWriteMode::default(),
                Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                    var: "LINK_WRITE_MODE",
                    value,
                    reason,
                })?,
            };
            Some(LinkSettings {
                base_url,
                column,
                mode,
            })
        } else {
            None
        };

        let link_concurrency =
            parse_number("LINK_CONCURRENCY", DEFAULT_LINK_CONCURRENCY as u64)? as usize;
        if link_concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "LINK_CONCURRENCY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let defaults = PublishPaths::default();
        let paths = PublishPaths {
            guests: optional("GUEST_PATH").unwrap_or(defaults.guests),
            details: optional("DETAIL_PATH").unwrap_or(defaults.details),
        };

        let timeout_secs = parse_number("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "HTTP_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let http_timeout = Duration::from_secs(timeout_secs);

        Ok(Self {
            database_url,
            credentials_path,
            sheet_id,
            sheet_range,
            data_start_row,
            links,
            link_concurrency,
            detail_file,
            paths,
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("FIREBASE_DB_URL", "https://wedding-default-rtdb.firebaseio.com"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/secrets/sa.json"),
            ("SHEET_ID", "1AbCdEf"),
            ("SHEET_RANGE", "Guests!A2:F"),
            ("DETAIL_FILE_URL", "detail.json"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>, force_links: bool) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env.get(name).map(|v| v.to_string()), force_links)
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = load(&base_env(), false).unwrap();

        assert_eq!(config.sheet_id, "1AbCdEf");
        assert_eq!(config.data_start_row, 2);
        assert!(config.links.is_none());
        assert_eq!(config.link_concurrency, DEFAULT_LINK_CONCURRENCY);
        assert_eq!(config.paths, PublishPaths::default());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_required_variable() {
        let mut env = base_env();
        env.remove("SHEET_ID");
        assert_eq!(load(&env, false).unwrap_err(), ConfigError::Missing("SHEET_ID"));

        let mut env = base_env();
        env.insert("FIREBASE_DB_URL", "   ");
        assert_eq!(load(&env, false).unwrap_err(), ConfigError::Missing("FIREBASE_DB_URL"));
    }

    #[test]
    fn test_link_regeneration_requires_settings() {
        let mut env = base_env();
        env.insert("REGENERATE_LINK", "1");
        assert_eq!(
            load(&env, false).unwrap_err(),
            ConfigError::Missing("INVITATION_BASE_URL")
        );

        env.insert("INVITATION_BASE_URL", "https://x.test");
        env.insert("LINK_SHEET_COL", "Guests!G");
        let config = load(&env, false).unwrap();
        let links = config.links.unwrap();
        assert_eq!(links.base_url, "https://x.test");
        assert_eq!(links.column.cell(2), "Guests!G2");
        assert_eq!(links.mode, LinkWriteMode::Batch);
    }

    #[test]
    fn test_regenerate_flag_values() {
        let mut env = base_env();
        env.insert("INVITATION_BASE_URL", "https://x.test");
        env.insert("LINK_SHEET_COL", "G");

        env.insert("REGENERATE_LINK", "0");
        assert!(load(&env, false).unwrap().links.is_none());
        assert!(load(&env, true).unwrap().links.is_some());

        env.insert("REGENERATE_LINK", "true");
        assert!(load(&env, false).unwrap().links.is_some());
    }

    #[test]
    fn test_invalid_values() {
        let mut env = base_env();
        env.insert("LINK_CONCURRENCY", "many");
        assert!(matches!(
            load(&env, false).unwrap_err(),
            ConfigError::Invalid { var: "LINK_CONCURRENCY", .. }
        ));

        let mut env = base_env();
        env.insert("LINK_CONCURRENCY", "0");
        assert!(matches!(
            load(&env, false).unwrap_err(),
            ConfigError::Invalid { var: "LINK_CONCURRENCY", .. }
        ));

        let mut env = base_env();
        env.insert("HTTP_TIMEOUT_SECS", "0");
        assert!(matches!(
            load(&env, false).unwrap_err(),
            ConfigError::Invalid { var: "HTTP_TIMEOUT_SECS", .. }
        ));

        let mut env = base_env();
        env.insert("HTTP_TIMEOUT_SECS", "5");
        assert_eq!(load(&env, false).unwrap().http_timeout, Duration::from_secs(5));

        let mut env = base_env();
        env.insert("REGENERATE_LINK", "1");
        env.insert("INVITATION_BASE_URL", "https://x.test");
        env.insert("LINK_SHEET_COL", "Guests!G2");
        assert!(matches!(
            load(&env, false).unwrap_err(),
            ConfigError::Invalid { var: "LINK_SHEET_COL", .. }
        ));

        env.insert("LINK_SHEET_COL", "Guests!G");
        env.insert("LINK_WRITE_MODE", "parallel");
        assert!(matches!(
            load(&env, false).unwrap_err(),
            ConfigError::Invalid { var: "LINK_WRITE_MODE", .. }
        ));
    }

    #[test]
    fn test_start_row_override_and_fallback() {
        let mut env = base_env();
        env.insert("SHEET_DATA_START_ROW", "4");
        assert_eq!(load(&env, false).unwrap().data_start_row, 4);

        let mut env = base_env();
        env.insert("SHEET_RANGE", "Guests!A:F");
        assert_eq!(load(&env, false).unwrap().data_start_row, 1);

        let mut env = base_env();
        env.insert("SHEET_DATA_START_ROW", "0");
        assert!(load(&env, false).is_err());
    }

    #[test]
    fn test_custom_paths() {
        let mut env = base_env();
        env.insert("GUEST_PATH", "wedding/guests");
        env.insert("DETAIL_PATH", "invitation/detail");
        let config = load(&env, false).unwrap();
        assert_eq!(config.paths.guests, "wedding/guests");
        assert_eq!(config.paths.details, "invitation/detail");
    }

    #[test]
    fn test_explicit_env_file_missing() {
        let err = load_env_file(Some(Path::new("/nonexistent/.env"))).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }
}
