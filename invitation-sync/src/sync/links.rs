//! Invitation link regeneration
//!
//! Writes `base_url/key` next to every guest in the source sheet. Failures
//! are collected into a [`LinkReport`] and never abort the sync.

use futures::future::join_all;
use log::{debug, info, warn};
use std::str::FromStr;
use std::sync::Arc;

use super::invitation::BuiltInvitations;
use crate::api::{ColumnRef, ConcurrencyLimiter, SpreadsheetService};

/// Build the personalized invitation link for a guest key
pub fn invitation_link(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}

/// How link cells are written back to the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkWriteMode {
    /// One update covering the whole link column
    #[default]
    Batch,
    /// One update per guest row
    PerRow,
}

impl FromStr for LinkWriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(LinkWriteMode::Batch),
            "per-row" | "per_row" | "row" => Ok(LinkWriteMode::PerRow),
            other => Err(format!("unknown link write mode '{}' (expected batch or per-row)", other)),
        }
    }
}

impl std::fmt::Display for LinkWriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkWriteMode::Batch => write!(f, "batch"),
            LinkWriteMode::PerRow => write!(f, "per-row"),
        }
    }
}

/// A link write that did not go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFailure {
    /// A1 range that was being written
    pub range: String,
    /// Number of link cells in that range
    pub rows: usize,
    pub message: String,
}

/// Outcome of a link regeneration pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Link cells we tried to write
    pub attempted: usize,
    /// Link cells confirmed written
    pub written: usize,
    pub failures: Vec<LinkFailure>,
}

impl LinkReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.written == self.attempted
    }
}

/// Settings for link regeneration
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub base_url: String,
    pub column: ColumnRef,
    pub mode: LinkWriteMode,
}

/// Writes invitation links back into the spreadsheet
pub struct LinkUpdater {
    sheets: Arc<dyn SpreadsheetService>,
    settings: LinkSettings,
    limiter: ConcurrencyLimiter,
}

impl LinkUpdater {
    pub fn new(
        sheets: Arc<dyn SpreadsheetService>,
        settings: LinkSettings,
        limiter: ConcurrencyLimiter,
    ) -> Self {
        Self {
            sheets,
            settings,
            limiter,
        }
    }

    /// Write links for every built invitation and wait for all writes
    pub async fn regenerate(&self, built: &BuiltInvitations) -> LinkReport {
        if built.invitations.is_empty() {
            return LinkReport::default();
        }

        let report = match self.settings.mode {
            LinkWriteMode::Batch => self.write_batch(built).await,
            LinkWriteMode::PerRow => self.write_per_row(built).await,
        };

        for failure in &report.failures {
            warn!(
                "Failed to write invitation link(s) at {}: {}",
                failure.range, failure.message
            );
        }
        info!(
            "Invitation links written: {}/{} ({} mode)",
            report.written, report.attempted, self.settings.mode
        );

        report
    }

    async fn write_batch(&self, built: &BuiltInvitations) -> LinkReport {
        let count = built.invitations.len();
        let range = self
            .settings
            .column
            .span(built.sheet_row(0), built.sheet_row(count - 1));

        let values = built
            .invitations
            .iter()
            .map(|inv| vec![invitation_link(&self.settings.base_url, &inv.key)])
            .collect::<Vec<_>>();

        debug!("Writing {} links to {}", count, range);

        match self.sheets.update_values(&range, values).await {
            Ok(()) => LinkReport {
                attempted: count,
                written: count,
                failures: Vec::new(),
            },
            Err(e) => LinkReport {
                attempted: count,
                written: 0,
                failures: vec![LinkFailure {
                    range,
                    rows: count,
                    message: e.to_string(),
                }],
            },
        }
    }

    async fn write_per_row(&self, built: &BuiltInvitations) -> LinkReport {
        let writes = built.invitations.iter().enumerate().map(|(index, inv)| {
            let range = self.settings.column.cell(built.sheet_row(index));
            let link = invitation_link(&self.settings.base_url, &inv.key);
            async move {
                let _permit = self.limiter.acquire().await;
                debug!("{} -> {}", range, link);
                let result = self.sheets.update_values(&range, vec![vec![link]]).await;
                (range, result)
            }
        });

        let results = join_all(writes).await;

        let mut report = LinkReport {
            attempted: results.len(),
            ..Default::default()
        };
        for (range, result) in results {
            match result {
                Ok(()) => report.written += 1,
                Err(e) => report.failures.push(LinkFailure {
                    range,
                    rows: 1,
                    message: e.to_string(),
                }),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ConcurrencyConfig};
    use crate::sync::{ColumnLayout, GuestRow, build_invitations};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records link writes, optionally failing some ranges
    #[derive(Default)]
    struct RecordingSheets {
        writes: Mutex<Vec<(String, Vec<Vec<String>>)>>,
        fail_ranges: Vec<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl SpreadsheetService for RecordingSheets {
        async fn fetch_rows(&self, _range: &str) -> Result<Vec<GuestRow>, ApiError> {
            Ok(Vec::new())
        }

        async fn update_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), ApiError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_ranges.iter().any(|r| r == range) {
                return Err(ApiError::Status {
                    status: 429,
                    body: "quota exceeded".to_string(),
                });
            }
            self.writes.lock().unwrap().push((range.to_string(), values));
            Ok(())
        }
    }

    fn built(names: &[&str]) -> BuiltInvitations {
        let rows: Vec<GuestRow> = names
            .iter()
            .map(|n| vec![n.to_string(), "x".into(), "1".into(), "1".into(), "F".into()])
            .collect();
        build_invitations(&rows, &ColumnLayout::default(), 2).unwrap()
    }

    fn settings(mode: LinkWriteMode) -> LinkSettings {
        LinkSettings {
            base_url: "https://x.test".to_string(),
            column: ColumnRef::parse("Guests!G").unwrap(),
            mode,
        }
    }

    #[test]
    fn test_invitation_link() {
        assert_eq!(invitation_link("https://x.test", "jane-doe"), "https://x.test/jane-doe");
        assert_eq!(invitation_link("https://x.test/", "jane-doe"), "https://x.test/jane-doe");
    }

    #[test]
    fn test_link_write_mode_parsing() {
        assert_eq!("batch".parse::<LinkWriteMode>(), Ok(LinkWriteMode::Batch));
        assert_eq!("Per-Row".parse::<LinkWriteMode>(), Ok(LinkWriteMode::PerRow));
        assert!("sometimes".parse::<LinkWriteMode>().is_err());
    }

    #[tokio::test]
    async fn test_batch_mode_single_call() {
        let sheets = Arc::new(RecordingSheets::default());
        let updater = LinkUpdater::new(
            sheets.clone(),
            settings(LinkWriteMode::Batch),
            ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(8)),
        );

        let report = updater.regenerate(&built(&["Jane Doe", "John Roe"])).await;

        assert!(report.is_complete());
        assert_eq!(report.written, 2);

        let writes = sheets.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "Guests!G2:G3");
        assert_eq!(
            writes[0].1,
            vec![
                vec!["https://x.test/jane-doe".to_string()],
                vec!["https://x.test/john-roe".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_batch_failure_is_reported_not_raised() {
        let sheets = Arc::new(RecordingSheets {
            fail_ranges: vec!["Guests!G2:G3".to_string()],
            ..Default::default()
        });
        let updater = LinkUpdater::new(
            sheets,
            settings(LinkWriteMode::Batch),
            ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(8)),
        );

        let report = updater.regenerate(&built(&["Jane Doe", "John Roe"])).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.written, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].rows, 2);
        assert!(report.failures[0].message.contains("429"));
    }

    #[tokio::test]
    async fn test_per_row_mode_aggregates_failures() {
        let sheets = Arc::new(RecordingSheets {
            fail_ranges: vec!["Guests!G3".to_string()],
            ..Default::default()
        });
        let updater = LinkUpdater::new(
            sheets.clone(),
            settings(LinkWriteMode::PerRow),
            ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(2)),
        );

        let report = updater.regenerate(&built(&["A", "B", "C"])).await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.written, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].range, "Guests!G3");
        assert!(!report.is_complete());

        let mut ranges: Vec<String> = sheets
            .writes
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.clone())
            .collect();
        ranges.sort();
        assert_eq!(ranges, vec!["Guests!G2", "Guests!G4"]);
    }

    #[tokio::test]
    async fn test_per_row_mode_respects_cap() {
        let sheets = Arc::new(RecordingSheets::default());
        let updater = LinkUpdater::new(
            sheets.clone(),
            settings(LinkWriteMode::PerRow),
            ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(2)),
        );

        let names: Vec<String> = (0..10).map(|i| format!("Guest {}", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let report = updater.regenerate(&built(&names)).await;

        assert!(report.is_complete());
        assert_eq!(report.written, 10);
        assert!(sheets.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_no_rows_no_calls() {
        let sheets = Arc::new(RecordingSheets::default());
        let updater = LinkUpdater::new(
            sheets.clone(),
            settings(LinkWriteMode::Batch),
            ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(8)),
        );

        let report = updater.regenerate(&BuiltInvitations::default()).await;
        assert_eq!(report, LinkReport::default());
        assert!(sheets.writes.lock().unwrap().is_empty());
    }
}
