//! One sync run: fetch rows, build invitations, write links, publish

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use super::invitation::{ColumnLayout, InvitationMap, build_invitations};
use super::links::{LinkReport, LinkSettings, LinkUpdater};
use super::publish::{PublishPaths, Publisher};
use crate::api::{ConcurrencyConfig, ConcurrencyLimiter, DocumentStore, SpreadsheetService};
use crate::config::Config;

/// What to sync and where to put it
#[derive(Debug, Clone)]
pub struct SyncJob {
    pub sheet_range: String,
    pub data_start_row: usize,
    pub layout: ColumnLayout,
    pub links: Option<LinkSettings>,
    pub link_concurrency: usize,
    pub detail_file: PathBuf,
    pub paths: PublishPaths,
    /// Build everything but skip link and store writes
    pub dry_run: bool,
}

impl SyncJob {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            sheet_range: config.sheet_range.clone(),
            data_start_row: config.data_start_row,
            layout: ColumnLayout::default(),
            links: config.links.clone(),
            link_concurrency: config.link_concurrency,
            detail_file: config.detail_file.clone(),
            paths: config.paths.clone(),
            dry_run,
        }
    }
}

/// What a run did
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// Rows read from the sheet
    pub rows: usize,
    /// The map that was (or in a dry run would have been) published
    pub map: InvitationMap,
    /// None when link regeneration was off or skipped
    pub links: Option<LinkReport>,
    pub published: bool,
}

impl SyncSummary {
    /// Rows whose key was taken over by a later row
    pub fn overwritten(&self) -> usize {
        self.rows.saturating_sub(self.map.len())
    }
}

/// Execute a sync job against the given services
pub async fn run_sync(
    job: &SyncJob,
    sheets: Arc<dyn SpreadsheetService>,
    store: Arc<dyn DocumentStore>,
) -> Result<SyncSummary> {
    let rows = sheets
        .fetch_rows(&job.sheet_range)
        .await
        .with_context(|| format!("Failed to read sheet range '{}'", job.sheet_range))?;
    info!("Fetched {} rows from '{}'", rows.len(), job.sheet_range);

    let built = build_invitations(&rows, &job.layout, job.data_start_row)
        .context("Guest sheet has an invalid row")?;

    let links = match (&job.links, job.dry_run) {
        (Some(settings), false) => {
            let limiter =
                ConcurrencyLimiter::new(ConcurrencyConfig::with_limit(job.link_concurrency));
            let updater = LinkUpdater::new(sheets.clone(), settings.clone(), limiter);
            Some(updater.regenerate(&built).await)
        }
        (Some(_), true) => {
            info!("Dry run: skipping invitation link regeneration");
            None
        }
        (None, _) => None,
    };

    let map = built.into_map();
    info!("Built {} invitations from {} rows", map.len(), rows.len());

    if job.dry_run {
        info!("Dry run: nothing published");
        return Ok(SyncSummary {
            rows: rows.len(),
            map,
            links,
            published: false,
        });
    }

    let publisher = Publisher::new(store, job.paths.clone());
    publisher.publish_guests(&map).await?;
    publisher.publish_details(&job.detail_file).await?;

    Ok(SyncSummary {
        rows: rows.len(),
        map,
        links,
        published: true,
    })
}
