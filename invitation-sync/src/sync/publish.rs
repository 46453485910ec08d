//! Publishing to the document store
//!
//! Both writes are full replacements of their target path.

use anyhow::{Context, Result};
use log::info;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::invitation::InvitationMap;
use crate::api::DocumentStore;

/// Target paths inside the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPaths {
    pub guests: String,
    pub details: String,
}

impl Default for PublishPaths {
    fn default() -> Self {
        Self {
            guests: "invitation/guest".to_string(),
            details: "invitation/digital".to_string(),
        }
    }
}

/// Read and parse the static details document
pub fn load_detail_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read details file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Details file is not valid JSON: {}", path.display()))
}

/// Writes the guest map and details document
pub struct Publisher {
    store: Arc<dyn DocumentStore>,
    paths: PublishPaths,
}

impl Publisher {
    pub fn new(store: Arc<dyn DocumentStore>, paths: PublishPaths) -> Self {
        Self { store, paths }
    }

    /// Replace the guest map at the guest path
    pub async fn publish_guests(&self, map: &InvitationMap) -> Result<()> {
        let payload = serde_json::to_value(map).context("Failed to serialize guest map")?;

        self.store
            .set(&self.paths.guests, &payload)
            .await
            .with_context(|| format!("Failed to write guests to '{}'", self.paths.guests))?;

        info!("Published {} guests to '{}'", map.len(), self.paths.guests);
        Ok(())
    }

    /// Load the details file and replace the details path with it
    pub async fn publish_details(&self, file: &Path) -> Result<()> {
        let document = load_detail_document(file)?;

        self.store
            .set(&self.paths.details, &document)
            .await
            .with_context(|| format!("Failed to write details to '{}'", self.paths.details))?;

        info!(
            "Published details from {} to '{}'",
            file.display(),
            self.paths.details
        );
        Ok(())
    }
}
