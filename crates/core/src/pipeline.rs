use crate::config::{AppConfig, DatabaseConfig};
use crate::persister::{ItemUpdate, Persister};
use crate::scanner::{ScanOptions, ScanReport, Scanner};
use crate::source::ContentSource;
use anyhow::{anyhow, Context};
use serde::Serialize;
use storage::classes::TABLE;
use storage::{connect, ClassLog};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Revisions and autosaves never touch the safelist.
    Revision,
    Unchanged { classes: Vec<String> },
    Updated { classes: Vec<String>, safelist: Vec<String> },
}

pub struct Pipeline {
    scanner: Scanner,
    options: ScanOptions,
    persister: Persister,
}

impl Pipeline {
    pub fn new(scanner: Scanner, options: ScanOptions, persister: Persister) -> Self {
        Self {
            scanner,
            options,
            persister,
        }
    }

    /// Builds the scanner from `[scan]`, file sinks from `[output]`, and the
    /// class log from `[database]` when configured and migrated.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let scanner = Scanner::from_config(&config.scan)?;
        let options = ScanOptions::from(&config.scan);
        let mut persister = Persister::from_output(&config.output);
        if let Some(db) = &config.database {
            if let Some(log) = open_log(db).await? {
                persister = persister.with_log(log);
            }
        }
        Ok(Self::new(scanner, options, persister))
    }

    pub fn options_mut(&mut self) -> &mut ScanOptions {
        &mut self.options
    }

    /// Full scan followed by a global save.
    pub async fn run_scan(&self, source: &dyn ContentSource) -> anyhow::Result<ScanReport> {
        info!("Starting scan...");
        let report = self.scanner.scan_all(source, &self.options)?;
        self.persister
            .save_all(&report.classes)
            .await
            .context("saving safelist")?;
        info!("Scan complete. {} unique classes.", report.classes.len());
        Ok(report)
    }

    /// Rescans one item and merges it into the safelist.
    pub async fn run_item_update(
        &self,
        source: &dyn ContentSource,
        content_id: u64,
    ) -> anyhow::Result<ItemOutcome> {
        let item = source
            .item(content_id)
            .ok_or_else(|| anyhow!("content item {} not found", content_id))?;
        if item.is_revision() {
            info!("item {} is a revision; skipping", content_id);
            return Ok(ItemOutcome::Revision);
        }
        let classes = self.scanner.scan_item(source, item);
        let outcome = match self.persister.save_item(content_id, &classes).await? {
            ItemUpdate::Unchanged => ItemOutcome::Unchanged { classes },
            ItemUpdate::Updated { safelist } => ItemOutcome::Updated { classes, safelist },
        };
        Ok(outcome)
    }
}

/// Connects to the configured database; `None` when the class table has not been created.
pub async fn open_log(db: &DatabaseConfig) -> anyhow::Result<Option<ClassLog>> {
    let pool = connect(&db.path).await.context("db connect")?;
    let log = ClassLog::open(pool).await?;
    if log.is_none() {
        warn!(
            "table {} missing in {}; run `safelist update-db` to create it",
            TABLE, db.path
        );
    }
    Ok(log)
}
