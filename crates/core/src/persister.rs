//! Writes the safelist: file outputs through [`SafelistSink`] and the
//! per-content class log through [`TokenLog`]. The two are independent; a
//! failure in one does not undo the other.

use crate::config::OutputConfig;
use anyhow::{bail, Context};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use storage::classes::GLOBAL_POST_ID;
use storage::ClassLog;
use tracing::{debug, info};

pub const MARKUP_HEADER: &str = "<!-- Auto-generated by safelist. Do not edit. -->";

/// A file the CSS build reads the safelist from.
pub trait SafelistSink: Send + Sync {
    fn path(&self) -> &Path;
    fn write(&self, classes: &[String]) -> anyhow::Result<()>;
}

/// Class rows keyed by owning content id (0 for full scans).
#[async_trait]
pub trait TokenLog: Send + Sync {
    /// Replaces everything with `classes` under the global id.
    async fn replace_all(&self, classes: &[String]) -> anyhow::Result<()>;
    async fn replace_for(&self, content_id: u64, classes: &[String]) -> anyhow::Result<()>;
    async fn classes_for(&self, content_id: u64) -> anyhow::Result<Vec<String>>;
    async fn distinct_classes(&self) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
impl TokenLog for ClassLog {
    async fn replace_all(&self, classes: &[String]) -> anyhow::Result<()> {
        ClassLog::replace_all(self, classes).await
    }

    async fn replace_for(&self, content_id: u64, classes: &[String]) -> anyhow::Result<()> {
        ClassLog::replace_for(self, content_id, classes).await
    }

    async fn classes_for(&self, content_id: u64) -> anyhow::Result<Vec<String>> {
        ClassLog::classes_for(self, content_id).await
    }

    async fn distinct_classes(&self) -> anyhow::Result<Vec<String>> {
        ClassLog::distinct_classes(self).await
    }
}

/// Base64 of the space-joined classes.
#[derive(Debug, Clone)]
pub struct EncodedFileSink {
    path: PathBuf,
}

impl EncodedFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SafelistSink for EncodedFileSink {
    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, classes: &[String]) -> anyhow::Result<()> {
        write_file(&self.path, &encode(classes))
    }
}

/// A single element whose class attribute lists every class.
#[derive(Debug, Clone)]
pub struct MarkupFileSink {
    path: PathBuf,
}

impl MarkupFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SafelistSink for MarkupFileSink {
    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, classes: &[String]) -> anyhow::Result<()> {
        write_file(&self.path, &render_markup(classes))
    }
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    debug!("wrote {}", path.display());
    Ok(())
}

pub fn encode(classes: &[String]) -> String {
    STANDARD.encode(classes.join(" "))
}

pub fn decode(encoded: &str) -> anyhow::Result<Vec<String>> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("safelist is not valid base64")?;
    let text = String::from_utf8(bytes).context("safelist is not valid UTF-8")?;
    Ok(text.split_whitespace().map(str::to_string).collect())
}

/// Classes from an encoded safelist file.
pub fn read_safelist(path: &Path) -> anyhow::Result<Vec<String>> {
    let encoded = fs::read_to_string(path)
        .with_context(|| format!("failed to read safelist {}", path.display()))?;
    decode(&encoded)
}

pub fn render_markup(classes: &[String]) -> String {
    format!(
        "{}\n<div class=\"{}\"></div>",
        MARKUP_HEADER,
        escape_attr(&classes.join(" "))
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUpdate {
    /// The item's classes match what the log already holds; nothing written.
    Unchanged,
    /// Log rows replaced and files rewritten with the merged safelist.
    Updated { safelist: Vec<String> },
}

#[derive(Default)]
pub struct Persister {
    sinks: Vec<Box<dyn SafelistSink>>,
    log: Option<Box<dyn TokenLog>>,
}

impl Persister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded file plus the markup mirror when one is configured.
    pub fn from_output(output: &OutputConfig) -> Self {
        let mut persister = Self::new().with_sink(EncodedFileSink::new(&output.path));
        if let Some(markup) = output.markup_path.as_deref().filter(|p| !p.is_empty()) {
            persister = persister.with_sink(MarkupFileSink::new(markup));
        }
        persister
    }

    pub fn with_sink(mut self, sink: impl SafelistSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn with_log(mut self, log: impl TokenLog + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    pub fn has_log(&self) -> bool {
        self.log.is_some()
    }

    /// Persists the result of a full scan.
    pub async fn save_all(&self, classes: &[String]) -> anyhow::Result<()> {
        if let Some(log) = &self.log {
            log.replace_all(classes).await.context("updating class log")?;
        }
        self.write_files(classes)?;
        info!("saved {} classes", classes.len());
        Ok(())
    }

    /// Replaces one item's classes and rewrites the files with the union over all items.
    pub async fn save_item(&self, content_id: u64, classes: &[String]) -> anyhow::Result<ItemUpdate> {
        if content_id == GLOBAL_POST_ID {
            bail!("content id {} is reserved for full scans", GLOBAL_POST_ID);
        }
        let Some(log) = &self.log else {
            self.write_files(classes)?;
            return Ok(ItemUpdate::Updated {
                safelist: classes.to_vec(),
            });
        };

        let before: BTreeSet<String> = log.classes_for(content_id).await?.into_iter().collect();
        let after: BTreeSet<String> = classes.iter().cloned().collect();
        if before == after {
            debug!("classes of item {} unchanged", content_id);
            return Ok(ItemUpdate::Unchanged);
        }

        log.replace_for(content_id, classes)
            .await
            .context("updating class log")?;
        let merged: BTreeSet<String> = log.distinct_classes().await?.into_iter().collect();
        let safelist: Vec<String> = merged.into_iter().collect();
        self.write_files(&safelist)?;
        info!(
            "item {} updated: {} classes, {} in safelist",
            content_id,
            classes.len(),
            safelist.len()
        );
        Ok(ItemUpdate::Updated { safelist })
    }

    fn write_files(&self, classes: &[String]) -> anyhow::Result<()> {
        for sink in &self.sinks {
            sink.write(classes)?;
        }
        Ok(())
    }
}
