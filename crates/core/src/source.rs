//! Where scannable content comes from. `JsonExport` reads a content export file.

use crate::models::{ContentExport, ContentItem};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

static WIDGET_INSTANCE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\d+$").expect("valid widget suffix regex"));

pub trait ContentSource {
    fn items(&self) -> Vec<&ContentItem>;

    fn item(&self, id: u64) -> Option<&ContentItem> {
        self.items().into_iter().find(|i| i.id == id)
    }

    /// Custom-field tree of one item. May fail for a single item without
    /// affecting the rest of a scan.
    fn fields<'a>(&self, item: &'a ContentItem) -> anyhow::Result<Option<Cow<'a, Value>>>;

    /// `(page id, field tree)` for every options page.
    fn option_pages(&self) -> Vec<(&str, &Value)>;

    /// Stored settings of every widget base placed in a sidebar.
    fn widget_settings(&self) -> Vec<&Value>;
}

#[derive(Debug, Clone, Default)]
pub struct JsonExport {
    export: ContentExport,
}

impl JsonExport {
    pub fn new(export: ContentExport) -> Self {
        Self { export }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read content export {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("failed to parse content export {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn export(&self) -> &ContentExport {
        &self.export
    }
}

impl ContentSource for JsonExport {
    fn items(&self) -> Vec<&ContentItem> {
        self.export.posts.iter().collect()
    }

    fn fields<'a>(&self, item: &'a ContentItem) -> anyhow::Result<Option<Cow<'a, Value>>> {
        match &item.fields {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(encoded)) if encoded.trim().is_empty() => Ok(None),
            Some(Value::String(encoded)) => {
                let decoded: Value = serde_json::from_str(encoded)
                    .with_context(|| format!("fields of item {} are not valid JSON", item.id))?;
                Ok(Some(Cow::Owned(decoded)))
            }
            Some(tree) => Ok(Some(Cow::Borrowed(tree))),
        }
    }

    fn option_pages(&self) -> Vec<(&str, &Value)> {
        self.export
            .options
            .iter()
            .map(|(page, tree)| (page.as_str(), tree))
            .collect()
    }

    fn widget_settings(&self) -> Vec<&Value> {
        let widgets = &self.export.widgets;
        let mut bases = BTreeSet::new();
        for ids in widgets.sidebars.values() {
            // sidebars_widgets also stores scalars such as array_version
            let Value::Array(ids) = ids else { continue };
            for id in ids.iter().filter_map(Value::as_str) {
                bases.insert(widget_base(id));
            }
        }
        bases
            .into_iter()
            .filter_map(|base| widgets.settings.get(base))
            .filter(|settings| !settings.is_null())
            .collect()
    }
}

/// `custom_html-3` → `custom_html`.
pub fn widget_base(widget_id: &str) -> &str {
    match WIDGET_INSTANCE_SUFFIX.find(widget_id) {
        Some(m) => &widget_id[..m.start()],
        None => widget_id,
    }
}
