//! Collects class tokens from every content source: post bodies, custom fields,
//! post meta, contact forms, options pages, widgets and (optionally) templates.

use crate::blocks::extract_block_classes;
use crate::config::ScanConfig;
use crate::extractor::extract_classes;
use crate::filter::{filter_classes, ExcludeRules, PatternError};
use crate::models::ContentItem;
use crate::source::ContentSource;
use crate::walker::{collect_markup, FieldWalker};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Empty means every post type present in the source.
    pub post_types: Vec<String>,
    pub statuses: Vec<String>,
    pub include_templates: bool,
    pub template_dir: PathBuf,
    pub template_globs: Vec<String>,
}

impl From<&ScanConfig> for ScanOptions {
    fn from(cfg: &ScanConfig) -> Self {
        Self {
            post_types: cfg.post_types.clone(),
            statuses: cfg.statuses.clone(),
            include_templates: cfg.include_templates,
            template_dir: PathBuf::from(&cfg.template_dir),
            template_globs: cfg.template_globs.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub classes: Vec<String>,
    /// Items scanned per post type.
    pub items_scanned: BTreeMap<String, usize>,
    /// Items whose custom fields could not be read; their other content was still scanned.
    pub skipped_fields: Vec<u64>,
    pub option_pages: usize,
    pub widgets: usize,
    pub templates_scanned: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    walker: FieldWalker,
    rules: ExcludeRules,
}

impl Scanner {
    pub fn new(walker: FieldWalker, rules: ExcludeRules) -> Self {
        Self { walker, rules }
    }

    pub fn from_config(cfg: &ScanConfig) -> Result<Self, PatternError> {
        Ok(Self::new(FieldWalker::new(cfg.class_fields()), cfg.exclude_rules()?))
    }

    pub fn rules(&self) -> &ExcludeRules {
        &self.rules
    }

    /// Full recomputation over every source; result is filtered, unique and sorted.
    pub fn scan_all(
        &self,
        source: &dyn ContentSource,
        opts: &ScanOptions,
    ) -> anyhow::Result<ScanReport> {
        let mut report = ScanReport::default();
        let mut raw = Vec::new();

        for post_type in &opts.post_types {
            report.items_scanned.insert(post_type.clone(), 0);
        }
        for item in source.items() {
            if !is_selected(item, opts) {
                continue;
            }
            if !self.collect_item(source, item, &mut raw) {
                report.skipped_fields.push(item.id);
            }
            *report.items_scanned.entry(item.post_type.clone()).or_default() += 1;
        }
        for (post_type, count) in &report.items_scanned {
            info!("{}: {} items scanned", post_type, count);
        }

        for (page, tree) in source.option_pages() {
            debug!("scanning options page {}", page);
            raw.extend(self.walker.walk(tree));
            report.option_pages += 1;
        }

        for settings in source.widget_settings() {
            raw.extend(collect_markup(settings));
            report.widgets += 1;
        }
        info!(
            "scanned {} options pages and {} widget types",
            report.option_pages, report.widgets
        );

        if opts.include_templates {
            let (classes, files) = scan_templates(&opts.template_dir, &opts.template_globs)?;
            info!("scanned {} template files", files);
            raw.extend(classes);
            report.templates_scanned = files;
        }

        report.classes = filter_classes(raw, &self.rules);
        info!("found {} unique classes", report.classes.len());
        Ok(report)
    }

    /// Filtered classes of a single item, as used for incremental updates.
    pub fn scan_item(&self, source: &dyn ContentSource, item: &ContentItem) -> Vec<String> {
        let mut raw = Vec::new();
        self.collect_item(source, item, &mut raw);
        filter_classes(raw, &self.rules)
    }

    /// Appends raw tokens of `item`; returns false when its custom fields were skipped.
    fn collect_item(
        &self,
        source: &dyn ContentSource,
        item: &ContentItem,
        out: &mut Vec<String>,
    ) -> bool {
        out.extend(extract_block_classes(&item.content));
        out.extend(extract_classes(&item.content));

        let fields_ok = match source.fields(item) {
            Ok(Some(tree)) => {
                out.extend(self.walker.walk(&tree));
                true
            }
            Ok(None) => true,
            Err(err) => {
                warn!("skipping custom fields of item {}: {:#}", item.id, err);
                false
            }
        };

        for (key, value) in &item.meta {
            if key.starts_with('_') {
                continue;
            }
            match value {
                Value::String(text) => out.extend(extract_classes(text)),
                other => out.extend(collect_markup(other)),
            }
        }

        for form in item.form_sources() {
            out.extend(extract_classes(form));
        }

        fields_ok
    }
}

fn is_selected(item: &ContentItem, opts: &ScanOptions) -> bool {
    if item.is_revision() {
        return false;
    }
    if !opts.post_types.is_empty() && !opts.post_types.contains(&item.post_type) {
        return false;
    }
    opts.statuses.is_empty() || opts.statuses.contains(&item.status)
}

/// Classes from template files under `dir` matching `globs`. A missing
/// directory yields nothing; unreadable files are skipped.
pub fn scan_templates(dir: &Path, globs: &[String]) -> anyhow::Result<(Vec<String>, usize)> {
    let mut classes = Vec::new();
    let mut files = 0usize;
    if !dir.is_dir() {
        debug!("template dir {:?} not found", dir);
        return Ok((classes, files));
    }
    let matcher = build_globset(globs)?;

    for entry in WalkDir::new(dir).follow_links(true).into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if !matcher.is_match(relative) {
            continue;
        }
        match fs::read_to_string(path) {
            Ok(content) => {
                classes.extend(extract_classes(&content));
                files += 1;
            }
            Err(err) => debug!("skipping template {:?}: {}", path, err),
        }
    }
    Ok((classes, files))
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::source::JsonExport;
    use serde_json::json;

    fn scanner() -> Scanner {
        Scanner::from_config(&ScanConfig::default()).unwrap()
    }

    fn options() -> ScanOptions {
        ScanOptions::from(&ScanConfig::default())
    }

    fn source() -> JsonExport {
        JsonExport::new(
            serde_json::from_value(json!({
                "posts": [
                    {
                        "id": 1,
                        "post_type": "page",
                        "content": "<!-- wp:group {\"className\":\"mt-8\",\"align\":\"full\"} --><div class=\"wp-block-group flex\"></div>",
                        "fields": {"hero": {"wrapper_class": "min-h-screen"}},
                        "meta": {
                            "_edit_lock": "<b class=\"hidden-meta\"></b>",
                            "subtitle": ["<em class=\"italic\"></em>"],
                            "layout": {"nested": "<i class=\"grid\"></i>"}
                        }
                    },
                    {"id": 2, "post_type": "post", "status": "trash", "content": "<p class=\"trashed\"></p>"},
                    {"id": 3, "post_type": "revision", "status": "inherit", "content": "<p class=\"old\"></p>"},
                    {"id": 4, "post_type": "post", "status": "draft", "content": "<p class=\"draft-only\"></p>", "fields": "{oops"},
                    {
                        "id": 5,
                        "post_type": "wpcf7_contact_form",
                        "meta": {"_form": "<div class=\"form-row wpcf7-text\"></div>"}
                    }
                ],
                "options": {"options": {"footer_classes": "bg-gray-900"}},
                "widgets": {
                    "sidebars": {"sidebar-1": ["custom_html-2"]},
                    "settings": {"custom_html": {"2": {"content": "<aside class=\"sticky\"></aside>"}}}
                }
            }))
            .unwrap(),
        )
    }

    #[test]
    fn scan_all_covers_every_source() {
        let report = scanner().scan_all(&source(), &options()).unwrap();
        assert_eq!(
            report.classes,
            vec![
                "bg-gray-900",
                "draft-only",
                "flex",
                "form-row",
                "grid",
                "italic",
                "min-h-screen",
                "mt-8",
                "sticky"
            ]
        );
        assert_eq!(report.items_scanned.get("page"), Some(&1));
        assert_eq!(report.items_scanned.get("post"), Some(&1));
        assert_eq!(report.items_scanned.get("wpcf7_contact_form"), Some(&1));
        assert_eq!(report.skipped_fields, vec![4]);
        assert_eq!(report.option_pages, 1);
        assert_eq!(report.widgets, 1);
        assert_eq!(report.templates_scanned, 0);
    }

    #[test]
    fn post_type_selection() {
        let mut opts = options();
        opts.post_types = vec!["wpcf7_contact_form".to_string(), "product".to_string()];
        let report = scanner().scan_all(&source(), &opts).unwrap();
        assert!(report.classes.contains(&"form-row".to_string()));
        assert!(!report.classes.contains(&"flex".to_string()));
        assert_eq!(report.items_scanned.get("product"), Some(&0));
    }

    #[test]
    fn scan_item_filters_single_item() {
        let source = source();
        let item = source.item(1).unwrap();
        assert_eq!(
            scanner().scan_item(&source, item),
            vec!["flex", "grid", "italic", "min-h-screen", "mt-8"]
        );
    }

    #[test]
    fn templates_only_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        fs::create_dir_all(views.join("partials")).unwrap();
        fs::write(
            views.join("partials/card.blade.php"),
            "<div class=\"card\" @class(['shadow-lg'])></div>",
        )
        .unwrap();
        fs::write(views.join("notes.txt"), "<div class=\"not-a-view\"></div>").unwrap();

        let mut opts = options();
        opts.template_dir = views.clone();
        let without = scanner().scan_all(&JsonExport::default(), &opts).unwrap();
        assert!(without.classes.is_empty());

        opts.include_templates = true;
        let with = scanner().scan_all(&JsonExport::default(), &opts).unwrap();
        assert_eq!(with.classes, vec!["card", "shadow-lg"]);
        assert_eq!(with.templates_scanned, 1);
    }

    #[test]
    fn missing_template_dir_is_empty() {
        let (classes, files) =
            scan_templates(Path::new("/definitely/not/here"), &["**/*.php".to_string()]).unwrap();
        assert!(classes.is_empty());
        assert_eq!(files, 0);
    }
}
