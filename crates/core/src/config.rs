use crate::filter::{ExcludeRules, PatternError};
use crate::walker::ClassFieldPatterns;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base64 safelist read by the CSS build config.
    #[serde(default = "default_output_path")]
    pub path: String,
    /// Markup mirror re-scanned by the CSS tool's content globs.
    #[serde(default = "default_markup_path")]
    pub markup_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
    #[serde(default = "default_class_field_patterns")]
    pub class_field_patterns: Vec<String>,
    /// Post types to scan; empty means every type in the export.
    #[serde(default)]
    pub post_types: Vec<String>,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub include_templates: bool,
    #[serde(default = "default_template_dir")]
    pub template_dir: String,
    #[serde(default = "default_template_globs")]
    pub template_globs: Vec<String>,
}

impl ScanConfig {
    pub fn exclude_rules(&self) -> Result<ExcludeRules, PatternError> {
        ExcludeRules::new(&self.exclude_patterns)
    }

    pub fn class_fields(&self) -> ClassFieldPatterns {
        ClassFieldPatterns::new(&self.class_field_patterns)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            markup_path: default_markup_path(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: default_exclude_patterns(),
            class_field_patterns: default_class_field_patterns(),
            post_types: Vec::new(),
            statuses: default_statuses(),
            include_templates: false,
            template_dir: default_template_dir(),
            template_globs: default_template_globs(),
        }
    }
}

fn default_output_path() -> String {
    "tailwind-safelist.txt".to_string()
}

fn default_markup_path() -> Option<String> {
    Some("tailwind-safelist.html".to_string())
}

fn default_template_dir() -> String {
    "resources/views".to_string()
}

fn default_template_globs() -> Vec<String> {
    vec!["**/*.php".to_string()]
}

fn default_statuses() -> Vec<String> {
    ["publish", "draft", "private"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_exclude_patterns() -> Vec<String> {
    [
        "/^wp-/",
        "/^wpcf7/",
        "/^acf-/",
        "/^block-/",
        "/^is-/",
        "/^has-/",
        "/^alignwide$/",
        "/^alignfull$/",
        "/^alignleft$/",
        "/^alignright$/",
        "/^aligncenter$/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_class_field_patterns() -> Vec<String> {
    [
        "class",
        "classes",
        "className",
        "css_class",
        "css_classes",
        "custom_class",
        "additional_class",
        "wrapper_class",
        "container_class",
        "section_class",
        "style",
        "styles",
        "tailwind",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Loads `path`, or `config/default` when present, then `SAFELIST__*` env overrides.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix("SAFELIST").separator("__"));
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
