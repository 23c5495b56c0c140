use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const FORM_POST_TYPE: &str = "wpcf7_contact_form";

/// One post, page, form or custom post type entry of a content export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(alias = "ID")]
    pub id: u64,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    #[serde(default = "default_status", alias = "post_status")]
    pub status: String,
    #[serde(default, alias = "post_content")]
    pub content: String,
    /// Custom-field tree, or a JSON document encoding one.
    #[serde(default)]
    pub fields: Option<Value>,
    /// Post meta; a key maps to one value or a list of values.
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

impl ContentItem {
    pub fn is_revision(&self) -> bool {
        self.post_type == "revision" || self.status == "inherit"
    }

    pub fn is_form(&self) -> bool {
        self.post_type == FORM_POST_TYPE
    }

    pub fn meta_values(&self, key: &str) -> Vec<&Value> {
        match self.meta.get(key) {
            Some(Value::Array(values)) => values.iter().collect(),
            Some(value) => vec![value],
            None => Vec::new(),
        }
    }

    /// Form template and mail body of a contact form; empty for other types.
    pub fn form_sources(&self) -> Vec<&str> {
        if !self.is_form() {
            return Vec::new();
        }
        let mut sources = Vec::new();
        if let Some(form) = self.meta_values("_form").first().and_then(|v| v.as_str()) {
            sources.push(form);
        }
        if let Some(body) = self
            .meta_values("_mail")
            .first()
            .and_then(|v| v.get("body"))
            .and_then(Value::as_str)
        {
            sources.push(body);
        }
        sources
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetExport {
    /// Sidebar id → list of widget instance ids such as `text-2`.
    #[serde(default)]
    pub sidebars: BTreeMap<String, Value>,
    /// Widget base (`text`, `custom_html`) → stored settings for all instances.
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentExport {
    #[serde(default)]
    pub posts: Vec<ContentItem>,
    /// Options page id → custom-field tree.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    #[serde(default)]
    pub widgets: WidgetExport,
}

fn default_post_type() -> String {
    "post".to_string()
}

fn default_status() -> String {
    "publish".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_cms_style_names() {
        let item: ContentItem = serde_json::from_value(json!({
            "ID": 5,
            "post_status": "draft",
            "post_content": "<p class=\"x\"></p>"
        }))
        .unwrap();
        assert_eq!(item.id, 5);
        assert_eq!(item.post_type, "post");
        assert_eq!(item.status, "draft");
        assert!(item.fields.is_none());
    }

    #[test]
    fn form_sources_only_for_forms() {
        let mut item: ContentItem = serde_json::from_value(json!({
            "id": 9,
            "post_type": "wpcf7_contact_form",
            "meta": {
                "_form": ["<label class=\"block\">[text name]</label>"],
                "_mail": {"body": "<p class=\"font-mono\"></p>"}
            }
        }))
        .unwrap();
        assert_eq!(item.form_sources().len(), 2);
        item.post_type = "page".to_string();
        assert!(item.form_sources().is_empty());
    }
}
