use safelist_core::pipeline::ItemOutcome;
use safelist_core::scanner::ScanReport;
use serde_json::json;

pub fn scan_json(report: &ScanReport, output_path: &str) -> serde_json::Value {
    json!({
        "status": "ok",
        "classes_count": report.classes.len(),
        "output": output_path,
        "items_scanned": report.items_scanned,
        "skipped_fields": report.skipped_fields,
        "option_pages": report.option_pages,
        "widgets": report.widgets,
        "templates_scanned": report.templates_scanned,
    })
}

pub fn scan_text(report: &ScanReport, output_path: &str) -> String {
    let mut lines = Vec::new();
    if !report.items_scanned.is_empty() {
        let types: Vec<&str> = report.items_scanned.keys().map(String::as_str).collect();
        lines.push(format!("Scanned post types: {}", types.join(", ")));
        for (post_type, count) in &report.items_scanned {
            lines.push(format!("  - {}: {} items scanned", post_type, count));
        }
    }
    if !report.skipped_fields.is_empty() {
        let ids: Vec<String> = report.skipped_fields.iter().map(|id| id.to_string()).collect();
        lines.push(format!("Skipped custom fields of items: {}", ids.join(", ")));
    }
    if report.templates_scanned > 0 {
        lines.push(format!("Scanned {} template files", report.templates_scanned));
    }
    lines.push(format!("Found {} unique classes.", report.classes.len()));
    lines.push(format!("Safelist saved to {}", output_path));
    lines.join("\n")
}

pub fn item_json(content_id: u64, outcome: &ItemOutcome) -> serde_json::Value {
    let mut value = serde_json::to_value(outcome).unwrap_or_else(|_| json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.insert("id".into(), json!(content_id));
    }
    value
}

pub fn item_text(content_id: u64, outcome: &ItemOutcome) -> String {
    match outcome {
        ItemOutcome::Revision => format!("Item {} is a revision; nothing to do.", content_id),
        ItemOutcome::Unchanged { classes } => format!(
            "Item {}: {} classes, unchanged since last update.",
            content_id,
            classes.len()
        ),
        ItemOutcome::Updated { classes, safelist } => format!(
            "Item {}: {} classes. Safelist now holds {} classes.",
            content_id,
            classes.len(),
            safelist.len()
        ),
    }
}
