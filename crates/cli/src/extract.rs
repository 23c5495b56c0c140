use anyhow::{Context, Result};
use safelist_core::extractor::extract_classes;
use safelist_core::filter::{filter_classes, ExcludeRules};
use std::io::Read;

/// Classes in markup read from `reader`. `raw` skips trimming, excludes and
/// dedupe and returns tokens in document order.
pub fn extract_from_reader<R: Read>(
    mut reader: R,
    rules: &ExcludeRules,
    raw: bool,
) -> Result<Vec<String>> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .context("failed to read markup")?;
    let tokens = extract_classes(&content);
    if raw {
        Ok(tokens)
    } else {
        Ok(filter_classes(tokens, rules))
    }
}
