//! Submission row validation and URL-list explosion.
//!
//! A batch submission arrives as a sequence of rows, each carrying a label
//! (e.g. a product name) and one or more source URLs. URLs may be supplied
//! either as a single comma-joined string (the CSV form) or as a JSON
//! array. [`explode_rows`] turns the rows into one [`ItemSpec`] per URL,
//! rejecting the whole submission if any row yields no usable URL.

use serde::Deserialize;

use crate::error::CoreError;

/// One submitted row: a label plus its source URL list.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    /// Opaque passthrough label, stored with every item of the row.
    pub label: String,
    pub urls: UrlList,
}

/// Source URLs for a row, in either wire shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UrlList {
    /// Comma-joined string, e.g. `"https://a/1.jpg, https://a/2.jpg"`.
    Joined(String),
    /// Explicit list of URLs.
    List(Vec<String>),
}

impl UrlList {
    /// Iterate the raw (untrimmed) URL candidates.
    fn candidates(&self) -> Vec<&str> {
        match self {
            UrlList::Joined(s) => s.split(',').collect(),
            UrlList::List(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// One unit of work produced by exploding a row: a single source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub label: String,
    pub url: String,
}

/// Validate that a source URL is non-empty and uses an HTTP scheme.
pub fn validate_source_url(url: &str) -> Result<(), CoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Source URL must not be empty".to_string(),
        ));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(CoreError::Validation(format!(
            "Source URL must start with http:// or https://, got: '{trimmed}'"
        )));
    }
    Ok(())
}

/// Explode submission rows into one [`ItemSpec`] per URL.
///
/// Whitespace around each URL is trimmed; empty fragments from trailing
/// commas are dropped. A row that yields zero parseable URLs (or any URL
/// with a non-HTTP scheme) fails the entire submission — nothing is
/// persisted for a partially valid batch.
pub fn explode_rows(rows: &[BatchRow]) -> Result<Vec<ItemSpec>, CoreError> {
    if rows.is_empty() {
        return Err(CoreError::Validation(
            "Submission must contain at least one row".to_string(),
        ));
    }

    let mut specs = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let mut row_count = 0;
        for raw in row.urls.candidates() {
            let url = raw.trim();
            if url.is_empty() {
                continue;
            }
            validate_source_url(url)
                .map_err(|e| CoreError::Validation(format!("Row {idx}: {e}")))?;
            specs.push(ItemSpec {
                label: row.label.trim().to_string(),
                url: url.to_string(),
            });
            row_count += 1;
        }
        if row_count == 0 {
            return Err(CoreError::Validation(format!(
                "Row {idx} ('{}') contains no parseable URLs",
                row.label
            )));
        }
    }
    Ok(specs)
}
