//! Row compression: bounds how much graph data reaches the answer prompt.

use kratos_core::Record;

/// Context used when the query returned nothing.
pub const NO_DATA_FOUND: &str = "No data found.";

/// Rows kept when no limit is configured.
pub const DEFAULT_MAX_ROWS: usize = 50;

/// Serialize the first `DEFAULT_MAX_ROWS` rows, one JSON object per line.
pub fn compress(rows: &[Record]) -> String {
    compress_with_limit(rows, DEFAULT_MAX_ROWS)
}

/// Serialize at most `max_rows` rows in execution order; the rest are dropped.
///
/// The limit is clamped to `1..=DEFAULT_MAX_ROWS`, so non-empty results always
/// reach the prompt and never exceed the default bound. Only an empty result
/// yields [`NO_DATA_FOUND`].
pub fn compress_with_limit(rows: &[Record], max_rows: usize) -> String {
    let max_rows = clamp_row_limit(max_rows);
    let lines: Vec<String> = rows
        .iter()
        .take(max_rows)
        .map(|row| serde_json::Value::Object(row.clone()).to_string())
        .collect();

    if lines.is_empty() {
        return NO_DATA_FOUND.to_string();
    }
    if rows.len() > max_rows {
        tracing::debug!(total = rows.len(), kept = max_rows, "Context rows truncated");
    }
    lines.join("\n")
}

/// Clamp a configured row limit into `1..=DEFAULT_MAX_ROWS`.
pub fn clamp_row_limit(max_rows: usize) -> usize {
    max_rows.clamp(1, DEFAULT_MAX_ROWS)
}
