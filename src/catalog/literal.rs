//! Text encoding for embedding vectors stored in the catalog CSV.
//!
//! Format: `[v1, v2, ..., vn]`
//!
//! - square brackets around the whole list
//! - comma separated decimal floats, whitespace around items is ignored
//! - `[]` is the empty vector
//!
//! Values are written with Rust's shortest round-trip float formatting, so
//! `parse_vector(&format_vector(v)) == v` for every finite vector.

/// Errors produced while parsing a vector literal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VectorParseError {
    #[error("vector literal must be wrapped in [ ]")]
    Unbracketed,

    #[error("empty item at position {0}")]
    EmptyItem(usize),

    #[error("invalid number {value:?} at position {position}")]
    InvalidNumber { position: usize, value: String },

    #[error("non-finite number at position {0}")]
    NonFinite(usize),
}

/// Serialize a vector into its literal form.
pub fn format_vector(values: &[f32]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Parse a vector literal.
pub fn parse_vector(text: &str) -> Result<Vec<f32>, VectorParseError> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or(VectorParseError::Unbracketed)?;

    if inner.trim().is_empty() {
        return Ok(vec![]);
    }

    inner
        .split(',')
        .enumerate()
        .map(|(position, item)| {
            let item = item.trim();
            if item.is_empty() {
                return Err(VectorParseError::EmptyItem(position));
            }
            let value = item
                .parse::<f32>()
                .map_err(|_| VectorParseError::InvalidNumber {
                    position,
                    value: item.to_string(),
                })?;
            if !value.is_finite() {
                return Err(VectorParseError::NonFinite(position));
            }
            Ok(value)
        })
        .collect()
}
