//! Document records and their well-known fields.

use serde_json::{Map, Value};

use crate::error::{Result, XimlError};

/// A corpus document: an arbitrary JSON object.
pub type Document = Map<String, Value>;

/// Preprocessed text of the document.
pub const CONTENT_FIELD: &str = "content";
/// Dense feature vector produced by a transformer.
pub const FEATURES_FIELD: &str = "features";
/// Reference category, when known.
pub const CATEGORY_FIELD: &str = "category";
/// Predicted category.
pub const SEASON_FIELD: &str = "season";
/// Predicted per-class probabilities.
pub const SEASON_PROB_FIELD: &str = "season_prob";

/// Parse a whitespace-separated list of numbers.
pub fn parse_features(text: &str) -> Result<Vec<f32>> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<f32>()
                .map_err(|_| XimlError::data(format!("Invalid feature value '{token}'")))
        })
        .collect()
}

/// Read a `features` value, either a JSON array of numbers or a
/// whitespace-separated string.
pub fn features_from_value(value: &Value) -> Result<Vec<f32>> {
    match value {
        Value::String(text) => parse_features(text),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_f64()
                    .map(|x| x as f32)
                    .ok_or_else(|| XimlError::data(format!("Feature {i} is not a number: {item}")))
            })
            .collect(),
        other => Err(XimlError::data(format!(
            "Features must be an array or a string, got {other}"
        ))),
    }
}
