//! Shared loading rules for JSON model parameter files.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, XimlError};
use crate::util::read_to_string;

/// Read `path` and parse it into `T`.
///
/// Malformed JSON is a caught error; a document that is not a non-empty
/// object, or whose keys and shapes do not match `T`, is a configuration
/// error.
pub(crate) fn load_params<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_to_string(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        XimlError::caught(format!("Bad format of JSON file '{}'", path.display()), e)
    })?;

    match &value {
        Value::Object(map) if map.is_empty() => {
            return Err(XimlError::config(format!(
                "No data found in JSON file '{}'",
                path.display()
            )));
        }
        Value::Object(_) => {}
        _ => {
            return Err(XimlError::config(format!(
                "JSON value stored in '{}' is not an object",
                path.display()
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| {
        XimlError::config(format!(
            "Model stored in '{}' does not match the expected structure: {e}",
            path.display()
        ))
    })
}

/// Dot product of model weights with single-precision features.
pub(crate) fn dot(weights: &[f64], features: &[f32]) -> f64 {
    weights
        .iter()
        .zip(features)
        .map(|(w, &x)| w * f64::from(x))
        .sum()
}
