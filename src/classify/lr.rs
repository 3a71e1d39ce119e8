//! Logistic-regression classifier.
//!
//! Model files are JSON objects exported by the training toolkit:
//!
//! ```json
//! {
//!   "n_classes": 2,
//!   "n_features": 2,
//!   "classes": ["non-sport", "sport"],
//!   "coeffs": [[0.5, -0.3]],
//!   "intercept": [0.1]
//! }
//! ```
//!
//! A two-class model stores a single row, the one for `classes[1]`.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::classify::activation::sigmoid;
use crate::classify::loader::{dot, load_params};
use crate::classify::prediction::{Prediction, Probabilities};
use crate::classify::DocumentClassifier;
use crate::error::{Result, XimlError};
use crate::util::round_to;

/// Parameters of a trained logistic-regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LrParams {
    /// Informational model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub n_classes: usize,
    pub n_features: usize,
    pub classes: Vec<String>,
    /// One row per class, or a single row for two-class models.
    #[serde(alias = "coefs")]
    pub coeffs: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LrParams {
    /// Check the structural invariants of the parameters.
    pub fn validate(&self) -> Result<()> {
        if self.n_classes < 2 {
            return Err(XimlError::config(format!(
                "Logistic regression needs at least 2 classes, got {}",
                self.n_classes
            )));
        }
        if self.classes.len() != self.n_classes {
            return Err(XimlError::config(format!(
                "Expected {} class labels, got {}",
                self.n_classes,
                self.classes.len()
            )));
        }

        let expected_rows = if self.n_classes == 2 { 1 } else { self.n_classes };
        if self.coeffs.len() != expected_rows {
            return Err(XimlError::config(format!(
                "Expected {expected_rows} coefficient rows for {} classes, got {}",
                self.n_classes,
                self.coeffs.len()
            )));
        }
        if self.intercept.len() != self.coeffs.len() {
            return Err(XimlError::config(format!(
                "Expected {} intercepts, got {}",
                self.coeffs.len(),
                self.intercept.len()
            )));
        }
        if let Some((row, coeffs)) = self
            .coeffs
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != self.n_features)
        {
            return Err(XimlError::config(format!(
                "Coefficient row {row} has {} values, expected {}",
                coeffs.len(),
                self.n_features
            )));
        }
        Ok(())
    }
}

/// A loaded, validated logistic-regression model.
#[derive(Debug, Clone)]
pub struct LrClassifier {
    params: LrParams,
}

impl LrClassifier {
    /// Build a classifier from already parsed parameters.
    pub fn new(params: LrParams) -> Result<Self> {
        params.validate()?;
        Ok(LrClassifier { params })
    }

    /// Load and validate a model file.
    pub fn load(path: &Path) -> Result<Self> {
        let params: LrParams = load_params(path)?;
        let classifier = Self::new(params)?;
        info!(
            "Loaded logistic regression model from '{}' ({} classes, {} features)",
            path.display(),
            classifier.params.n_classes,
            classifier.params.n_features
        );
        Ok(classifier)
    }

    pub fn params(&self) -> &LrParams {
        &self.params
    }

    fn score(&self, row: usize, features: &[f32]) -> f64 {
        round_to(
            sigmoid(dot(&self.params.coeffs[row], features) + self.params.intercept[row]),
            7,
        )
    }
}

impl DocumentClassifier for LrClassifier {
    fn classify(&self, features: &[f32]) -> Result<Prediction> {
        if features.is_empty() {
            return Ok(Prediction::no_class());
        }
        if features.len() != self.params.n_features {
            return Err(XimlError::data(format!(
                "Expected {} features, got {}",
                self.params.n_features,
                features.len()
            )));
        }

        let classes = &self.params.classes;
        let mut probabilities = Probabilities::with_capacity(classes.len());
        if self.params.n_classes == 2 {
            let p = self.score(0, features);
            probabilities.push(classes[1].as_str(), p);
            probabilities.push(classes[0].as_str(), round_to(1.0 - p, 7));
        } else {
            let scores: Vec<f64> = (0..classes.len())
                .map(|row| self.score(row, features))
                .collect();
            let total: f64 = scores.iter().sum();
            for (label, score) in classes.iter().zip(scores) {
                let p = if total > 0.0 { score / total } else { 0.0 };
                probabilities.push(label.as_str(), p);
            }
        }

        Ok(Prediction::from_probabilities(probabilities))
    }

    fn name(&self) -> &str {
        self.params.name.as_deref().unwrap_or("LogisticRegression")
    }

    fn n_features(&self) -> usize {
        self.params.n_features
    }

    fn classes(&self) -> &[String] {
        &self.params.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::prediction::NO_CLASS;
    use crate::error::ErrorKind;
    use std::fs;

    fn binary_params() -> LrParams {
        LrParams {
            name: None,
            n_classes: 2,
            n_features: 2,
            classes: vec!["non-sport".to_string(), "sport".to_string()],
            coeffs: vec![vec![0.5, -0.3]],
            intercept: vec![0.1],
        }
    }

    fn multiclass_params() -> LrParams {
        LrParams {
            name: Some("seasons".to_string()),
            n_classes: 3,
            n_features: 2,
            classes: vec![
                "spring".to_string(),
                "summer".to_string(),
                "winter".to_string(),
            ],
            coeffs: vec![vec![0.2, 0.1], vec![-0.4, 0.9], vec![1.5, -0.7]],
            intercept: vec![0.0, 0.3, -0.2],
        }
    }

    #[test]
    fn test_binary_classification() {
        let classifier = LrClassifier::new(binary_params()).unwrap();
        let prediction = classifier.classify(&[1.0, 1.0]).unwrap();

        assert_eq!(prediction.category, "sport");
        assert_eq!(prediction.probabilities.get("sport"), Some(0.5744425));
        assert_eq!(prediction.probabilities.get("non-sport"), Some(0.4255575));
        let labels: Vec<&str> = prediction.probabilities.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["sport", "non-sport"]);
        assert!((prediction.probabilities.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiclass_probabilities_sum_to_one() {
        let classifier = LrClassifier::new(multiclass_params()).unwrap();
        let prediction = classifier.classify(&[2.0, 0.5]).unwrap();

        assert_eq!(prediction.probabilities.len(), 3);
        assert!((prediction.probabilities.sum() - 1.0).abs() < 1e-9);
        assert_eq!(prediction.category, "winter");
    }

    #[test]
    fn test_empty_features() {
        let classifier = LrClassifier::new(binary_params()).unwrap();
        let prediction = classifier.classify(&[]).unwrap();
        assert_eq!(prediction.category, NO_CLASS);
        assert!(prediction.probabilities.is_empty());
    }

    #[test]
    fn test_wrong_feature_count() {
        let classifier = LrClassifier::new(binary_params()).unwrap();
        let err = classifier.classify(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_validation() {
        let mut params = binary_params();
        params.coeffs.push(vec![0.0, 0.0]);
        assert_eq!(params.validate().unwrap_err().kind(), ErrorKind::Config);

        let mut params = binary_params();
        params.classes.pop();
        assert!(params.validate().is_err());

        let mut params = binary_params();
        params.coeffs[0].push(1.0);
        assert!(params.validate().is_err());

        let mut params = multiclass_params();
        params.intercept.pop();
        assert!(params.validate().is_err());

        let mut params = binary_params();
        params.n_classes = 1;
        params.classes.truncate(1);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lr.json");
        fs::write(
            &path,
            r#"{"name": "sport", "n_classes": 2, "n_features": 2,
                "classes": ["non-sport", "sport"], "coefs": [[0.5, -0.3]], "intercept": [0.1]}"#,
        )
        .unwrap();

        let classifier = LrClassifier::load(&path).unwrap();
        assert_eq!(classifier.name(), "sport");
        assert_eq!(classifier.params().coeffs, vec![vec![0.5, -0.3]]);

        fs::write(&path, r#"{"n_classes": 2, "n_features": 2}"#).unwrap();
        assert_eq!(
            LrClassifier::load(&path).unwrap_err().kind(),
            ErrorKind::Config
        );

        fs::write(
            &path,
            r#"{"n_classes": 2, "n_features": 2, "classes": ["a", "b"],
                "coeffs": [[0.5, -0.3]], "intercept": [0.1], "bias": 3}"#,
        )
        .unwrap();
        assert_eq!(
            LrClassifier::load(&path).unwrap_err().kind(),
            ErrorKind::Config
        );
    }
}
