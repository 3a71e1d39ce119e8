//! Multi-layer perceptron classifier.
//!
//! Weight matrices are stored `[n_in][n_out]`, the way the training toolkit
//! exports them, so a layer computes `act(input · W + b)`.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::classify::activation::Activation;
use crate::classify::loader::load_params;
use crate::classify::prediction::{Prediction, Probabilities};
use crate::classify::DocumentClassifier;
use crate::error::{Result, XimlError};
use crate::util::round_to;

/// How the output layer maps onto classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierType {
    /// One class per document; a two-class model has a single output unit.
    Multiclass,
    /// Independent output unit per class.
    Multilabel,
}

/// Parameters of a trained MLP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MlpParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub classifier_type: ClassifierType,
    pub classes: Vec<String>,
    pub n_classes: usize,
    pub n_features: usize,
    pub hidden_coeffs: Vec<Vec<Vec<f64>>>,
    pub hidden_intercepts: Vec<Vec<f64>>,
    pub hidden_activation: Activation,
    pub output_coeffs: Vec<Vec<f64>>,
    pub output_intercepts: Vec<f64>,
    pub output_activation: Activation,
}

impl MlpParams {
    /// Check label counts and that every layer's shape chains onto the next.
    pub fn validate(&self) -> Result<()> {
        if self.n_classes == 0 || self.classes.len() != self.n_classes {
            return Err(XimlError::config(format!(
                "Expected {} class labels, got {}",
                self.n_classes,
                self.classes.len()
            )));
        }
        if self.hidden_coeffs.len() != self.hidden_intercepts.len() {
            return Err(XimlError::config(format!(
                "Got {} hidden weight matrices but {} hidden intercept vectors",
                self.hidden_coeffs.len(),
                self.hidden_intercepts.len()
            )));
        }

        let mut width = self.n_features;
        for (k, (weights, bias)) in self
            .hidden_coeffs
            .iter()
            .zip(&self.hidden_intercepts)
            .enumerate()
        {
            width = check_layer(&format!("hidden layer {k}"), weights, bias, width)?;
        }
        check_layer("output layer", &self.output_coeffs, &self.output_intercepts, width)?;
        Ok(())
    }

    /// Number of output units the classes require.
    fn expected_outputs(&self) -> usize {
        match self.classifier_type {
            ClassifierType::Multiclass if self.n_classes == 2 => 1,
            _ => self.n_classes,
        }
    }
}

/// Validate one layer against the width of its input and return its output
/// width.
fn check_layer(what: &str, weights: &[Vec<f64>], bias: &[f64], n_in: usize) -> Result<usize> {
    if weights.len() != n_in {
        return Err(XimlError::config(format!(
            "{what} has {} weight rows, expected {n_in}",
            weights.len()
        )));
    }
    if bias.is_empty() {
        return Err(XimlError::config(format!("{what} has no units")));
    }
    if let Some(row) = weights.iter().position(|row| row.len() != bias.len()) {
        return Err(XimlError::config(format!(
            "{what} weight row {row} has {} values, expected {}",
            weights[row].len(),
            bias.len()
        )));
    }
    Ok(bias.len())
}

/// `input · W + b` for a `[n_in][n_out]` weight matrix.
fn affine(input: &[f64], weights: &[Vec<f64>], bias: &[f64]) -> Vec<f64> {
    let mut out = bias.to_vec();
    for (x, row) in input.iter().zip(weights) {
        for (o, w) in out.iter_mut().zip(row) {
            *o += x * w;
        }
    }
    out
}

/// A loaded, validated MLP.
#[derive(Debug, Clone)]
pub struct MlpClassifier {
    params: MlpParams,
}

impl MlpClassifier {
    pub fn new(params: MlpParams) -> Result<Self> {
        params.validate()?;
        Ok(MlpClassifier { params })
    }

    /// Load and validate a model file.
    pub fn load(path: &Path) -> Result<Self> {
        let params: MlpParams = load_params(path)?;
        let classifier = Self::new(params)?;
        info!(
            "Loaded MLP model from '{}' ({} hidden layers, {} classes)",
            path.display(),
            classifier.params.hidden_coeffs.len(),
            classifier.params.n_classes
        );
        Ok(classifier)
    }

    pub fn params(&self) -> &MlpParams {
        &self.params
    }

    /// Run the network and return the output layer rounded to 7 decimals.
    ///
    /// Returns a [`XimlError::Data`] error if `features` does not have
    /// `n_features` values.
    pub fn forward(&self, features: &[f32]) -> Result<Vec<f64>> {
        let p = &self.params;
        if features.len() != p.n_features {
            return Err(XimlError::data(format!(
                "Expected {} features, got {}",
                p.n_features,
                features.len()
            )));
        }

        let input: Vec<f64> = features.iter().map(|&x| f64::from(x)).collect();
        let hidden = p
            .hidden_coeffs
            .iter()
            .zip(&p.hidden_intercepts)
            .fold(input, |layer, (weights, bias)| {
                p.hidden_activation.apply(&affine(&layer, weights, bias))
            });
        let output = p
            .output_activation
            .apply(&affine(&hidden, &p.output_coeffs, &p.output_intercepts))
            .into_iter()
            .map(|v| round_to(v, 7))
            .collect();
        Ok(output)
    }
}

impl DocumentClassifier for MlpClassifier {
    fn classify(&self, features: &[f32]) -> Result<Prediction> {
        if features.is_empty() {
            return Ok(Prediction::no_class());
        }

        let output = self.forward(features)?;
        let expected = self.params.expected_outputs();
        if output.len() != expected {
            return Err(XimlError::data(format!(
                "Output layer produced {} values, expected {expected}",
                output.len()
            )));
        }

        let classes = &self.params.classes;
        let probabilities = if expected == 1 && classes.len() == 2 {
            let p = output[0];
            let mut probabilities = Probabilities::with_capacity(2);
            probabilities.push(classes[1].as_str(), p);
            probabilities.push(classes[0].as_str(), round_to(1.0 - p, 7));
            probabilities
        } else {
            classes.iter().cloned().zip(output).collect()
        };

        Ok(Prediction::from_probabilities(probabilities))
    }

    fn name(&self) -> &str {
        self.params.name.as_deref().unwrap_or("MLPClassifier")
    }

    fn n_features(&self) -> usize {
        self.params.n_features
    }

    fn classes(&self) -> &[String] {
        &self.params.classes
    }
}
