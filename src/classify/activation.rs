//! Activation functions applied to a whole layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::XimlError;

/// Activation applied to the output of a dense layer.
///
/// Names follow the toolkit that exports the models
/// (`identity`, `tanh`, `relu`, `softmax`, `logistic`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Activation {
    Identity,
    Tanh,
    Relu,
    Softmax,
    Logistic,
}

impl Activation {
    pub const ALL: [Activation; 5] = [
        Activation::Identity,
        Activation::Tanh,
        Activation::Relu,
        Activation::Softmax,
        Activation::Logistic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Identity => "identity",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::Softmax => "softmax",
            Activation::Logistic => "logistic",
        }
    }

    /// Apply the activation to a layer, returning a new vector.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        match self {
            Activation::Identity => values.to_vec(),
            Activation::Tanh => values.iter().map(|x| x.tanh()).collect(),
            Activation::Relu => values.iter().map(|&x| x.max(0.0)).collect(),
            Activation::Softmax => softmax(values),
            Activation::Logistic => values.iter().map(|&x| sigmoid(x)).collect(),
        }
    }
}

/// `1 / (1 + e^-x)`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Softmax with the maximum subtracted before exponentiation.
pub fn softmax(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl FromStr for Activation {
    type Err = XimlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Activation::ALL.iter().map(|a| a.name()).collect();
                XimlError::config(format!(
                    "Unknown activation function '{s}'. Choose from {known:?}"
                ))
            })
    }
}

impl TryFrom<String> for Activation {
    type Error = XimlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
