//! Model-agnostic classifier facade.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::DocumentClassifier;
use crate::classify::lr::LrClassifier;
use crate::classify::mlp::MlpClassifier;
use crate::classify::prediction::Prediction;
use crate::corpus::batch::{BatchOptions, BatchSummary, process_corpus};
use crate::corpus::document::{
    Document, FEATURES_FIELD, SEASON_FIELD, SEASON_PROB_FIELD, features_from_value,
};
use crate::error::{Result, XimlError};

/// Supported classifier models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClassifierKind {
    LogisticRegression,
    Mlp,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 2] = [ClassifierKind::LogisticRegression, ClassifierKind::Mlp];

    /// Canonical model name, as written in model metadata.
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::LogisticRegression => "LogisticRegression",
            ClassifierKind::Mlp => "MLPClassifier",
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = XimlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "logisticregression" | "logistic_regression" | "lr" => {
                Ok(ClassifierKind::LogisticRegression)
            }
            "mlpclassifier" | "mlp" => Ok(ClassifierKind::Mlp),
            _ => {
                let known: Vec<&str> = ClassifierKind::ALL.iter().map(|k| k.name()).collect();
                Err(XimlError::config(format!(
                    "Unknown model '{s}'. Choose from {known:?}"
                )))
            }
        }
    }
}

impl TryFrom<String> for ClassifierKind {
    type Error = XimlError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ClassifierKind> for String {
    fn from(kind: ClassifierKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A loaded classifier of any supported kind.
#[derive(Debug, Clone)]
pub enum Classifier {
    LogisticRegression(LrClassifier),
    Mlp(MlpClassifier),
}

impl Classifier {
    /// Load the model file for `kind`.
    pub fn load(kind: ClassifierKind, path: &Path) -> Result<Self> {
        match kind {
            ClassifierKind::LogisticRegression => {
                LrClassifier::load(path).map(Classifier::LogisticRegression)
            }
            ClassifierKind::Mlp => MlpClassifier::load(path).map(Classifier::Mlp),
        }
    }

    pub fn kind(&self) -> ClassifierKind {
        match self {
            Classifier::LogisticRegression(_) => ClassifierKind::LogisticRegression,
            Classifier::Mlp(_) => ClassifierKind::Mlp,
        }
    }

    fn model(&self) -> &dyn DocumentClassifier {
        match self {
            Classifier::LogisticRegression(model) => model,
            Classifier::Mlp(model) => model,
        }
    }

    /// Classify a single feature vector.
    pub fn classify(&self, features: &[f32]) -> Result<Prediction> {
        self.model().classify(features)
    }

    /// Classify a `features` value as found in a corpus document.
    pub fn classify_value(&self, features: &Value) -> Result<Prediction> {
        self.classify(&features_from_value(features)?)
    }

    /// Classify many feature vectors in parallel, keeping input order.
    pub fn classify_batch(&self, batch: &[Vec<f32>]) -> Vec<Result<Prediction>> {
        batch.par_iter().map(|features| self.classify(features)).collect()
    }

    pub fn n_features(&self) -> usize {
        self.model().n_features()
    }

    pub fn classes(&self) -> &[String] {
        self.model().classes()
    }

    /// Classify every document of `input` that has features and write it to
    /// `output` with `season` and `season_prob` added.
    pub fn store_classification(
        &self,
        input: &Path,
        output: &Path,
        options: &BatchOptions,
    ) -> Result<BatchSummary> {
        process_corpus(input, output, options, |doc| self.classify_document(doc))
    }

    fn classify_document(&self, mut doc: Document) -> Result<Option<Document>> {
        let Some(features) = doc.get(FEATURES_FIELD) else {
            return Ok(None);
        };
        let prediction = self.classify_value(features)?;
        debug!("Predicted '{}'", prediction.category);
        doc.insert(SEASON_FIELD.to_string(), Value::String(prediction.category));
        doc.insert(
            SEASON_PROB_FIELD.to_string(),
            serde_json::to_value(&prediction.probabilities)?,
        );
        Ok(Some(doc))
    }
}

impl DocumentClassifier for Classifier {
    fn classify(&self, features: &[f32]) -> Result<Prediction> {
        self.model().classify(features)
    }

    fn name(&self) -> &str {
        self.model().name()
    }

    fn n_features(&self) -> usize {
        self.model().n_features()
    }

    fn classes(&self) -> &[String] {
        self.model().classes()
    }
}
