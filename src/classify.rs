//! Document classification.
//!
//! Two model families are supported, both trained elsewhere and loaded from
//! JSON parameter files:
//!
//! - [`lr::LrClassifier`]: one-vs-rest logistic regression.
//! - [`mlp::MlpClassifier`]: a feed-forward network with dense layers.
//!
//! [`classifier::Classifier`] wraps either of them and adds batch processing
//! over a JSON-lines corpus.
//!
//! # Examples
//!
//! ```
//! use ximl::classify::lr::{LrClassifier, LrParams};
//! use ximl::classify::DocumentClassifier;
//!
//! let classifier = LrClassifier::new(LrParams {
//!     name: None,
//!     n_classes: 2,
//!     n_features: 2,
//!     classes: vec!["non-sport".to_string(), "sport".to_string()],
//!     coeffs: vec![vec![0.5, -0.3]],
//!     intercept: vec![0.1],
//! })
//! .unwrap();
//!
//! let prediction = classifier.classify(&[1.0, 1.0]).unwrap();
//! assert_eq!(prediction.category, "sport");
//! assert_eq!(prediction.probabilities.get("sport"), Some(0.5744425));
//! ```

pub mod activation;
pub mod classifier;
mod loader;
pub mod lr;
pub mod mlp;
pub mod prediction;

pub use activation::Activation;
pub use classifier::{Classifier, ClassifierKind};
pub use lr::{LrClassifier, LrParams};
pub use mlp::{ClassifierType, MlpClassifier, MlpParams};
pub use prediction::{NO_CLASS, Prediction, Probabilities};

use crate::error::Result;

/// A trained model that maps a feature vector onto class probabilities.
///
/// Implementations are read-only after loading, so one instance can be
/// shared across worker threads.
pub trait DocumentClassifier: Send + Sync {
    /// Predict the category of one document.
    ///
    /// An empty feature vector yields the [`NO_CLASS`] prediction. A vector of
    /// the wrong length is a data error.
    fn classify(&self, features: &[f32]) -> Result<Prediction>;

    /// Model name.
    fn name(&self) -> &str;

    /// Expected feature vector length.
    fn n_features(&self) -> usize;

    /// Class labels known to the model.
    fn classes(&self) -> &[String];
}
