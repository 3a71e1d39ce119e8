//! # ximl
//!
//! Inference and evaluation for text classifiers trained elsewhere.
//!
//! ## Features
//!
//! - LSI feature extraction from preprocessed text
//! - Logistic-regression and MLP classifiers loaded from JSON parameters
//! - Compact binary format for dense model matrices
//! - Parallel batch processing of JSON-lines corpora
//! - Accuracy, precision and recall over classified corpora
//!
//! ## Example
//!
//! ```
//! use ximl::classify::{Classifier, LrClassifier, LrParams};
//!
//! let classifier = Classifier::LogisticRegression(
//!     LrClassifier::new(LrParams {
//!         name: None,
//!         n_classes: 2,
//!         n_features: 2,
//!         classes: vec!["non-sport".to_string(), "sport".to_string()],
//!         coeffs: vec![vec![0.5, -0.3]],
//!         intercept: vec![0.1],
//!     })
//!     .unwrap(),
//! );
//!
//! let prediction = classifier.classify(&[1.0, 1.0]).unwrap();
//! assert_eq!(prediction.category, "sport");
//! ```

pub mod classify;
pub mod cli;
pub mod codec;
pub mod config;
pub mod corpus;
pub mod error;
pub mod stats;
pub mod transform;
pub mod util;

pub mod prelude {
    pub use crate::classify::{Classifier, ClassifierKind, DocumentClassifier, Prediction};
    pub use crate::corpus::{BatchOptions, BatchPolicy};
    pub use crate::error::{ErrorKind, Result, XimlError};
    pub use crate::stats::PredictionStatistics;
    pub use crate::transform::{LsiFiles, Transformer, TransformerKind};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
