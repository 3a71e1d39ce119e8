//! Pipeline configuration.
//!
//! A pipeline transforms a raw corpus into features, classifies it and
//! optionally scores the predictions. Its settings live in a JSON file:
//!
//! ```json
//! {
//!   "transformer": {
//!     "kind": "LSI",
//!     "files": {"dictionary": "dict.txt", "tfidf": "tfidf.json", "lsi": "lsi.bin"}
//!   },
//!   "classifier": {"kind": "LogisticRegression", "model": "lr.json"},
//!   "categories": ["sport", "non-sport"],
//!   "batch": {"batch_size": 500, "policy": "skip"},
//!   "threads": 4
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the file.
//!
//! # Examples
//!
//! ```
//! use ximl::config::PipelineConfig;
//! use ximl::corpus::BatchPolicy;
//!
//! let config = PipelineConfig::default();
//! assert!(config.transformer.is_none());
//! assert_eq!(config.batch.policy, BatchPolicy::Abort);
//! ```

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::classify::ClassifierKind;
use crate::corpus::BatchOptions;
use crate::error::{Result, XimlError};
use crate::transform::{LsiFiles, TransformerKind};
use crate::util::read_to_string;

/// Which transformer to load and from where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformerConfig {
    #[serde(default)]
    pub kind: TransformerKind,
    pub files: LsiFiles,
}

/// Which classifier to load and from where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    pub model: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::LogisticRegression,
            model: PathBuf::from("model.json"),
        }
    }
}

/// Settings of a full transform, classify and score run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Transformer applied to `content` first; skipped when the corpus
    /// already carries features.
    pub transformer: Option<TransformerConfig>,
    pub classifier: ClassifierConfig,
    /// Categories scored by the statistics step; empty disables it.
    pub categories: Vec<String>,
    pub batch: BatchOptions,
    /// Worker threads for batch processing; all cores when unset.
    pub threads: Option<usize>,
}

impl PipelineConfig {
    /// Load a configuration file, resolving relative paths against its
    /// directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = read_to_string(path)?;
        let mut config: PipelineConfig = serde_json::from_str(&text).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                XimlError::caught(format!("Bad format of JSON file '{}'", path.display()), e)
            } else {
                XimlError::config(format!("Invalid configuration in '{}': {e}", path.display()))
            }
        })?;
        config.validate()?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        info!("Loaded pipeline configuration from '{}'", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.batch_size == 0 {
            return Err(XimlError::config("batch_size must be greater than 0"));
        }
        if self.threads == Some(0) {
            return Err(XimlError::config("threads must be greater than 0"));
        }
        Ok(())
    }

    /// Prefix every relative model path with `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.classifier.model);
        if let Some(transformer) = &mut self.transformer {
            resolve(&mut transformer.files.dictionary);
            resolve(&mut transformer.files.tfidf);
            resolve(&mut transformer.files.lsi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::BatchPolicy;
    use crate::error::ErrorKind;
    use std::fs;

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(
            &path,
            r#"{
                "transformer": {"files": {"dictionary": "dict.txt", "tfidf": "/abs/tfidf.json", "lsi": "lsi.bin"}},
                "classifier": {"kind": "mlp", "model": "mlp.json"},
                "categories": ["sport", "non-sport"],
                "batch": {"policy": "skip"}
            }"#,
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.classifier.kind, ClassifierKind::Mlp);
        assert_eq!(config.classifier.model, dir.path().join("mlp.json"));
        let transformer = config.transformer.unwrap();
        assert_eq!(transformer.kind, TransformerKind::Lsi);
        assert_eq!(transformer.files.dictionary, dir.path().join("dict.txt"));
        assert_eq!(transformer.files.tfidf, PathBuf::from("/abs/tfidf.json"));
        assert_eq!(config.batch.policy, BatchPolicy::Skip);
        assert_eq!(config.batch.batch_size, 1000);
        assert_eq!(config.threads, None);
    }

    #[test]
    fn test_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");

        fs::write(&path, r#"{"classifier": {"kind": "svm", "model": "x"}}"#).unwrap();
        assert_eq!(
            PipelineConfig::from_file(&path).unwrap_err().kind(),
            ErrorKind::Config
        );

        fs::write(&path, r#"{"threads": 0}"#).unwrap();
        assert_eq!(
            PipelineConfig::from_file(&path).unwrap_err().kind(),
            ErrorKind::Config
        );

        fs::write(&path, r#"{"threads": "#).unwrap();
        assert_eq!(
            PipelineConfig::from_file(&path).unwrap_err().kind(),
            ErrorKind::Caught
        );
    }
}
