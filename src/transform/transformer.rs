//! Model-agnostic transformer facade.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::corpus::batch::{BatchOptions, BatchSummary, process_corpus};
use crate::corpus::document::{CONTENT_FIELD, Document, FEATURES_FIELD};
use crate::error::{Result, XimlError};
use crate::transform::lsi::{LsiFiles, LsiTransformer};

/// Supported feature transformers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransformerKind {
    #[default]
    Lsi,
}

impl TransformerKind {
    pub fn name(&self) -> &'static str {
        match self {
            TransformerKind::Lsi => "LSI",
        }
    }
}

impl FromStr for TransformerKind {
    type Err = XimlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LSI" => Ok(TransformerKind::Lsi),
            _ => Err(XimlError::config(format!(
                "Unknown model '{s}'. Choose from [\"LSI\"]"
            ))),
        }
    }
}

impl TryFrom<String> for TransformerKind {
    type Error = XimlError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TransformerKind> for String {
    fn from(kind: TransformerKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for TransformerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A loaded transformer of any supported kind.
#[derive(Debug, Clone)]
pub enum Transformer {
    Lsi(LsiTransformer),
}

impl Transformer {
    pub fn load(kind: TransformerKind, files: &LsiFiles) -> Result<Self> {
        match kind {
            TransformerKind::Lsi => LsiTransformer::load(files).map(Transformer::Lsi),
        }
    }

    pub fn kind(&self) -> TransformerKind {
        match self {
            Transformer::Lsi(_) => TransformerKind::Lsi,
        }
    }

    /// Dimension of the produced feature vectors.
    pub fn n_features(&self) -> usize {
        match self {
            Transformer::Lsi(model) => model.n_topics(),
        }
    }

    /// Transform preprocessed text (whitespace-separated tokens).
    pub fn transform_text(&self, text: &str) -> Vec<f32> {
        match self {
            Transformer::Lsi(model) => model.transform_text(text),
        }
    }

    /// Add a `features` array to every document of `input` that has a
    /// `content` field and write it to `output`.
    pub fn store_transformation(
        &self,
        input: &Path,
        output: &Path,
        options: &BatchOptions,
    ) -> Result<BatchSummary> {
        process_corpus(input, output, options, |doc| self.transform_document(doc))
    }

    fn transform_document(&self, mut doc: Document) -> Result<Option<Document>> {
        let features = match doc.get(CONTENT_FIELD) {
            None => return Ok(None),
            Some(Value::String(text)) => self.transform_text(text),
            Some(other) => {
                return Err(XimlError::data(format!(
                    "Field '{CONTENT_FIELD}' is not a string: {other}"
                )));
            }
        };
        doc.insert(FEATURES_FIELD.to_string(), serde_json::to_value(features)?);
        Ok(Some(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::batch::BatchPolicy;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;

    fn transformer() -> Transformer {
        let dictionary: HashMap<String, u32> =
            [("ski".to_string(), 0), ("sun".to_string(), 1)].into_iter().collect();
        let idf: HashMap<u32, f64> = [(0, 1.0), (1, 1.0)].into_iter().collect();
        let projection: HashMap<u32, Vec<f32>> =
            [(0, vec![1.0, 0.0]), (1, vec![0.0, 1.0])].into_iter().collect();
        Transformer::Lsi(LsiTransformer::new(dictionary, idf, projection).unwrap())
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("lsi".parse::<TransformerKind>().unwrap(), TransformerKind::Lsi);
        assert_eq!("LSI".parse::<TransformerKind>().unwrap(), TransformerKind::Lsi);
        assert_eq!(
            "LDA".parse::<TransformerKind>().unwrap_err().kind(),
            ErrorKind::Config
        );
        assert_eq!(serde_json::to_string(&TransformerKind::Lsi).unwrap(), "\"LSI\"");
    }

    #[test]
    fn test_store_transformation() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("docs.jsonl");
        let output = dir.path().join("features.jsonl");
        let lines = [
            json!({"id": 1, "content": "ski ski"}),
            json!({"id": 2, "title": "no content"}),
            json!({"id": 3, "content": "rain"}),
            json!({"id": 4, "content": 42}),
            json!({"id": 5, "content": "sun"}),
        ];
        fs::write(
            &input,
            lines.iter().map(|l| l.to_string()).collect::<Vec<_>>().join("\n"),
        )
        .unwrap();

        let t = transformer();
        let err = t
            .store_transformation(&input, &output, &BatchOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);

        let options = BatchOptions {
            batch_size: 10,
            policy: BatchPolicy::Skip,
        };
        let summary = t.store_transformation(&input, &output, &options).unwrap();
        assert_eq!(summary.written, 3);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.skipped, 1);

        let docs: Vec<Value> = fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(docs[0]["features"], json!([1.0, 0.0]));
        assert_eq!(docs[1]["features"], json!([]));
        assert_eq!(docs[2]["features"], json!([0.0, 1.0]));
    }
}
