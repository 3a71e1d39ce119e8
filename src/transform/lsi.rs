//! Latent semantic indexing transformer.
//!
//! A document's known words are weighted by TF-IDF, L2-normalized and
//! projected onto the topic space:
//!
//! ```text
//! w(word)      = count(word) * idf(id(word))
//! features[t]  = Σ  w(word) / |w| * projection[id(word)][t]
//! ```
//!
//! The three model parts are trained by an external toolkit and loaded from
//! separate files, see [`LsiFiles`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{RecordLayout, read_partial_model};
use crate::error::{Result, XimlError};
use crate::util::read_to_string;

/// Files making up a trained LSI model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LsiFiles {
    /// Vocabulary: a JSON object `{word: id}` or `id word` text lines.
    pub dictionary: PathBuf,
    /// IDF weights: a JSON array indexed by id or an object `{"id": weight}`.
    pub tfidf: PathBuf,
    /// Projection matrix in the binary model format.
    pub lsi: PathBuf,
}

/// A loaded LSI model.
#[derive(Debug, Clone)]
pub struct LsiTransformer {
    dictionary: HashMap<String, u32>,
    idf: HashMap<u32, f64>,
    projection: HashMap<u32, Vec<f32>>,
    n_topics: usize,
}

impl LsiTransformer {
    /// Build a transformer from its parts, checking that every vocabulary id
    /// has an IDF weight and a projection row of the same width.
    pub fn new(
        dictionary: HashMap<String, u32>,
        idf: HashMap<u32, f64>,
        projection: HashMap<u32, Vec<f32>>,
    ) -> Result<Self> {
        if dictionary.is_empty() {
            return Err(XimlError::config("LSI dictionary is empty"));
        }
        let ids: HashSet<u32> = dictionary.values().copied().collect();
        if ids.len() != dictionary.len() {
            return Err(XimlError::config(
                "LSI dictionary maps several words to the same id",
            ));
        }
        if projection.len() != dictionary.len() {
            return Err(XimlError::config(format!(
                "LSI projection has {} rows for a vocabulary of {} words",
                projection.len(),
                dictionary.len()
            )));
        }

        let n_topics = projection.values().next().map_or(0, Vec::len);
        if n_topics == 0 {
            return Err(XimlError::config("LSI projection has no topics"));
        }
        for (word, id) in &dictionary {
            if !idf.contains_key(id) {
                return Err(XimlError::config(format!(
                    "No IDF weight for word '{word}' (id {id})"
                )));
            }
            match projection.get(id) {
                None => {
                    return Err(XimlError::config(format!(
                        "No projection row for word '{word}' (id {id})"
                    )));
                }
                Some(row) if row.len() != n_topics => {
                    return Err(XimlError::config(format!(
                        "Projection row {id} has {} topics, expected {n_topics}",
                        row.len()
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(LsiTransformer {
            dictionary,
            idf,
            projection,
            n_topics,
        })
    }

    /// Load the three model files.
    pub fn load(files: &LsiFiles) -> Result<Self> {
        info!("Loading LSI model from {files:?}");
        let dictionary = load_dictionary(&files.dictionary)?;
        let idf = load_idf(&files.tfidf)?;

        let ids: HashSet<u32> = dictionary.values().copied().collect();
        let projection: HashMap<u32, Vec<f32>> =
            read_partial_model(&files.lsi, RecordLayout::Keyed, &ids)?
                .into_iter()
                .collect();

        let transformer = Self::new(dictionary, idf, projection)?;
        info!(
            "LSI model loaded ({} words, {} topics)",
            transformer.vocabulary_size(),
            transformer.n_topics
        );
        Ok(transformer)
    }

    pub fn n_topics(&self) -> usize {
        self.n_topics
    }

    pub fn vocabulary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Project a tokenized document onto the topic space.
    ///
    /// Unknown tokens are ignored; a document without known tokens yields an
    /// empty vector.
    pub fn transform<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<f32> {
        // word -> (id, count), ordered by word
        let mut counts: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
        for token in tokens {
            let token = token.as_ref();
            if let Some(&id) = self.dictionary.get(token) {
                counts.entry(token).or_insert((id, 0)).1 += 1;
            }
        }
        if counts.is_empty() {
            return Vec::new();
        }

        let weights: Vec<(u32, f64)> = counts
            .values()
            .map(|&(id, count)| (id, f64::from(count) * self.idf[&id]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();

        let mut features = vec![0.0f64; self.n_topics];
        for (id, weight) in weights {
            let weight = if norm > 0.0 { weight / norm } else { 0.0 };
            for (feature, &p) in features.iter_mut().zip(&self.projection[&id]) {
                *feature += weight * f64::from(p);
            }
        }
        features.into_iter().map(|f| f as f32).collect()
    }

    /// Split `text` on whitespace and transform the tokens.
    pub fn transform_text(&self, text: &str) -> Vec<f32> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        self.transform(&tokens)
    }
}

fn parse_json(text: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| XimlError::caught(format!("Bad format of JSON file '{}'", path.display()), e))
}

fn parse_id(key: &str, path: &Path) -> Result<u32> {
    key.parse().map_err(|_| {
        XimlError::config(format!("Invalid id '{key}' in '{}'", path.display()))
    })
}

/// Load a vocabulary from either a JSON object or `id word` lines.
///
/// Text lines may carry trailing fields such as a document frequency; only
/// the first two are used.
pub fn load_dictionary(path: &Path) -> Result<HashMap<String, u32>> {
    let text = read_to_string(path)?;
    let dictionary = if text.trim_start().starts_with('{') {
        let Value::Object(entries) = parse_json(&text, path)? else {
            return Err(XimlError::config(format!(
                "JSON value stored in '{}' is not an object",
                path.display()
            )));
        };
        entries
            .into_iter()
            .map(|(word, id)| {
                let id = id
                    .as_u64()
                    .and_then(|id| u32::try_from(id).ok())
                    .ok_or_else(|| {
                        XimlError::config(format!(
                            "Id of word '{word}' in '{}' is not a valid id",
                            path.display()
                        ))
                    })?;
                Ok((word, id))
            })
            .collect::<Result<HashMap<_, _>>>()?
    } else {
        let mut dictionary = HashMap::new();
        for line in text.lines() {
            // `id word [count ...]`; lines without a word (blank, or a lone
            // document-count header) carry no vocabulary entry.
            let mut fields = line.split_whitespace();
            let (Some(id), Some(word)) = (fields.next(), fields.next()) else {
                continue;
            };
            dictionary.insert(word.to_string(), parse_id(id, path)?);
        }
        dictionary
    };

    if dictionary.is_empty() {
        return Err(XimlError::config(format!(
            "No data found in dictionary file '{}'",
            path.display()
        )));
    }
    Ok(dictionary)
}

/// Load IDF weights from a JSON array or object.
pub fn load_idf(path: &Path) -> Result<HashMap<u32, f64>> {
    let text = read_to_string(path)?;
    let weight = |key: &str, value: &Value| {
        value.as_f64().ok_or_else(|| {
            XimlError::config(format!(
                "IDF weight of id {key} in '{}' is not a number",
                path.display()
            ))
        })
    };

    let idf = match parse_json(&text, path)? {
        Value::Array(values) => values
            .iter()
            .enumerate()
            .map(|(id, value)| {
                let id = u32::try_from(id)
                    .map_err(|_| XimlError::config("Too many IDF weights"))?;
                Ok((id, weight(&id.to_string(), value)?))
            })
            .collect::<Result<HashMap<_, _>>>()?,
        Value::Object(entries) => entries
            .iter()
            .map(|(key, value)| Ok((parse_id(key, path)?, weight(key, value)?)))
            .collect::<Result<HashMap<_, _>>>()?,
        _ => {
            return Err(XimlError::config(format!(
                "JSON value stored in '{}' is neither an array nor an object",
                path.display()
            )));
        }
    };

    if idf.is_empty() {
        return Err(XimlError::config(format!(
            "No data found in JSON file '{}'",
            path.display()
        )));
    }
    Ok(idf)
}
