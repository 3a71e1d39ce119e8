//! Classifier output types.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::{Deserialize, Deserializer};

/// Category reported when a document has no features.
pub const NO_CLASS: &str = "_NA_";

/// Class probabilities in the order the classifier produced them.
///
/// Order matters: when two classes tie for the highest probability the one
/// inserted first wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Probabilities {
    entries: Vec<(String, f64)>,
}

impl Probabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Probabilities {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push<S: Into<String>>(&mut self, label: S, probability: f64) {
        self.entries.push((label.into(), probability));
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Label with the highest probability; the first one wins on ties.
    pub fn argmax(&self) -> Option<&str> {
        let mut best: Option<&(String, f64)> = None;
        for entry in &self.entries {
            match best {
                Some((_, p)) if entry.1 <= *p => {}
                _ => best = Some(entry),
            }
        }
        best.map(|(l, _)| l.as_str())
    }
}

impl FromIterator<(String, f64)> for Probabilities {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Probabilities {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Probabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, probability) in &self.entries {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Probabilities {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        map.into_iter()
            .map(|(label, value)| {
                value
                    .as_f64()
                    .map(|p| (label.clone(), p))
                    .ok_or_else(|| serde::de::Error::custom(format!("probability of '{label}' is not a number")))
            })
            .collect()
    }
}

/// The result of classifying one document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct Prediction {
    /// Most likely class, or [`NO_CLASS`].
    pub category: String,
    /// Per-class probabilities.
    pub probabilities: Probabilities,
}

impl Prediction {
    /// Build a prediction, picking the category by argmax.
    pub fn from_probabilities(probabilities: Probabilities) -> Self {
        let category = probabilities.argmax().unwrap_or(NO_CLASS).to_string();
        Prediction {
            category,
            probabilities,
        }
    }

    /// The prediction for a document without features.
    pub fn no_class() -> Self {
        Prediction {
            category: NO_CLASS.to_string(),
            probabilities: Probabilities::new(),
        }
    }

    pub fn is_no_class(&self) -> bool {
        self.category == NO_CLASS && self.probabilities.is_empty()
    }
}
