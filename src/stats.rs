//! Accuracy, precision and recall over classified corpora.
//!
//! Input corpora hold documents with a reference `category` and a predicted
//! `season`, as written by
//! [`Classifier::store_classification`](crate::classify::Classifier::store_classification).
//! Documents missing either field are counted as badly formatted and ignored.
//!
//! All figures are percentages rounded to two decimals. A zero denominator
//! yields `0.0` and a warning.

pub mod confusion;

pub use confusion::{BinaryCounts, ConfusionMatrix};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::corpus::document::{CATEGORY_FIELD, SEASON_FIELD};
use crate::corpus::stream::StreamCorpus;
use crate::error::Result;
use crate::util::{create_parent_dirs, round_to};

/// `numerator / denominator * 100`, rounded to two decimals, or `0.0` when
/// the denominator is zero.
pub fn safe_percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        warn!("Zero division error");
        return 0.0;
    }
    round_to(numerator as f64 / denominator as f64 * 100.0, 2)
}

/// Precision and recall of one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    pub precision: f64,
    pub recall: f64,
}

/// The statistics written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub global_accuracy: f64,
    #[serde(flatten)]
    pub categories: BTreeMap<String, ClassStats>,
}

impl StatsReport {
    /// Derive the report for `categories` from a confusion matrix.
    pub fn from_matrix(matrix: &ConfusionMatrix, categories: &[String]) -> Self {
        let mut correct = 0;
        let mut total = 0;
        let mut stats = BTreeMap::new();

        for category in categories {
            let counts = matrix.one_vs_rest(category);
            let tp = counts.true_positives;
            let row = matrix.row_total(category);
            info!(
                "Correctly classified documents of class={category}: {tp} / {row} = {:.2}",
                safe_percentage(tp, row)
            );
            correct += tp;
            total += row;

            let class_stats = ClassStats {
                precision: safe_percentage(tp, tp + counts.false_positives),
                recall: safe_percentage(tp, tp + counts.false_negatives),
            };
            info!(
                "Confusion matrix, precision and recall stats for the {category} class:\n{}",
                confusion_table(category, &counts, &class_stats)
            );
            stats.insert(category.clone(), class_stats);
        }

        let global_accuracy = safe_percentage(correct, total);
        info!("Correctly classified documents: {correct} / {total} = {global_accuracy:.2}");

        StatsReport {
            global_accuracy,
            categories: stats,
        }
    }
}

fn confusion_table(category: &str, counts: &BinaryCounts, stats: &ClassStats) -> String {
    let rule = "=".repeat(40);
    format!(
        "{rule}\nClass={category}\n{rule}\n      | declare H1 |  declare H0 |\n\
         is H1 | {:>10} | {:>11} |\n\
         is H0 | {:>10} | {:>11} |\n\
         {}\nPrecision = {:.2}\nRecall    = {:.2}",
        counts.true_positives,
        counts.false_negatives,
        counts.false_positives,
        counts.true_negatives,
        "-".repeat(40),
        stats.precision,
        stats.recall
    )
}

/// Confusion counts gathered from one or more files.
#[derive(Debug, Clone, Default)]
struct Tally {
    matrix: ConfusionMatrix,
    bad_format: usize,
}

impl Tally {
    fn from_file(path: &Path) -> Result<Tally> {
        let mut tally = Tally::default();
        for doc in StreamCorpus::new(path)?.docs()? {
            let doc = doc?;
            match (doc.get(CATEGORY_FIELD), doc.get(SEASON_FIELD)) {
                (Some(Value::String(actual)), Some(Value::String(predicted))) => {
                    tally.matrix.increment(actual, predicted);
                }
                _ => tally.bad_format += 1,
            }
        }
        Ok(tally)
    }

    fn merge(self, other: Tally) -> Tally {
        Tally {
            matrix: self.matrix.merge(other.matrix),
            bad_format: self.bad_format + other.bad_format,
        }
    }
}

/// Statistics over a set of classified corpus files.
#[derive(Debug, Clone)]
pub struct PredictionStatistics {
    files: Vec<PathBuf>,
    categories: Vec<String>,
}

impl PredictionStatistics {
    pub fn new<P: AsRef<Path>>(files: &[P], categories: &[String]) -> Self {
        PredictionStatistics {
            files: files.iter().map(|f| f.as_ref().to_path_buf()).collect(),
            categories: categories.to_vec(),
        }
    }

    /// Build the confusion matrix of all files, reading them in parallel.
    pub fn confusion_matrix(&self) -> Result<ConfusionMatrix> {
        let tally = self
            .files
            .par_iter()
            .map(|path| Tally::from_file(path))
            .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))?;

        if tally.bad_format > 0 {
            warn!(
                "Missing fields '{CATEGORY_FIELD}' or '{SEASON_FIELD}' in {} documents",
                tally.bad_format
            );
        }
        Ok(tally.matrix)
    }

    pub fn compute(&self) -> Result<StatsReport> {
        let matrix = self.confusion_matrix()?;
        Ok(StatsReport::from_matrix(&matrix, &self.categories))
    }

    /// Compute the statistics and write them as pretty-printed JSON.
    pub fn save(&self, output: &Path) -> Result<StatsReport> {
        info!("Save statistics to '{}'", output.display());
        let report = self.compute()?;
        create_parent_dirs(output)?;
        fs::write(output, serde_json::to_string_pretty(&report)? + "\n")?;
        Ok(report)
    }
}
