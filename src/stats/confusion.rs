//! Confusion matrix over string labels.

use std::collections::BTreeMap;

/// Counts of (true category, predicted category) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: BTreeMap<String, BTreeMap<String, u64>>,
    row_totals: BTreeMap<String, u64>,
    column_totals: BTreeMap<String, u64>,
    total: u64,
}

/// One-vs-rest counts for a single category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryCounts {
    pub true_positives: u64,
    pub false_negatives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one document.
    pub fn increment(&mut self, actual: &str, predicted: &str) {
        *self
            .counts
            .entry(actual.to_string())
            .or_default()
            .entry(predicted.to_string())
            .or_default() += 1;
        *self.row_totals.entry(actual.to_string()).or_default() += 1;
        *self.column_totals.entry(predicted.to_string()).or_default() += 1;
        self.total += 1;
    }

    /// Add the counts of `other` into `self`.
    pub fn merge(mut self, other: ConfusionMatrix) -> ConfusionMatrix {
        for (actual, row) in other.counts {
            let target = self.counts.entry(actual).or_default();
            for (predicted, count) in row {
                *target.entry(predicted).or_default() += count;
            }
        }
        for (label, count) in other.row_totals {
            *self.row_totals.entry(label).or_default() += count;
        }
        for (label, count) in other.column_totals {
            *self.column_totals.entry(label).or_default() += count;
        }
        self.total += other.total;
        self
    }

    pub fn get(&self, actual: &str, predicted: &str) -> u64 {
        self.counts
            .get(actual)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Documents whose true category is `actual`.
    pub fn row_total(&self, actual: &str) -> u64 {
        self.row_totals.get(actual).copied().unwrap_or(0)
    }

    /// Documents predicted as `predicted`.
    pub fn column_total(&self, predicted: &str) -> u64 {
        self.column_totals.get(predicted).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn one_vs_rest(&self, category: &str) -> BinaryCounts {
        let tp = self.get(category, category);
        let fn_ = self.row_total(category) - tp;
        let fp = self.column_total(category) - tp;
        BinaryCounts {
            true_positives: tp,
            false_negatives: fn_,
            false_positives: fp,
            true_negatives: self.total - tp - fn_ - fp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfusionMatrix {
        let mut m = ConfusionMatrix::new();
        for (actual, predicted) in [
            ("sport", "sport"),
            ("sport", "sport"),
            ("sport", "news"),
            ("news", "news"),
            ("news", "sport"),
            ("weather", "news"),
        ] {
            m.increment(actual, predicted);
        }
        m
    }

    #[test]
    fn test_counts_and_marginals() {
        let m = sample();
        assert_eq!(m.total(), 6);
        assert_eq!(m.get("sport", "sport"), 2);
        assert_eq!(m.get("weather", "weather"), 0);
        assert_eq!(m.row_total("sport"), 3);
        assert_eq!(m.column_total("news"), 3);
        assert_eq!(m.column_total("weather"), 0);
    }

    #[test]
    fn test_one_vs_rest() {
        let counts = sample().one_vs_rest("sport");
        assert_eq!(
            counts,
            BinaryCounts {
                true_positives: 2,
                false_negatives: 1,
                false_positives: 1,
                true_negatives: 2,
            }
        );
    }

    #[test]
    fn test_merge_is_commutative() {
        let mut a = ConfusionMatrix::new();
        a.increment("sport", "sport");
        a.increment("news", "sport");
        let mut b = ConfusionMatrix::new();
        b.increment("sport", "news");

        let ab = a.clone().merge(b.clone());
        let ba = b.merge(a);
        assert_eq!(ab, ba);
        assert_eq!(ab.total(), 3);
        assert_eq!(ab.column_total("sport"), 2);
        assert_eq!(ab.merge(ConfusionMatrix::new()).total(), 3);
    }
}
