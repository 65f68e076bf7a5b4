//! Summary statistics over an entropy sequence and model-specific feature selection.
//!
//! The 8 statistics always come out in the same order:
//! `[count, mean, std, min, p25, median, p75, max]`. A deployed model usually
//! consumes a subset of those, in its own training-time order; that mapping is
//! carried by [`FeatureSelector`] and comes from configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EwclError, Result};

/// Number of statistics produced by [`SummaryStatistics::from_values`].
pub const SUMMARY_LEN: usize = 8;

/// One position of the summary-statistics vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFeature {
    #[serde(alias = "length")]
    Count,
    Mean,
    #[serde(alias = "std_dev")]
    Std,
    Min,
    P25,
    #[serde(alias = "p50")]
    Median,
    P75,
    #[serde(alias = "maxEntropy", alias = "max_entropy")]
    Max,
}

impl SummaryFeature {
    pub const ALL: [SummaryFeature; SUMMARY_LEN] = [
        SummaryFeature::Count,
        SummaryFeature::Mean,
        SummaryFeature::Std,
        SummaryFeature::Min,
        SummaryFeature::P25,
        SummaryFeature::Median,
        SummaryFeature::P75,
        SummaryFeature::Max,
    ];

    /// Position of this statistic in the full summary vector.
    pub fn index(self) -> usize {
        match self {
            SummaryFeature::Count => 0,
            SummaryFeature::Mean => 1,
            SummaryFeature::Std => 2,
            SummaryFeature::Min => 3,
            SummaryFeature::P25 => 4,
            SummaryFeature::Median => 5,
            SummaryFeature::P75 => 6,
            SummaryFeature::Max => 7,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SummaryFeature::Count => "count",
            SummaryFeature::Mean => "mean",
            SummaryFeature::Std => "std",
            SummaryFeature::Min => "min",
            SummaryFeature::P25 => "p25",
            SummaryFeature::Median => "median",
            SummaryFeature::P75 => "p75",
            SummaryFeature::Max => "max",
        }
    }
}

impl fmt::Display for SummaryFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary statistics of one entropy sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub count: f64,
    pub mean: f64,
    /// Population standard deviation (divides by n, not n - 1).
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl SummaryStatistics {
    /// Compute the statistics. Empty or non-finite input is rejected.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(EwclError::Input(
                "empty input: at least one entropy value is required".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(EwclError::Input(format!(
                "entropy value at position {pos} is not a finite number"
            )));
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let stats = Self {
            count: n,
            mean,
            std: variance.sqrt(),
            min: sorted[0],
            p25: percentile_sorted(&sorted, 25.0),
            median: percentile_sorted(&sorted, 50.0),
            p75: percentile_sorted(&sorted, 75.0),
            max: sorted[sorted.len() - 1],
        };

        // Finite inputs can still overflow the sum or the variance.
        if let Some(feature) = SummaryFeature::ALL
            .into_iter()
            .find(|f| !stats.get(*f).is_finite())
        {
            return Err(EwclError::Input(format!(
                "entropy values overflow the {} statistic",
                feature.as_str()
            )));
        }
        Ok(stats)
    }

    pub fn to_vector(&self) -> [f64; SUMMARY_LEN] {
        [
            self.count,
            self.mean,
            self.std,
            self.min,
            self.p25,
            self.median,
            self.p75,
            self.max,
        ]
    }

    pub fn get(&self, feature: SummaryFeature) -> f64 {
        self.to_vector()[feature.index()]
    }
}

/// Percentile with linear interpolation between order statistics.
///
/// `sorted` must be non-empty and ascending.
fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Projects the full summary vector onto the positions a model was trained on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSelector {
    indices: Vec<usize>,
}

impl FeatureSelector {
    /// Identity selection over all 8 statistics.
    pub fn all() -> Self {
        Self {
            indices: (0..SUMMARY_LEN).collect(),
        }
    }

    pub fn from_indices(indices: &[usize]) -> Result<Self> {
        if indices.is_empty() {
            return Err(EwclError::InvalidConfig(
                "feature selection must name at least one statistic".to_string(),
            ));
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= SUMMARY_LEN) {
            return Err(EwclError::FeatureIndex {
                index,
                len: SUMMARY_LEN,
            });
        }
        Ok(Self {
            indices: indices.to_vec(),
        })
    }

    pub fn from_features(features: &[SummaryFeature]) -> Result<Self> {
        let indices: Vec<usize> = features.iter().map(|f| f.index()).collect();
        Self::from_indices(&indices)
    }

    pub fn width(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Named view of the selection, in model input order.
    pub fn features(&self) -> Vec<SummaryFeature> {
        self.indices
            .iter()
            .filter_map(|&i| SummaryFeature::from_index(i))
            .collect()
    }

    /// Pick the configured positions out of `vector`, in order.
    pub fn select(&self, vector: &[f64]) -> Result<Vec<f64>> {
        self.indices
            .iter()
            .map(|&index| {
                vector.get(index).copied().ok_or(EwclError::FeatureIndex {
                    index,
                    len: vector.len(),
                })
            })
            .collect()
    }

    pub fn select_stats(&self, stats: &SummaryStatistics) -> Result<Vec<f64>> {
        self.select(&stats.to_vector())
    }
}

impl Default for FeatureSelector {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn reference_sequence_statistics() {
        let stats = SummaryStatistics::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let v = stats.to_vector();
        let expected = [5.0, 3.0, 2f64.sqrt(), 1.0, 2.0, 3.0, 4.0, 5.0];
        for (got, want) in v.iter().zip(expected.iter()) {
            assert!(approx(*got, *want), "got {got}, want {want}");
        }
    }

    #[test]
    fn percentiles_interpolate_between_order_statistics() {
        // numpy.percentile([1, 2, 3, 4], 25) == 1.75
        let stats = SummaryStatistics::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!(approx(stats.p25, 1.75));
        assert!(approx(stats.median, 2.5));
        assert!(approx(stats.p75, 3.25));
        assert!(approx(stats.min, 1.0));
        assert!(approx(stats.max, 4.0));
    }

    #[test]
    fn single_value_has_zero_spread() {
        let stats = SummaryStatistics::from_values(&[0.42]).unwrap();
        assert!(approx(stats.count, 1.0));
        assert!(approx(stats.std, 0.0));
        assert!(approx(stats.p25, 0.42));
        assert!(approx(stats.p75, 0.42));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = SummaryStatistics::from_values(&[]).unwrap_err();
        assert!(matches!(err, EwclError::Input(ref msg) if msg.contains("empty input")));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let err = SummaryStatistics::from_values(&[1.0, f64::NAN]).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn overflowing_statistics_are_rejected() {
        // Each value is finite, the sum is not.
        let err = SummaryStatistics::from_values(&[1e308, 1e308]).unwrap_err();
        assert!(matches!(err, EwclError::Input(ref msg) if msg.contains("mean")));

        // Mean is 0.0, the variance is not finite.
        let err = SummaryStatistics::from_values(&[1e308, -1e308]).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn selects_count_mean_std_max() {
        let stats = SummaryStatistics::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let selector = FeatureSelector::from_indices(&[0, 1, 2, 7]).unwrap();
        let selected = selector.select_stats(&stats).unwrap();
        assert_eq!(selected.len(), 4);
        assert!(approx(selected[0], 5.0));
        assert!(approx(selected[1], 3.0));
        assert!((selected[2] - 1.4142).abs() < 1e-4);
        assert!(approx(selected[3], 5.0));
    }

    #[test]
    fn named_selection_matches_indices() {
        let names: Vec<SummaryFeature> =
            serde_json::from_str(r#"["length", "mean", "std", "maxEntropy"]"#).unwrap();
        let by_name = FeatureSelector::from_features(&names).unwrap();
        assert_eq!(by_name, FeatureSelector::from_indices(&[0, 1, 2, 7]).unwrap());
        assert_eq!(
            by_name.features(),
            vec![
                SummaryFeature::Count,
                SummaryFeature::Mean,
                SummaryFeature::Std,
                SummaryFeature::Max
            ]
        );
    }

    #[test]
    fn selection_can_reorder() {
        let selector = FeatureSelector::from_indices(&[7, 0]).unwrap();
        let out = selector.select(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        assert_eq!(out, vec![8.0, 1.0]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        assert!(matches!(
            FeatureSelector::from_indices(&[0, 8]),
            Err(EwclError::FeatureIndex { index: 8, len: 8 })
        ));

        // A short vector surfaces the same error at selection time.
        let selector = FeatureSelector::from_indices(&[0, 5]).unwrap();
        assert!(matches!(
            selector.select(&[1.0, 2.0]),
            Err(EwclError::FeatureIndex { index: 5, len: 2 })
        ));
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert!(FeatureSelector::from_indices(&[]).is_err());
    }
}
