//! PLACEHOLDER structure analysis for uploaded PDB files.
//!
//! There is no structural algorithm here. Each text line is turned into a
//! pseudo-score so the upload endpoint has a stable response shape for the
//! frontend. Every result carries `placeholder: true`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Average score above which a structure is labeled High risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;
/// Average score above which a structure is labeled Medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderScoring {
    /// SHA-256 of each line, reduced to two decimals in `[0, 1)`.
    #[default]
    LineHash,
    /// Uniform random score per line, independent of content.
    Random,
}

impl PlaceholderScoring {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderScoring::LineHash => "line_hash",
            PlaceholderScoring::Random => "random",
        }
    }
}

impl fmt::Display for PlaceholderScoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Strict thresholds: exactly 0.7 is Medium, exactly 0.4 is Low.
    pub fn classify(score: f64) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if score > MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderAnalysis {
    pub per_residue_scores: Vec<f64>,
    pub collapse_score: f64,
    pub risk_level: RiskLevel,
    pub scoring: PlaceholderScoring,
    pub placeholder: bool,
}

/// Deterministic pseudo-score for one line.
pub fn line_hash_score(line: &str) -> f64 {
    let digest = Sha256::digest(line.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % 100) as f64 / 100.0
}

/// Score every line of `text` with the given placeholder scheme.
pub fn analyze_placeholder(text: &str, scoring: PlaceholderScoring) -> PlaceholderAnalysis {
    let lines: Vec<&str> = text.trim().lines().collect();

    let per_residue_scores: Vec<f64> = match scoring {
        PlaceholderScoring::LineHash => lines.iter().map(|l| line_hash_score(l)).collect(),
        PlaceholderScoring::Random => {
            let mut rng = rand::thread_rng();
            lines.iter().map(|_| rng.gen_range(0.0..1.0)).collect()
        }
    };

    let collapse_score = if per_residue_scores.is_empty() {
        0.0
    } else {
        per_residue_scores.iter().sum::<f64>() / per_residue_scores.len() as f64
    };

    PlaceholderAnalysis {
        risk_level: RiskLevel::classify(collapse_score),
        per_residue_scores,
        collapse_score,
        scoring,
        placeholder: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDB: &str = "HEADER    PLANT PROTEIN\n\
ATOM      1  N   THR A   1      17.047  14.099   3.625  1.00 13.79           N\n\
ATOM      2  CA  THR A   1      16.967  12.784   4.338  1.00 10.80           C\n\
END\n";

    #[test]
    fn risk_thresholds_are_strict() {
        assert_eq!(RiskLevel::classify(0.75), RiskLevel::High);
        assert_eq!(RiskLevel::classify(0.5), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::classify(0.7), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(0.4), RiskLevel::Low);
    }

    #[test]
    fn line_hash_is_deterministic_and_bounded() {
        let a = analyze_placeholder(PDB, PlaceholderScoring::LineHash);
        let b = analyze_placeholder(PDB, PlaceholderScoring::LineHash);
        assert_eq!(a, b);
        assert_eq!(a.per_residue_scores.len(), 4);
        assert!(a.per_residue_scores.iter().all(|s| (0.0..1.0).contains(s)));
        assert!(a.placeholder);
    }

    #[test]
    fn average_drives_risk_label() {
        let a = analyze_placeholder(PDB, PlaceholderScoring::LineHash);
        let mean = a.per_residue_scores.iter().sum::<f64>() / 4.0;
        assert!((a.collapse_score - mean).abs() < 1e-12);
        assert_eq!(a.risk_level, RiskLevel::classify(mean));
    }

    #[test]
    fn random_scores_one_per_line() {
        let a = analyze_placeholder(PDB, PlaceholderScoring::Random);
        assert_eq!(a.per_residue_scores.len(), 4);
        assert!(a.per_residue_scores.iter().all(|s| (0.0..1.0).contains(s)));
        assert_eq!(a.scoring, PlaceholderScoring::Random);
    }

    #[test]
    fn blank_file_scores_zero() {
        let a = analyze_placeholder("  \n\n", PlaceholderScoring::LineHash);
        assert!(a.per_residue_scores.is_empty());
        assert_eq!(a.collapse_score, 0.0);
        assert_eq!(a.risk_level, RiskLevel::Low);
    }

    #[test]
    fn serializes_risk_label_as_word() {
        let a = analyze_placeholder("", PlaceholderScoring::LineHash);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["risk_level"], "Low");
        assert_eq!(json["scoring"], "line_hash");
        assert_eq!(json["placeholder"], true);
    }
}
