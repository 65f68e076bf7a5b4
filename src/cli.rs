use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analysis::{analyze_placeholder, PlaceholderScoring};
use crate::config::AppConfig;
use crate::error::{EwclError, Result};
use crate::features::{SummaryFeature, SummaryStatistics};
use crate::predictor::CollapsePredictor;

#[derive(Parser)]
#[command(name = "ewcl")]
#[command(author = "EWCL Team")]
#[command(version = "0.1.0")]
#[command(about = "EWCL collapse-score inference service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml, <EWCL_ENV>.toml)
    #[arg(short, long, default_value = "config", env = "EWCL_CONFIG_DIR")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Predict a collapse score for one entropy sequence
    Predict {
        #[command(flatten)]
        input: EntropyArgs,
    },
    /// Print the summary statistics of an entropy sequence
    Features {
        #[command(flatten)]
        input: EntropyArgs,
    },
    /// Run the placeholder analysis on a local PDB file
    Analyze {
        /// Path to the structure file
        path: PathBuf,
        /// Placeholder scoring scheme
        #[arg(long, value_enum, default_value = "line_hash")]
        scoring: ScoringArg,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct EntropyArgs {
    /// Entropy values (comma-separated: 0.1,0.4,0.35)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub values: Vec<f64>,
    /// JSON file holding `[..]` or `{"entropy": [..]}`
    #[arg(long, conflicts_with = "values")]
    pub file: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum ScoringArg {
    #[value(name = "line_hash")]
    LineHash,
    Random,
}

impl From<ScoringArg> for PlaceholderScoring {
    fn from(arg: ScoringArg) -> Self {
        match arg {
            ScoringArg::LineHash => PlaceholderScoring::LineHash,
            ScoringArg::Random => PlaceholderScoring::Random,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntropyFile {
    Bare(Vec<f64>),
    Wrapped { entropy: Vec<f64> },
}

impl EntropyArgs {
    pub fn load(&self) -> Result<Vec<f64>> {
        match &self.file {
            Some(path) => read_entropy_file(path),
            None => Ok(self.values.clone()),
        }
    }
}

/// Read an entropy sequence from a JSON file.
pub fn read_entropy_file(path: &Path) -> Result<Vec<f64>> {
    let content = std::fs::read_to_string(path)?;
    let parsed: EntropyFile = serde_json::from_str(&content).map_err(|e| {
        EwclError::Input(format!("{} is not an entropy list: {e}", path.display()))
    })?;
    Ok(match parsed {
        EntropyFile::Bare(values) => values,
        EntropyFile::Wrapped { entropy } => entropy,
    })
}

pub fn run_predict(config: &AppConfig, input: &EntropyArgs) -> Result<()> {
    let predictor = CollapsePredictor::from_config(&config.model)?;
    let entropy = input.load()?;
    let result = predictor.predict(&entropy)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn run_features(input: &EntropyArgs) -> Result<()> {
    let stats = SummaryStatistics::from_values(&input.load()?)?;

    println!("\n{:<10} {:>14}", "feature", "value");
    println!("{}", "-".repeat(25));
    for feature in SummaryFeature::ALL {
        println!("{:<10} {:>14.6}", feature.as_str(), stats.get(feature));
    }
    println!();
    Ok(())
}

pub fn run_analyze(path: &Path, scoring: PlaceholderScoring) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    let result = analyze_placeholder(&text, scoring);

    println!("\nPLACEHOLDER analysis ({}) of {}", scoring, path.display());
    println!("  lines scored:   {}", result.per_residue_scores.len());
    println!("  collapse score: {:.3}", result.collapse_score);
    println!("  risk level:     {}", result.risk_level);
    println!();
    Ok(())
}
