//! Command-line interface for doe-anova.

use crate::config::Config;
use clap::{Args, Parser, Subcommand, ValueEnum};
use doe_anova_core::{Bound, Factor, LevelLabel};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "doe-anova")]
#[command(about = "Single-factor ANOVA, contrasts and power analysis for designed experiments")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (defaults to .doe-anova.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a one-way ANOVA to a JSON data file
    Anova(AnovaArgs),
    /// Power of the F-test for a planned experiment
    Power(PowerArgs),
    /// Smallest replicate count reaching a target power
    SampleSize(SampleSizeArgs),
    /// Full-factorial design table in random run order
    Factorial(FactorialArgs),
    /// Quantile of a named distribution
    Quantile(QuantileArgs),
    /// Tail probability of a named distribution
    Tail(TailArgs),
}

/// Output format for ANOVA reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Terminal,
    Json,
}

#[derive(Debug, Args)]
pub struct AnovaArgs {
    /// JSON file mapping column names to arrays
    #[arg(long)]
    pub data: PathBuf,

    /// Column holding the factor levels
    #[arg(long)]
    pub factor: String,

    /// Column holding the numeric response
    #[arg(long)]
    pub response: String,

    /// Test the linear trend across numeric levels
    #[arg(long)]
    pub linear_trend: bool,

    /// Test an orthogonal polynomial trend of this order (repeatable)
    #[arg(long, value_name = "ORDER")]
    pub polynomial: Vec<usize>,

    /// Compare two groups of levels, e.g. "a,b:c" (repeatable)
    #[arg(long, value_name = "A:B")]
    pub compare: Vec<String>,

    /// Test explicit contrast coefficients, e.g. "1,0,-1" (repeatable)
    #[arg(long, value_name = "COEFFICIENTS")]
    pub contrast: Vec<String>,

    /// Tail(s) for contrast p-values and bounds: upper, lower or two-sided
    #[arg(long)]
    pub bound: Option<Bound>,

    /// Confidence level for error bars and contrast bounds (0.0-1.0)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Use per-level standard deviations for contrast standard errors
    #[arg(long)]
    pub unequal_variance: bool,

    /// Write the error-bar plot description as JSON to this file
    #[arg(long, value_name = "OUT")]
    pub plot_json: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Terminal)]
    pub format: Format,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Args)]
pub struct PowerArgs {
    /// Type I error rate
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Smallest difference between level means worth detecting
    #[arg(long)]
    pub delta: f64,

    /// Replicates per level
    #[arg(long)]
    pub replicates: u32,

    /// Number of factor levels
    #[arg(long)]
    pub levels: u32,

    /// Error variance
    #[arg(long)]
    pub variance: f64,
}

#[derive(Debug, Args)]
pub struct SampleSizeArgs {
    /// Type I error rate
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Type II error rate (power = 1 - beta)
    #[arg(long)]
    pub beta: Option<f64>,

    /// Smallest difference between level means worth detecting
    #[arg(long)]
    pub delta: f64,

    /// Number of factor levels
    #[arg(long)]
    pub levels: u32,

    /// Error variance
    #[arg(long)]
    pub variance: f64,

    /// Largest replicate count to try
    #[arg(long)]
    pub max_replicates: Option<u32>,
}

#[derive(Debug, Args)]
pub struct FactorialArgs {
    /// Factor definition "name=level1,level2,..." (repeatable, first varies slowest)
    #[arg(
        long = "factor",
        value_name = "NAME=LEVELS",
        value_parser = parse_factor,
        required = true
    )]
    pub factors: Vec<Factor>,

    /// Seed for the run-order shuffle
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Which tail(s) a quantile or probability refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Side {
    #[default]
    Upper,
    Lower,
    Central,
}

#[derive(Debug, Args)]
pub struct QuantileArgs {
    /// Distribution name: normal, t, chi-squared, f or ncf
    #[arg(long)]
    pub distribution: String,

    /// Probability mass outside the quantile(s)
    #[arg(long)]
    pub alpha: f64,

    /// Distribution parameters, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub params: Vec<f64>,

    #[arg(long, value_enum, default_value_t = Side::Upper)]
    pub side: Side,
}

#[derive(Debug, Args)]
pub struct TailArgs {
    /// Distribution name: normal, t, chi-squared, f or ncf
    #[arg(long)]
    pub distribution: String,

    /// Point at which to evaluate the tail
    #[arg(long, allow_hyphen_values = true)]
    pub x: f64,

    /// Upper end of the interval for central probabilities
    #[arg(long, allow_hyphen_values = true, required_if_eq("side", "central"))]
    pub x2: Option<f64>,

    /// Distribution parameters, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub params: Vec<f64>,

    #[arg(long, value_enum, default_value_t = Side::Upper)]
    pub side: Side,
}

/// Read a level label, treating anything that parses as a number as numeric.
pub fn parse_label(text: &str) -> LevelLabel {
    let text = text.trim();
    match text.parse::<f64>() {
        Ok(value) => LevelLabel::Numeric(value),
        Err(_) => LevelLabel::Text(text.to_string()),
    }
}

/// Parse a comma-separated list of level labels.
pub fn parse_labels(text: &str) -> Vec<LevelLabel> {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_label)
        .collect()
}

fn parse_factor(text: &str) -> Result<Factor, String> {
    let (name, levels) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=LEVELS, got '{text}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("factor name is empty in '{text}'"));
    }
    let levels = parse_labels(levels);
    if levels.is_empty() {
        return Err(format!("factor '{name}' has no levels"));
    }
    Ok(Factor::new(name, levels))
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Only flags that were given override the config.
    pub fn apply_to_config(&self, config: &mut Config) {
        match &self.command {
            Command::Anova(args) => {
                if let Some(confidence) = args.confidence {
                    config.analysis.confidence_level = confidence;
                }
                if let Some(bound) = args.bound {
                    config.analysis.bound = bound;
                }
                if args.unequal_variance {
                    config.analysis.equal_variance = false;
                }
                if args.no_color {
                    config.report.colors = false;
                }
            }
            Command::Power(args) => {
                if let Some(alpha) = args.alpha {
                    config.power.alpha = alpha;
                }
            }
            Command::SampleSize(args) => {
                if let Some(alpha) = args.alpha {
                    config.power.alpha = alpha;
                }
                if let Some(beta) = args.beta {
                    config.power.beta = beta;
                }
                if let Some(max_replicates) = args.max_replicates {
                    config.power.max_replicates = max_replicates;
                }
            }
            Command::Factorial(_) | Command::Quantile(_) | Command::Tail(_) => {}
        }
    }
}
