//! Core analysis routines for doe-anova.
//!
//! This crate provides the single-factor ANOVA engine, contrast construction
//! and inference, a distribution gateway over `statrs`, power analysis for
//! planning experiments, and reporters for presenting results.

pub mod anova;
pub mod contrast;
pub mod design;
pub mod distribution;
pub mod error;
pub mod power;
pub mod report;
pub mod table;

// Re-export main types for convenience
pub use anova::{AnovaDecomposition, AnovaModel, Bound, ConfidenceBound, ErrorBar, TreatmentLevel};
pub use contrast::{group_difference, linear_trend, polynomial_trend, Contrast};
pub use design::{factorial_table, Factor, RUN_ORDER_COLUMN};
pub use distribution::{
    central_ci, central_prob, lower_ci, lower_prob, one_sample_mean_diff, upper_ci, upper_prob,
    Distribution, DistributionKind, NoncentralF,
};
pub use error::{DesignError, Result};
pub use power::{num_observations, num_observations_bounded, test_power, DEFAULT_MAX_REPLICATES};
pub use report::{
    AnovaReport, ContrastSummary, ErrorBarPlot, JsonReporter, PlotPoint, ReportError, Reporter,
    TerminalReporter,
};
pub use table::{AnovaRow, AnovaTable, Column, DataTable, LevelLabel};
