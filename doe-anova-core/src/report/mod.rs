use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

use crate::anova::{AnovaModel, Bound, ConfidenceBound, ErrorBar, TreatmentLevel};
use crate::contrast::Contrast;
use crate::error::DesignError;
use crate::table::AnovaTable;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Design(#[from] DesignError),
}

/// Inference on one named contrast, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct ContrastSummary {
    pub name: String,
    pub coefficients: Vec<f64>,
    pub estimate: f64,
    pub std_error: f64,
    pub bound: Bound,
    pub p_value: f64,
    pub confidence_level: f64,
    pub confidence_bound: ConfidenceBound,
}

impl ContrastSummary {
    /// Evaluate a contrast against a fitted model.
    pub fn evaluate(
        model: &AnovaModel,
        name: impl Into<String>,
        contrast: &Contrast,
        bound: Bound,
        confidence_level: f64,
        equal_variance: bool,
    ) -> Result<Self, DesignError> {
        let (estimate, std_error) = model.contrast_estimate(contrast, equal_variance)?;
        let p_value = model.contrast_p_value(contrast, bound, equal_variance)?;
        let confidence_bound =
            model.contrast_confidence_bound(contrast, confidence_level, bound, equal_variance)?;
        Ok(Self {
            name: name.into(),
            coefficients: contrast.coefficients().to_vec(),
            estimate,
            std_error,
            bound,
            p_value,
            confidence_level,
            confidence_bound,
        })
    }
}

/// Everything a reporter needs to present a fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct AnovaReport {
    pub factor: String,
    pub response: String,
    pub table: AnovaTable,
    pub levels: Vec<TreatmentLevel>,
    pub error_bars: Vec<ErrorBar>,
    pub r_squared: f64,
    /// Confidence level of the error bars and contrast bounds (e.g. 0.95).
    pub confidence_level: f64,
    pub contrasts: Vec<ContrastSummary>,
}

impl AnovaReport {
    pub fn from_model(model: &AnovaModel, confidence_level: f64) -> Result<Self, DesignError> {
        Ok(Self {
            factor: model.factor().to_string(),
            response: model.response().to_string(),
            table: model.table(),
            levels: model.levels().to_vec(),
            error_bars: model.error_bars(confidence_level)?,
            r_squared: model.decomposition().r_squared,
            confidence_level,
            contrasts: Vec::new(),
        })
    }

    pub fn with_contrast(mut self, summary: ContrastSummary) -> Self {
        self.contrasts.push(summary);
        self
    }

    /// Significance level matching the report's confidence level.
    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence_level
    }
}

pub trait Reporter: Send + Sync {
    /// Write the report to `writer`.
    fn write(&self, report: &AnovaReport, writer: &mut dyn Write) -> Result<(), ReportError>;

    /// Write the report to standard output.
    fn report(&self, report: &AnovaReport) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.write(report, &mut writer)
    }
}

mod json;
mod plot;
mod terminal;
pub use json::JsonReporter;
pub use plot::{ErrorBarPlot, PlotPoint};
pub use terminal::TerminalReporter;
