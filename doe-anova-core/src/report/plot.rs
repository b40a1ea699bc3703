use std::io::Write;

use serde::{Deserialize, Serialize};

use super::ReportError;
use crate::anova::{AnovaModel, ErrorBar};
use crate::error::DesignError;
use crate::table::LevelLabel;

/// One raw observation on the scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub x: LevelLabel,
    pub y: f64,
}

/// Scatter plot of the observations with an error bar on each level mean.
///
/// Serialized as JSON for whatever plotting tool renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBarPlot {
    pub x_label: String,
    pub y_label: String,
    pub confidence_level: f64,
    pub points: Vec<PlotPoint>,
    pub error_bars: Vec<ErrorBar>,
}

impl ErrorBarPlot {
    pub fn from_model(model: &AnovaModel, confidence_level: f64) -> Result<Self, DesignError> {
        Ok(Self {
            x_label: model.factor().to_string(),
            y_label: model.response().to_string(),
            confidence_level,
            points: model
                .observations()
                .map(|(label, y)| PlotPoint {
                    x: label.clone(),
                    y,
                })
                .collect(),
            error_bars: model.error_bars(confidence_level)?,
        })
    }

    pub fn write_json(&self, writer: &mut impl Write) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}
