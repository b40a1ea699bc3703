use std::io::Write;

use super::{AnovaReport, ReportError, Reporter};

/// A reporter that writes the full report as JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonReporter {
    pretty: bool,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Single-line output, e.g. for piping into other tools.
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Reporter for JsonReporter {
    fn write(&self, report: &AnovaReport, writer: &mut dyn Write) -> Result<(), ReportError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, report)?;
        } else {
            serde_json::to_writer(&mut *writer, report)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anova::AnovaModel;
    use crate::table::LevelLabel;

    #[test]
    fn test_json_report() {
        let model = AnovaModel::from_observations(
            "group",
            "score",
            ["x", "x", "y", "y", "z", "z"].into_iter().map(LevelLabel::from).collect(),
            vec![1.0, 1.5, 2.0, 2.5, 4.0, 4.5],
        )
        .unwrap();
        let report = AnovaReport::from_model(&model, 0.9).unwrap();

        let mut buffer = Vec::new();
        JsonReporter::compact().write(&report, &mut buffer).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["factor"], "group");
        assert_eq!(value["table"]["rows"][2]["source"], "Total");
        assert!(value["table"]["rows"][2].get("mean_square").is_none());
        assert_eq!(value["levels"].as_array().unwrap().len(), 3);
    }
}
