use std::io::{self, Write};

use colored::Colorize;

use super::{AnovaReport, ContrastSummary, ReportError, Reporter};
use crate::anova::ConfidenceBound;
use crate::table::AnovaRow;

const RULE_WIDTH: usize = 88;

/// A reporter that prints the ANOVA table, level means and contrasts to the terminal.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// Format a number for a table cell; blank cells stay empty.
    fn format_value(value: Option<f64>) -> String {
        match value {
            None => String::new(),
            Some(v) if v.is_infinite() => {
                if v > 0.0 {
                    "inf".to_string()
                } else {
                    "-inf".to_string()
                }
            }
            Some(v) if v != 0.0 && (v.abs() >= 1e6 || v.abs() < 1e-3) => format!("{v:.3e}"),
            Some(v) => format!("{v:.4}"),
        }
    }

    /// Format a p-value, highlighting it when below `alpha`.
    fn format_p_value(&self, p_value: Option<f64>, alpha: f64, width: usize) -> String {
        let text = format!("{:>width$}", Self::format_value(p_value), width = width);
        match p_value {
            Some(p) if self.use_colors && p < alpha => text.green().bold().to_string(),
            Some(_) if self.use_colors => text.yellow().to_string(),
            _ => text,
        }
    }

    /// Shorten a label to fit the 20-character first column.
    fn truncate(text: &str) -> String {
        if text.chars().count() > 20 {
            format!("{}...", text.chars().take(17).collect::<String>())
        } else {
            text.to_string()
        }
    }

    fn format_bound(bound: &ConfidenceBound) -> String {
        let (lower, upper) = bound.interval();
        format!(
            "[{}, {}]",
            Self::format_value(Some(lower)),
            Self::format_value(Some(upper))
        )
    }

    fn print_title(&self, writer: &mut impl Write, title: &str) -> io::Result<()> {
        writeln!(writer)?;
        if self.use_colors {
            writeln!(writer, "{}", title.bold())?;
        } else {
            writeln!(writer, "{}", title)?;
        }
        Ok(())
    }

    /// Print the ANOVA table header.
    fn print_header(&self, writer: &mut impl Write, report: &AnovaReport) -> io::Result<()> {
        self.print_title(
            writer,
            &format!("One-way ANOVA: {} by {}", report.response, report.factor),
        )?;
        let header = format!(
            "{:<20} {:>6} {:>14} {:>14} {:>12} {:>12}",
            "Source", "DoF", "Sum Sq", "Mean Sq", "F", "p-value"
        );
        if self.use_colors {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        Ok(())
    }

    /// Print a single ANOVA table row.
    fn print_row(&self, writer: &mut impl Write, row: &AnovaRow, alpha: f64) -> io::Result<()> {
        let source = Self::truncate(&row.source);
        writeln!(
            writer,
            "{:<20} {:>6} {:>14} {:>14} {:>12} {}",
            source,
            row.dof,
            Self::format_value(row.sum_of_squares),
            Self::format_value(row.mean_square),
            Self::format_value(row.f_ratio),
            self.format_p_value(row.p_value, alpha, 12),
        )
    }

    /// Print the per-level means with their error bars.
    fn print_levels(&self, writer: &mut impl Write, report: &AnovaReport) -> io::Result<()> {
        self.print_title(
            writer,
            &format!(
                "Treatment levels ({:.0}% error bars)",
                report.confidence_level * 100.0
            ),
        )?;
        writeln!(
            writer,
            "{:<20} {:>6} {:>14} {:>14} {:>12} {:>12}",
            "Level", "r", "Mean", "Std Dev", "Effect", "+/-"
        )?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        for (level, bar) in report.levels.iter().zip(&report.error_bars) {
            writeln!(
                writer,
                "{:<20} {:>6} {:>14} {:>14} {:>12} {:>12}",
                level.label.to_string(),
                level.replicates,
                Self::format_value(Some(level.mean)),
                Self::format_value(Some(level.std_dev)),
                Self::format_value(Some(level.effect)),
                Self::format_value(Some(bar.half_width)),
            )?;
        }
        Ok(())
    }

    fn print_contrast(
        &self,
        writer: &mut impl Write,
        contrast: &ContrastSummary,
        alpha: f64,
    ) -> io::Result<()> {
        let name = Self::truncate(&contrast.name);
        writeln!(
            writer,
            "{:<20} {:>10} {:>14} {:>12} {} {:>24}",
            name,
            contrast.bound.to_string(),
            Self::format_value(Some(contrast.estimate)),
            Self::format_value(Some(contrast.std_error)),
            self.format_p_value(Some(contrast.p_value), alpha, 12),
            Self::format_bound(&contrast.confidence_bound),
        )
    }

    fn print_contrasts(&self, writer: &mut impl Write, report: &AnovaReport) -> io::Result<()> {
        if report.contrasts.is_empty() {
            return Ok(());
        }
        self.print_title(writer, "Contrasts")?;
        writeln!(
            writer,
            "{:<20} {:>10} {:>14} {:>12} {:>12} {:>24}",
            "Contrast",
            "Bound",
            "Estimate",
            "Std Err",
            "p-value",
            format!("{:.0}% bound", report.confidence_level * 100.0)
        )?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH + 10))?;
        for contrast in &report.contrasts {
            self.print_contrast(writer, contrast, report.alpha())?;
        }
        Ok(())
    }

    /// Print the summary footer.
    fn print_summary(&self, writer: &mut impl Write, report: &AnovaReport) -> io::Result<()> {
        let treatment_p = report.table.rows().first().and_then(|row| row.p_value);

        writeln!(writer)?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;

        let summary_label = "Summary:";
        if self.use_colors {
            write!(writer, "{} ", summary_label.bold())?;
        } else {
            write!(writer, "{} ", summary_label)?;
        }

        let r_squared = format!("R^2 = {:.4}", report.r_squared);
        let significant = matches!(treatment_p, Some(p) if p < report.alpha());
        let verdict = if significant {
            format!("{} effect significant", report.factor)
        } else {
            format!("no significant {} effect", report.factor)
        };

        if self.use_colors {
            let verdict = if significant {
                verdict.green()
            } else {
                verdict.yellow()
            };
            writeln!(writer, "{}, {}", r_squared, verdict)?;
        } else {
            writeln!(writer, "{}, {}", r_squared, verdict)?;
        }

        writeln!(writer)?;
        Ok(())
    }

    /// Write the full report to any writer.
    pub fn write_report(&self, writer: &mut impl Write, report: &AnovaReport) -> io::Result<()> {
        self.print_header(writer, report)?;
        for row in report.table.rows() {
            self.print_row(writer, row, report.alpha())?;
        }
        self.print_levels(writer, report)?;
        self.print_contrasts(writer, report)?;
        self.print_summary(writer, report)
    }
}

impl Reporter for TerminalReporter {
    fn write(&self, report: &AnovaReport, mut writer: &mut dyn Write) -> Result<(), ReportError> {
        self.write_report(&mut writer, report)?;
        Ok(())
    }
}
