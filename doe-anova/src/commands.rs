//! Subcommand execution.
//!
//! Each command writes its result to the supplied writer so the binary can
//! hand it stdout and tests can hand it a buffer.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{bail, Context, Result};
use doe_anova_core::distribution::{
    central_ci, central_prob, lower_ci, lower_prob, upper_ci, upper_prob,
};
use doe_anova_core::{
    factorial_table, num_observations_bounded, test_power, AnovaModel, AnovaReport, Contrast,
    ContrastSummary, DataTable, Distribution, ErrorBarPlot, JsonReporter, Reporter,
    TerminalReporter,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::cli::{
    parse_labels, AnovaArgs, Command, FactorialArgs, Format, PowerArgs, QuantileArgs,
    SampleSizeArgs, Side, TailArgs,
};
use crate::config::Config;

/// Run a parsed command against the effective configuration.
pub fn run(command: &Command, config: &Config, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Anova(args) => run_anova(args, config, out),
        Command::Power(args) => run_power(args, config, out),
        Command::SampleSize(args) => run_sample_size(args, config, out),
        Command::Factorial(args) => run_factorial(args, out),
        Command::Quantile(args) => run_quantile(args, out),
        Command::Tail(args) => run_tail(args, out),
    }
}

/// Fit the model and collect every requested contrast into a report.
pub fn build_report(
    model: &AnovaModel,
    args: &AnovaArgs,
    config: &Config,
) -> Result<AnovaReport> {
    let analysis = &config.analysis;
    let mut report = AnovaReport::from_model(model, analysis.confidence_level)?;

    let mut contrasts: Vec<(String, Contrast)> = Vec::new();
    if args.linear_trend {
        contrasts.push(("linear trend".to_string(), model.linear_trend_contrast()?));
    }
    for &order in &args.polynomial {
        let contrast = model
            .polynomial_trend_contrast(order)
            .with_context(|| format!("Failed to build order-{order} trend contrast"))?;
        contrasts.push((format!("order-{order} trend"), contrast));
    }
    for text in &args.compare {
        let Some((a, b)) = text.split_once(':') else {
            bail!("Comparison '{text}' must have the form A:B");
        };
        let contrast = model
            .group_difference_contrast(&parse_labels(a), &parse_labels(b))
            .with_context(|| format!("Failed to build comparison '{text}'"))?;
        contrasts.push((format!("{a} vs {b}"), contrast));
    }
    for text in &args.contrast {
        let coefficients = text
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Contrast '{text}' is not a list of numbers"))?;
        contrasts.push((format!("[{text}]"), Contrast::new(coefficients)));
    }

    for (name, contrast) in contrasts {
        let summary = ContrastSummary::evaluate(
            model,
            name.as_str(),
            &contrast,
            analysis.bound,
            analysis.confidence_level,
            analysis.equal_variance,
        )
        .with_context(|| format!("Failed to evaluate contrast '{name}'"))?;
        debug!(
            contrast = %name,
            estimate = summary.estimate,
            p_value = summary.p_value,
            "Evaluated contrast"
        );
        report = report.with_contrast(summary);
    }

    Ok(report)
}

fn run_anova(args: &AnovaArgs, config: &Config, out: &mut dyn Write) -> Result<()> {
    let table = DataTable::from_json_file(&args.data)
        .with_context(|| format!("Failed to load data file: {}", args.data.display()))?;
    let model = AnovaModel::fit(&table, &args.factor, &args.response)
        .with_context(|| format!("Failed to fit {} by {}", args.response, args.factor))?;
    info!(
        observations = model.decomposition().observations,
        levels = model.levels().len(),
        "Fitted model"
    );

    let report = build_report(&model, args, config)?;
    let reporter: Box<dyn Reporter> = match args.format {
        Format::Json => Box::new(JsonReporter::new()),
        Format::Terminal if config.report.colors => Box::new(TerminalReporter::new()),
        Format::Terminal => Box::new(TerminalReporter::without_colors()),
    };
    reporter.write(&report, out)?;

    if let Some(path) = &args.plot_json {
        let plot = ErrorBarPlot::from_model(&model, config.analysis.confidence_level)?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create plot file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        plot.write_json(&mut writer)?;
        writer.flush()?;
        info!(path = %path.display(), "Wrote error-bar plot");
    }

    Ok(())
}

fn run_power(args: &PowerArgs, config: &Config, out: &mut dyn Write) -> Result<()> {
    let power = test_power(
        config.power.alpha,
        args.delta,
        args.replicates,
        args.levels,
        args.variance,
    )?;
    writeln!(
        out,
        "Power with {} replicates per level at alpha = {}: {:.4}",
        args.replicates, config.power.alpha, power
    )?;
    Ok(())
}

fn run_sample_size(args: &SampleSizeArgs, config: &Config, out: &mut dyn Write) -> Result<()> {
    let power = &config.power;
    let replicates = num_observations_bounded(
        power.alpha,
        power.beta,
        args.delta,
        args.levels,
        args.variance,
        power.max_replicates,
    )?;
    let achieved = test_power(
        power.alpha,
        args.delta,
        replicates,
        args.levels,
        args.variance,
    )?;
    writeln!(
        out,
        "Replicates per level: {} ({} runs in total, power {:.4})",
        replicates,
        u64::from(replicates) * u64::from(args.levels),
        achieved
    )?;
    Ok(())
}

fn run_factorial(args: &FactorialArgs, out: &mut dyn Write) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let table = factorial_table(&args.factors, &mut rng)?;
    let runs = table.rows().unwrap_or(0);
    debug!(runs, "Generated factorial design");
    serde_json::to_writer_pretty(&mut *out, &table)?;
    writeln!(out)?;
    Ok(())
}

fn run_quantile(args: &QuantileArgs, out: &mut dyn Write) -> Result<()> {
    let distribution = Distribution::from_name(&args.distribution, &args.params)?;
    match args.side {
        Side::Upper => writeln!(out, "{}", upper_ci(&distribution, args.alpha)?)?,
        Side::Lower => writeln!(out, "{}", lower_ci(&distribution, args.alpha)?)?,
        Side::Central => {
            let [low, high] = central_ci(&distribution, args.alpha)?;
            writeln!(out, "{low} {high}")?;
        }
    }
    Ok(())
}

fn run_tail(args: &TailArgs, out: &mut dyn Write) -> Result<()> {
    let distribution = Distribution::from_name(&args.distribution, &args.params)?;
    let probability = match (args.side, args.x2) {
        (Side::Upper, _) => upper_prob(&distribution, args.x),
        (Side::Lower, _) => lower_prob(&distribution, args.x),
        (Side::Central, Some(x2)) => central_prob(&distribution, args.x, x2),
        (Side::Central, None) => bail!("A central probability needs --x2"),
    };
    writeln!(out, "{probability}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::parse_from(args);
        let mut config = Config::default();
        cli.apply_to_config(&mut config);
        let mut buffer = Vec::new();
        run(&cli.command, &config, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    #[test]
    fn test_quantile_command() {
        let output = run_args(&[
            "doe-anova",
            "quantile",
            "--distribution",
            "normal",
            "--alpha",
            "0.05",
        ])
        .unwrap();
        let value: f64 = output.trim().parse().unwrap();
        assert!((value - 1.644_853_6).abs() < 1e-6);
    }

    #[test]
    fn test_central_quantile_command() {
        let output = run_args(&[
            "doe-anova",
            "quantile",
            "--distribution",
            "t",
            "--params",
            "10",
            "--alpha",
            "0.05",
            "--side",
            "central",
        ])
        .unwrap();
        let values: Vec<f64> = output
            .split_whitespace()
            .map(|part| part.parse().unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert!((values[1] - 2.228_138_9).abs() < 1e-5);
        assert!((values[0] + values[1]).abs() < 1e-9);
    }

    #[test]
    fn test_tail_command() {
        let output = run_args(&[
            "doe-anova",
            "tail",
            "--distribution",
            "normal",
            "--x",
            "-1.96",
            "--x2",
            "1.96",
            "--side",
            "central",
        ])
        .unwrap();
        let value: f64 = output.trim().parse().unwrap();
        assert!((value - 0.95).abs() < 1e-3);
    }

    #[test]
    fn test_unknown_distribution_fails() {
        let result = run_args(&[
            "doe-anova",
            "quantile",
            "--distribution",
            "cauchy",
            "--alpha",
            "0.1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sample_size_command() {
        let output = run_args(&[
            "doe-anova",
            "sample-size",
            "--delta",
            "2",
            "--levels",
            "3",
            "--variance",
            "1",
        ])
        .unwrap();
        assert!(output.starts_with("Replicates per level: "));
    }

    #[test]
    fn test_sample_size_respects_cap() {
        let result = run_args(&[
            "doe-anova",
            "sample-size",
            "--delta",
            "0.01",
            "--levels",
            "3",
            "--variance",
            "10",
            "--max-replicates",
            "5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_factorial_command_is_seeded() {
        let args = [
            "doe-anova",
            "factorial",
            "--factor",
            "temp=150,200",
            "--factor",
            "catalyst=A,B,C",
            "--seed",
            "3",
        ];
        let first = run_args(&args).unwrap();
        let second = run_args(&args).unwrap();
        assert_eq!(first, second);

        let table: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(table["temp"].as_array().unwrap().len(), 6);
        assert_eq!(table["Run_Order"].as_array().unwrap().len(), 6);
    }
}
