//! Integration tests for doe-anova.
//!
//! These drive whole subcommands through `commands::run` with data and
//! config files written to temporary directories.

use clap::Parser;
use doe_anova::{commands, Cli, Config};
use doe_anova_core::{Bound, ErrorBarPlot};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DOSE_DATA: &str = r#"{
    "dose": [10, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40],
    "growth": [7.0, 8.0, 9.0, 8.5, 9.5, 10.5, 10.0, 11.0, 12.0, 10.5, 11.5, 12.5]
}"#;

fn write_data(dir: &TempDir) -> String {
    let path = dir.path().join("dose.json");
    fs::write(&path, DOSE_DATA).unwrap();
    path.to_string_lossy().into_owned()
}

fn run_cli(args: &[&str], config_path: Option<&Path>) -> anyhow::Result<String> {
    let cli = Cli::parse_from(args);
    let mut config = Config::load_from(config_path.or(cli.config.as_deref()))?;
    cli.apply_to_config(&mut config);
    let mut buffer = Vec::new();
    commands::run(&cli.command, &config, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// The terminal report carries the table, level means and requested contrasts.
#[test]
fn test_anova_terminal_report() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);

    let output = run_cli(
        &[
            "doe-anova",
            "anova",
            "--data",
            data.as_str(),
            "--factor",
            "dose",
            "--response",
            "growth",
            "--linear-trend",
            "--compare",
            "10:40",
            "--no-color",
        ],
        None,
    )
    .unwrap();

    assert!(output.contains("One-way ANOVA: growth by dose"));
    assert!(output.contains("Error"));
    assert!(output.contains("Total"));
    assert!(output.contains("linear trend"));
    assert!(output.contains("10 vs 40"));
    assert!(output.contains("R^2 = "));
}

/// JSON output parses back and reflects the decomposition.
#[test]
fn test_anova_json_report() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);

    let output = run_cli(
        &[
            "doe-anova",
            "anova",
            "--data",
            data.as_str(),
            "--factor",
            "dose",
            "--response",
            "growth",
            "--polynomial",
            "2",
            "--contrast",
            "1,-1,-1,1",
            "--format",
            "json",
        ],
        None,
    )
    .unwrap();

    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    let rows = report["table"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["source"], "dose");
    assert_eq!(rows[0]["dof"], 3);
    assert_eq!(rows[1]["dof"], 8);
    assert!((rows[0]["f_ratio"].as_f64().unwrap() - 7.5).abs() < 1e-9);

    let contrasts = report["contrasts"].as_array().unwrap();
    assert_eq!(contrasts.len(), 2);
    // The quadratic trend and its raw coefficients test the same hypothesis.
    let p_poly = contrasts[0]["p_value"].as_f64().unwrap();
    let p_raw = contrasts[1]["p_value"].as_f64().unwrap();
    assert!((p_poly - p_raw).abs() < 1e-9);
}

#[test]
fn test_anova_writes_plot_json() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let plot_path = dir.path().join("plot.json");
    let plot_arg = plot_path.to_string_lossy().into_owned();

    run_cli(
        &[
            "doe-anova",
            "anova",
            "--data",
            data.as_str(),
            "--factor",
            "dose",
            "--response",
            "growth",
            "--plot-json",
            plot_arg.as_str(),
            "--confidence",
            "0.9",
            "--no-color",
        ],
        None,
    )
    .unwrap();

    let plot_text = fs::read_to_string(&plot_path).unwrap();
    let plot: ErrorBarPlot = serde_json::from_str(&plot_text).unwrap();
    assert_eq!(plot.x_label, "dose");
    assert_eq!(plot.y_label, "growth");
    assert_eq!(plot.confidence_level, 0.9);
    assert_eq!(plot.points.len(), 12);
    assert_eq!(plot.error_bars.len(), 4);
}

/// Values from the config file apply unless a flag overrides them.
#[test]
fn test_config_file_feeds_analysis() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let config_path = dir.path().join("doe.toml");
    fs::write(
        &config_path,
        "[analysis]\nbound = \"upper\"\nconfidence_level = 0.9\n\n[report]\ncolors = false\n",
    )
    .unwrap();

    let cli = Cli::parse_from([
        "doe-anova",
        "anova",
        "--data",
        data.as_str(),
        "--factor",
        "dose",
        "--response",
        "growth",
        "--confidence",
        "0.99",
    ]);
    let mut config = Config::load(&config_path).unwrap();
    cli.apply_to_config(&mut config);

    assert_eq!(config.analysis.bound, Bound::Upper);
    assert_eq!(config.analysis.confidence_level, 0.99);
    assert!(!config.report.colors);

    let output = run_cli(
        &[
            "doe-anova",
            "anova",
            "--data",
            data.as_str(),
            "--factor",
            "dose",
            "--response",
            "growth",
            "--linear-trend",
        ],
        Some(&config_path),
    )
    .unwrap();
    assert!(output.contains("upper"));
    assert!(output.contains("90% bound"));
    assert!(!output.contains('\u{1b}'));
}

#[test]
fn test_anova_missing_column_fails() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);

    let error = run_cli(
        &[
            "doe-anova",
            "anova",
            "--data",
            data.as_str(),
            "--factor",
            "dose",
            "--response",
            "height",
        ],
        None,
    )
    .unwrap_err();
    assert!(format!("{error:#}").contains("height"));
}

#[test]
fn test_anova_rejects_non_contrast() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);

    let result = run_cli(
        &[
            "doe-anova",
            "anova",
            "--data",
            data.as_str(),
            "--factor",
            "dose",
            "--response",
            "growth",
            "--contrast",
            "1,1,0,0",
        ],
        None,
    );
    assert!(result.is_err());
}

#[test]
fn test_anova_missing_data_file() {
    let result = run_cli(
        &[
            "doe-anova",
            "anova",
            "--data",
            "/nonexistent/data.json",
            "--factor",
            "a",
            "--response",
            "b",
        ],
        None,
    );
    assert!(result.is_err());
}

#[test]
fn test_power_command() {
    let output = run_cli(
        &[
            "doe-anova",
            "power",
            "--delta",
            "2",
            "--replicates",
            "6",
            "--levels",
            "4",
            "--variance",
            "1",
        ],
        None,
    )
    .unwrap();
    let power: f64 = output.trim().rsplit(' ').next().unwrap().parse().unwrap();
    assert!(power > 0.05 && power <= 1.0);
}
