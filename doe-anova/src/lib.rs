//! doe-anova: analyse and plan single-factor designed experiments.
//!
//! This library holds the command-line surface: argument parsing,
//! configuration loading and subcommand execution on top of
//! `doe-anova-core`.

pub mod cli;
pub mod commands;
pub mod config;

pub use doe_anova_core::{AnovaReport, JsonReporter, ReportError, Reporter, TerminalReporter};

pub use cli::{Cli, Command};
pub use commands::run;
pub use config::Config;
