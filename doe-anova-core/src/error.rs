use thiserror::Error;

/// Errors raised while validating inputs or evaluating an experiment design.
///
/// Every variant is raised at the point of detection, before any partial
/// computation is kept.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DesignError {
    /// A column holds values of the wrong kind (e.g. text where numbers are required).
    #[error("Column '{column}' must be {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A referenced column does not exist in the table.
    #[error("'{0}' is not a column in the given table")]
    MissingColumn(String),

    /// The input is not a well-formed table.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// An out-of-domain argument.
    #[error("Invalid {name}: {value} (expected {expected})")]
    InvalidArgument {
        name: &'static str,
        value: String,
        expected: String,
    },

    /// A distribution keyword that is not supported.
    #[error("Unsupported distribution '{0}' (expected normal, t, chi-squared, f or ncf)")]
    UnsupportedDistribution(String),

    /// Distribution parameters that are missing, superfluous or out of range.
    #[error("Invalid parameters for {distribution}: {reason}")]
    InvalidParameters {
        distribution: &'static str,
        reason: String,
    },

    /// The observations cannot support a decomposition.
    #[error("Degenerate design: {0}")]
    DegenerateDesign(String),

    /// The contrast has zero estimated standard deviation.
    #[error("Contrast has zero estimated standard deviation (all coefficients zero?)")]
    DegenerateContrast,

    /// Contrast length does not match the number of treatment levels.
    #[error("Contrast has {found} coefficients but the model has {expected} treatment levels")]
    ContrastLength { expected: usize, found: usize },

    /// Coefficients do not sum to zero.
    #[error("Contrast coefficients must sum to zero, got {sum}")]
    NotAContrast { sum: f64 },

    /// The sample-size search hit its cap without reaching the target power.
    #[error("Target power {target} not reached with up to {max_replicates} replicates per level")]
    SearchExhausted { target: f64, max_replicates: u32 },
}

/// Result alias for design operations.
pub type Result<T> = std::result::Result<T, DesignError>;

impl DesignError {
    pub(crate) fn invalid_argument(
        name: &'static str,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            name,
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Check that a probability-like argument lies in `[0, 1]`.
pub(crate) fn check_unit_interval(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DesignError::invalid_argument(
            name,
            value,
            "a value between 0 and 1",
        ))
    }
}
