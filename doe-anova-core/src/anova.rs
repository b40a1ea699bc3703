//! Single-factor analysis of variance.
//!
//! [`AnovaModel`] partitions the variability of a response into a treatment
//! component and an error component, and answers contrast questions about the
//! treatment-level means.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contrast::{self, Contrast};
use crate::distribution::Distribution;
use crate::error::{check_unit_interval, DesignError, Result};
use crate::table::{AnovaRow, AnovaTable, DataTable, LevelLabel};

/// Which tail(s) an inference is made on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bound {
    Upper,
    Lower,
    #[default]
    TwoSided,
}

impl Bound {
    pub fn as_str(self) -> &'static str {
        match self {
            Bound::Upper => "upper",
            Bound::Lower => "lower",
            Bound::TwoSided => "two-sided",
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bound {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "upper" => Ok(Bound::Upper),
            "lower" => Ok(Bound::Lower),
            "two-sided" => Ok(Bound::TwoSided),
            other => Err(DesignError::invalid_argument(
                "bound",
                other,
                "'upper', 'lower', or 'two-sided'",
            )),
        }
    }
}

/// A confidence bound on a contrast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "bound")]
pub enum ConfidenceBound {
    Upper { upper: f64 },
    Lower { lower: f64 },
    TwoSided { lower: f64, upper: f64 },
}

impl ConfidenceBound {
    /// The bound as an interval, open-ended on the unbounded side.
    pub fn interval(&self) -> (f64, f64) {
        match *self {
            ConfidenceBound::Upper { upper } => (f64::NEG_INFINITY, upper),
            ConfidenceBound::Lower { lower } => (lower, f64::INFINITY),
            ConfidenceBound::TwoSided { lower, upper } => (lower, upper),
        }
    }

    pub fn width(&self) -> f64 {
        let (lower, upper) = self.interval();
        upper - lower
    }
}

/// Summary statistics for one treatment level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentLevel {
    pub label: LevelLabel,
    /// Number of observations at this level.
    pub replicates: usize,
    pub mean: f64,
    /// Population (divide-by-r) standard deviation of the level's responses.
    pub std_dev: f64,
    /// Least-squares treatment effect: level mean minus grand mean.
    pub effect: f64,
}

/// The sum-of-squares decomposition of a one-way layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaDecomposition {
    pub observations: usize,
    pub grand_mean: f64,
    pub ss_total: f64,
    pub ss_treatment: f64,
    pub ss_error: f64,
    pub dof_total: usize,
    pub dof_treatment: usize,
    pub dof_error: usize,
    pub ms_treatment: f64,
    pub ms_error: f64,
    pub f_ratio: f64,
    /// Upper-tail F(dof_treatment, dof_error) probability of the F-ratio.
    pub p_value: f64,
    /// Upper-tail χ²(dof_error) probability of the error mean square.
    pub error_p_value: f64,
    pub r_squared: f64,
}

/// Error bar for a treatment-level mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBar {
    pub label: LevelLabel,
    pub mean: f64,
    pub half_width: f64,
}

/// A fitted single-factor ANOVA. Immutable once fitted.
#[derive(Debug, Clone)]
pub struct AnovaModel {
    factor: String,
    response: String,
    labels: Vec<LevelLabel>,
    responses: Vec<f64>,
    levels: Vec<TreatmentLevel>,
    decomposition: AnovaDecomposition,
}

impl AnovaModel {
    /// Fit the model to two columns of a table.
    ///
    /// # Errors
    /// `MissingColumn` if either column is absent, `TypeMismatch` if the
    /// response column is not numeric, `DegenerateDesign` if the data cannot
    /// support the decomposition.
    pub fn fit(table: &DataTable, factor: &str, response: &str) -> Result<Self> {
        let labels = table.column(factor)?.labels();
        let responses = table.numeric_column(response)?.to_vec();
        Self::from_observations(factor, response, labels, responses)
    }

    /// Fit the model to aligned label/response sequences.
    ///
    /// # Errors
    /// `InvalidTable` for misaligned sequences, `InvalidArgument` for
    /// non-finite responses, `DegenerateDesign` for fewer than two levels or
    /// no error degrees of freedom.
    pub fn from_observations(
        factor: impl Into<String>,
        response: impl Into<String>,
        labels: Vec<LevelLabel>,
        responses: Vec<f64>,
    ) -> Result<Self> {
        let factor = factor.into();
        let response = response.into();

        if labels.len() != responses.len() {
            return Err(DesignError::InvalidTable(format!(
                "{} labels but {} responses",
                labels.len(),
                responses.len()
            )));
        }
        if let Some(bad) = responses.iter().find(|y| !y.is_finite()) {
            return Err(DesignError::invalid_argument(
                "response",
                bad,
                "finite response values",
            ));
        }

        let mut groups: BTreeMap<&LevelLabel, Vec<f64>> = BTreeMap::new();
        for (label, &y) in labels.iter().zip(&responses) {
            groups.entry(label).or_default().push(y);
        }

        let n = responses.len();
        let v = groups.len();
        if v < 2 {
            return Err(DesignError::DegenerateDesign(format!(
                "factor '{factor}' has {v} level(s), at least two are required"
            )));
        }
        if n <= v {
            return Err(DesignError::DegenerateDesign(format!(
                "{n} observations over {v} levels leave no error degrees of freedom"
            )));
        }

        // Total
        let n_f = n as f64;
        let grand_mean = responses.iter().sum::<f64>() / n_f;
        let ss_total: f64 = responses.iter().map(|y| (y - grand_mean).powi(2)).sum();
        let dof_total = n - 1;

        // Treatment levels, accumulating the within-level sum of squares
        let mut ss_error = 0.0;
        let levels: Vec<TreatmentLevel> = groups
            .into_iter()
            .map(|(label, values)| {
                let r = values.len() as f64;
                let mean = values.iter().sum::<f64>() / r;
                let within: f64 = values.iter().map(|y| (y - mean).powi(2)).sum();
                ss_error += within;
                TreatmentLevel {
                    label: label.clone(),
                    replicates: values.len(),
                    mean,
                    std_dev: (within / r).sqrt(),
                    effect: mean - grand_mean,
                }
            })
            .collect();

        // Treatment
        let ss_treatment: f64 = levels
            .iter()
            .map(|level| level.replicates as f64 * level.effect.powi(2))
            .sum();
        let dof_treatment = v - 1;
        let ms_treatment = ss_treatment / dof_treatment as f64;
        let r_squared = if ss_total > 0.0 {
            (ss_treatment / ss_total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        // Error
        let dof_error = dof_total - dof_treatment;
        let ms_error = ss_error / dof_error as f64;

        let f_ratio = ms_treatment / ms_error;
        let p_value = Distribution::f(dof_treatment as f64, dof_error as f64)?.sf(f_ratio);
        let error_p_value = Distribution::chi_squared(dof_error as f64)?.sf(ms_error);

        debug!(
            factor = %factor,
            response = %response,
            observations = n,
            levels = v,
            f_ratio,
            p_value,
            "fitted one-way ANOVA"
        );

        Ok(Self {
            factor,
            response,
            labels,
            responses,
            levels,
            decomposition: AnovaDecomposition {
                observations: n,
                grand_mean,
                ss_total,
                ss_treatment,
                ss_error,
                dof_total,
                dof_treatment,
                dof_error,
                ms_treatment,
                ms_error,
                f_ratio,
                p_value,
                error_p_value,
                r_squared,
            },
        })
    }

    pub fn factor(&self) -> &str {
        &self.factor
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn decomposition(&self) -> &AnovaDecomposition {
        &self.decomposition
    }

    /// Treatment levels in ascending label order.
    pub fn levels(&self) -> &[TreatmentLevel] {
        &self.levels
    }

    pub fn level_labels(&self) -> Vec<LevelLabel> {
        self.levels
            .iter()
            .map(|level| level.label.clone())
            .collect()
    }

    pub fn replicates(&self) -> Vec<usize> {
        self.levels.iter().map(|level| level.replicates).collect()
    }

    pub fn level_means(&self) -> Vec<f64> {
        self.levels.iter().map(|level| level.mean).collect()
    }

    /// The raw observations the model was fitted to, as (label, response) pairs.
    pub fn observations(&self) -> impl Iterator<Item = (&LevelLabel, f64)> {
        self.labels.iter().zip(self.responses.iter().copied())
    }

    /// The ANOVA summary table with rows for the factor, Error and Total.
    pub fn table(&self) -> AnovaTable {
        let d = &self.decomposition;
        AnovaTable::from_rows(vec![
            AnovaRow {
                source: self.factor.clone(),
                dof: d.dof_treatment,
                sum_of_squares: Some(d.ss_treatment),
                mean_square: Some(d.ms_treatment),
                f_ratio: Some(d.f_ratio),
                p_value: Some(d.p_value),
            },
            AnovaRow {
                source: "Error".to_string(),
                dof: d.dof_error,
                sum_of_squares: Some(d.ss_error),
                mean_square: Some(d.ms_error),
                f_ratio: None,
                p_value: Some(d.error_p_value),
            },
            AnovaRow {
                source: "Total".to_string(),
                dof: d.dof_total,
                sum_of_squares: Some(d.ss_total),
                mean_square: None,
                f_ratio: None,
                p_value: None,
            },
        ])
    }

    /// Point estimate and estimated standard deviation of a contrast.
    ///
    /// With `equal_variance` the pooled error mean square is used:
    /// σ̂² = MSE·Σ cᵢ²/rᵢ. Otherwise each level contributes its own spread:
    /// σ̂² = Σ sᵢ·cᵢ²/rᵢ.
    ///
    /// # Errors
    /// `ContrastLength`/`NotAContrast` for an invalid contrast,
    /// `DegenerateContrast` if σ̂ is zero.
    pub fn contrast_estimate(
        &self,
        contrast: &Contrast,
        equal_variance: bool,
    ) -> Result<(f64, f64)> {
        contrast.validate(self.levels.len())?;

        let variance = if equal_variance {
            let scaled: f64 = contrast
                .coefficients()
                .iter()
                .zip(&self.levels)
                .map(|(c, level)| c * c / level.replicates as f64)
                .sum();
            self.decomposition.ms_error * scaled
        } else {
            contrast
                .coefficients()
                .iter()
                .zip(&self.levels)
                .map(|(c, level)| level.std_dev * c * c / level.replicates as f64)
                .sum()
        };

        let std_estimate = variance.sqrt();
        if !(std_estimate > 0.0 && std_estimate.is_finite()) {
            return Err(DesignError::DegenerateContrast);
        }
        let mean_estimate = contrast.dot(&self.level_means());
        Ok((mean_estimate, std_estimate))
    }

    /// p-value for a contrast.
    ///
    /// `Upper` and `Lower` evaluate the tails of a Student-t distribution
    /// with the error degrees of freedom, scaled by σ̂, at mean/σ̂. `TwoSided`
    /// evaluates the upper tail of F(1, dof_error) at (mean/σ̂)².
    pub fn contrast_p_value(
        &self,
        contrast: &Contrast,
        bound: Bound,
        equal_variance: bool,
    ) -> Result<f64> {
        let (mean_estimate, std_estimate) = self.contrast_estimate(contrast, equal_variance)?;
        let dof = self.decomposition.dof_error as f64;
        let statistic = mean_estimate / std_estimate;

        let p_value = match bound {
            Bound::Upper => Distribution::students_t(dof, 0.0, std_estimate)?.sf(statistic),
            Bound::Lower => Distribution::students_t(dof, 0.0, std_estimate)?.cdf(statistic),
            Bound::TwoSided => Distribution::f(1.0, dof)?.sf(statistic.powi(2)),
        };
        debug!(%bound, mean_estimate, std_estimate, p_value, "contrast p-value");
        Ok(p_value)
    }

    /// Confidence bound for a contrast at the given confidence level.
    ///
    /// # Errors
    /// `InvalidArgument` if `confidence` is outside `[0, 1]`, plus the
    /// contrast errors of [`AnovaModel::contrast_estimate`].
    pub fn contrast_confidence_bound(
        &self,
        contrast: &Contrast,
        confidence: f64,
        bound: Bound,
        equal_variance: bool,
    ) -> Result<ConfidenceBound> {
        check_unit_interval("confidence", confidence)?;
        let (mean_estimate, std_estimate) = self.contrast_estimate(contrast, equal_variance)?;
        let t = Distribution::students_t(self.decomposition.dof_error as f64, 0.0, std_estimate)?;

        Ok(match bound {
            Bound::Upper => ConfidenceBound::Upper {
                upper: mean_estimate + t.isf(1.0 - confidence),
            },
            Bound::Lower => ConfidenceBound::Lower {
                lower: mean_estimate - t.isf(1.0 - confidence),
            },
            Bound::TwoSided => {
                let half_width = t.isf((1.0 - confidence) / 2.0);
                ConfidenceBound::TwoSided {
                    lower: mean_estimate - half_width,
                    upper: mean_estimate + half_width,
                }
            }
        })
    }

    /// Error bars for each level mean: t_{(1-confidence)/2, dof_error}·√(MSE/rᵢ).
    pub fn error_bars(&self, confidence: f64) -> Result<Vec<ErrorBar>> {
        check_unit_interval("confidence", confidence)?;
        let d = &self.decomposition;
        let critical =
            Distribution::students_t(d.dof_error as f64, 0.0, 1.0)?.isf((1.0 - confidence) / 2.0);

        Ok(self
            .levels
            .iter()
            .map(|level| ErrorBar {
                label: level.label.clone(),
                mean: level.mean,
                half_width: critical * (d.ms_error / level.replicates as f64).sqrt(),
            })
            .collect())
    }

    fn numeric_levels(&self) -> Result<Vec<f64>> {
        self.levels
            .iter()
            .map(|level| level.label.as_f64())
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| DesignError::TypeMismatch {
                column: self.factor.clone(),
                expected: "numeric",
                found: "text",
            })
    }

    /// Linear-trend contrast over this model's numeric levels.
    pub fn linear_trend_contrast(&self) -> Result<Contrast> {
        contrast::linear_trend(&self.replicates(), &self.numeric_levels()?)
    }

    /// Orthogonal-polynomial trend contrast over this model's numeric levels.
    pub fn polynomial_trend_contrast(&self, order: usize) -> Result<Contrast> {
        contrast::polynomial_trend(&self.replicates(), &self.numeric_levels()?, order)
    }

    /// Contrast between two groups of this model's levels.
    pub fn group_difference_contrast(
        &self,
        a: &[LevelLabel],
        b: &[LevelLabel],
    ) -> Result<Contrast> {
        contrast::group_difference(&self.level_labels(), a, b)
    }
}
