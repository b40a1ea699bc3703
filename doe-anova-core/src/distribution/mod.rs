//! Probability distributions used for inference and power analysis.
//!
//! A [`Distribution`] is resolved once from a family keyword and its shape
//! parameters and then answers four questions: lower-tail probability
//! (`cdf`), upper-tail probability (`sf`), and their inverses (`ppf`, `isf`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use crate::error::{check_unit_interval, DesignError, Result};

mod noncentral;
pub use noncentral::NoncentralF;

/// Supported distribution families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionKind {
    Normal,
    #[serde(rename = "t")]
    StudentsT,
    ChiSquared,
    #[serde(rename = "f")]
    F,
    #[serde(rename = "ncf")]
    NoncentralF,
}

impl DistributionKind {
    /// All supported families, in keyword order.
    pub const ALL: [DistributionKind; 5] = [
        DistributionKind::Normal,
        DistributionKind::StudentsT,
        DistributionKind::ChiSquared,
        DistributionKind::F,
        DistributionKind::NoncentralF,
    ];

    /// The keyword this family is selected by.
    pub fn keyword(self) -> &'static str {
        match self {
            DistributionKind::Normal => "normal",
            DistributionKind::StudentsT => "t",
            DistributionKind::ChiSquared => "chi-squared",
            DistributionKind::F => "f",
            DistributionKind::NoncentralF => "ncf",
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for DistributionKind {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword() == s)
            .ok_or_else(|| DesignError::UnsupportedDistribution(s.to_string()))
    }
}

/// A continuous distribution resolved from a [`DistributionKind`] and its parameters.
#[derive(Debug, Clone)]
pub enum Distribution {
    Normal(Normal),
    StudentsT(StudentsT),
    ChiSquared(ChiSquared),
    F(FisherSnedecor),
    NoncentralF(NoncentralF),
}

fn invalid(distribution: &'static str, reason: impl fmt::Display) -> DesignError {
    DesignError::InvalidParameters {
        distribution,
        reason: reason.to_string(),
    }
}

impl Distribution {
    /// Resolve a distribution from its keyword and positional parameters.
    ///
    /// Parameters follow the usual positional order for each family:
    ///
    /// | keyword       | parameters                  |
    /// |---------------|-----------------------------|
    /// | `normal`      | `[loc = 0, scale = 1]`      |
    /// | `t`           | `[df, loc = 0, scale = 1]`  |
    /// | `chi-squared` | `[df]`                      |
    /// | `f`           | `[dfn, dfd]`                |
    /// | `ncf`         | `[dfn, dfd, nc]`            |
    ///
    /// # Errors
    /// `UnsupportedDistribution` for an unknown keyword, `InvalidParameters`
    /// for a wrong parameter count or out-of-range values.
    pub fn from_name(name: &str, params: &[f64]) -> Result<Self> {
        Self::new(name.parse()?, params)
    }

    /// Resolve a distribution from its family and positional parameters.
    pub fn new(kind: DistributionKind, params: &[f64]) -> Result<Self> {
        let keyword = kind.keyword();
        match (kind, params) {
            (DistributionKind::Normal, []) => Self::normal(0.0, 1.0),
            (DistributionKind::Normal, [loc]) => Self::normal(*loc, 1.0),
            (DistributionKind::Normal, [loc, scale]) => Self::normal(*loc, *scale),
            (DistributionKind::StudentsT, [df]) => Self::students_t(*df, 0.0, 1.0),
            (DistributionKind::StudentsT, [df, loc]) => Self::students_t(*df, *loc, 1.0),
            (DistributionKind::StudentsT, [df, loc, scale]) => Self::students_t(*df, *loc, *scale),
            (DistributionKind::ChiSquared, [df]) => Self::chi_squared(*df),
            (DistributionKind::F, [dfn, dfd]) => Self::f(*dfn, *dfd),
            (DistributionKind::NoncentralF, [dfn, dfd, nc]) => Self::noncentral_f(*dfn, *dfd, *nc),
            (_, params) => Err(invalid(
                keyword,
                format!(
                    "{} parameter(s) given, expected {}",
                    params.len(),
                    Self::parameter_signature(kind)
                ),
            )),
        }
    }

    fn parameter_signature(kind: DistributionKind) -> &'static str {
        match kind {
            DistributionKind::Normal => "[loc[, scale]]",
            DistributionKind::StudentsT => "df[, loc[, scale]]",
            DistributionKind::ChiSquared => "df",
            DistributionKind::F => "dfn, dfd",
            DistributionKind::NoncentralF => "dfn, dfd, nc",
        }
    }

    /// Normal distribution with the given mean and standard deviation.
    pub fn normal(mean: f64, std_dev: f64) -> Result<Self> {
        Normal::new(mean, std_dev)
            .map(Self::Normal)
            .map_err(|e| invalid("normal", e))
    }

    /// Student's t distribution with `df` degrees of freedom, shifted and scaled.
    pub fn students_t(df: f64, location: f64, scale: f64) -> Result<Self> {
        StudentsT::new(location, scale, df)
            .map(Self::StudentsT)
            .map_err(|e| invalid("t", e))
    }

    pub fn chi_squared(df: f64) -> Result<Self> {
        ChiSquared::new(df)
            .map(Self::ChiSquared)
            .map_err(|e| invalid("chi-squared", e))
    }

    pub fn f(dfn: f64, dfd: f64) -> Result<Self> {
        FisherSnedecor::new(dfn, dfd)
            .map(Self::F)
            .map_err(|e| invalid("f", e))
    }

    pub fn noncentral_f(dfn: f64, dfd: f64, nc: f64) -> Result<Self> {
        NoncentralF::new(dfn, dfd, nc).map(Self::NoncentralF)
    }

    /// The family this distribution belongs to.
    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Normal(_) => DistributionKind::Normal,
            Self::StudentsT(_) => DistributionKind::StudentsT,
            Self::ChiSquared(_) => DistributionKind::ChiSquared,
            Self::F(_) => DistributionKind::F,
            Self::NoncentralF(_) => DistributionKind::NoncentralF,
        }
    }

    /// Lower end of the support.
    fn support_min(&self) -> f64 {
        match self {
            Self::Normal(_) | Self::StudentsT(_) => f64::NEG_INFINITY,
            Self::ChiSquared(_) | Self::F(_) | Self::NoncentralF(_) => 0.0,
        }
    }

    /// Lower-tail probability P(X <= x).
    pub fn cdf(&self, x: f64) -> f64 {
        if x.is_infinite() {
            return if x > 0.0 { 1.0 } else { 0.0 };
        }
        match self {
            Self::Normal(d) => d.cdf(x),
            Self::StudentsT(d) => d.cdf(x),
            Self::ChiSquared(d) => d.cdf(x),
            Self::F(d) => d.cdf(x),
            Self::NoncentralF(d) => d.cdf(x),
        }
    }

    /// Upper-tail (survival) probability P(X > x).
    pub fn sf(&self, x: f64) -> f64 {
        if x.is_infinite() {
            return if x > 0.0 { 0.0 } else { 1.0 };
        }
        match self {
            Self::Normal(d) => d.sf(x),
            Self::StudentsT(d) => d.sf(x),
            Self::ChiSquared(d) => d.sf(x),
            Self::F(d) => d.sf(x),
            Self::NoncentralF(d) => d.sf(x),
        }
    }

    /// Percent-point function (inverse of `cdf`). `NaN` outside `[0, 1]`.
    pub fn ppf(&self, p: f64) -> f64 {
        if !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        if p == 0.0 {
            return self.support_min();
        }
        if p == 1.0 {
            return f64::INFINITY;
        }
        match self {
            Self::Normal(d) => d.inverse_cdf(p),
            Self::StudentsT(d) => d.inverse_cdf(p),
            Self::ChiSquared(d) => d.inverse_cdf(p),
            Self::F(d) => d.inverse_cdf(p),
            Self::NoncentralF(d) => d.inverse_cdf(p),
        }
    }

    /// Inverse survival function: the `x` with `sf(x) = q`.
    pub fn isf(&self, q: f64) -> f64 {
        if !(0.0..=1.0).contains(&q) {
            return f64::NAN;
        }
        self.ppf(1.0 - q)
    }
}

/// Upper confidence bound: the value exceeded with probability `alpha`.
pub fn upper_ci(distribution: &Distribution, alpha: f64) -> Result<f64> {
    check_unit_interval("alpha", alpha)?;
    Ok(distribution.isf(alpha))
}

/// Lower confidence bound: the value not exceeded with probability `alpha`.
pub fn lower_ci(distribution: &Distribution, alpha: f64) -> Result<f64> {
    check_unit_interval("alpha", alpha)?;
    Ok(distribution.ppf(alpha))
}

/// Central interval leaving `alpha / 2` in each tail.
pub fn central_ci(distribution: &Distribution, alpha: f64) -> Result<[f64; 2]> {
    check_unit_interval("alpha", alpha)?;
    let tail = alpha / 2.0;
    Ok([distribution.ppf(tail), distribution.isf(tail)])
}

pub fn upper_prob(distribution: &Distribution, x: f64) -> f64 {
    distribution.sf(x)
}

pub fn lower_prob(distribution: &Distribution, x: f64) -> f64 {
    distribution.cdf(x)
}

/// Probability mass between `x1` and `x2`, in either order.
pub fn central_prob(distribution: &Distribution, x1: f64, x2: f64) -> f64 {
    (distribution.cdf(x2) - distribution.cdf(x1)).abs()
}

/// Two-sided p-value for a sample mean against a known population mean,
/// using the normal approximation `z = |x̄ - μ| / (σ² / √n)`.
///
/// # Errors
/// `InvalidArgument` if `n == 0` or `pop_variance <= 0`.
pub fn one_sample_mean_diff(
    sample_mean: f64,
    pop_mean: f64,
    pop_variance: f64,
    n: usize,
) -> Result<f64> {
    if n == 0 {
        return Err(DesignError::invalid_argument(
            "n",
            n,
            "at least one observation",
        ));
    }
    if pop_variance.is_nan() || pop_variance <= 0.0 {
        return Err(DesignError::invalid_argument(
            "pop_variance",
            pop_variance,
            "a positive variance",
        ));
    }
    let z = ((sample_mean - pop_mean) / (pop_variance / (n as f64).sqrt())).abs();
    let standard = Distribution::normal(0.0, 1.0)?;
    Ok(2.0 * upper_prob(&standard, z))
}
