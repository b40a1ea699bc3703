//! Power and sample-size calculations for a planned one-way experiment.

use tracing::{debug, trace};

use crate::distribution::Distribution;
use crate::error::{DesignError, Result};

/// Default cap on the replicates-per-level search in [`num_observations`].
pub const DEFAULT_MAX_REPLICATES: u32 = 10_000;

fn check_open_unit(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(DesignError::invalid_argument(
            name,
            value,
            "a probability strictly between 0 and 1",
        ))
    }
}

fn check_scenario(alpha: f64, delta: f64, levels: u32, variance: f64) -> Result<()> {
    check_open_unit("alpha", alpha)?;
    if !delta.is_finite() {
        return Err(DesignError::invalid_argument(
            "delta",
            delta,
            "a finite mean difference",
        ));
    }
    if levels < 2 {
        return Err(DesignError::invalid_argument(
            "levels",
            levels,
            "at least two treatment levels",
        ));
    }
    if !(variance > 0.0 && variance.is_finite()) {
        return Err(DesignError::invalid_argument(
            "variance",
            variance,
            "a positive, finite variance",
        ));
    }
    Ok(())
}

/// Power of the one-way ANOVA F-test.
///
/// With `dfn = v - 1`, `dfd = v(r - 1)` and noncentrality `λ = rδ² / 2σ²`,
/// the power is the probability that a noncentral F(dfn, dfd, λ) variate
/// exceeds the central F(dfn, dfd) critical value at `alpha`.
///
/// # Arguments
/// * `alpha` - Probability of a Type I error
/// * `delta` - Smallest difference in treatment means worth detecting
/// * `replicates` - Observations per treatment level (r)
/// * `levels` - Number of treatment levels (v)
/// * `variance` - Assumed error variance (σ²)
///
/// # Errors
/// `InvalidArgument` unless `0 < alpha < 1`, `replicates >= 2`,
/// `levels >= 2` and `variance > 0`.
pub fn test_power(
    alpha: f64,
    delta: f64,
    replicates: u32,
    levels: u32,
    variance: f64,
) -> Result<f64> {
    check_scenario(alpha, delta, levels, variance)?;
    if replicates < 2 {
        return Err(DesignError::invalid_argument(
            "replicates",
            replicates,
            "at least two observations per level",
        ));
    }

    let r = f64::from(replicates);
    let v = f64::from(levels);
    let dfn = v - 1.0;
    let dfd = v * (r - 1.0);
    let noncentrality = r * delta.powi(2) / (2.0 * variance);

    let critical = Distribution::f(dfn, dfd)?.isf(alpha);
    let power = Distribution::noncentral_f(dfn, dfd, noncentrality)?.sf(critical);
    trace!(replicates, noncentrality, critical, power, "test power");
    Ok(power)
}

/// Smallest number of replicates per level whose F-test reaches power `1 - beta`.
///
/// Searches r = 2, 3, … up to [`DEFAULT_MAX_REPLICATES`].
///
/// # Errors
/// `InvalidArgument` for out-of-range inputs, `SearchExhausted` if the cap is
/// reached first (e.g. `delta == 0`).
pub fn num_observations(
    alpha: f64,
    beta: f64,
    delta: f64,
    levels: u32,
    variance: f64,
) -> Result<u32> {
    let max_replicates = DEFAULT_MAX_REPLICATES;
    num_observations_bounded(alpha, beta, delta, levels, variance, max_replicates)
}

/// [`num_observations`] with an explicit cap on the replicates searched.
pub fn num_observations_bounded(
    alpha: f64,
    beta: f64,
    delta: f64,
    levels: u32,
    variance: f64,
    max_replicates: u32,
) -> Result<u32> {
    check_scenario(alpha, delta, levels, variance)?;
    check_open_unit("beta", beta)?;
    let target = 1.0 - beta;

    for replicates in 2..=max_replicates {
        let power = test_power(alpha, delta, replicates, levels, variance)?;
        if power >= target {
            debug!(replicates, power, target, "sample size found");
            return Ok(replicates);
        }
    }

    Err(DesignError::SearchExhausted {
        target,
        max_replicates,
    })
}
