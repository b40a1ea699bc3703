use statrs::function::beta::beta_reg;
use statrs::function::gamma::ln_gamma;

use crate::error::{DesignError, Result};

/// Poisson weights below this are dropped from the mixture tails.
const WEIGHT_EPSILON: f64 = 1e-17;

/// Hard cap on mixture terms walked on either side of the Poisson mode.
const MAX_TERMS: u32 = 100_000;

/// Bisection iterations for quantiles.
const MAX_BISECTIONS: u32 = 200;

/// Noncentral F distribution with `dfn` and `dfd` degrees of freedom and
/// noncentrality `nc`.
///
/// Evaluated as a Poisson(`nc / 2`) mixture of regularized incomplete beta
/// functions:
///
/// P(X <= x) = sum_j w_j * I_y(dfn/2 + j, dfd/2), y = dfn*x / (dfn*x + dfd)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoncentralF {
    dfn: f64,
    dfd: f64,
    nc: f64,
}

impl NoncentralF {
    /// Create a noncentral F distribution.
    ///
    /// # Errors
    /// Returns `InvalidParameters` unless `dfn > 0`, `dfd > 0` and `nc >= 0`
    /// are all finite.
    pub fn new(dfn: f64, dfd: f64, nc: f64) -> Result<Self> {
        let valid = dfn.is_finite()
            && dfd.is_finite()
            && nc.is_finite()
            && dfn > 0.0
            && dfd > 0.0
            && nc >= 0.0;
        if !valid {
            return Err(DesignError::InvalidParameters {
                distribution: "ncf",
                reason: format!(
                    "need dfn > 0, dfd > 0 and nc >= 0, got dfn={dfn}, dfd={dfd}, nc={nc}"
                ),
            });
        }
        Ok(Self { dfn, dfd, nc })
    }

    pub fn dfn(&self) -> f64 {
        self.dfn
    }

    pub fn dfd(&self) -> f64 {
        self.dfd
    }

    pub fn noncentrality(&self) -> f64 {
        self.nc
    }

    /// Lower-tail probability P(X <= x).
    pub fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= 0.0 {
            return 0.0;
        }
        if x == f64::INFINITY {
            return 1.0;
        }
        self.mixture(x, false).clamp(0.0, 1.0)
    }

    /// Upper-tail probability P(X > x), summed directly rather than as `1 - cdf`.
    pub fn sf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= 0.0 {
            return 1.0;
        }
        if x == f64::INFINITY {
            return 0.0;
        }
        self.mixture(x, true).clamp(0.0, 1.0)
    }

    /// Quantile function: the `x` with `cdf(x) = p`.
    pub fn inverse_cdf(&self, p: f64) -> f64 {
        if !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        if p == 0.0 {
            return 0.0;
        }
        if p == 1.0 {
            return f64::INFINITY;
        }

        let mut low = 0.0;
        let mut high = 1.0;
        while self.cdf(high) < p {
            low = high;
            high *= 2.0;
            if !high.is_finite() {
                return f64::INFINITY;
            }
        }

        for _ in 0..MAX_BISECTIONS {
            let mid = 0.5 * (low + high);
            if self.cdf(mid) < p {
                low = mid;
            } else {
                high = mid;
            }
            if high - low <= 1e-12 * high.max(1.0) {
                break;
            }
        }
        0.5 * (low + high)
    }

    /// Sum the Poisson-weighted beta terms, walking outward from the mode.
    fn mixture(&self, x: f64, upper: bool) -> f64 {
        let a0 = self.dfn / 2.0;
        let b = self.dfd / 2.0;
        let denom = self.dfn * x + self.dfd;
        let y = self.dfn * x / denom;
        let y_complement = self.dfd / denom;

        let term = |j: u32| -> f64 {
            let a = a0 + f64::from(j);
            if upper {
                beta_reg(b, a, y_complement)
            } else {
                beta_reg(a, b, y)
            }
        };

        let half_nc = self.nc / 2.0;
        if half_nc == 0.0 {
            return term(0);
        }

        let ln_half_nc = half_nc.ln();
        let weight = |j: u32| -> f64 {
            let j = f64::from(j);
            (j * ln_half_nc - half_nc - ln_gamma(j + 1.0)).exp()
        };

        let mode = half_nc.floor().min(f64::from(u32::MAX - MAX_TERMS)) as u32;
        let mut total = 0.0;

        let mut j = mode;
        loop {
            let w = weight(j);
            total += w * term(j);
            if (w < WEIGHT_EPSILON && j > mode) || j - mode >= MAX_TERMS {
                break;
            }
            j += 1;
        }

        let mut j = mode;
        while j > 0 && mode - j < MAX_TERMS {
            j -= 1;
            let w = weight(j);
            total += w * term(j);
            if w < WEIGHT_EPSILON {
                break;
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::{ContinuousCDF, FisherSnedecor};

    #[test]
    fn test_zero_noncentrality_matches_central_f() {
        let central = FisherSnedecor::new(3.0, 12.0).unwrap();
        let ncf = NoncentralF::new(3.0, 12.0, 0.0).unwrap();

        for x in [0.5, 1.0, 2.5, 6.0] {
            assert!((ncf.sf(x) - central.sf(x)).abs() < 1e-10);
            assert!((ncf.cdf(x) - central.cdf(x)).abs() < 1e-10);
        }
    }

    #[test]
    fn test_cdf_and_sf_are_complementary() {
        let ncf = NoncentralF::new(4.0, 20.0, 7.5).unwrap();
        for x in [0.1, 1.0, 3.0, 10.0] {
            assert!((ncf.cdf(x) + ncf.sf(x) - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_sf_grows_with_noncentrality() {
        let mut previous = 0.0;
        for nc in [0.0, 1.0, 4.0, 16.0, 64.0] {
            let sf = NoncentralF::new(3.0, 12.0, nc).unwrap().sf(3.49);
            assert!(
                sf > previous,
                "sf should increase with nc: {sf} <= {previous}"
            );
            previous = sf;
        }
    }

    #[test]
    fn test_support_edges() {
        let ncf = NoncentralF::new(2.0, 10.0, 3.0).unwrap();
        assert_eq!(ncf.cdf(0.0), 0.0);
        assert_eq!(ncf.sf(-1.0), 1.0);
        assert_eq!(ncf.cdf(f64::INFINITY), 1.0);
        assert!(ncf.cdf(f64::NAN).is_nan());
    }

    #[test]
    fn test_inverse_cdf_inverts_cdf() {
        let ncf = NoncentralF::new(3.0, 15.0, 5.0).unwrap();
        for p in [0.05, 0.5, 0.95] {
            let x = ncf.inverse_cdf(p);
            assert!((ncf.cdf(x) - p).abs() < 1e-8, "p={p}, x={x}");
        }
        assert_eq!(ncf.inverse_cdf(0.0), 0.0);
        assert_eq!(ncf.inverse_cdf(1.0), f64::INFINITY);
        assert!(ncf.inverse_cdf(1.5).is_nan());
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(NoncentralF::new(0.0, 10.0, 1.0).is_err());
        assert!(NoncentralF::new(3.0, -1.0, 1.0).is_err());
        assert!(NoncentralF::new(3.0, 10.0, -0.5).is_err());
        assert!(NoncentralF::new(3.0, 10.0, f64::NAN).is_err());
    }
}
