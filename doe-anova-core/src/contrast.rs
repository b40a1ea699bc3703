//! Contrasts: linear combinations of treatment-level means whose coefficients sum to zero.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, Result};
use crate::table::LevelLabel;

/// Relative tolerance used when checking that coefficients sum to zero.
const SUM_TOLERANCE: f64 = 1e-9;

/// Contrast coefficients, one per treatment level in level order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contrast {
    coefficients: Vec<f64>,
}

impl Contrast {
    /// Wrap raw coefficients. Whether they sum to zero is checked when the
    /// contrast is used for inference, see [`Contrast::validate`].
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Check the contrast against a model with `levels` treatment levels.
    ///
    /// # Errors
    /// `ContrastLength` on a length mismatch, `NotAContrast` if the
    /// coefficients do not sum to zero.
    pub fn validate(&self, levels: usize) -> Result<()> {
        if self.coefficients.len() != levels {
            return Err(DesignError::ContrastLength {
                expected: levels,
                found: self.coefficients.len(),
            });
        }
        let sum: f64 = self.coefficients.iter().sum();
        let scale: f64 = self.coefficients.iter().map(|c| c.abs()).sum();
        if sum.abs() > SUM_TOLERANCE * scale.max(1.0) {
            return Err(DesignError::NotAContrast { sum });
        }
        Ok(())
    }

    /// Σ cᵢ·yᵢ
    pub fn dot(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(c, y)| c * y)
            .sum()
    }
}

impl From<Vec<f64>> for Contrast {
    fn from(coefficients: Vec<f64>) -> Self {
        Self::new(coefficients)
    }
}

fn check_design(replicates: &[usize], levels: &[f64]) -> Result<()> {
    if replicates.len() != levels.len() {
        return Err(DesignError::invalid_argument(
            "levels",
            format!(
                "{} values for {} replicate counts",
                levels.len(),
                replicates.len()
            ),
            "one level value per replicate count",
        ));
    }
    if replicates.len() < 2 {
        return Err(DesignError::invalid_argument(
            "levels",
            replicates.len(),
            "at least two treatment levels",
        ));
    }
    if replicates.contains(&0) {
        return Err(DesignError::invalid_argument(
            "replicates",
            format!("{replicates:?}"),
            "at least one observation per level",
        ));
    }
    Ok(())
}

/// Linear-trend contrast for ordered, numeric treatment levels.
///
/// cᵢ = rᵢ·(xᵢ − x̄), with x̄ = Σ rᵢxᵢ / Σ rᵢ the replicate-weighted mean level.
///
/// The textbook recipe divides Σ rᵢxᵢ by the number of levels instead of by
/// Σ rᵢ. That centring only yields coefficients summing to zero when every
/// rᵢ = 1, so the replicate-weighted mean is used here.
///
/// # Errors
/// `InvalidArgument` for mismatched lengths, fewer than two levels or a zero
/// replicate count.
pub fn linear_trend(replicates: &[usize], levels: &[f64]) -> Result<Contrast> {
    check_design(replicates, levels)?;
    let n: usize = replicates.iter().sum();
    let weighted: f64 = replicates
        .iter()
        .zip(levels)
        .map(|(&r, &x)| r as f64 * x)
        .sum();
    let level_average = weighted / n as f64;

    Ok(Contrast::new(
        replicates
            .iter()
            .zip(levels)
            .map(|(&r, &x)| r as f64 * (x - level_average))
            .collect(),
    ))
}

/// Orthogonal-polynomial trend contrast of the given order.
///
/// The polynomials 1, x, …, x^order are orthogonalised under the
/// replicate-weighted inner product ⟨u, w⟩ = Σ rᵢuᵢwᵢ and the coefficients are
/// cᵢ = rᵢ·p(xᵢ) for the resulting degree-`order` polynomial p. The
/// contrasts of different orders are mutually orthogonal and order 1
/// reproduces [`linear_trend`].
///
/// # Errors
/// `InvalidArgument` unless `1 <= order < levels` and the level values are
/// distinct.
pub fn polynomial_trend(replicates: &[usize], levels: &[f64], order: usize) -> Result<Contrast> {
    check_design(replicates, levels)?;
    if order == 0 || order >= levels.len() {
        return Err(DesignError::invalid_argument(
            "order",
            order,
            format!("an order between 1 and {}", levels.len() - 1),
        ));
    }

    let weights: Vec<f64> = replicates.iter().map(|&r| r as f64).collect();
    let inner = |u: &[f64], w: &[f64]| -> f64 {
        weights
            .iter()
            .zip(u.iter().zip(w))
            .map(|(r, (a, b))| r * a * b)
            .sum()
    };

    // Gram-Schmidt over the monomials evaluated at each level.
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(order + 1);
    for degree in 0..=order {
        let mut p: Vec<f64> = levels.iter().map(|x| x.powi(degree as i32)).collect();
        let scale: f64 = p.iter().map(|v| v.abs()).fold(0.0, f64::max);
        for q in &basis {
            let projection = inner(&p[..], &q[..]) / inner(&q[..], &q[..]);
            for (pi, qi) in p.iter_mut().zip(q) {
                *pi -= projection * qi;
            }
        }
        let norm = inner(&p[..], &p[..]).sqrt();
        if !(norm > 1e-12 * scale.max(1.0)) {
            return Err(DesignError::invalid_argument(
                "levels",
                format!("{levels:?}"),
                format!("at least {} distinct level values", order + 1),
            ));
        }
        basis.push(p);
    }

    let coefficients = weights
        .iter()
        .zip(&basis[order])
        .map(|(r, p)| r * p)
        .collect();
    Ok(Contrast::new(coefficients))
}

/// Contrast comparing the average mean of group `a` with that of group `b`.
///
/// Levels in `a` get `1/|a|`, levels in `b` get `−1/|b|`, all others zero.
///
/// # Errors
/// `InvalidArgument` if either group is empty, a label is not one of
/// `levels`, or a label appears in both groups.
pub fn group_difference(
    levels: &[LevelLabel],
    a: &[LevelLabel],
    b: &[LevelLabel],
) -> Result<Contrast> {
    // Repeated labels within a group count once.
    let a: BTreeSet<&LevelLabel> = a.iter().collect();
    let b: BTreeSet<&LevelLabel> = b.iter().collect();
    if a.is_empty() || b.is_empty() {
        return Err(DesignError::invalid_argument(
            "group",
            "an empty group",
            "at least one level in each group",
        ));
    }
    if let Some(shared) = a.intersection(&b).next() {
        return Err(DesignError::invalid_argument(
            "group",
            shared,
            "disjoint groups",
        ));
    }
    if let Some(unknown) = a.union(&b).find(|label| !levels.contains(**label)) {
        let known: Vec<String> = levels.iter().map(ToString::to_string).collect();
        return Err(DesignError::invalid_argument(
            "level",
            unknown,
            format!("one of: {}", known.join(", ")),
        ));
    }

    let weight_a = 1.0 / a.len() as f64;
    let weight_b = 1.0 / b.len() as f64;
    Ok(Contrast::new(
        levels
            .iter()
            .map(|level| {
                if a.contains(level) {
                    weight_a
                } else if b.contains(level) {
                    -weight_b
                } else {
                    0.0
                }
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_linear_trend_equal_replication() {
        let c = linear_trend(&[4, 4, 4, 4], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(approx(c.coefficients(), &[-6.0, -2.0, 2.0, 6.0]));
        assert!(c.validate(4).is_ok());
    }

    #[test]
    fn test_linear_trend_unequal_replication_sums_to_zero() {
        let c = linear_trend(&[2, 3, 5], &[10.0, 20.0, 40.0]).unwrap();
        let sum: f64 = c.coefficients().iter().sum();
        assert!(sum.abs() < 1e-9);
        // x̄ = (20 + 60 + 200) / 10 = 28
        assert!(approx(c.coefficients(), &[-36.0, -24.0, 60.0]));
    }

    #[test]
    fn test_linear_trend_rejects_bad_design() {
        assert!(linear_trend(&[2, 2], &[1.0]).is_err());
        assert!(linear_trend(&[2], &[1.0]).is_err());
        assert!(linear_trend(&[2, 0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_polynomial_order_one_matches_linear_trend() {
        let r = [3, 3, 4, 2];
        let x = [0.5, 1.0, 2.0, 4.0];
        let linear = linear_trend(&r, &x).unwrap();
        let poly = polynomial_trend(&r, &x, 1).unwrap();
        assert!(approx(linear.coefficients(), poly.coefficients()));
    }

    #[test]
    fn test_quadratic_contrast_equally_spaced() {
        // Classical coefficients for 4 equally spaced levels: 1, -1, -1, 1.
        let c = polynomial_trend(&[1, 1, 1, 1], &[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let coeffs = c.coefficients();
        let scaled: Vec<f64> = coeffs.iter().map(|v| v / coeffs[0]).collect();
        assert!(approx(&scaled, &[1.0, -1.0, -1.0, 1.0]));
        assert!(c.validate(4).is_ok());
    }

    #[test]
    fn test_polynomial_contrasts_are_orthogonal() {
        let r = [2usize, 3, 2, 4, 3];
        let x = [1.0, 2.0, 4.0, 5.0, 7.0];
        let c1 = polynomial_trend(&r, &x, 1).unwrap();
        let c2 = polynomial_trend(&r, &x, 2).unwrap();
        let c3 = polynomial_trend(&r, &x, 3).unwrap();
        // Orthogonal as contrasts: Σ c_i d_i / r_i = 0
        let dot = |a: &Contrast, b: &Contrast| -> f64 {
            a.coefficients()
                .iter()
                .zip(b.coefficients())
                .zip(&r)
                .map(|((p, q), &ri)| p * q / ri as f64)
                .sum()
        };
        assert!(dot(&c1, &c2).abs() < 1e-6);
        assert!(dot(&c1, &c3).abs() < 1e-6);
        assert!(dot(&c2, &c3).abs() < 1e-6);
    }

    #[test]
    fn test_polynomial_order_bounds() {
        assert!(polynomial_trend(&[1, 1, 1], &[1.0, 2.0, 3.0], 0).is_err());
        assert!(polynomial_trend(&[1, 1, 1], &[1.0, 2.0, 3.0], 3).is_err());
        assert!(polynomial_trend(&[1, 1, 1], &[1.0, 1.0, 3.0], 2).is_err());
    }

    #[test]
    fn test_group_difference() {
        let levels: Vec<LevelLabel> = ["a", "b", "c", "d"]
            .into_iter()
            .map(LevelLabel::from)
            .collect();
        let c = group_difference(
            &levels,
            &[LevelLabel::from("a"), LevelLabel::from("b")],
            &[LevelLabel::from("d")],
        )
        .unwrap();
        assert!(approx(c.coefficients(), &[0.5, 0.5, 0.0, -1.0]));
        assert!(c.validate(4).is_ok());
    }

    #[test]
    fn test_group_difference_rejects_bad_groups() {
        let levels: Vec<LevelLabel> = ["a", "b"].into_iter().map(LevelLabel::from).collect();
        let a = [LevelLabel::from("a")];
        assert!(group_difference(&levels, &a, &[]).is_err());
        assert!(group_difference(&levels, &a, &a).is_err());
        let unknown = [LevelLabel::from("z")];
        assert!(group_difference(&levels, &a, &unknown).is_err());
    }

    #[test]
    fn test_group_difference_ignores_repeated_labels() {
        let levels: Vec<LevelLabel> = ["a", "b", "c"].into_iter().map(LevelLabel::from).collect();
        let c = group_difference(
            &levels,
            &[LevelLabel::from("a"), LevelLabel::from("a")],
            &[LevelLabel::from("b")],
        )
        .unwrap();
        assert!(approx(c.coefficients(), &[1.0, -1.0, 0.0]));
        assert!(c.validate(3).is_ok());
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            Contrast::new(vec![1.0, -1.0]).validate(3),
            Err(DesignError::ContrastLength {
                expected: 3,
                found: 2,
            })
        );
        assert!(matches!(
            Contrast::new(vec![1.0, 1.0]).validate(2),
            Err(DesignError::NotAContrast { .. })
        ));
        assert!(Contrast::new(vec![0.1, 0.2, -0.3]).validate(3).is_ok());
    }

    #[test]
    fn test_dot() {
        let c = Contrast::new(vec![1.0, -1.0, 0.0]);
        assert_eq!(c.dot(&[5.0, 3.0, 100.0]), 2.0);
    }
}
