//! Full-factorial experiment templates.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{DesignError, Result};
use crate::table::{Column, DataTable, LevelLabel};

/// Name of the column holding the randomized run order.
pub const RUN_ORDER_COLUMN: &str = "Run_Order";

/// A factor and the levels it is run at.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    pub name: String,
    pub levels: Vec<LevelLabel>,
}

impl Factor {
    pub fn new(name: impl Into<String>, levels: Vec<LevelLabel>) -> Self {
        Self {
            name: name.into(),
            levels,
        }
    }
}

fn level_column(levels: Vec<LevelLabel>) -> Column {
    let numeric: Option<Vec<f64>> = levels.iter().map(LevelLabel::as_f64).collect();
    match numeric {
        Some(values) => Column::Numeric(values),
        None => Column::Text(levels.iter().map(ToString::to_string).collect()),
    }
}

/// Build a full-factorial template with one row per treatment combination.
///
/// The first factor varies slowest. A [`RUN_ORDER_COLUMN`] holds a random
/// permutation of `0..n` giving the order in which to perform the runs.
///
/// # Errors
/// `InvalidArgument` if there are no factors, a factor has no levels, or two
/// factors share a name.
pub fn factorial_table<R: Rng + ?Sized>(factors: &[Factor], rng: &mut R) -> Result<DataTable> {
    if factors.is_empty() {
        return Err(DesignError::invalid_argument(
            "factors",
            "none",
            "at least one factor",
        ));
    }
    if let Some(empty) = factors.iter().find(|factor| factor.levels.is_empty()) {
        return Err(DesignError::invalid_argument(
            "factor",
            &empty.name,
            "at least one level per factor",
        ));
    }

    let runs: usize = factors.iter().map(|factor| factor.levels.len()).product();
    let mut table = DataTable::new();
    let mut slower = 1;

    for factor in factors {
        if factor.name == RUN_ORDER_COLUMN || table.column(&factor.name).is_ok() {
            return Err(DesignError::invalid_argument(
                "factor",
                &factor.name,
                "unique factor names",
            ));
        }
        let v = factor.levels.len();
        let repeat = runs / (slower * v);

        let mut values = Vec::with_capacity(runs);
        for _ in 0..slower {
            for level in &factor.levels {
                values.extend(std::iter::repeat(level.clone()).take(repeat));
            }
        }
        table = table.with_column(factor.name.clone(), level_column(values))?;
        slower *= v;
    }

    let mut order: Vec<f64> = (0..runs).map(|i| i as f64).collect();
    order.shuffle(rng);
    table.with_column(RUN_ORDER_COLUMN, order)
}
