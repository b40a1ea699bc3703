//! Tabular inputs and outputs: named-column data tables and the ANOVA summary table.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, Result};

/// A single named column of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Text(_) => "text",
        }
    }

    /// The column's values as treatment-level labels.
    pub fn labels(&self) -> Vec<LevelLabel> {
        match self {
            Column::Numeric(values) => values.iter().copied().map(LevelLabel::Numeric).collect(),
            Column::Text(values) => values.iter().cloned().map(LevelLabel::Text).collect(),
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Numeric(values)
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Text(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Text(values.into_iter().map(str::to_string).collect())
    }
}

/// A table of equally long, named columns.
///
/// Serialized as a JSON object mapping column names to arrays of numbers or
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataTable {
    columns: BTreeMap<String, Column>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, keeping all columns the same length.
    ///
    /// # Errors
    /// `InvalidTable` if the column length differs from existing columns.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: impl Into<Column>,
    ) -> Result<Self> {
        self.insert(name.into(), column.into())?;
        Ok(self)
    }

    fn insert(&mut self, name: String, column: Column) -> Result<()> {
        if let Some(rows) = self.rows() {
            if rows != column.len() {
                return Err(DesignError::InvalidTable(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    column.len(),
                    rows
                )));
            }
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Number of rows, or `None` for a table without columns.
    pub fn rows(&self) -> Option<usize> {
        self.columns.values().next().map(Column::len)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Look up a column by name.
    ///
    /// # Errors
    /// `MissingColumn` if no column has that name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| DesignError::MissingColumn(name.to_string()))
    }

    /// Look up a column that must hold numbers.
    ///
    /// # Errors
    /// `MissingColumn` if absent, `TypeMismatch` if it holds text.
    pub fn numeric_column(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values.as_slice()),
            other => Err(DesignError::TypeMismatch {
                column: name.to_string(),
                expected: "numeric",
                found: other.kind(),
            }),
        }
    }

    /// Parse a table from JSON text.
    ///
    /// # Errors
    /// `InvalidTable` if the text is not an object of equally long arrays of
    /// numbers or strings.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let columns: BTreeMap<String, Column> = serde_json::from_str(json)
            .map_err(|e| DesignError::InvalidTable(format!("expected an object of columns: {e}")))?;
        let mut table = Self::new();
        for (name, column) in columns {
            table.insert(name, column)?;
        }
        Ok(table)
    }

    /// Read a table from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DesignError::InvalidTable(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }
}

/// A treatment-level label, either numeric or textual.
///
/// Numeric labels order by value, text labels lexicographically, and all
/// numeric labels sort before text labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelLabel {
    Numeric(f64),
    Text(String),
}

impl LevelLabel {
    /// The numeric value of this label, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LevelLabel::Numeric(value) => Some(*value),
            LevelLabel::Text(_) => None,
        }
    }
}

impl PartialEq for LevelLabel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LevelLabel {}

impl PartialOrd for LevelLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LevelLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (LevelLabel::Numeric(a), LevelLabel::Numeric(b)) => a.total_cmp(b),
            (LevelLabel::Text(a), LevelLabel::Text(b)) => a.cmp(b),
            (LevelLabel::Numeric(_), LevelLabel::Text(_)) => Ordering::Less,
            (LevelLabel::Text(_), LevelLabel::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for LevelLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelLabel::Numeric(value) => write!(f, "{value}"),
            LevelLabel::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for LevelLabel {
    fn from(value: f64) -> Self {
        LevelLabel::Numeric(value)
    }
}

impl From<&str> for LevelLabel {
    fn from(value: &str) -> Self {
        LevelLabel::Text(value.to_string())
    }
}

/// One row of an ANOVA summary table. Blank cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    pub source: String,
    pub dof: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_of_squares: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_square: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
}

/// An ANOVA summary table: sources of variation with their degrees of
/// freedom, sums of squares, mean squares, F-ratios and p-values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaTable {
    rows: Vec<AnovaRow>,
}

impl AnovaTable {
    pub(crate) fn from_rows(rows: Vec<AnovaRow>) -> Self {
        Self { rows }
    }

    /// Build a table from its five columns: sources of variation, degrees of
    /// freedom, mean squares, F-values and p-values.
    ///
    /// # Errors
    /// `InvalidTable` if the columns differ in length.
    pub fn from_columns(
        sources: Vec<String>,
        dof: Vec<usize>,
        mean_squares: Vec<Option<f64>>,
        f_values: Vec<Option<f64>>,
        p_values: Vec<Option<f64>>,
    ) -> Result<Self> {
        let n = sources.len();
        let lengths = [dof.len(), mean_squares.len(), f_values.len(), p_values.len()];
        if lengths.iter().any(|&len| len != n) {
            return Err(DesignError::InvalidTable(format!(
                "ANOVA table columns must all have {n} entries, got {lengths:?}"
            )));
        }

        let rows = sources
            .into_iter()
            .zip(dof)
            .zip(mean_squares)
            .zip(f_values)
            .zip(p_values)
            .map(|((((source, dof), mean_square), f_ratio), p_value)| AnovaRow {
                source,
                dof,
                sum_of_squares: None,
                mean_square,
                f_ratio,
                p_value,
            })
            .collect();
        Ok(Self { rows })
    }

    /// Attach a sum-of-squares column.
    ///
    /// # Errors
    /// `InvalidTable` if the column length differs from the row count.
    pub fn with_sum_of_squares(mut self, sums: Vec<f64>) -> Result<Self> {
        if sums.len() != self.rows.len() {
            return Err(DesignError::InvalidTable(format!(
                "expected {} sums of squares, got {}",
                self.rows.len(),
                sums.len()
            )));
        }
        for (row, ss) in self.rows.iter_mut().zip(sums) {
            row.sum_of_squares = Some(ss);
        }
        Ok(self)
    }

    pub fn rows(&self) -> &[AnovaRow] {
        &self.rows
    }

    /// Find a row by its source of variation.
    pub fn row(&self, source: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|row| row.source == source)
    }
}
