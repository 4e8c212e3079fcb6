#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::{Error, Result};

/// Values of one column. Missing entries are `None`, or `NaN` for numbers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColumnData {
    Boolean(Vec<Option<bool>>),
    Numeric(Vec<f64>),
    Label {
        n_labels: usize,
        values: Vec<Option<usize>>,
    },
}

impl ColumnData {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(v) => v.len(),
            Self::Numeric(v) => v.len(),
            Self::Label { values, .. } => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Numeric(_) => "numeric",
            Self::Label { .. } => "label",
        }
    }

    /// Numeric view of row `row`: booleans as 0 / 1, labels as their index,
    /// missing values as `NaN`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, row: usize) -> f64 {
        match self {
            Self::Boolean(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(f64::NAN, |b| if b { 1.0 } else { 0.0 }),
            Self::Numeric(v) => v.get(row).copied().unwrap_or(f64::NAN),
            Self::Label { values, .. } => values
                .get(row)
                .copied()
                .flatten()
                .map_or(f64::NAN, |l| l as f64),
        }
    }
}

/// Where a column's values come from.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColumnSource {
    /// Observed directly.
    Variable,
    /// Computed row-wise from other columns.
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Column {
    pub name: String,
    pub source: ColumnSource,
    pub data: ColumnData,
}

/// Column-oriented sample matrix. Every column has `n_samples` rows.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataTable {
    n_samples: usize,
    columns: Vec<Column>,
}

impl DataTable {
    #[must_use]
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Adds an observed column and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnLengthMismatch`] when `data` does not have
    /// `n_samples` rows.
    pub fn add_column(&mut self, name: impl Into<String>, data: ColumnData) -> Result<usize> {
        self.push(name.into(), ColumnSource::Variable, data)
    }

    /// Adds a numeric column holding `expression` evaluated on every row.
    /// Input `i` of the expression reads the column named `inputs[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] for an unknown input name.
    pub fn add_expression_column(
        &mut self,
        name: impl Into<String>,
        expression: Expression,
        inputs: &[&str],
    ) -> Result<usize> {
        let sources = inputs
            .iter()
            .map(|n| self.column_by_name(n).map(|c| &c.data))
            .collect::<Result<Vec<_>>>()?;
        let mut row = vec![0.0; sources.len()];
        let values = (0..self.n_samples)
            .map(|r| {
                for (slot, data) in row.iter_mut().zip(&sources) {
                    *slot = data.value(r);
                }
                expression.evaluate(&row)
            })
            .collect();
        self.push(
            name.into(),
            ColumnSource::Expression(expression),
            ColumnData::Numeric(values),
        )
    }

    fn push(&mut self, name: String, source: ColumnSource, data: ColumnData) -> Result<usize> {
        if data.len() != self.n_samples {
            return Err(Error::ColumnLengthMismatch {
                column: name,
                expected: self.n_samples,
                got: data.len(),
            });
        }
        self.columns.push(Column { name, source, data });
        Ok(self.columns.len() - 1)
    }

    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] for an unknown index.
    pub fn column(&self, index: usize) -> Result<&Column> {
        self.columns.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.columns.len(),
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] when no column has that name.
    pub fn column_by_name(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_owned()))
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// The numeric values of column `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnTypeMismatch`] for a non-numeric column.
    pub fn numeric(&self, index: usize) -> Result<&[f64]> {
        let column = self.column(index)?;
        match &column.data {
            ColumnData::Numeric(v) => Ok(v),
            _ => Err(Error::ColumnTypeMismatch {
                column: column.name.clone(),
                expected: "numeric",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Operator;

    fn table() -> DataTable {
        let mut t = DataTable::new(4);
        t.add_column("x", ColumnData::Numeric(vec![1.0, 2.0, f64::NAN, 4.0]))
            .unwrap();
        t.add_column(
            "flag",
            ColumnData::Boolean(vec![Some(true), None, Some(false), Some(true)]),
        )
        .unwrap();
        t.add_column(
            "class",
            ColumnData::Label {
                n_labels: 3,
                values: vec![Some(0), Some(2), Some(1), None],
            },
        )
        .unwrap();
        t
    }

    #[test]
    fn lookup_by_name_and_index() {
        let t = table();
        assert_eq!(t.n_columns(), 3);
        assert_eq!(t.column_index("flag"), Some(1));
        assert_eq!(t.column_by_name("class").unwrap().data.type_name(), "label");
        assert!(matches!(t.column_by_name("y"), Err(Error::UnknownColumn(_))));
        assert!(matches!(t.column(9), Err(Error::IndexOutOfRange { index: 9, len: 3 })));
        assert!(matches!(t.numeric(1), Err(Error::ColumnTypeMismatch { .. })));
    }

    #[test]
    fn column_length_is_checked() {
        let mut t = table();
        let err = t
            .add_column("short", ColumnData::Numeric(vec![1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnLengthMismatch {
                expected: 4,
                got: 1,
                ..
            }
        ));
        assert_eq!(t.n_columns(), 3);
    }

    #[test]
    fn expression_columns_propagate_missing_values() {
        let mut t = table();
        let e = Expression::apply(Operator::Add, vec![Expression::Input(0), Expression::Input(1)]);
        let i = t.add_expression_column("x+flag", e.clone(), &["x", "flag"]).unwrap();
        let v = t.numeric(i).unwrap();
        assert!((v[0] - 2.0).abs() < 1e-12);
        assert!(v[1].is_nan());
        assert!(v[2].is_nan());
        assert!((v[3] - 5.0).abs() < 1e-12);
        assert_eq!(t.column(i).unwrap().source, ColumnSource::Expression(e));
    }
}
