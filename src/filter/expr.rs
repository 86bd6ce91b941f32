//! Expression-based filtering
//!
//! A small expression language over Arrow columns. Evaluation follows SQL
//! three-valued logic: comparing against a null value yields null, and a null
//! result never selects a row.

use std::collections::HashSet;

use arrow::array::{Array, ArrayRef, BooleanArray, Int32Array, Int64Array, StringArray};
use arrow::compute::kernels::cmp::{eq, neq};
use arrow::compute::{and_kleene, is_not_null, is_null, not, or_kleene};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{EtlError, Result};
use crate::filter::core::{BatchFilter, filter_record_batch};

/// Represents a filter expression over record batch columns
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column equals a literal value
    Eq(String, LiteralValue),

    /// Column not equals a literal value
    NotEq(String, LiteralValue),

    /// Column is null
    IsNull(String),

    /// Column is not null
    IsNotNull(String),

    /// Logical AND of expressions
    And(Vec<Expr>),

    /// Logical OR of expressions
    Or(Vec<Expr>),

    /// Logical NOT of an expression
    Not(Box<Expr>),
}

/// Represents a literal value that can be used in filter expressions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    /// Integer value, compared against Int32 or Int64 columns
    Int(i64),

    /// String value
    String(String),
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl Expr {
    /// `column == value`
    pub fn eq(column: &str, value: impl Into<LiteralValue>) -> Self {
        Self::Eq(column.to_string(), value.into())
    }

    /// Returns a set of all column names required by this expression
    #[must_use]
    pub fn required_columns(&self) -> HashSet<String> {
        let mut columns = HashSet::new();
        self.collect_required_columns(&mut columns);
        columns
    }

    fn collect_required_columns(&self, columns: &mut HashSet<String>) {
        match self {
            Self::Eq(col, _) | Self::NotEq(col, _) | Self::IsNull(col) | Self::IsNotNull(col) => {
                columns.insert(col.clone());
            }
            Self::And(exprs) | Self::Or(exprs) => {
                for expr in exprs {
                    expr.collect_required_columns(columns);
                }
            }
            Self::Not(expr) => expr.collect_required_columns(columns),
        }
    }

    /// Evaluate the expression to a row mask
    pub fn evaluate(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        match self {
            Self::Eq(col_name, literal) => {
                let column = column(batch, col_name)?;
                compare(&column, col_name, literal, false)
            }
            Self::NotEq(col_name, literal) => {
                let column = column(batch, col_name)?;
                compare(&column, col_name, literal, true)
            }
            Self::IsNull(col_name) => Ok(is_null(column(batch, col_name)?.as_ref())?),
            Self::IsNotNull(col_name) => Ok(is_not_null(column(batch, col_name)?.as_ref())?),
            Self::And(exprs) => {
                let mut result = BooleanArray::from(vec![true; batch.num_rows()]);
                for expr in exprs {
                    result = and_kleene(&result, &expr.evaluate(batch)?)?;
                }
                Ok(result)
            }
            Self::Or(exprs) => {
                let mut result = BooleanArray::from(vec![false; batch.num_rows()]);
                for expr in exprs {
                    result = or_kleene(&result, &expr.evaluate(batch)?)?;
                }
                Ok(result)
            }
            Self::Not(expr) => Ok(not(&expr.evaluate(batch)?)?),
        }
    }
}

fn column(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    batch
        .column_by_name(name)
        .cloned()
        .ok_or_else(|| EtlError::filter(format!("Column '{name}' not found")))
}

fn compare(
    column: &ArrayRef,
    col_name: &str,
    literal: &LiteralValue,
    negate: bool,
) -> Result<BooleanArray> {
    let op = if negate { neq } else { eq };

    let result = match (column.data_type(), literal) {
        (DataType::Utf8, LiteralValue::String(s)) => {
            op(column, &StringArray::new_scalar(s.as_str()))?
        }
        (DataType::Int64, LiteralValue::Int(v)) => op(column, &Int64Array::new_scalar(*v))?,
        (DataType::Int32, LiteralValue::Int(v)) => match i32::try_from(*v) {
            Ok(v) => op(column, &Int32Array::new_scalar(v))?,
            // Out of range for the column: no non-null value can be equal
            Err(_) => (0..column.len())
                .map(|i| column.is_valid(i).then_some(negate))
                .collect(),
        },
        (data_type, literal) => {
            return Err(EtlError::filter(format!(
                "Cannot compare column '{col_name}' of type {data_type} with {literal:?}"
            )));
        }
    };

    Ok(result)
}

/// A filter that evaluates an expression against a record batch
#[derive(Debug, Clone)]
pub struct ExpressionFilter {
    expr: Expr,
}

impl ExpressionFilter {
    /// Create a new expression filter
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }
}

impl BatchFilter for ExpressionFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        self.check_columns(batch)?;
        let mask = self.expr.evaluate(batch)?;
        filter_record_batch(batch, &mask)
    }

    fn required_columns(&self) -> HashSet<String> {
        self.expr.required_columns()
    }
}
