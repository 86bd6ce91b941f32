//! Row identity helpers
//!
//! Rows are compared through Arrow's row format, which gives every row of a
//! set of columns a byte encoding that is equal exactly when the values are.
//! Nulls encode equal to each other, so deduplication treats two null keys
//! as the same key.

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::utils::arrow::array_utils::get_column;

/// Indices of the first row for each distinct key, in input order
///
/// # Arguments
/// * `batch` - Rows to scan
/// * `columns` - Key columns; an empty slice means every column
pub fn distinct_indices(batch: &RecordBatch, columns: &[&str]) -> Result<Vec<u32>> {
    let arrays: Vec<ArrayRef> = if columns.is_empty() {
        batch.columns().to_vec()
    } else {
        columns
            .iter()
            .map(|name| get_column(batch, name))
            .collect::<Result<_>>()?
    };

    if arrays.is_empty() {
        return Ok((0..batch.num_rows() as u32).collect());
    }

    let converter = RowConverter::new(
        arrays
            .iter()
            .map(|a| SortField::new(a.data_type().clone()))
            .collect(),
    )?;
    let rows = converter.convert_columns(&arrays)?;

    let mut seen = FxHashSet::default();
    let mut keep = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        if seen.insert(row) {
            keep.push(idx as u32);
        }
    }

    Ok(keep)
}

/// Drop duplicate rows, keeping the first occurrence of each key
pub fn distinct(batch: &RecordBatch, columns: &[&str]) -> Result<RecordBatch> {
    let keep = distinct_indices(batch, columns)?;
    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }
    Ok(take_record_batch(batch, &UInt32Array::from(keep))?)
}
