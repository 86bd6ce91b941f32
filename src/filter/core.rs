//! Core filtering functionality
//!
//! Defines the [`BatchFilter`] trait and the mask application shared by all
//! filters.

use std::collections::HashSet;

use arrow::array::BooleanArray;
use arrow::compute::filter_record_batch as arrow_filter_record_batch;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::error::{EtlError, Result};

/// Filter a record batch based on a boolean mask
///
/// Rows whose mask value is null are dropped, same as `false`.
///
/// # Arguments
/// * `batch` - The record batch to filter
/// * `mask` - The boolean mask indicating which rows to keep
///
/// # Errors
/// Returns an error if the mask length does not match the batch
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return Err(EtlError::filter(format!(
            "Mask length ({}) doesn't match batch row count ({})",
            mask.len(),
            batch.num_rows()
        )));
    }

    Ok(arrow_filter_record_batch(batch, mask)?)
}

/// Trait for objects that can filter record batches
pub trait BatchFilter: std::fmt::Debug {
    /// Filter a record batch
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch>;

    /// Returns the set of column names required by this filter
    fn required_columns(&self) -> HashSet<String>;

    /// Check that `batch` has every column this filter reads
    ///
    /// # Errors
    /// A filter error naming the missing columns, in sorted order
    fn check_columns(&self, batch: &RecordBatch) -> Result<()> {
        let schema = batch.schema();
        let missing = self
            .required_columns()
            .into_iter()
            .filter(|column| schema.index_of(column).is_err())
            .sorted()
            .collect_vec();
        if missing.is_empty() {
            return Ok(());
        }
        Err(EtlError::filter(format!(
            "Columns required by filter not found: {}",
            missing.join(", ")
        )))
    }
}
