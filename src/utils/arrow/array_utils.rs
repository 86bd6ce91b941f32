//! Utilities for working with Arrow arrays and record batches.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::{Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{EtlError, Result};

/// Get a column from a record batch by name
///
/// # Errors
/// Returns a schema error naming the missing column
pub fn get_column(batch: &RecordBatch, column_name: &str) -> Result<ArrayRef> {
    batch
        .column_by_name(column_name)
        .cloned()
        .ok_or_else(|| {
            EtlError::schema(format!("Column '{column_name}' not found in record batch"))
        })
}

/// Downcast an array to a concrete Arrow array type
///
/// # Arguments
/// * `array` - The array to downcast
/// * `column_name` - Column name for the error message
/// * `expected` - Human-readable expected type for the error message
pub fn downcast_array<'a, T: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected: &str,
) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        EtlError::schema(format!(
            "Column '{column_name}' is {} but {expected} was expected",
            array.data_type()
        ))
    })
}

/// Select columns from a batch, renaming each on the way out
///
/// Output columns appear in the order of `mapping`, each given as
/// `(source_name, output_name)`.
pub fn project_renamed(batch: &RecordBatch, mapping: &[(&str, &str)]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<FieldRef> = Vec::with_capacity(mapping.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(mapping.len());

    for (source, target) in mapping {
        let field = schema
            .field_with_name(source)
            .map_err(|_| EtlError::schema(format!("Column '{source}' not found in record batch")))?;
        fields.push(Arc::new(Field::new(
            *target,
            field.data_type().clone(),
            field.is_nullable(),
        )));
        columns.push(get_column(batch, source)?);
    }

    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        columns,
    )?)
}

/// Append a column to a batch, or prepend it when `first` is set
pub fn with_column(
    batch: &RecordBatch,
    field: Field,
    array: ArrayRef,
    first: bool,
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    if first {
        fields.insert(0, Arc::new(field));
        columns.insert(0, array);
    } else {
        fields.push(Arc::new(field));
        columns.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
