//! Users dimension table

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::event;
use crate::tables::columns::{FIRST_NAME, GENDER, ID, LAST_NAME, LEVEL, LOCATION};
use crate::tables::conform;
use crate::utils::arrow::{distinct, project_renamed};

#[must_use]
pub fn users_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID, DataType::Utf8, true),
        Field::new(FIRST_NAME, DataType::Utf8, true),
        Field::new(LAST_NAME, DataType::Utf8, true),
        Field::new(GENDER, DataType::Utf8, true),
        Field::new(LEVEL, DataType::Utf8, true),
        Field::new(LOCATION, DataType::Utf8, true),
    ]))
}

/// Distinct user rows from song-play events
///
/// Rows differing in any column (a user moving from `free` to `paid`, say)
/// are kept as separate rows.
pub fn build_users_table(plays: &RecordBatch) -> Result<RecordBatch> {
    let projected = project_renamed(
        plays,
        &[
            (event::USER_ID, ID),
            (event::FIRST_NAME, FIRST_NAME),
            (event::LAST_NAME, LAST_NAME),
            (event::GENDER, GENDER),
            (event::LEVEL, LEVEL),
            (event::LOCATION, LOCATION),
        ],
    )?;
    let users = distinct(&projected, &[])?;
    conform(&users, &users_schema())
}
