//! Artists dimension table

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::song;
use crate::tables::columns::{ID, LATITUDE, LOCATION, LONGITUDE, NAME};
use crate::tables::conform;
use crate::utils::arrow::{distinct, project_renamed};

#[must_use]
pub fn artists_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID, DataType::Utf8, true),
        Field::new(NAME, DataType::Utf8, true),
        Field::new(LOCATION, DataType::Utf8, true),
        Field::new(LATITUDE, DataType::Float64, true),
        Field::new(LONGITUDE, DataType::Float64, true),
    ]))
}

/// One row per distinct (id, name), taken from the catalog's artist fields
pub fn build_artists_table(catalog: &RecordBatch) -> Result<RecordBatch> {
    let projected = project_renamed(
        catalog,
        &[
            (song::ARTIST_ID, ID),
            (song::ARTIST_NAME, NAME),
            (song::ARTIST_LOCATION, LOCATION),
            (song::ARTIST_LATITUDE, LATITUDE),
            (song::ARTIST_LONGITUDE, LONGITUDE),
        ],
    )?;
    let artists = distinct(&projected, &[ID, NAME])?;
    conform(&artists, &artists_schema())
}
