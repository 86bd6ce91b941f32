//! Songs dimension table

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::song;
use crate::tables::columns::{ARTIST_ID, DURATION, ID, TITLE, YEAR};
use crate::tables::conform;
use crate::utils::arrow::{distinct, project_renamed};

#[must_use]
pub fn songs_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID, DataType::Utf8, true),
        Field::new(ARTIST_ID, DataType::Utf8, true),
        Field::new(DURATION, DataType::Float64, true),
        Field::new(TITLE, DataType::Utf8, true),
        Field::new(YEAR, DataType::Int32, true),
    ]))
}

/// One row per distinct (id, title); the first catalog record wins
pub fn build_songs_table(catalog: &RecordBatch) -> Result<RecordBatch> {
    let projected = project_renamed(
        catalog,
        &[
            (song::SONG_ID, ID),
            (song::ARTIST_ID, ARTIST_ID),
            (song::DURATION, DURATION),
            (song::TITLE, TITLE),
            (song::YEAR, YEAR),
        ],
    )?;
    let songs = distinct(&projected, &[ID, TITLE])?;
    conform(&songs, &songs_schema())
}
