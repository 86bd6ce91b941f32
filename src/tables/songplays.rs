//! Songplays fact table
//!
//! Song-play events are matched to catalog entries on exact
//! `(artist name, song title)` equality. Events without a match are dropped;
//! an event matching several catalog entries yields one row per entry before
//! deduplication.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::schema::{event, song, start_time_type};
use crate::tables::columns::{
    ARTIST_ID, LEVEL, LOCATION, MONTH, SESSION_ID, SONG_ID, SONGPLAY_ID, START_TIME, USER_AGENT,
    USER_ID, YEAR,
};
use crate::tables::conform;
use crate::tables::time::{calendar_part, derive_start_time, month_of, year_of};
use crate::utils::arrow::{distinct, downcast_array, get_column, with_column};

#[must_use]
pub fn songplays_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(SONGPLAY_ID, DataType::Int64, false),
        Field::new(START_TIME, start_time_type(), true),
        Field::new(USER_ID, DataType::Utf8, true),
        Field::new(LEVEL, DataType::Utf8, true),
        Field::new(SONG_ID, DataType::Utf8, true),
        Field::new(ARTIST_ID, DataType::Utf8, true),
        Field::new(SESSION_ID, DataType::Int64, true),
        Field::new(LOCATION, DataType::Utf8, true),
        Field::new(USER_AGENT, DataType::Utf8, true),
        Field::new(YEAR, DataType::Int32, true),
        Field::new(MONTH, DataType::Int32, true),
    ]))
}

/// Matching `(play row, catalog row)` index pairs, in play order
fn match_plays(
    artists: &StringArray,
    songs: &StringArray,
    catalog_artists: &StringArray,
    catalog_titles: &StringArray,
) -> (Vec<u32>, Vec<u32>) {
    let mut index: FxHashMap<(&str, &str), Vec<u32>> = FxHashMap::default();
    for row in 0..catalog_artists.len() {
        if catalog_artists.is_valid(row) && catalog_titles.is_valid(row) {
            index
                .entry((catalog_artists.value(row), catalog_titles.value(row)))
                .or_default()
                .push(row as u32);
        }
    }

    let mut play_rows = Vec::new();
    let mut catalog_rows = Vec::new();
    for row in 0..artists.len() {
        if artists.is_null(row) || songs.is_null(row) {
            continue;
        }
        if let Some(matches) = index.get(&(artists.value(row), songs.value(row))) {
            for catalog_row in matches {
                play_rows.push(row as u32);
                catalog_rows.push(*catalog_row);
            }
        }
    }
    (play_rows, catalog_rows)
}

/// Join song-play events to the catalog and number the distinct results
///
/// # Arguments
/// * `plays` - Events already restricted to song plays
/// * `catalog` - Catalog records
pub fn build_songplays_table(plays: &RecordBatch, catalog: &RecordBatch) -> Result<RecordBatch> {
    let artist = get_column(plays, event::ARTIST)?;
    let title = get_column(plays, event::SONG)?;
    let catalog_artist = get_column(catalog, song::ARTIST_NAME)?;
    let catalog_title = get_column(catalog, song::TITLE)?;

    let (play_rows, catalog_rows) = match_plays(
        downcast_array::<StringArray>(&artist, event::ARTIST, "Utf8")?,
        downcast_array::<StringArray>(&title, event::SONG, "Utf8")?,
        downcast_array::<StringArray>(&catalog_artist, song::ARTIST_NAME, "Utf8")?,
        downcast_array::<StringArray>(&catalog_title, song::TITLE, "Utf8")?,
    );
    let play_rows = UInt32Array::from(play_rows);
    let catalog_rows = UInt32Array::from(catalog_rows);

    let from_plays = |name: &str| -> Result<ArrayRef> {
        Ok(take(get_column(plays, name)?.as_ref(), &play_rows, None)?)
    };
    let from_catalog = |name: &str| -> Result<ArrayRef> {
        Ok(take(get_column(catalog, name)?.as_ref(), &catalog_rows, None)?)
    };

    let ts = from_plays(event::TS)?;
    let start_time = derive_start_time(downcast_array::<Int64Array>(&ts, event::TS, "Int64")?);
    let year = calendar_part(&start_time, year_of);
    let month = calendar_part(&start_time, month_of);

    let schema = songplays_schema();
    let projected = RecordBatch::try_new(
        Arc::new(Schema::new(schema.fields()[1..].to_vec())),
        vec![
            Arc::new(start_time),
            from_plays(event::USER_ID)?,
            from_plays(event::LEVEL)?,
            from_catalog(song::SONG_ID)?,
            from_catalog(song::ARTIST_ID)?,
            from_plays(event::SESSION_ID)?,
            from_plays(event::LOCATION)?,
            from_plays(event::USER_AGENT)?,
            Arc::new(year),
            Arc::new(month),
        ],
    )?;
    let distinct_plays = distinct(&projected, &[])?;

    let ids = Int64Array::from_iter_values(0..distinct_plays.num_rows() as i64);
    let songplays = with_column(
        &distinct_plays,
        schema.field(0).clone(),
        Arc::new(ids),
        true,
    )?;
    conform(&songplays, &schema)
}
