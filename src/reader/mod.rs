//! Reading the JSON input datasets.
//!
//! Each dataset is a glob of newline-delimited JSON files under the input
//! root. Files are decoded in parallel and concatenated in path order, so the
//! row order of a dataset is stable between runs.

use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::error::Result;
use crate::error::util::{safe_read, validate_directory};
use crate::filter::{BatchFilter, Expr, ExpressionFilter};
use crate::schema::{NEXT_SONG_PAGE, decode_json_lines, event, log_schema, song_schema};
use crate::utils::io::Storage;
use crate::utils::logging::{
    create_file_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
};

/// Read every file matching `pattern` under the storage root against `schema`
///
/// # Errors
/// `NoInputFiles` when the pattern matches nothing; IO errors for unreadable
/// files. Record content, including its encoding, never fails the read.
pub fn read_json_dataset(
    storage: &Storage,
    pattern: &str,
    schema: &SchemaRef,
) -> Result<RecordBatch> {
    let start = Instant::now();
    validate_directory(storage.root(), "input data")?;
    log_operation_start(&format!("Reading {pattern} from"), storage.root());

    let files = storage.glob(pattern)?;
    log::debug!("{} files match {pattern}", files.len());

    let pb = create_file_progress_bar(files.len() as u64, Some(pattern));
    let batches = files
        .par_iter()
        .progress_with(pb.clone())
        .map(|path| {
            let bytes = safe_read(path)?;
            decode_json_lines(&bytes, schema, path)
        })
        .collect::<Result<Vec<_>>>()?;
    finish_progress_bar(&pb, Some("decoded"));

    let combined = concat_batches(schema, &batches)?;
    log_operation_complete("read", storage.root(), combined.num_rows(), Some(start.elapsed()));
    Ok(combined)
}

/// Read catalog (song) records
pub fn read_catalog(storage: &Storage, pattern: &str) -> Result<RecordBatch> {
    read_json_dataset(storage, pattern, &song_schema())
}

/// Read event log records
pub fn read_events(storage: &Storage, pattern: &str) -> Result<RecordBatch> {
    read_json_dataset(storage, pattern, &log_schema())
}

/// Filter selecting song-play events
#[must_use]
pub fn next_song_filter() -> ExpressionFilter {
    ExpressionFilter::new(Expr::eq(event::PAGE, NEXT_SONG_PAGE))
}

/// Restrict events to song plays
pub fn filter_song_plays(events: &RecordBatch) -> Result<RecordBatch> {
    let plays = next_song_filter().filter(events)?;
    log::info!(
        "Kept {} of {} events with page = {NEXT_SONG_PAGE}",
        plays.num_rows(),
        events.num_rows()
    );
    Ok(plays)
}
