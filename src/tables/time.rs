//! Time dimension table and timestamp derivation
//!
//! Event timestamps are epoch milliseconds. They are truncated to whole
//! seconds and interpreted as UTC; the same derivation feeds the songplays
//! table so both tables agree on `start_time`.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array, Int64Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::Result;
use crate::schema::{UTC, event, start_time_type};
use crate::tables::columns::{DAY_OF_MONTH, HOUR, MONTH, START_TIME, WEEK_OF_YEAR, YEAR};
use crate::utils::arrow::{distinct, downcast_array, get_column};

const MILLIS_PER_SECOND: i64 = 1_000;
const MICROS_PER_SECOND: i64 = 1_000_000;

#[must_use]
pub fn time_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(START_TIME, start_time_type(), true),
        Field::new(YEAR, DataType::Int32, true),
        Field::new(MONTH, DataType::Int32, true),
        Field::new(DAY_OF_MONTH, DataType::Int32, true),
        Field::new(HOUR, DataType::Int32, true),
        Field::new(WEEK_OF_YEAR, DataType::Int32, true),
    ]))
}

/// Whole seconds of an epoch-millisecond timestamp, truncating toward zero
#[must_use]
pub const fn epoch_seconds(ts_millis: i64) -> i64 {
    ts_millis / MILLIS_PER_SECOND
}

/// UTC datetime of an epoch-millisecond timestamp, truncated to seconds
///
/// `None` when the value is outside chrono's representable range.
#[must_use]
pub fn derive_datetime(ts_millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch_seconds(ts_millis), 0)
}

/// `start_time` column for a column of epoch-millisecond timestamps
#[must_use]
pub fn derive_start_time(ts: &Int64Array) -> TimestampMicrosecondArray {
    ts.iter()
        .map(|value| {
            value
                .and_then(derive_datetime)
                .and_then(|dt| dt.timestamp().checked_mul(MICROS_PER_SECOND))
        })
        .collect::<TimestampMicrosecondArray>()
        .with_timezone(UTC)
}

/// Extract one calendar field from every `start_time` value
pub(crate) fn calendar_part(
    start_time: &TimestampMicrosecondArray,
    part: fn(&DateTime<Utc>) -> i32,
) -> Int32Array {
    start_time
        .iter()
        .map(|value| value.and_then(DateTime::from_timestamp_micros).map(|dt| part(&dt)))
        .collect()
}

pub(crate) fn year_of(dt: &DateTime<Utc>) -> i32 {
    dt.year()
}

pub(crate) fn month_of(dt: &DateTime<Utc>) -> i32 {
    dt.month() as i32
}

fn day_of(dt: &DateTime<Utc>) -> i32 {
    dt.day() as i32
}

fn hour_of(dt: &DateTime<Utc>) -> i32 {
    dt.hour() as i32
}

fn iso_week_of(dt: &DateTime<Utc>) -> i32 {
    dt.iso_week().week() as i32
}

/// One row per distinct `start_time` among song-play events
///
/// Events without a usable `ts` collapse into a single row whose columns are
/// all null.
pub fn build_time_table(plays: &RecordBatch) -> Result<RecordBatch> {
    let ts = get_column(plays, event::TS)?;
    let ts = downcast_array::<Int64Array>(&ts, event::TS, "Int64")?;

    let start_time = Arc::new(derive_start_time(ts)) as ArrayRef;
    let times = RecordBatch::try_new(
        Arc::new(Schema::new(vec![Field::new(START_TIME, start_time_type(), true)])),
        vec![start_time],
    )?;
    let times = distinct(&times, &[START_TIME])?;

    let start_time = times.column(0);
    let start_time =
        downcast_array::<TimestampMicrosecondArray>(start_time, START_TIME, "Timestamp")?;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(start_time.clone()),
        Arc::new(calendar_part(start_time, year_of)),
        Arc::new(calendar_part(start_time, month_of)),
        Arc::new(calendar_part(start_time, day_of)),
        Arc::new(calendar_part(start_time, hour_of)),
        Arc::new(calendar_part(start_time, iso_week_of)),
    ];
    Ok(RecordBatch::try_new(time_schema(), columns)?)
}
