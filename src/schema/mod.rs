//! Fixed input schemas
//!
//! The catalog and event log files are read against these Arrow schemas.
//! Field names are the JSON keys as they appear in the source files; table
//! builders rename them to the snake_case output columns.

pub mod adapt;

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};

pub use adapt::{adapt_value, decode_json_lines};

/// Time zone attached to derived timestamps
pub const UTC: &str = "UTC";

/// Column names of catalog (song) records
pub mod song {
    pub const ARTIST_ID: &str = "artist_id";
    pub const ARTIST_LATITUDE: &str = "artist_latitude";
    pub const ARTIST_LOCATION: &str = "artist_location";
    pub const ARTIST_LONGITUDE: &str = "artist_longitude";
    pub const ARTIST_NAME: &str = "artist_name";
    pub const DURATION: &str = "duration";
    pub const NUM_SONGS: &str = "num_songs";
    pub const SONG_ID: &str = "song_id";
    pub const TITLE: &str = "title";
    pub const YEAR: &str = "year";
}

/// Column names of event log records
pub mod event {
    pub const ARTIST: &str = "artist";
    pub const AUTH: &str = "auth";
    pub const FIRST_NAME: &str = "firstName";
    pub const GENDER: &str = "gender";
    pub const ITEM_IN_SESSION: &str = "itemInSession";
    pub const LAST_NAME: &str = "lastName";
    pub const LENGTH: &str = "length";
    pub const LEVEL: &str = "level";
    pub const LOCATION: &str = "location";
    pub const METHOD: &str = "method";
    pub const PAGE: &str = "page";
    pub const REGISTRATION: &str = "registration";
    pub const SESSION_ID: &str = "sessionId";
    pub const SONG: &str = "song";
    pub const STATUS: &str = "status";
    pub const TS: &str = "ts";
    pub const USER_AGENT: &str = "userAgent";
    pub const USER_ID: &str = "userId";
}

/// Page value marking a song play
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// Schema of catalog (song) records
#[must_use]
pub fn song_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(song::ARTIST_ID, DataType::Utf8, true),
        Field::new(song::ARTIST_LATITUDE, DataType::Float64, true),
        Field::new(song::ARTIST_LOCATION, DataType::Utf8, true),
        Field::new(song::ARTIST_LONGITUDE, DataType::Float64, true),
        Field::new(song::ARTIST_NAME, DataType::Utf8, true),
        Field::new(song::DURATION, DataType::Float64, true),
        Field::new(song::NUM_SONGS, DataType::Int32, true),
        Field::new(song::SONG_ID, DataType::Utf8, true),
        Field::new(song::TITLE, DataType::Utf8, true),
        Field::new(song::YEAR, DataType::Int32, true),
    ]))
}

/// Schema of event log records
#[must_use]
pub fn log_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(event::ARTIST, DataType::Utf8, true),
        Field::new(event::AUTH, DataType::Utf8, true),
        Field::new(event::FIRST_NAME, DataType::Utf8, true),
        Field::new(event::GENDER, DataType::Utf8, true),
        Field::new(event::ITEM_IN_SESSION, DataType::Int32, true),
        Field::new(event::LAST_NAME, DataType::Utf8, true),
        Field::new(event::LENGTH, DataType::Float64, true),
        Field::new(event::LEVEL, DataType::Utf8, true),
        Field::new(event::LOCATION, DataType::Utf8, true),
        Field::new(event::METHOD, DataType::Utf8, true),
        Field::new(event::PAGE, DataType::Utf8, true),
        Field::new(event::REGISTRATION, DataType::Float64, true),
        Field::new(event::SESSION_ID, DataType::Int64, true),
        Field::new(event::SONG, DataType::Utf8, true),
        Field::new(event::STATUS, DataType::Int32, true),
        Field::new(event::TS, DataType::Int64, true),
        Field::new(event::USER_AGENT, DataType::Utf8, true),
        Field::new(event::USER_ID, DataType::Utf8, true),
    ]))
}

/// Arrow type of derived `start_time` columns
#[must_use]
pub fn start_time_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some(UTC.into()))
}
