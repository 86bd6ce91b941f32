//! Output table definitions
//!
//! Every output table has a fixed Arrow schema, a directory name under the
//! output root and a partition layout. The builders in the submodules derive
//! table contents from the input batches; [`TableSpec`] ties a built batch to
//! where and how it is written.

pub mod artists;
pub mod songplays;
pub mod songs;
pub mod time;
pub mod users;

use std::path::PathBuf;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::error::{EtlError, Result};
use crate::utils::io::{PartitionedWriter, Storage, TableWriteReport, read_partitioned};

pub use artists::{artists_schema, build_artists_table};
pub use songplays::{build_songplays_table, songplays_schema};
pub use songs::{build_songs_table, songs_schema};
pub use time::{build_time_table, derive_datetime, derive_start_time, epoch_seconds, time_schema};
pub use users::{build_users_table, users_schema};

/// Output column names shared across tables
pub mod columns {
    pub const ID: &str = "id";
    pub const ARTIST_ID: &str = "artist_id";
    pub const DURATION: &str = "duration";
    pub const TITLE: &str = "title";
    pub const YEAR: &str = "year";
    pub const NAME: &str = "name";
    pub const LOCATION: &str = "location";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const GENDER: &str = "gender";
    pub const LEVEL: &str = "level";
    pub const START_TIME: &str = "start_time";
    pub const MONTH: &str = "month";
    pub const DAY_OF_MONTH: &str = "day_of_month";
    pub const HOUR: &str = "hour";
    pub const WEEK_OF_YEAR: &str = "week_of_year";
    pub const SONGPLAY_ID: &str = "songplay_id";
    pub const USER_ID: &str = "user_id";
    pub const SONG_ID: &str = "song_id";
    pub const SESSION_ID: &str = "session_id";
    pub const USER_AGENT: &str = "user_agent";
}

/// Where and how an output table is stored
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Table name used in logs and reports
    pub name: &'static str,
    /// Directory under the output root
    pub dir_name: &'static str,
    /// Partition columns, outermost first
    pub partition_by: &'static [&'static str],
    schema: fn() -> SchemaRef,
}

impl TableSpec {
    /// Declared schema of the table
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        (self.schema)()
    }

    /// Table directory under the given output storage
    #[must_use]
    pub fn path(&self, storage: &Storage) -> PathBuf {
        storage.path(self.dir_name)
    }

    /// Check a built batch against the declared schema and write it
    pub fn write(
        &self,
        writer: &PartitionedWriter,
        storage: &Storage,
        batch: &RecordBatch,
    ) -> Result<TableWriteReport> {
        let batch = conform(batch, &self.schema())?;
        writer.write(self.name, &self.path(storage), &batch, self.partition_by)
    }
}

pub const SONGS: TableSpec = TableSpec {
    name: "songs",
    dir_name: "songs.parquet",
    partition_by: &[columns::YEAR, columns::ARTIST_ID],
    schema: songs_schema,
};

pub const ARTISTS: TableSpec = TableSpec {
    name: "artists",
    dir_name: "artists.parquet",
    partition_by: &[],
    schema: artists_schema,
};

pub const USERS: TableSpec = TableSpec {
    name: "users",
    dir_name: "users.parquet",
    partition_by: &[columns::GENDER],
    schema: users_schema,
};

pub const TIME: TableSpec = TableSpec {
    name: "time",
    dir_name: "time_table.parquet",
    partition_by: &[columns::YEAR, columns::MONTH],
    schema: time_schema,
};

pub const SONGPLAYS: TableSpec = TableSpec {
    name: "songplays",
    dir_name: "songplays.parquet",
    partition_by: &[columns::YEAR, columns::MONTH],
    schema: songplays_schema,
};

/// All output tables in the order the pipeline writes them
pub const ALL_TABLES: [TableSpec; 5] = [SONGS, ARTISTS, USERS, TIME, SONGPLAYS];

/// Rebind a batch to the declared schema
///
/// Column names and order must match exactly; Arrow checks the types and
/// that non-nullable columns hold no nulls.
pub fn conform(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let actual = batch.schema();
    let actual_names: Vec<&str> = actual.fields().iter().map(|f| f.name().as_str()).collect();
    let expected_names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    if actual_names != expected_names {
        return Err(EtlError::schema(format!(
            "Columns {actual_names:?} do not match table columns {expected_names:?}"
        )));
    }
    Ok(RecordBatch::try_new(schema.clone(), batch.columns().to_vec())?)
}

/// Read a written table back, partition columns included
pub fn read_table(storage: &Storage, spec: &TableSpec) -> Result<RecordBatch> {
    read_partitioned(&spec.path(storage), &spec.schema(), spec.partition_by)
}
