//! The ETL run
//!
//! Catalog tables are written first, then the tables derived from the event
//! log, then the fact table. Stages run one after another; the first failure
//! ends the run.

use std::fmt;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::PipelineSettings;
use crate::error::Result;
use crate::reader::{filter_song_plays, read_catalog, read_events};
use crate::tables::{
    ARTISTS, SONGPLAYS, SONGS, TIME, USERS, build_artists_table, build_songplays_table,
    build_songs_table, build_time_table, build_users_table,
};
use crate::utils::io::{PartitionedWriter, Storage, TableWriteReport};

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub job_id: String,
    pub profile: String,
    pub tables: Vec<TableWriteReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Report for one table by name
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableWriteReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Rows written across all tables
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run {} (profile {}) finished in {:?}",
            self.job_id, self.profile, self.elapsed
        )?;
        for report in &self.tables {
            if report.skipped {
                writeln!(
                    f,
                    "  {:<10} skipped (exists at {})",
                    report.table,
                    report.path.display()
                )?;
            } else {
                writeln!(
                    f,
                    "  {:<10} {:>8} rows in {} files at {}",
                    report.table,
                    report.rows,
                    report.files,
                    report.path.display()
                )?;
            }
        }
        Ok(())
    }
}

/// A configured run against one profile
///
/// A pipeline can be run more than once. Every run gets a fresh job id, so
/// appending runs never reuse a part-file name.
#[derive(Debug)]
pub struct Pipeline {
    settings: PipelineSettings,
    input: Storage,
    output: Storage,
}

impl Pipeline {
    /// Resolve storage for the profile's roots
    ///
    /// # Errors
    /// Storage errors for unsupported or uncredentialed roots
    pub fn new(settings: PipelineSettings) -> Result<Self> {
        let input = Storage::connect(&settings.input_root, settings.credentials.as_ref())?;
        let output = Storage::connect(&settings.output_root, settings.credentials.as_ref())?;

        Ok(Self {
            settings,
            input,
            output,
        })
    }

    /// Run every stage in order under a new job id
    pub fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let job_id = Uuid::new_v4().to_string();
        let writer = PartitionedWriter::new(self.settings.output, job_id.clone());
        log::info!(
            "Starting run {job_id} for profile {} ({} -> {})",
            self.settings.profile,
            self.input.location(),
            self.output.location()
        );

        let mut tables = self.process_song_data(&writer)?;
        tables.extend(self.process_log_data(&writer)?);

        Ok(RunSummary {
            job_id,
            profile: self.settings.profile.clone(),
            tables,
            elapsed: start.elapsed(),
        })
    }

    /// Build and write the songs and artists tables
    pub fn process_song_data(&self, writer: &PartitionedWriter) -> Result<Vec<TableWriteReport>> {
        let catalog = read_catalog(&self.input, &self.settings.input.song_data)?;

        let songs = build_songs_table(&catalog)?;
        let songs = SONGS.write(writer, &self.output, &songs)?;

        let artists = build_artists_table(&catalog)?;
        let artists = ARTISTS.write(writer, &self.output, &artists)?;

        Ok(vec![songs, artists])
    }

    /// Build and write the users, time and songplays tables
    pub fn process_log_data(&self, writer: &PartitionedWriter) -> Result<Vec<TableWriteReport>> {
        let events = read_events(&self.input, &self.settings.input.log_data)?;
        let plays = filter_song_plays(&events)?;

        let users = build_users_table(&plays)?;
        let users = USERS.write(writer, &self.output, &users)?;

        let time = build_time_table(&plays)?;
        let time = TIME.write(writer, &self.output, &time)?;

        let catalog = read_catalog(&self.input, &self.settings.input.song_data)?;
        let songplays = build_songplays_table(&plays, &catalog)?;
        if songplays.num_rows() == 0 {
            log::info!(
                "No song plays matched a catalog entry; writing an empty {} table",
                SONGPLAYS.name
            );
        }
        let songplays = SONGPLAYS.write(writer, &self.output, &songplays)?;

        Ok(vec![users, time, songplays])
    }
}
