use std::fs;

use songplays_etl::config::WriteMode;
use songplays_etl::tables::{ALL_TABLES, SONGPLAYS, SONGS, USERS};
use songplays_etl::utils::io::find_parquet_files;
use songplays_etl::{EtlError, Pipeline};

use crate::utils::{KNOWN_TS, Lake, play, song};

fn small_lake() -> Lake {
    let lake = Lake::new();
    lake.add_songs(
        "A/B/C/TR1.json",
        &[
            song("Explorer", "Test Song", "S1", "A1", 2000),
            song("Casual", "I Didn't Mean To", "S2", "A2", 0),
        ],
    );
    lake.add_events(
        "events.json",
        &[
            play("Explorer", "Test Song", "U1", KNOWN_TS),
            play("Casual", "I Didn't Mean To", "U2", KNOWN_TS + 1_000),
        ],
    );
    lake
}

#[test]
fn test_error_if_exists_refuses_existing_tables() {
    let lake = small_lake();
    lake.run(WriteMode::ErrorIfExists).unwrap();

    let err = lake.run(WriteMode::ErrorIfExists).unwrap_err();
    assert!(matches!(err, EtlError::TableExists(path) if path.ends_with("songs.parquet")));
}

#[test]
fn test_overwrite_reproduces_identical_tables() {
    let lake = small_lake();
    lake.run(WriteMode::Overwrite).unwrap();
    let first: Vec<_> = ALL_TABLES.iter().map(|spec| lake.read(spec)).collect();

    lake.run(WriteMode::Overwrite).unwrap();
    let second: Vec<_> = ALL_TABLES.iter().map(|spec| lake.read(spec)).collect();

    assert_eq!(first, second);
    let files = find_parquet_files(&SONGPLAYS.path(&lake.output())).unwrap();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_ignore_leaves_existing_tables_untouched() {
    let lake = small_lake();
    lake.run(WriteMode::ErrorIfExists).unwrap();
    let before = find_parquet_files(&lake.output_root()).unwrap();

    let summary = lake.run(WriteMode::Ignore).unwrap();
    assert!(summary.tables.iter().all(|t| t.skipped));
    assert_eq!(summary.total_rows(), 0);
    assert_eq!(find_parquet_files(&lake.output_root()).unwrap(), before);
}

#[test]
fn test_append_adds_part_files() {
    let lake = small_lake();
    lake.run(WriteMode::Append).unwrap();
    let songs = lake.read(&SONGS).num_rows();
    let users = lake.read(&USERS).num_rows();

    lake.run(WriteMode::Append).unwrap();
    assert_eq!(lake.read(&SONGS).num_rows(), songs * 2);
    assert_eq!(lake.read(&USERS).num_rows(), users * 2);
    assert_eq!(lake.read(&SONGPLAYS).num_rows(), 4);
}

#[test]
fn test_one_pipeline_can_append_twice() {
    let lake = small_lake();
    let pipeline = Pipeline::new(lake.settings(WriteMode::Append)).unwrap();

    let first = pipeline.run().unwrap();
    let second = pipeline.run().unwrap();
    assert_ne!(first.job_id, second.job_id);

    assert_eq!(lake.read(&SONGS).num_rows(), 4);
    assert_eq!(lake.read(&USERS).num_rows(), 4);
    assert_eq!(lake.read(&SONGPLAYS).num_rows(), 4);
    let files = find_parquet_files(&USERS.path(&lake.output())).unwrap();
    assert_eq!(files.len(), 2);
}

#[test]
fn test_ignore_writes_missing_tables() {
    let lake = small_lake();
    lake.run(WriteMode::ErrorIfExists).unwrap();
    fs::remove_dir_all(USERS.path(&lake.output())).unwrap();

    let summary = lake.run(WriteMode::Ignore).unwrap();
    let users = summary.table("users").unwrap();
    assert!(!users.skipped);
    assert_eq!(users.rows, 2);
    assert!(summary.table("songs").unwrap().skipped);
}
