use arrow::array::{Array, TimestampMicrosecondArray};
use serde::Deserialize;
use serde_json::json;
use songplays_etl::config::{Credentials, WriteMode};
use songplays_etl::tables::columns::*;
use songplays_etl::tables::{ARTISTS, SONGPLAYS, SONGS, TIME, USERS};
use songplays_etl::utils::io::SUCCESS_MARKER;
use songplays_etl::{EtlError, Pipeline};

use crate::utils::{KNOWN_TS, Lake, decode_rows, play, song};

#[derive(Debug, Deserialize, PartialEq)]
struct SongplayRow {
    songplay_id: i64,
    user_id: Option<String>,
    level: Option<String>,
    song_id: Option<String>,
    artist_id: Option<String>,
    session_id: Option<i64>,
    location: Option<String>,
    user_agent: Option<String>,
    year: Option<i32>,
    month: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct UserIdRow {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SongplayIdRow {
    songplay_id: i64,
}

#[derive(Debug, Deserialize, PartialEq)]
struct TimeRow {
    year: Option<i32>,
    month: Option<i32>,
    day_of_month: Option<i32>,
    hour: Option<i32>,
    week_of_year: Option<i32>,
}

fn explorer_lake() -> Lake {
    let lake = Lake::new();
    lake.add_songs(
        "A/B/C/TRAAAAA.json",
        &[song("Explorer", "Test Song", "S1", "A1", 2000)],
    );
    lake.add_songs(
        "A/B/D/TRAAAAB.json",
        &[song("Casual", "I Didn't Mean To", "S2", "A2", 0)],
    );

    let mut home = play("Explorer", "Test Song", "U2", KNOWN_TS);
    home["page"] = json!("Home");
    lake.add_events(
        "2018-11-02-events.json",
        &[
            play("Explorer", "Test Song", "U1", KNOWN_TS),
            home,
            play("Nobody", "Unknown Song", "U3", 1_541_203_200_000),
        ],
    );
    lake
}

#[test]
fn test_end_to_end_single_songplay() {
    let lake = explorer_lake();
    let summary = lake.run(WriteMode::ErrorIfExists).unwrap();

    assert_eq!(summary.tables.len(), 5);
    assert_eq!(summary.table("songplays").unwrap().rows, 1);

    let songplays = lake.read(&SONGPLAYS);
    let rows: Vec<SongplayRow> = decode_rows(
        &songplays,
        &[
            SONGPLAY_ID, USER_ID, LEVEL, SONG_ID, ARTIST_ID, SESSION_ID, LOCATION, USER_AGENT,
            YEAR, MONTH,
        ],
    );
    assert_eq!(
        rows,
        vec![SongplayRow {
            songplay_id: 0,
            user_id: Some("U1".to_string()),
            level: Some("free".to_string()),
            song_id: Some("S1".to_string()),
            artist_id: Some("A1".to_string()),
            session_id: Some(42),
            location: Some("NY".to_string()),
            user_agent: Some("UA".to_string()),
            year: Some(2018),
            month: Some(11),
        }]
    );

    let start_time = songplays
        .column_by_name(START_TIME)
        .unwrap()
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    assert_eq!(start_time.value(0), 1_541_121_934_000_000);
}

#[test]
fn test_non_song_plays_are_excluded() {
    let lake = explorer_lake();
    lake.run(WriteMode::ErrorIfExists).unwrap();

    let users = lake.read(&USERS);
    let rows: Vec<UserIdRow> = decode_rows(&users, &[ID]);
    let mut ids: Vec<String> = rows.into_iter().filter_map(|row| row.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["U1", "U3"]);

    // Two distinct plays, two distinct start times
    assert_eq!(lake.read(&TIME).num_rows(), 2);
}

#[test]
fn test_time_table_for_known_timestamp() {
    let lake = explorer_lake();
    lake.run(WriteMode::ErrorIfExists).unwrap();

    let time = lake.read(&TIME);
    let start_time = time
        .column_by_name(START_TIME)
        .unwrap()
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    let position = (0..start_time.len())
        .find(|i| start_time.value(*i) == 1_541_121_934_000_000)
        .expect("known timestamp missing from time table");

    let rows: Vec<TimeRow> = decode_rows(&time, &[YEAR, MONTH, DAY_OF_MONTH, HOUR, WEEK_OF_YEAR]);
    assert_eq!(
        rows[position],
        TimeRow {
            year: Some(2018),
            month: Some(11),
            day_of_month: Some(2),
            hour: Some(1),
            week_of_year: Some(44),
        }
    );
    for row in &rows {
        assert!((1..=12).contains(&row.month.unwrap()));
        assert!((0..=23).contains(&row.hour.unwrap()));
    }
}

#[test]
fn test_output_layout() {
    let lake = explorer_lake();
    lake.run(WriteMode::ErrorIfExists).unwrap();

    let out = lake.output_root();
    assert!(out.join("songs.parquet/year=2000/artist_id=A1").is_dir());
    assert!(out.join("songs.parquet/year=0/artist_id=A2").is_dir());
    assert!(out.join("users.parquet/gender=F").is_dir());
    assert!(out.join("time_table.parquet/year=2018/month=11").is_dir());
    assert!(out.join("songplays.parquet/year=2018/month=11").is_dir());
    for dir in ["songs", "artists", "users", "time_table", "songplays"] {
        assert!(out.join(format!("{dir}.parquet")).join(SUCCESS_MARKER).is_file());
    }
    assert_eq!(lake.read(&ARTISTS).num_rows(), 2);
}

#[test]
fn test_duplicate_catalog_records_collapse() {
    let lake = Lake::new();
    lake.add_songs("A/A/A/TR1.json", &[song("Explorer", "Test Song", "S1", "A1", 2000)]);
    lake.add_songs("A/A/B/TR2.json", &[song("Explorer", "Test Song", "S1", "A1", 2000)]);
    lake.add_events("events.json", &[play("Explorer", "Test Song", "U1", KNOWN_TS)]);

    let summary = lake.run(WriteMode::ErrorIfExists).unwrap();
    assert_eq!(summary.table("songs").unwrap().rows, 1);
    assert_eq!(summary.table("artists").unwrap().rows, 1);
    assert_eq!(lake.read(&SONGS).num_rows(), 1);
    // Both catalog entries match, but the joined rows are identical
    assert_eq!(lake.read(&SONGPLAYS).num_rows(), 1);
}

#[test]
fn test_repeated_plays_get_distinct_ids() {
    let lake = Lake::new();
    lake.add_songs("A/A/A/TR1.json", &[song("Explorer", "Test Song", "S1", "A1", 2000)]);
    lake.add_events(
        "events.json",
        &[
            play("Explorer", "Test Song", "U1", KNOWN_TS),
            play("Explorer", "Test Song", "U1", KNOWN_TS + 60_000),
            play("Explorer", "Test Song", "U2", KNOWN_TS),
        ],
    );
    lake.run(WriteMode::ErrorIfExists).unwrap();

    let rows: Vec<SongplayIdRow> = decode_rows(&lake.read(&SONGPLAYS), &[SONGPLAY_ID]);
    let mut ids: Vec<i64> = rows.into_iter().map(|row| row.songplay_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn test_zero_matches_write_an_empty_fact_table() {
    let lake = Lake::new();
    lake.add_songs("A/A/A/TR1.json", &[song("Explorer", "Test Song", "S1", "A1", 2000)]);
    lake.add_events("events.json", &[play("Someone Else", "Test Song", "U1", KNOWN_TS)]);

    let summary = lake.run(WriteMode::ErrorIfExists).unwrap();
    let report = summary.table("songplays").unwrap();
    assert_eq!(report.rows, 0);
    assert_eq!(report.files, 0);
    assert!(report.path.join(SUCCESS_MARKER).is_file());
    assert_eq!(lake.read(&SONGPLAYS).num_rows(), 0);
    assert_eq!(lake.read(&USERS).num_rows(), 1);
}

#[test]
fn test_missing_event_files_fail_the_run() {
    let lake = Lake::new();
    lake.add_songs("A/A/A/TR1.json", &[song("Explorer", "Test Song", "S1", "A1", 2000)]);

    let err = lake.run(WriteMode::ErrorIfExists).unwrap_err();
    assert!(matches!(
        err,
        EtlError::NoInputFiles { ref pattern, .. } if pattern == "log-data/*.json"
    ));
}

#[test]
fn test_remote_roots_are_rejected() {
    let lake = Lake::new();
    let mut settings = lake.settings(WriteMode::ErrorIfExists);
    settings.output_root = "s3a://bucket/out/".to_string();

    let err = Pipeline::new(settings.clone()).unwrap_err();
    assert!(matches!(err, EtlError::MissingCredentials(_)));

    settings.credentials = Some(Credentials {
        access_key_id: "AKIAEXAMPLE".to_string(),
        secret_access_key: "secret".to_string(),
    });
    let err = Pipeline::new(settings).unwrap_err();
    assert!(matches!(err, EtlError::UnsupportedStorage(_)));
}
