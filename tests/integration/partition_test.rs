use arrow::array::{Array, StringArray};
use serde_json::json;
use songplays_etl::config::WriteMode;
use songplays_etl::tables::columns::{ARTIST_ID, GENDER, START_TIME, YEAR};
use songplays_etl::tables::{SONGS, TIME, USERS};

use crate::utils::{KNOWN_TS, Lake, play, song};

fn strings(batch: &arrow::record_batch::RecordBatch, name: &str) -> Vec<Option<String>> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

#[test]
fn test_partition_values_are_escaped() {
    let lake = Lake::new();
    lake.add_songs("A/A/A/TR1.json", &[song("Slash", "Path", "S1", "AR/1:x", 1999)]);
    lake.add_events("events.json", &[play("Slash", "Path", "U1", KNOWN_TS)]);
    lake.run(WriteMode::ErrorIfExists).unwrap();

    assert!(
        lake.output_root()
            .join("songs.parquet/year=1999/artist_id=AR%2F1%3Ax")
            .is_dir()
    );
    let songs = lake.read(&SONGS);
    assert_eq!(strings(&songs, ARTIST_ID), vec![Some("AR/1:x".to_string())]);
}

#[test]
fn test_null_partitions_use_default_directory() {
    let lake = Lake::new();
    lake.add_songs("A/A/A/TR1.json", &[song("Explorer", "Test Song", "S1", "A1", 2000)]);

    let mut no_gender = play("Explorer", "Test Song", "U1", KNOWN_TS);
    no_gender["gender"] = json!(null);
    let mut no_ts = play("Explorer", "Test Song", "U2", KNOWN_TS);
    no_ts["ts"] = json!(null);
    lake.add_events("events.json", &[no_gender, no_ts]);

    let summary = lake.run(WriteMode::ErrorIfExists).unwrap();
    let out = lake.output_root();
    assert!(out.join("users.parquet/gender=__HIVE_DEFAULT_PARTITION__").is_dir());
    let unknown_month = "year=__HIVE_DEFAULT_PARTITION__/month=__HIVE_DEFAULT_PARTITION__";
    assert!(out.join("time_table.parquet").join(unknown_month).is_dir());
    // The play without a timestamp still joins
    assert_eq!(summary.table("songplays").unwrap().rows, 2);
    assert!(out.join("songplays.parquet").join(unknown_month).is_dir());

    let users = lake.read(&USERS);
    let genders = strings(&users, GENDER);
    assert!(genders.contains(&None));
    assert!(genders.contains(&Some("F".to_string())));

    let time = lake.read(&TIME);
    assert_eq!(time.num_rows(), 2);
    let nulls = time.column_by_name(START_TIME).unwrap().null_count();
    assert_eq!(nulls, 1);
    assert_eq!(time.column_by_name(YEAR).unwrap().null_count(), 1);
}

#[test]
fn test_malformed_records_do_not_fail_the_run() {
    let lake = Lake::new();
    lake.add_songs("A/A/A/TR1.json", &[song("Explorer", "Test Song", "S1", "A1", 2000)]);

    let mut bad_session = play("Explorer", "Test Song", "U1", KNOWN_TS);
    bad_session["sessionId"] = json!("forty-two");
    let good = play("Explorer", "Test Song", "U2", KNOWN_TS).to_string();
    let text = format!("{bad_session}\nnot json at all\n[1, 2, 3]\n\n{good}\n");
    lake.add_raw("log-data/events.json", &text);
    lake.add_raw("log-data/.events.json.crc", "ignored");
    lake.add_raw("log-data/_SUCCESS", "");

    let summary = lake.run(WriteMode::ErrorIfExists).unwrap();
    // Null-page rows are not song plays
    assert_eq!(summary.table("users").unwrap().rows, 2);
    assert_eq!(summary.table("songplays").unwrap().rows, 2);
}

#[test]
fn test_non_utf8_bytes_do_not_fail_the_run() {
    let lake = Lake::new();
    lake.add_songs(
        "A/A/A/TR1.json",
        &[
            song("Explorer", "Test Song", "S1", "A1", 2000),
            song("Bj\u{FFFD}rk", "Joga", "S2", "A2", 1997),
        ],
    );

    // A Latin-1 encoded artist name in the middle of an otherwise valid file
    let mut bytes = play("Explorer", "Test Song", "U1", KNOWN_TS).to_string().into_bytes();
    bytes.push(b'\n');
    let latin1 = play("Bj\u{F6}rk", "Joga", "U2", KNOWN_TS).to_string();
    let (before, after) = latin1.split_once('\u{F6}').unwrap();
    bytes.extend_from_slice(before.as_bytes());
    bytes.push(0xF6);
    bytes.extend_from_slice(after.as_bytes());
    bytes.push(b'\n');
    lake.add_raw_bytes("log-data/events.json", &bytes);

    let summary = lake.run(WriteMode::ErrorIfExists).unwrap();
    assert_eq!(summary.table("users").unwrap().rows, 2);
    assert_eq!(summary.table("songplays").unwrap().rows, 2);
}
