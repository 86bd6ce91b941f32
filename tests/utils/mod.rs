use std::fs;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use songplays_etl::config::{InputConfig, OutputConfig, PipelineSettings, WriteMode};
use songplays_etl::{Pipeline, RunSummary, Storage, TableSpec, read_table};
use tempfile::TempDir;

/// Timestamp whose derived start time is 2018-11-02T01:25:34Z
pub const KNOWN_TS: i64 = 1_541_121_934_796;

/// A scratch data lake with an input and an output root
pub struct Lake {
    dir: TempDir,
}

impl Lake {
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::create_dir_all(dir.path().join("input")).expect("failed to create input root");
        Self { dir }
    }

    #[must_use]
    pub fn input_root(&self) -> PathBuf {
        self.dir.path().join("input")
    }

    #[must_use]
    pub fn output_root(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    /// Write catalog records as one file under `song-data/<a>/<b>/<c>/`
    pub fn add_songs(&self, relative: &str, records: &[Value]) {
        self.write_lines(&Path::new("song-data").join(relative), records);
    }

    /// Write event records as one file under `log-data/`
    pub fn add_events(&self, name: &str, records: &[Value]) {
        self.write_lines(&Path::new("log-data").join(name), records);
    }

    /// Write raw text under the input root
    pub fn add_raw(&self, relative: &str, text: &str) {
        self.add_raw_bytes(relative, text.as_bytes());
    }

    /// Write raw bytes under the input root
    pub fn add_raw_bytes(&self, relative: &str, bytes: &[u8]) {
        let path = self.input_root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn write_lines(&self, relative: &Path, records: &[Value]) {
        let text = records
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.add_raw(relative.to_str().unwrap(), &text);
    }

    #[must_use]
    pub fn settings(&self, write_mode: WriteMode) -> PipelineSettings {
        PipelineSettings {
            profile: "test".to_string(),
            input_root: self.input_root().to_string_lossy().into_owned(),
            output_root: self.output_root().to_string_lossy().into_owned(),
            credentials: None,
            output: OutputConfig {
                write_mode,
                ..OutputConfig::default()
            },
            input: InputConfig::default(),
        }
    }

    pub fn run(&self, write_mode: WriteMode) -> songplays_etl::Result<RunSummary> {
        Pipeline::new(self.settings(write_mode))?.run()
    }

    #[must_use]
    pub fn output(&self) -> Storage {
        Storage::connect(self.output_root().to_str().unwrap(), None).unwrap()
    }

    #[must_use]
    pub fn read(&self, spec: &TableSpec) -> RecordBatch {
        read_table(&self.output(), spec).unwrap()
    }
}

/// A catalog record
#[must_use]
pub fn song(artist_name: &str, title: &str, song_id: &str, artist_id: &str, year: i32) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": 123.4,
        "year": year,
    })
}

/// A song-play event
#[must_use]
pub fn play(artist: &str, title: &str, user_id: &str, ts: i64) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Test",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "User",
        "length": 123.4,
        "level": "free",
        "location": "NY",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1_540_919_166_796.0,
        "sessionId": 42,
        "song": title,
        "status": 200,
        "ts": ts,
        "userAgent": "UA",
        "userId": user_id,
    })
}

/// Decode the named columns of a batch into typed rows
pub fn decode_rows<T: DeserializeOwned>(batch: &RecordBatch, columns: &[&str]) -> Vec<T> {
    let schema = batch.schema();
    let indices: Vec<usize> = columns
        .iter()
        .map(|c| schema.index_of(c).unwrap())
        .collect();
    let projected = batch.project(&indices).unwrap();
    serde_arrow::from_record_batch(&projected).unwrap()
}
