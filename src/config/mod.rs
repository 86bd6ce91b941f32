//! Configuration for the ETL pipeline.
//!
//! The configuration file is TOML. It carries optional storage credentials,
//! one or more named data profiles (input and output roots), and output and
//! input options shared by every profile. Environment variables are only
//! consulted by the binary; everything in here takes explicit values.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use serde::Deserialize;

use crate::error::util::safe_read_to_string;
use crate::error::{EtlError, Result};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "ETL_CONFIG";

/// Configuration file used when `ETL_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "dl.toml";

/// Environment variable selecting the data profile
pub const PROFILE_ENV: &str = "ETL_PROFILE";

/// Profile used when `ETL_PROFILE` is unset
pub const DEFAULT_PROFILE: &str = "prd";

/// Default glob for catalog files, relative to the input root
pub const DEFAULT_SONG_DATA_GLOB: &str = "song-data/*/*/*/*.json";

/// Default glob for event log files, relative to the input root
pub const DEFAULT_LOG_DATA_GLOB: &str = "log-data/*.json";

/// Top-level configuration file contents
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EtlConfig {
    /// Storage credentials, needed only for remote roots
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Named data profiles
    pub profiles: BTreeMap<String, DataProfile>,
    /// Output options applied to every table
    #[serde(default)]
    pub output: OutputConfig,
    /// Input file patterns
    #[serde(default)]
    pub input: InputConfig,
}

/// Access credentials for the storage backend
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &"***")
            .finish()
    }
}

/// Keep the first four characters of a key id for log correlation
fn redact(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    format!("{visible}***")
}

/// Input and output roots for one environment
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DataProfile {
    pub input_data: String,
    pub output_data: String,
}

/// How a table is written when its destination already exists
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Fail the run
    #[default]
    ErrorIfExists,
    /// Replace the existing table
    Overwrite,
    /// Add new part files next to the existing ones
    Append,
    /// Leave the existing table untouched
    Ignore,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ErrorIfExists => "error_if_exists",
            Self::Overwrite => "overwrite",
            Self::Append => "append",
            Self::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

/// Parquet compression codec for written part files
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Lz4,
    Uncompressed,
}

impl CompressionCodec {
    /// The parquet codec setting
    #[must_use]
    pub fn to_parquet(self) -> Compression {
        match self {
            Self::Snappy => Compression::SNAPPY,
            Self::Zstd => Compression::ZSTD(ZstdLevel::default()),
            Self::Gzip => Compression::GZIP(GzipLevel::default()),
            Self::Lz4 => Compression::LZ4_RAW,
            Self::Uncompressed => Compression::UNCOMPRESSED,
        }
    }

    /// Codec tag embedded in part-file names (`part-00000-<job>.c000.<tag>.parquet`)
    #[must_use]
    pub fn file_tag(self) -> Option<&'static str> {
        match self {
            Self::Snappy => Some("snappy"),
            Self::Zstd => Some("zstd"),
            Self::Gzip => Some("gz"),
            Self::Lz4 => Some("lz4raw"),
            Self::Uncompressed => None,
        }
    }
}

/// Options applied uniformly to every output table
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub write_mode: WriteMode,
    pub compression: CompressionCodec,
    /// Upper bound on rows per part file; 0 means unlimited
    pub max_rows_per_file: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::ErrorIfExists,
            compression: CompressionCodec::Snappy,
            max_rows_per_file: 0,
        }
    }
}

/// Glob patterns locating the input files under the input root
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub song_data: String,
    pub log_data: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            song_data: DEFAULT_SONG_DATA_GLOB.to_string(),
            log_data: DEFAULT_LOG_DATA_GLOB.to_string(),
        }
    }
}

/// Everything a single pipeline run needs, resolved for one profile
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub profile: String,
    pub input_root: String,
    pub output_root: String,
    pub credentials: Option<Credentials>,
    pub output: OutputConfig,
    pub input: InputConfig,
}

impl EtlConfig {
    /// Read and validate a configuration file
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = safe_read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|source| EtlError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        let config = config.normalized()?;
        config.validate()?;
        Ok(config)
    }

    /// Profile names are matched case-insensitively
    ///
    /// # Errors
    /// A config error when two profile names differ only in case
    fn normalized(mut self) -> Result<Self> {
        let mut profiles = BTreeMap::new();
        for (name, profile) in self.profiles {
            let key = name.to_lowercase();
            if profiles.insert(key.clone(), profile).is_some() {
                return Err(EtlError::config(format!(
                    "profile '{key}' is defined more than once \
                     (profile names are case-insensitive)"
                )));
            }
        }
        self.profiles = profiles;
        Ok(self)
    }

    /// Check required values are present
    pub fn validate(&self) -> Result<()> {
        if self.profiles.is_empty() {
            return Err(EtlError::config("at least one [profiles.<name>] section is required"));
        }
        for (name, profile) in &self.profiles {
            if profile.input_data.trim().is_empty() {
                return Err(EtlError::config(format!(
                    "profiles.{name}.input_data must not be empty"
                )));
            }
            if profile.output_data.trim().is_empty() {
                return Err(EtlError::config(format!(
                    "profiles.{name}.output_data must not be empty"
                )));
            }
        }
        if let Some(credentials) = &self.credentials {
            if credentials.access_key_id.trim().is_empty()
                || credentials.secret_access_key.trim().is_empty()
            {
                return Err(EtlError::config(
                    "credentials.access_key_id and credentials.secret_access_key must not be empty",
                ));
            }
        }
        if self.input.song_data.trim().is_empty() || self.input.log_data.trim().is_empty() {
            return Err(EtlError::config("input patterns must not be empty"));
        }
        Ok(())
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&DataProfile> {
        self.profiles
            .get(&name.to_lowercase())
            .ok_or_else(|| EtlError::MissingProfile(name.to_lowercase()))
    }

    /// Resolve the settings for a single run against `profile`
    pub fn settings(&self, profile: &str) -> Result<PipelineSettings> {
        let data = self.profile(profile)?;
        Ok(PipelineSettings {
            profile: profile.to_lowercase(),
            input_root: data.input_data.clone(),
            output_root: data.output_data.clone(),
            credentials: self.credentials.clone(),
            output: self.output,
            input: self.input.clone(),
        })
    }
}

/// Turn the raw `ETL_PROFILE` value into a profile name
#[must_use]
pub fn resolve_profile_name(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_PROFILE)
        .to_lowercase()
}
