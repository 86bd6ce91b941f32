//! Batch ETL that turns song catalog and listening-log JSON into a
//! partitioned Parquet star schema.

pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod reader;
pub mod schema;
pub mod tables;
pub mod utils;

// Core types
pub use config::{EtlConfig, OutputConfig, PipelineSettings, WriteMode};
pub use error::{EtlError, Result};
pub use pipeline::{Pipeline, RunSummary};

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Tables
pub use tables::{ALL_TABLES, TableSpec, read_table};
pub use utils::io::{Storage, TableWriteReport};
