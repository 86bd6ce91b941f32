//! Storage roots, input discovery and Parquet table IO.

pub mod parquet;
pub mod paths;
pub mod storage;

pub use self::parquet::{
    PartitionedWriter, SUCCESS_MARKER, TableWriteReport, find_parquet_files, read_parquet,
    read_partitioned,
};
pub use paths::{HIVE_DEFAULT_PARTITION, expand_glob, partition_dir_name};
pub use storage::Storage;
