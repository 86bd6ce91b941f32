//! Parquet file operations
//!
//! Writing splits a batch into Hive-style partition directories and writes
//! each partition as one or more part files. Reading walks a table directory,
//! decodes every part file and puts the partition columns back from the
//! directory names.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::array::{Array, ArrayRef, StringArray, UInt32Array, new_null_array};
use arrow::compute::{cast, concat_batches, take_record_batch};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use itertools::Itertools;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;

use crate::config::{CompressionCodec, OutputConfig, WriteMode};
use crate::error::util::IoResultExt;
use crate::error::{EtlError, Result};
use crate::utils::arrow::get_column;
use crate::utils::io::paths::{is_hidden, parse_partition_dir, partition_dir_name};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Marker file written once every part file of a table is in place
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Outcome of writing one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWriteReport {
    /// Table name
    pub table: String,
    /// Table directory
    pub path: PathBuf,
    /// Rows written
    pub rows: usize,
    /// Part files written
    pub files: usize,
    /// Set when the table already existed and the write mode is `ignore`
    pub skipped: bool,
}

/// Writes record batches as partitioned Parquet tables
#[derive(Debug, Clone)]
pub struct PartitionedWriter {
    output: OutputConfig,
    job_id: String,
}

impl PartitionedWriter {
    /// Create a writer; `job_id` is embedded in every part-file name
    pub fn new(output: OutputConfig, job_id: impl Into<String>) -> Self {
        Self {
            output,
            job_id: job_id.into(),
        }
    }

    /// Write `batch` as the table at `table_dir`
    ///
    /// # Arguments
    /// * `table` - Table name for reporting
    /// * `table_dir` - Table directory (`<root>/<name>.parquet`)
    /// * `batch` - Table contents, partition columns included
    /// * `partition_by` - Partition columns, outermost first
    ///
    /// # Errors
    /// `TableExists` under `error_if_exists` when the directory is present,
    /// schema errors when a partition column is missing or no data columns
    /// would remain, and IO or Parquet errors from the write itself.
    pub fn write(
        &self,
        table: &str,
        table_dir: &Path,
        batch: &RecordBatch,
        partition_by: &[&str],
    ) -> Result<TableWriteReport> {
        let start = Instant::now();
        log_operation_start(
            &format!("Writing table {table} ({})", self.output.write_mode),
            table_dir,
        );

        if table_dir.exists() {
            match self.output.write_mode {
                WriteMode::ErrorIfExists => {
                    return Err(EtlError::TableExists(table_dir.to_path_buf()));
                }
                WriteMode::Ignore => {
                    log::info!("Table {table} already exists at {}, skipping", table_dir.display());
                    return Ok(TableWriteReport {
                        table: table.to_string(),
                        path: table_dir.to_path_buf(),
                        rows: 0,
                        files: 0,
                        skipped: true,
                    });
                }
                WriteMode::Overwrite => fs::remove_dir_all(table_dir).with_path(table_dir)?,
                WriteMode::Append => {}
            }
        }
        fs::create_dir_all(table_dir).with_path(table_dir)?;

        let data_indices = data_column_indices(batch, partition_by)?;
        let mut part = 0;

        if partition_by.is_empty() {
            part += self.write_partition(table_dir, batch, part, true)?;
        } else {
            for (segments, rows) in group_by_partition(batch, partition_by)? {
                let dir = segments.iter().fold(table_dir.to_path_buf(), |dir, s| dir.join(s));
                fs::create_dir_all(&dir).with_path(&dir)?;
                let rows = take_record_batch(batch, &UInt32Array::from(rows))?;
                let data = rows.project(&data_indices)?;
                part += self.write_partition(&dir, &data, part, false)?;
            }
        }

        let marker = table_dir.join(SUCCESS_MARKER);
        fs::write(&marker, b"").with_path(&marker)?;

        log_operation_complete("wrote", table_dir, batch.num_rows(), Some(start.elapsed()));
        Ok(TableWriteReport {
            table: table.to_string(),
            path: table_dir.to_path_buf(),
            rows: batch.num_rows(),
            files: part,
            skipped: false,
        })
    }

    /// Write one partition directory, returning the number of part files
    fn write_partition(
        &self,
        dir: &Path,
        batch: &RecordBatch,
        first_part: usize,
        write_empty: bool,
    ) -> Result<usize> {
        if batch.num_rows() == 0 {
            if !write_empty {
                return Ok(0);
            }
            let path = dir.join(self.part_file_name(first_part));
            write_part_file(&path, batch, self.output.compression)?;
            return Ok(1);
        }

        let chunk = match self.output.max_rows_per_file {
            0 => batch.num_rows(),
            n => n,
        };

        let mut written = 0;
        let mut offset = 0;
        while offset < batch.num_rows() {
            let len = chunk.min(batch.num_rows() - offset);
            let path = dir.join(self.part_file_name(first_part + written));
            write_part_file(&path, &batch.slice(offset, len), self.output.compression)?;
            offset += len;
            written += 1;
        }
        Ok(written)
    }

    fn part_file_name(&self, part: usize) -> String {
        let tag = self
            .output
            .compression
            .file_tag()
            .map(|t| format!(".{t}"))
            .unwrap_or_default();
        format!("part-{part:05}-{}.c000{tag}.parquet", self.job_id)
    }
}

/// Indices of the columns that stay in the data files
fn data_column_indices(batch: &RecordBatch, partition_by: &[&str]) -> Result<Vec<usize>> {
    let schema = batch.schema();
    for column in partition_by {
        if schema.index_of(column).is_err() {
            return Err(EtlError::schema(format!("Partition column '{column}' not found")));
        }
    }

    let indices = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !partition_by.contains(&f.name().as_str()))
        .map(|(i, _)| i)
        .collect_vec();

    if indices.is_empty() {
        return Err(EtlError::schema(
            "Every column is a partition column; nothing left to write",
        ));
    }
    Ok(indices)
}

/// Row indices per partition directory path, in directory order
fn group_by_partition(
    batch: &RecordBatch,
    partition_by: &[&str],
) -> Result<BTreeMap<Vec<String>, Vec<u32>>> {
    let columns: Vec<ArrayRef> = partition_by
        .iter()
        .map(|name| get_column(batch, name))
        .collect::<Result<_>>()?;

    let mut groups: BTreeMap<Vec<String>, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let mut segments = Vec::with_capacity(columns.len());
        for (name, column) in partition_by.iter().zip(&columns) {
            let value = if column.is_valid(row) {
                Some(array_value_to_string(column, row)?)
            } else {
                None
            };
            segments.push(partition_dir_name(name, value.as_deref()));
        }
        groups.entry(segments).or_default().push(row as u32);
    }
    Ok(groups)
}

/// Write a single part file through a hidden temporary name
///
/// An existing file at `path` is never replaced.
fn write_part_file(path: &Path, batch: &RecordBatch, compression: CompressionCodec) -> Result<()> {
    if path.exists() {
        return Err(EtlError::IoAt {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "part file already exists"),
        });
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| EtlError::schema(format!("Invalid part file path {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{name}.inprogress"));

    let file = File::create(&temp_path).with_path(&temp_path)?;
    let props = WriterProperties::builder()
        .set_compression(compression.to_parquet())
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    fs::rename(&temp_path, path).with_path(path)?;
    log::debug!("Wrote {} rows to {}", batch.num_rows(), path.display());
    Ok(())
}

/// Find all Parquet part files under a table directory, sorted by path
///
/// Hidden files and directories (leading `.` or `_`) are skipped.
pub fn find_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_parquet_files(dir, &mut files)?;
    Ok(files.into_iter().sorted().collect_vec())
}

fn collect_parquet_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        if is_hidden(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_parquet_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "parquet") {
            files.push(path);
        }
    }
    Ok(())
}

/// Read a parquet file into Arrow record batches
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path).with_path(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(batches)
}

/// Read a partitioned table back into one batch with the given schema
///
/// # Arguments
/// * `table_dir` - Table directory
/// * `schema` - Full table schema, partition columns included
/// * `partition_by` - Partition columns, outermost first
pub fn read_partitioned(
    table_dir: &Path,
    schema: &SchemaRef,
    partition_by: &[&str],
) -> Result<RecordBatch> {
    let start = Instant::now();
    log_operation_start("Reading table", table_dir);

    let files = find_parquet_files(table_dir)?;
    if files.is_empty() {
        log_warning("No Parquet files found in table directory", Some(table_dir));
    }

    let mut batches = Vec::new();
    for file in &files {
        let values = partition_values(table_dir, file);
        for batch in read_parquet(file)? {
            batches.push(attach_partition_columns(&batch, schema, partition_by, &values)?);
        }
    }

    let combined = concat_batches(schema, &batches)?;
    log_operation_complete("read", table_dir, combined.num_rows(), Some(start.elapsed()));
    Ok(combined)
}

/// Partition values encoded in the directories between `table_dir` and `file`
fn partition_values(table_dir: &Path, file: &Path) -> BTreeMap<String, Option<String>> {
    let relative = file.strip_prefix(table_dir).unwrap_or(file);
    relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| parse_partition_dir(&c.as_os_str().to_string_lossy()))
        .collect()
}

fn attach_partition_columns(
    batch: &RecordBatch,
    schema: &SchemaRef,
    partition_by: &[&str],
    values: &BTreeMap<String, Option<String>>,
) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let name = field.name().as_str();
        if partition_by.contains(&name) {
            let column = match values.get(name) {
                Some(Some(value)) => {
                    let text = StringArray::from(vec![value.as_str(); rows]);
                    cast(&text, field.data_type())?
                }
                Some(None) => new_null_array(field.data_type(), rows),
                None => {
                    return Err(EtlError::schema(format!(
                        "Partition directory for column '{name}' not found"
                    )));
                }
            };
            columns.push(column);
        } else {
            columns.push(get_column(batch, name)?);
        }
    }

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}
