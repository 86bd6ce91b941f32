//! Logging utilities for output and progress tracking
//!
//! This module provides standardized log lines for pipeline stages and a
//! progress bar for input decoding.

pub mod log;
pub mod progress;

pub use self::log::{log_operation_complete, log_operation_start, log_warning};
pub use progress::{create_file_progress_bar, finish_progress_bar};
