//! Progress reporting for input decoding
//!
//! Uses indicatif; the bar is hidden automatically when stderr is not a
//! terminal, so batch runs under a scheduler only see log lines.

use indicatif::{ProgressBar, ProgressStyle};

/// Template for the per-file decoding bar
pub const FILE_PROGRESS_TEMPLATE: &str = concat!(
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] ",
    "{pos}/{len} files ({per_sec}) {msg}"
);

/// Create a progress bar counting decoded input files
///
/// # Arguments
/// * `length` - Number of files to decode
/// * `description` - Optional description to display as the initial message
#[must_use]
pub fn create_file_progress_bar(length: u64, description: Option<&str>) -> ProgressBar {
    let pb = ProgressBar::new(length);
    let style = ProgressStyle::default_bar()
        .template(FILE_PROGRESS_TEMPLATE)
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);

    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }

    pb
}

/// Finish a progress bar with a completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
