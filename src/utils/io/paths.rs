//! Path handling for input discovery and partitioned output
//!
//! Input globs are matched one path segment at a time. Partition directories
//! follow the Hive layout (`column=value`) with Hive's escaping rules, so
//! downstream engines can prune them.

use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::error::Result;
use crate::error::util::IoResultExt;

/// Directory name used for null or empty partition values
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Files and directories starting with these are never treated as data
#[must_use]
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Match a single path segment against a pattern with `*` and `?` wildcards
#[must_use]
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            resume = n;
            p += 1;
        } else if let Some(star_at) = star {
            p = star_at + 1;
            resume += 1;
            n = resume;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

/// Expand a relative glob under `root` into the matching files, sorted by path
///
/// Every segment but the last must match a directory; the last must match a
/// regular file. Hidden entries are skipped at every level.
pub fn expand_glob(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, dirs)) = segments.split_last() else {
        return Ok(Vec::new());
    };

    let mut current = vec![root.to_path_buf()];
    for segment in dirs {
        let mut next = Vec::new();
        for dir in &current {
            next.extend(matching_entries(dir, segment, true)?);
        }
        current = next;
    }

    let mut files = Vec::new();
    for dir in &current {
        files.extend(matching_entries(dir, last, false)?);
    }

    Ok(files.into_iter().sorted().collect_vec())
}

fn matching_entries(dir: &Path, segment: &str, want_dir: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_hidden(&name) || !wildcard_match(segment, &name) {
            continue;
        }
        let path = entry.path();
        if (want_dir && path.is_dir()) || (!want_dir && path.is_file()) {
            matches.push(path);
        }
    }
    Ok(matches)
}

fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '\u{00}'..='\u{1F}'
            | '"'
            | '#'
            | '%'
            | '\''
            | '*'
            | '/'
            | ':'
            | '='
            | '?'
            | '\\'
            | '\u{7F}'
            | '{'
            | '['
            | ']'
            | '^'
    )
}

/// Escape a partition value for use in a directory name
#[must_use]
pub fn escape_partition_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Reverse [`escape_partition_value`]
#[must_use]
pub fn unescape_partition_value(escaped: &str) -> String {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(high * 16 + low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

/// Directory name for one partition level
#[must_use]
pub fn partition_dir_name(column: &str, value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("{column}={}", escape_partition_value(v)),
        _ => format!("{column}={HIVE_DEFAULT_PARTITION}"),
    }
}

/// Parse a `column=value` directory name; `None` value means null
#[must_use]
pub fn parse_partition_dir(name: &str) -> Option<(String, Option<String>)> {
    let (column, value) = name.split_once('=')?;
    if column.is_empty() {
        return None;
    }
    let value = (value != HIVE_DEFAULT_PARTITION).then(|| unescape_partition_value(value));
    Some((unescape_partition_value(column), value))
}
