//! Arrow data handling utilities
//!
//! Column lookup, projection with renaming, and the row-identity helpers used
//! for deduplication and joins.

pub mod array_utils;
pub mod rows;

pub use array_utils::{downcast_array, get_column, project_renamed, with_column};
pub use rows::{distinct, distinct_indices};
