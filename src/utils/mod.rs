//! Shared helpers: Arrow batch manipulation, storage and Parquet IO, logging.

pub mod arrow;
pub mod io;
pub mod logging;
