//! Row filtering for Arrow record batches
//!
//! Filters are expressed as [`Expr`] trees and applied through the
//! [`BatchFilter`] trait. The pipeline uses them to keep only song-play
//! events before any table is derived from the event log.

pub mod core;
pub mod expr;

pub use self::core::{BatchFilter, filter_record_batch};
pub use self::expr::{Expr, ExpressionFilter, LiteralValue};
