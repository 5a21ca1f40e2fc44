//! Line diff engine for revdiff.
//!
//! Pure and deterministic: no I/O, and identical inputs always produce
//! identical reports.
//!
//! # Key Types
//!
//! - [`DiffReport`] -- ordered edit script plus line counts
//! - [`LineOp`] -- one `Unchanged`, `Added`, or `Removed` line

pub mod line_diff;

pub use line_diff::{diff_lines, DiffReport, LineOp};
