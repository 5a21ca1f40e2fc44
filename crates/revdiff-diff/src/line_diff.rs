//! Line-level diff between two text payloads.
//!
//! Inputs are split with [`str::lines`] (`\n` or `\r\n`, trailing partial
//! line included) and aligned with the `similar` crate's Myers algorithm,
//! which yields a shortest edit script: the `Unchanged` lines form a
//! longest common subsequence of the two inputs.

use std::fmt;

use serde::Serialize;
use similar::{capture_diff_slices, Algorithm, DiffTag};

/// The result of diffing a previous payload against the latest one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// Edit operations in output order.
    pub ops: Vec<LineOp>,
    /// Number of lines in the previous payload.
    pub previous_lines: usize,
    /// Number of lines in the latest payload.
    pub latest_lines: usize,
}

impl DiffReport {
    /// Returns `true` if both payloads have the same lines.
    pub fn is_identical(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, LineOp::Unchanged(_)))
    }

    pub fn additions(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, LineOp::Added(_))).count()
    }

    pub fn deletions(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, LineOp::Removed(_))).count()
    }

    pub fn unchanged(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, LineOp::Unchanged(_))).count()
    }

    /// Plain-text rendering: one output line per op, no truncation.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Short `+N -M` summary for log lines.
    pub fn render_summary(&self) -> String {
        format!("+{} -{}", self.additions(), self.deletions())
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

/// A single line of a diff report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "line", rename_all = "snake_case")]
pub enum LineOp {
    /// A line present in both payloads.
    Unchanged(String),
    /// A line only present in the latest payload.
    Added(String),
    /// A line only present in the previous payload.
    Removed(String),
}

impl LineOp {
    /// The line text without its marker.
    pub fn line(&self) -> &str {
        match self {
            Self::Unchanged(l) | Self::Added(l) | Self::Removed(l) => l,
        }
    }

    /// The one-character marker used by the plain-text rendering.
    pub fn marker(&self) -> char {
        match self {
            Self::Unchanged(_) => ' ',
            Self::Added(_) => '+',
            Self::Removed(_) => '-',
        }
    }
}

impl fmt::Display for LineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.marker(), self.line())
    }
}

/// Compute a line diff from `previous` to `latest`.
///
/// An empty `previous` yields a report where every line of `latest` is
/// `Added`. Replaced regions are emitted as all their removals followed by
/// all their additions.
pub fn diff_lines(previous: &str, latest: &str) -> DiffReport {
    let old: Vec<&str> = previous.lines().collect();
    let new: Vec<&str> = latest.lines().collect();

    let mut ops = Vec::with_capacity(old.len().max(new.len()));
    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                ops.extend(old[old_range].iter().map(|l| LineOp::Unchanged(l.to_string())));
            }
            DiffTag::Delete => {
                ops.extend(old[old_range].iter().map(|l| LineOp::Removed(l.to_string())));
            }
            DiffTag::Insert => {
                ops.extend(new[new_range].iter().map(|l| LineOp::Added(l.to_string())));
            }
            DiffTag::Replace => {
                ops.extend(old[old_range].iter().map(|l| LineOp::Removed(l.to_string())));
                ops.extend(new[new_range].iter().map(|l| LineOp::Added(l.to_string())));
            }
        }
    }

    DiffReport {
        ops,
        previous_lines: old.len(),
        latest_lines: new.len(),
    }
}
