//! Source positions.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A position within the YAML input stream.
///
/// - `index` counts Unicode scalar values from the start of the stream (0-based).
/// - `line` and `column` are 1-indexed and character-based.
///
/// Marks compare (for both equality and ordering) by `index` only, so two marks pointing
/// at the same character are equal even if one of them was produced synthetically.
///
/// [`Mark::EMPTY`] is the sentinel used for events built by hand rather than parsed
/// from text.
///
/// ```rust
/// use yaml_events::Mark;
///
/// let m = Mark::new(4, 2, 1);
/// assert_eq!(m.line(), 2);
/// assert!(Mark::EMPTY.is_empty());
/// assert!(Mark::EMPTY < m);
/// ```
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Mark {
    /// Character offset within the input stream.
    pub(crate) index: usize,
    /// 1-indexed row number in the input stream.
    pub(crate) line: usize,
    /// 1-indexed column number in the input stream.
    pub(crate) column: usize,
}

impl Mark {
    /// Sentinel value meaning "no position", used for synthetically constructed events.
    pub const EMPTY: Self = Self {
        index: 0,
        line: 0,
        column: 0,
    };

    /// Create a new mark.
    ///
    /// Arguments:
    /// - `index`: 0-based character offset.
    /// - `line`: 1-indexed line.
    /// - `column`: 1-indexed column.
    pub const fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
        }
    }

    /// Character offset within the input stream.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-indexed line, or 0 for [`Mark::EMPTY`].
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-indexed column, or 0 for [`Mark::EMPTY`].
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// True for the sentinel mark that carries no source position.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.line == 0
    }
}

impl PartialEq for Mark {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Mark {}

impl PartialOrd for Mark {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mark {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl std::hash::Hash for Mark {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("<unknown position>")
        } else {
            write!(f, "line {}, column {}", self.line, self.column)
        }
    }
}
