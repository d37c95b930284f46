//! Emitter options.
//!
//! Example: four-space indentation with flow collections by default.
//!
//! ```rust
//! use yaml_events::{emit_to_string_with_options, emitter_options, parse_str};
//!
//! let events = parse_str("a:\n  b: [1, 2]\n").unwrap();
//! let opts = emitter_options! {
//!     indent_step: 4,
//! };
//! let yaml = emit_to_string_with_options(&events, opts).unwrap();
//! assert_eq!(yaml, "a:\n    b: [1, 2]\n");
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Mark};

/// Line terminator written by the emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineBreak {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
    /// `\r\n` on Windows, `\n` elsewhere.
    Platform,
}

impl LineBreak {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            LineBreak::Lf => "\n",
            LineBreak::CrLf => "\r\n",
            LineBreak::Cr => "\r",
            LineBreak::Platform => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

/// Emitter options.
///
/// Construct with the [`emitter_options!`](crate::emitter_options!) macro so that call sites
/// keep compiling when fields are added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterOptions {
    /// Spaces per nesting level in block collections (2 by default). Must be in `1..=9`.
    pub indent_step: usize,
    /// Soft wrap column for plain, quoted and folded scalars (80 by default).
    /// Values below `indent_step * 2` are raised to that.
    pub best_width: usize,
    /// Canonical output: explicit document markers, explicit tags, flow collections and
    /// double-quoted scalars everywhere. Off by default.
    pub canonical: bool,
    pub line_break: LineBreak,
    /// Collections whose style is `Any` are written in flow style. Off by default.
    pub default_flow: bool,
    /// Write non-ASCII printable characters as they are. On by default; when off they are
    /// escaped inside double quotes.
    pub unicode: bool,
    /// Always write `---` before a document. Off by default.
    pub explicit_document_start: bool,
}

pub(crate) const MAX_INDENT_STEP: usize = 9;

impl EmitterOptions {
    pub(crate) fn consistent(&self) -> Result<(), Error> {
        if self.indent_step == 0 {
            return Err(Error::emit("indent step must be positive", Mark::EMPTY));
        }
        if self.indent_step > MAX_INDENT_STEP {
            return Err(Error::emit(
                format!(
                    "indent step {} is too large (at most {MAX_INDENT_STEP})",
                    self.indent_step
                ),
                Mark::EMPTY,
            ));
        }
        Ok(())
    }

    /// Effective wrap column.
    pub(crate) fn width(&self) -> usize {
        self.best_width.max(self.indent_step * 2)
    }
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            indent_step: 2,
            best_width: 80,
            canonical: false,
            line_break: LineBreak::Lf,
            default_flow: false,
            unicode: true,
            explicit_document_start: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let opts = EmitterOptions::default();
        assert!(opts.consistent().is_ok());
        assert_eq!(opts.indent_step, 2);
        assert_eq!(opts.width(), 80);
        assert_eq!(opts.line_break.as_str(), "\n");
    }

    #[test]
    fn indent_step_bounds() {
        let zero = crate::emitter_options! { indent_step: 0 };
        assert!(matches!(zero.consistent(), Err(Error::Emit { .. })));
        let ten = crate::emitter_options! { indent_step: 10 };
        assert!(ten.consistent().is_err());
        let nine = crate::emitter_options! { indent_step: 9 };
        assert!(nine.consistent().is_ok());
    }

    #[test]
    fn narrow_width_is_clamped() {
        let opts = crate::emitter_options! { indent_step: 4, best_width: 3 };
        assert_eq!(opts.width(), 8);
    }

    #[test]
    fn serde_roundtrip() {
        let opts = crate::emitter_options! {
            line_break: LineBreak::CrLf,
            canonical: true,
        };
        let json = serde_json::to_string(&opts).unwrap();
        assert!(json.contains("\"CrLf\""));
        let back: EmitterOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opts);
    }
}
