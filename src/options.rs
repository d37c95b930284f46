use serde::{Deserialize, Serialize};

use crate::budget::Budget;

/// Parser configuration.
///
/// ```rust
/// use yaml_events::{budget, parser_options, parse_str_with_options};
///
/// let options = parser_options! {
///     budget: Some(budget! { max_depth: 8 }),
///     with_comments: false,
/// };
/// let events = parse_str_with_options("a: 1 # note\n", options).unwrap();
/// assert!(!events.iter().any(|e| e.is_comment()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Optional budget enforced on every produced event. Default: `Budget::default()`.
    pub budget: Option<Budget>,
    /// Produce `Comment` events. Default: true.
    pub with_comments: bool,
    /// If true (default), entry points that have the whole input wrap returned errors with a
    /// rendered source snippet.
    pub with_snippet: bool,
    /// Horizontal crop radius (in character columns) for snippet diagnostics.
    ///
    /// All displayed lines are cropped to the same column window around the error column.
    /// `0` disables cropping. Default: 64.
    pub crop_radius: usize,
    /// Cap on decoded input bytes for reader-based parsing. Default: none.
    pub max_input_bytes: Option<usize>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            budget: Some(Budget::default()),
            with_comments: true,
            with_snippet: true,
            crop_radius: 64,
            max_input_bytes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ParserOptions::default();
        assert_eq!(opts.budget, Some(Budget::default()));
        assert!(opts.with_comments);
        assert!(opts.with_snippet);
        assert_eq!(opts.crop_radius, 64);
        assert_eq!(opts.max_input_bytes, None);
    }

    #[test]
    fn macro_overrides_fields() {
        let opts = crate::parser_options! {
            with_snippet: false,
            max_input_bytes: Some(1024),
        };
        assert!(!opts.with_snippet);
        assert_eq!(opts.max_input_bytes, Some(1024));
        assert!(opts.with_comments);
    }

    #[test]
    fn serde_roundtrip() {
        let opts = ParserOptions::default();
        let json = serde_json::to_string(&opts).unwrap();
        let back: ParserOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opts);
    }
}
