//! Lexical tokens produced by the [`Scanner`](crate::Scanner).

use serde::{Deserialize, Serialize};

use crate::Mark;

/// Presentation style of a scalar.
///
/// Tokens always carry a concrete style; [`ScalarStyle::Any`] only appears on events that
/// ask the emitter to pick the style itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarStyle {
    /// Let the emitter choose.
    #[default]
    Any,
    /// Unquoted.
    Plain,
    /// `'quoted'`
    SingleQuoted,
    /// `"quoted"` with escapes.
    DoubleQuoted,
    /// `|` block scalar, line breaks kept.
    Literal,
    /// `>` block scalar, line breaks folded.
    Folded,
}

impl ScalarStyle {
    /// True for the `|` and `>` block styles.
    #[inline]
    pub fn is_block(self) -> bool {
        matches!(self, ScalarStyle::Literal | ScalarStyle::Folded)
    }
}

/// The kind of a lexical token, together with its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    StreamStart,
    StreamEnd,
    /// `%YAML major.minor`
    VersionDirective { major: u32, minor: u32 },
    /// `%TAG handle prefix`
    TagDirective { handle: String, prefix: String },
    /// `---`
    DocumentStart,
    /// `...`
    DocumentEnd,
    BlockSequenceStart,
    BlockMappingStart,
    BlockEnd,
    FlowSequenceStart,
    FlowSequenceEnd,
    FlowMappingStart,
    FlowMappingEnd,
    /// `-` in block context.
    BlockEntry,
    /// `,` in flow context.
    FlowEntry,
    /// Explicit `?` or an implicit simple key.
    Key,
    /// `:`
    Value,
    /// `*name`
    Alias(String),
    /// `&name`
    Anchor(String),
    /// `!handle!suffix`, `!suffix`, `!<verbatim>` (empty handle).
    Tag { handle: String, suffix: String },
    Scalar { value: String, style: ScalarStyle },
    /// `# text`. `inline` is set when the comment follows other content on the same line.
    Comment { text: String, inline: bool },
}

/// A token with its source span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Position of the first character of the token.
    pub start: Mark,
    /// Position just past the last character of the token.
    pub end: Mark,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, start: Mark, end: Mark) -> Self {
        Self { kind, start, end }
    }

    /// Short human-readable name of the token kind, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        self.kind.describe()
    }
}

impl TokenKind {
    /// Short human-readable name, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::StreamStart => "stream start",
            TokenKind::StreamEnd => "end of stream",
            TokenKind::VersionDirective { .. } => "%YAML directive",
            TokenKind::TagDirective { .. } => "%TAG directive",
            TokenKind::DocumentStart => "document start marker '---'",
            TokenKind::DocumentEnd => "document end marker '...'",
            TokenKind::BlockSequenceStart => "block sequence start",
            TokenKind::BlockMappingStart => "block mapping start",
            TokenKind::BlockEnd => "block end",
            TokenKind::FlowSequenceStart => "'['",
            TokenKind::FlowSequenceEnd => "']'",
            TokenKind::FlowMappingStart => "'{'",
            TokenKind::FlowMappingEnd => "'}'",
            TokenKind::BlockEntry => "block entry '-'",
            TokenKind::FlowEntry => "','",
            TokenKind::Key => "key",
            TokenKind::Value => "value indicator ':'",
            TokenKind::Alias(_) => "alias",
            TokenKind::Anchor(_) => "anchor",
            TokenKind::Tag { .. } => "tag",
            TokenKind::Scalar { .. } => "scalar",
            TokenKind::Comment { .. } => "comment",
        }
    }
}
