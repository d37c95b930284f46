//! Error type shared by the scanner, parser, emitter and event constructors.

use std::{fmt, io};

use crate::budget::BudgetBreach;
use crate::Mark;

/// Pipeline stage an [`Error`] originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Malformed lexical structure: bad indentation, tabs, unterminated scalars, bad escapes.
    Scanner,
    /// Token sequence that violates the grammar, undefined aliases, bad directives, budgets.
    Parser,
    /// Event sequence that violates nesting, aliases to unrendered anchors, invalid options.
    Emitter,
    /// An event or anchor name built with an invalid field.
    Construction,
    /// The underlying reader or writer failed.
    Io,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Scanner => "scanner",
            Stage::Parser => "parser",
            Stage::Emitter => "emitter",
            Stage::Construction => "construction",
            Stage::Io => "I/O",
        })
    }
}

/// Error type returned by all public operations of this crate.
///
/// Nothing is recovered locally: scanning, parsing and emitting stop at the first error.
/// Output already written by the emitter before the failure stays written.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The scanner could not tokenize the input.
    Scan {
        problem: String,
        /// What the scanner was doing, e.g. "while scanning a quoted scalar".
        context: Option<&'static str>,
        mark: Mark,
    },
    /// The parser found a grammar violation other than an unexpected token.
    Parse {
        problem: String,
        context: Option<&'static str>,
        mark: Mark,
    },
    /// The parser received a token that is not valid in its current state.
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
        mark: Mark,
    },
    /// An alias referred to an anchor not defined earlier in the document.
    UndefinedAlias { name: String, mark: Mark },
    /// A configured [`Budget`](crate::Budget) was exceeded.
    Budget { breach: BudgetBreach, mark: Mark },
    /// The emitter received an event sequence it cannot render, or invalid options.
    Emit { problem: String, mark: Mark },
    /// The emitter received an alias for an anchor it has not rendered.
    UnknownAnchor { name: String, mark: Mark },
    /// An event or anchor name was constructed with invalid content.
    Construction { problem: String },
    /// Wrapper for formatting errors from a `fmt::Write` target.
    Format { error: fmt::Error },
    /// Wrapper for I/O errors from a reader or an `io::Write` target.
    Io { cause: io::Error },
    /// Any of the above with a pre-rendered source snippet.
    WithSnippet {
        /// Rendered diagnostic (cropped window around the error, not the whole input).
        text: String,
        error: Box<Error>,
    },
}

impl Error {
    #[cold]
    pub(crate) fn scan(context: &'static str, problem: impl Into<String>, mark: Mark) -> Self {
        Error::Scan {
            problem: problem.into(),
            context: Some(context),
            mark,
        }
    }

    #[cold]
    pub(crate) fn parse(problem: impl Into<String>, mark: Mark) -> Self {
        Error::Parse {
            problem: problem.into(),
            context: None,
            mark,
        }
    }

    #[cold]
    pub(crate) fn parse_in(context: &'static str, problem: impl Into<String>, mark: Mark) -> Self {
        Error::Parse {
            problem: problem.into(),
            context: Some(context),
            mark,
        }
    }

    #[cold]
    pub(crate) fn unexpected(expected: &'static str, found: &'static str, mark: Mark) -> Self {
        Error::UnexpectedToken {
            expected,
            found,
            mark,
        }
    }

    #[cold]
    pub(crate) fn emit(problem: impl Into<String>, mark: Mark) -> Self {
        Error::Emit {
            problem: problem.into(),
            mark,
        }
    }

    #[cold]
    pub(crate) fn construction(problem: impl Into<String>) -> Self {
        Error::Construction {
            problem: problem.into(),
        }
    }

    /// Which stage of the pipeline failed.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Scan { .. } => Stage::Scanner,
            Error::Parse { .. }
            | Error::UnexpectedToken { .. }
            | Error::UndefinedAlias { .. }
            | Error::Budget { .. } => Stage::Parser,
            Error::Emit { .. } | Error::UnknownAnchor { .. } => Stage::Emitter,
            Error::Construction { .. } => Stage::Construction,
            Error::Format { .. } | Error::Io { .. } => Stage::Io,
            Error::WithSnippet { error, .. } => error.stage(),
        }
    }

    /// Position of the offending input or event, if known.
    pub fn mark(&self) -> Option<Mark> {
        let mark = match self {
            Error::Scan { mark, .. }
            | Error::Parse { mark, .. }
            | Error::UnexpectedToken { mark, .. }
            | Error::UndefinedAlias { mark, .. }
            | Error::Budget { mark, .. }
            | Error::Emit { mark, .. }
            | Error::UnknownAnchor { mark, .. } => *mark,
            Error::Construction { .. } | Error::Format { .. } | Error::Io { .. } => return None,
            Error::WithSnippet { error, .. } => return error.mark(),
        };
        (!mark.is_empty()).then_some(mark)
    }

    /// Attach a rendered snippet of `text` around this error's mark.
    ///
    /// Errors without a mark are returned unchanged. `crop_radius` limits how many columns
    /// around the error column are shown on each line (0 disables horizontal cropping).
    pub fn with_snippet(self, text: &str, crop_radius: usize) -> Self {
        let inner = self.without_snippet();
        let Some(mark) = inner.mark() else {
            return inner;
        };
        let message = inner.message();
        match crate::snippet::render(&message, &mark, text, "<input>", crop_radius) {
            Some(text) => Error::WithSnippet {
                text,
                error: Box::new(inner),
            },
            None => inner,
        }
    }

    /// Strip a snippet wrapper, if present.
    pub fn without_snippet(self) -> Self {
        match self {
            Error::WithSnippet { error, .. } => *error,
            other => other,
        }
    }

    /// The message without the position suffix.
    pub(crate) fn message(&self) -> String {
        match self {
            Error::Scan {
                problem, context, ..
            }
            | Error::Parse {
                problem, context, ..
            } => match context {
                Some(context) => format!("{problem} {context}"),
                None => problem.clone(),
            },
            Error::UnexpectedToken {
                expected, found, ..
            } => format!("expected {expected}, found {found}"),
            Error::UndefinedAlias { name, .. } => format!("alias `*{name}` refers to an undefined anchor"),
            Error::Budget { breach, .. } => format!("budget exceeded: {breach}"),
            Error::Emit { problem, .. } => problem.clone(),
            Error::UnknownAnchor { name, .. } => {
                format!("alias `*{name}` refers to an anchor that has not been emitted")
            }
            Error::Construction { problem } => problem.clone(),
            Error::Format { error } => format!("formatting error: {error}"),
            Error::Io { cause } => format!("I/O error: {cause}"),
            Error::WithSnippet { error, .. } => error.message(),
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(error: fmt::Error) -> Self {
        Error::Format { error }
    }
}

impl From<io::Error> for Error {
    fn from(cause: io::Error) -> Self {
        Error::Io { cause }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Error::WithSnippet { text, .. } = self {
            return f.write_str(text);
        }
        let message = self.message();
        match self.mark() {
            Some(mark) => write!(f, "{} error: {message} at {mark}", self.stage()),
            None => write!(f, "{} error: {message}", self.stage()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Format { error } => Some(error),
            Error::Io { cause } => Some(cause),
            Error::WithSnippet { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}
