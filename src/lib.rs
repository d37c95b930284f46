//! Streaming YAML scanner, parser and emitter built around a round-trippable event model.
//!
//! Text is turned into [`Token`]s by the [`Scanner`], tokens into [`Event`]s by the
//! [`Parser`], and events back into text by the [`Emitter`]. Events are the only interface
//! to anything that maps YAML onto application data; comments travel through the pipeline
//! as events of their own, so parse-then-emit keeps them.
//!
//! ```rust
//! use yaml_events::{emit_to_string, parse_str};
//!
//! let yaml = "# owner\nname: PandaTea\nports: [80, 443]\n";
//! let events = parse_str(yaml).unwrap();
//! assert_eq!(emit_to_string(&events).unwrap(), yaml);
//! ```

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!($($arg)*) };
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) };
}
#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

mod anchors;
pub mod budget;
mod chars;
mod emitter;
mod emitter_options;
mod error;
mod event;
mod input;
mod interceptor;
mod macros;
mod mark;
mod options;
mod parser;
mod scalar_analysis;
mod scanner;
mod snippet;
mod token;
mod writer;

#[cfg(feature = "miette")]
pub mod miette;

use std::{fmt, io};

pub use budget::{check_budget, Budget, BudgetBreach, BudgetEnforcer, BudgetReport};
pub use emitter::Emitter;
pub use emitter_options::{EmitterOptions, LineBreak};
pub use error::{Error, Stage};
pub use event::{
    check_well_formed, AnchorName, CollectionStart, CollectionStyle, Event, EventKind,
    NestingTracker, Scalar, TagDirective, VersionDirective,
};
pub use input::{decoded_reader, CharInput, DecodedReader, ReaderChars};
pub use interceptor::{EventInterceptor, FlowStyleAbove, ForceFlowForTags};
pub use mark::Mark;
pub use options::ParserOptions;
pub use parser::Parser;
pub use scanner::Scanner;
pub use token::{ScalarStyle, Token, TokenKind};

/// Parse a whole string into its events with default [`ParserOptions`].
pub fn parse_str(input: &str) -> Result<Vec<Event>, Error> {
    parse_str_with_options(input, ParserOptions::default())
}

/// Parse a whole string into its events.
///
/// When `options.with_snippet` is set, a returned error carries a rendered window of
/// `input` around the failure.
///
/// ```rust
/// use yaml_events::{parse_str_with_options, parser_options, Error};
///
/// let err = parse_str_with_options("a: *missing\n", parser_options! {}).unwrap_err();
/// assert!(matches!(err, Error::WithSnippet { .. }));
/// assert!(err.to_string().contains("missing"));
/// ```
pub fn parse_str_with_options(input: &str, options: ParserOptions) -> Result<Vec<Event>, Error> {
    let with_snippet = options.with_snippet;
    let crop_radius = options.crop_radius;
    Parser::with_options(input.chars(), options)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            if with_snippet {
                err.with_snippet(input, crop_radius)
            } else {
                err
            }
        })
}

/// Render `events` with default [`EmitterOptions`].
pub fn emit_to_string(events: &[Event]) -> Result<String, Error> {
    emit_to_string_with_options(events, EmitterOptions::default())
}

pub fn emit_to_string_with_options(
    events: &[Event],
    options: EmitterOptions,
) -> Result<String, Error> {
    let mut out = String::new();
    emit_to_fmt_writer_with_options(&mut out, events, options)?;
    Ok(out)
}

/// Render `events` into any `fmt::Write`.
pub fn emit_to_fmt_writer<W: fmt::Write>(out: W, events: &[Event]) -> Result<(), Error> {
    emit_to_fmt_writer_with_options(out, events, EmitterOptions::default())
}

pub fn emit_to_fmt_writer_with_options<W: fmt::Write>(
    out: W,
    events: &[Event],
    options: EmitterOptions,
) -> Result<(), Error> {
    let mut emitter = Emitter::with_options(out, options)?;
    for event in events {
        emitter.emit(event.clone())?;
    }
    emitter.finish()
}

/// Render `events` into an `io::Write`. Failures of the writer surface as [`Error::Io`].
///
/// ```rust
/// use yaml_events::{emit_to_io_writer, parse_str};
///
/// let events = parse_str("- a\n- b\n").unwrap();
/// let mut bytes = Vec::new();
/// emit_to_io_writer(&mut bytes, &events).unwrap();
/// assert_eq!(bytes, b"- a\n- b\n");
/// ```
pub fn emit_to_io_writer<W: io::Write>(out: W, events: &[Event]) -> Result<(), Error> {
    emit_to_io_writer_with_options(out, events, EmitterOptions::default())
}

pub fn emit_to_io_writer_with_options<W: io::Write>(
    out: W,
    events: &[Event],
    options: EmitterOptions,
) -> Result<(), Error> {
    let mut writer = writer::IoWriter::new(out);
    let result = emit_to_fmt_writer_with_options(&mut writer, events, options);
    if let Some(cause) = writer.take_error() {
        return Err(Error::Io { cause });
    }
    result?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_keeps_comments() {
        let yaml = "# owner\nname: PandaTea\nports: [80, 443]\n";
        let events = parse_str(yaml).unwrap();
        assert_eq!(emit_to_string(&events).unwrap(), yaml);
    }

    #[test]
    fn snippet_can_be_disabled() {
        let options = parser_options! { with_snippet: false };
        let err = parse_str_with_options("a: *missing\n", options).unwrap_err();
        assert!(matches!(err, Error::UndefinedAlias { .. }));
    }

    #[test]
    fn io_errors_are_reported() {
        struct Full;
        impl io::Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::StorageFull, "full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let events = parse_str("a: b\n").unwrap();
        let err = emit_to_io_writer(Full, &events).unwrap_err();
        assert!(matches!(err, Error::Io { ref cause } if cause.kind() == io::ErrorKind::StorageFull));
        assert_eq!(err.stage(), Stage::Io);
    }
}
