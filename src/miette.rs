//! `miette` integration.
//!
//! This module is feature-gated behind the `miette` feature.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};

use crate::{Error, Mark};

/// Convert an [`Error`] into a `miette::Report` labelled at the error's position in `source`.
///
/// # Example
///
/// ```rust,no_run
/// let yaml = "key: [unclosed\n";
///
/// let err = yaml_events::parse_str(yaml).expect_err("parse error expected");
/// let report = yaml_events::miette::to_miette_report(&err, yaml, "config.yaml");
///
/// // `Debug` formatting uses miette's graphical reporter.
/// eprintln!("{report:?}");
/// ```
///
/// The error does not retain the input, so `source` is copied into the report. Errors
/// without a position (I/O, construction) produce a report without labels.
pub fn to_miette_report(err: &Error, source: &str, file: &str) -> miette::Report {
    // Marks are counted after the byte order mark.
    let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
    let src = Arc::new(NamedSource::new(file, source.to_owned()));
    miette::Report::new(build_diagnostic(err, src))
}

#[derive(Clone, Debug)]
struct ErrorDiagnostic {
    message: String,
    stage: String,
    src: Arc<NamedSource<String>>,
    labels: Vec<LabeledSpan>,
}

impl fmt::Display for ErrorDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorDiagnostic {}

impl Diagnostic for ErrorDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.stage))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Box::new(self.labels.clone().into_iter()))
        }
    }
}

fn build_diagnostic(err: &Error, src: Arc<NamedSource<String>>) -> ErrorDiagnostic {
    let inner = match err {
        Error::WithSnippet { error, .. } => error.as_ref(),
        other => other,
    };
    let message = inner.message();
    let mut labels = Vec::new();
    if let Some(mark) = inner.mark()
        && let Some(span) = to_source_span(&src, &mark)
    {
        labels.push(LabeledSpan::new_with_span(Some(message.clone()), span));
    }
    ErrorDiagnostic {
        message,
        stage: format!("yaml_events::{}", inner.stage()),
        src,
        labels,
    }
}

/// One character at `mark`, converted from a character offset to a byte range.
fn to_source_span(src: &NamedSource<String>, mark: &Mark) -> Option<SourceSpan> {
    let text = src.inner();
    let mut chars = text.char_indices().skip(mark.index());
    let (start, c) = match chars.next() {
        Some(found) => found,
        None if mark.index() == text.chars().count() => (text.len(), ' '),
        None => return None,
    };
    let len = if start == text.len() { 0 } else { c.len_utf8() };
    Some(SourceSpan::new(start.into(), len))
}

#[cfg(all(test, feature = "miette"))]
mod tests {
    use super::*;

    fn labels_of(err: &Error, yaml: &str) -> Vec<LabeledSpan> {
        let src = Arc::new(NamedSource::new("input.yaml", yaml.to_owned()));
        build_diagnostic(err, src).labels
    }

    #[test]
    fn parse_error_has_primary_label() {
        let yaml = "a: [1, 2\n";
        let err = crate::parse_str(yaml).unwrap_err();
        let labels = labels_of(&err, yaml);
        assert_eq!(labels.len(), 1);
        assert!(labels[0].offset() <= yaml.len());
    }

    #[test]
    fn multibyte_offsets_are_converted() {
        let yaml = "é: *missing\n";
        let err = crate::parse_str(yaml).unwrap_err();
        let labels = labels_of(&err, yaml);
        assert_eq!(labels.len(), 1);
        // `*` is the fourth character but sits at byte 4 because `é` takes two bytes.
        assert_eq!(labels[0].offset(), 4);
    }

    #[test]
    fn errors_without_position_have_no_labels() {
        let err = Error::construction("bad anchor");
        assert!(labels_of(&err, "").is_empty());
    }

    #[test]
    fn snippet_wrapper_is_unwrapped() {
        let yaml = "a: *nope\n";
        let err = crate::parse_str_with_options(yaml, crate::parser_options! { with_snippet: true })
            .unwrap_err();
        assert!(matches!(err, Error::WithSnippet { .. }));
        assert_eq!(labels_of(&err, yaml).len(), 1);
        let report = to_miette_report(&err, yaml, "input.yaml");
        assert!(report.to_string().contains("nope"));
    }
}
