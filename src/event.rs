//! The event model: the seam between the parser, the emitter and any mapping layer.
//!
//! Every [`Event`] carries start/end [`Mark`]s and a [`nesting_increase`](Event::nesting_increase)
//! of -1, 0 or +1, so consumers can track structural depth without a stack of their own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Mark, ScalarStyle};

/// A validated anchor or alias name: non-empty, made of `[A-Za-z0-9_-]`.
///
/// Validation happens on construction (and on deserialization), so an invalid name can never
/// reach the emitter.
///
/// ```rust
/// use yaml_events::AnchorName;
///
/// assert!(AnchorName::new("").is_err());
/// assert!(AnchorName::new("a b").is_err());
/// assert_eq!(AnchorName::new("abc123").unwrap().as_str(), "abc123");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnchorName(String);

impl AnchorName {
    /// Validate and wrap `name`.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::construction("anchor value must not be empty"));
        }
        if !name.chars().all(crate::chars::is_alpha) {
            return Err(Error::construction(format!(
                "anchor value `{name}` must contain alphanumerical characters, '_' or '-' only"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AnchorName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for AnchorName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AnchorName> for String {
    fn from(value: AnchorName) -> Self {
        value.0
    }
}

impl AsRef<str> for AnchorName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnchorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Layout of a sequence or mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionStyle {
    /// Let the emitter choose.
    #[default]
    Any,
    /// Indentation-delimited.
    Block,
    /// `[a, b]` / `{a: b}`.
    Flow,
}

/// `%YAML major.minor`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDirective {
    pub major: u32,
    pub minor: u32,
}

/// `%TAG handle prefix`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDirective {
    pub handle: String,
    pub prefix: String,
}

/// Properties shared by `SequenceStart` and `MappingStart`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStart {
    pub anchor: Option<AnchorName>,
    /// Fully resolved tag, if any.
    pub tag: Option<String>,
    /// True when the tag may be omitted on output.
    pub implicit: bool,
    pub style: CollectionStyle,
}

/// A scalar node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scalar {
    pub anchor: Option<AnchorName>,
    /// Fully resolved tag, if any.
    pub tag: Option<String>,
    pub value: String,
    pub style: ScalarStyle,
    /// The tag may be omitted when the scalar is written plain.
    pub plain_implicit: bool,
    /// The tag may be omitted when the scalar is written in any non-plain style.
    pub quoted_implicit: bool,
}

/// What happened, without the position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    StreamStart,
    StreamEnd,
    DocumentStart {
        version: Option<VersionDirective>,
        tags: Vec<TagDirective>,
        implicit: bool,
    },
    DocumentEnd {
        implicit: bool,
    },
    SequenceStart(CollectionStart),
    SequenceEnd,
    MappingStart(CollectionStart),
    MappingEnd,
    Scalar(Scalar),
    /// Back-reference to an anchor defined earlier in the same document.
    Alias(AnchorName),
    Comment {
        value: String,
        inline: bool,
    },
}

/// A parsing event with its source span.
///
/// Events built by hand carry [`Mark::EMPTY`] until [`Event::at`] places them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub start: Mark,
    pub end: Mark,
}

impl Event {
    pub fn new(kind: EventKind, start: Mark, end: Mark) -> Self {
        Self { kind, start, end }
    }

    fn unplaced(kind: EventKind) -> Self {
        Self::new(kind, Mark::EMPTY, Mark::EMPTY)
    }

    pub fn stream_start() -> Self {
        Self::unplaced(EventKind::StreamStart)
    }

    pub fn stream_end() -> Self {
        Self::unplaced(EventKind::StreamEnd)
    }

    /// Document start without directives.
    pub fn document_start(implicit: bool) -> Self {
        Self::unplaced(EventKind::DocumentStart {
            version: None,
            tags: Vec::new(),
            implicit,
        })
    }

    pub fn document_end(implicit: bool) -> Self {
        Self::unplaced(EventKind::DocumentEnd { implicit })
    }

    pub fn sequence_start(style: CollectionStyle) -> Self {
        Self::unplaced(EventKind::SequenceStart(CollectionStart {
            implicit: true,
            style,
            ..CollectionStart::default()
        }))
    }

    pub fn sequence_end() -> Self {
        Self::unplaced(EventKind::SequenceEnd)
    }

    pub fn mapping_start(style: CollectionStyle) -> Self {
        Self::unplaced(EventKind::MappingStart(CollectionStart {
            implicit: true,
            style,
            ..CollectionStart::default()
        }))
    }

    pub fn mapping_end() -> Self {
        Self::unplaced(EventKind::MappingEnd)
    }

    /// An untagged scalar whose style is left to the emitter.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::unplaced(EventKind::Scalar(Scalar {
            value: value.into(),
            plain_implicit: true,
            quoted_implicit: true,
            ..Scalar::default()
        }))
    }

    /// Alias event; fails if `name` is not a valid anchor name.
    pub fn alias(name: &str) -> Result<Self, Error> {
        Ok(Self::unplaced(EventKind::Alias(AnchorName::new(name)?)))
    }

    pub fn comment(value: impl Into<String>, inline: bool) -> Self {
        Self::unplaced(EventKind::Comment {
            value: value.into(),
            inline,
        })
    }

    /// Same event with `anchor` attached. Ignored for events that cannot carry an anchor.
    pub fn with_anchor(mut self, anchor: AnchorName) -> Self {
        match &mut self.kind {
            EventKind::SequenceStart(c) | EventKind::MappingStart(c) => c.anchor = Some(anchor),
            EventKind::Scalar(s) => s.anchor = Some(anchor),
            _ => {}
        }
        self
    }

    /// Same event with an explicit `tag`. The implicit flags are cleared so the tag is written.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        match &mut self.kind {
            EventKind::SequenceStart(c) | EventKind::MappingStart(c) => {
                c.tag = Some(tag.into());
                c.implicit = false;
            }
            EventKind::Scalar(s) => {
                s.tag = Some(tag.into());
                s.plain_implicit = false;
                s.quoted_implicit = false;
            }
            _ => {}
        }
        self
    }

    /// Same scalar with a requested presentation style.
    pub fn with_style(mut self, style: ScalarStyle) -> Self {
        if let EventKind::Scalar(s) = &mut self.kind {
            s.style = style;
        }
        self
    }

    /// Same collection start with a requested layout.
    pub fn with_collection_style(mut self, style: CollectionStyle) -> Self {
        if let EventKind::SequenceStart(c) | EventKind::MappingStart(c) = &mut self.kind {
            c.style = style;
        }
        self
    }

    /// Same event placed at the given span.
    pub fn at(mut self, start: Mark, end: Mark) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// +1 for collection starts, -1 for collection ends, 0 otherwise.
    pub fn nesting_increase(&self) -> i32 {
        match self.kind {
            EventKind::SequenceStart(_) | EventKind::MappingStart(_) => 1,
            EventKind::SequenceEnd | EventKind::MappingEnd => -1,
            _ => 0,
        }
    }

    /// Anchor defined by this event, if any.
    pub fn anchor(&self) -> Option<&AnchorName> {
        match &self.kind {
            EventKind::SequenceStart(c) | EventKind::MappingStart(c) => c.anchor.as_ref(),
            EventKind::Scalar(s) => s.anchor.as_ref(),
            _ => None,
        }
    }

    /// Resolved tag carried by this event, if any.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            EventKind::SequenceStart(c) | EventKind::MappingStart(c) => c.tag.as_deref(),
            EventKind::Scalar(s) => s.tag.as_deref(),
            _ => None,
        }
    }

    /// True for scalars, aliases and collection starts.
    pub fn is_node_start(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Scalar(_)
                | EventKind::Alias(_)
                | EventKind::SequenceStart(_)
                | EventKind::MappingStart(_)
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, EventKind::Comment { .. })
    }

    /// Short name of the event kind, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self.kind {
            EventKind::StreamStart => "stream start",
            EventKind::StreamEnd => "stream end",
            EventKind::DocumentStart { .. } => "document start",
            EventKind::DocumentEnd { .. } => "document end",
            EventKind::SequenceStart(_) => "sequence start",
            EventKind::SequenceEnd => "sequence end",
            EventKind::MappingStart(_) => "mapping start",
            EventKind::MappingEnd => "mapping end",
            EventKind::Scalar(_) => "scalar",
            EventKind::Alias(_) => "alias",
            EventKind::Comment { .. } => "comment",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Open {
    Sequence,
    Mapping,
}

/// Running depth over an event stream, checking that every end matches its start.
///
/// ```rust
/// use yaml_events::{CollectionStyle, Event, NestingTracker};
///
/// let mut tracker = NestingTracker::default();
/// tracker.observe(&Event::sequence_start(CollectionStyle::Block)).unwrap();
/// assert_eq!(tracker.depth(), 1);
/// assert!(tracker.observe(&Event::mapping_end()).is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct NestingTracker {
    open: Vec<Open>,
}

impl NestingTracker {
    /// Current depth: the running sum of `nesting_increase`.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Account for `event`, failing on an end without a matching start of the same kind.
    pub fn observe(&mut self, event: &Event) -> Result<(), Error> {
        match event.kind {
            EventKind::SequenceStart(_) => self.open.push(Open::Sequence),
            EventKind::MappingStart(_) => self.open.push(Open::Mapping),
            EventKind::SequenceEnd => self.close(Open::Sequence, event)?,
            EventKind::MappingEnd => self.close(Open::Mapping, event)?,
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, kind: Open, event: &Event) -> Result<(), Error> {
        match self.open.pop() {
            Some(open) if open == kind => Ok(()),
            Some(_) => Err(Error::emit(
                format!("{} does not match the innermost open collection", event.describe()),
                event.start,
            )),
            None => Err(Error::emit(
                format!("{} without a matching start", event.describe()),
                event.start,
            )),
        }
    }

    /// Fail unless every opened collection has been closed.
    pub fn finish(&self) -> Result<(), Error> {
        if self.open.is_empty() {
            Ok(())
        } else {
            Err(Error::emit(
                format!("{} collection(s) left open", self.open.len()),
                Mark::EMPTY,
            ))
        }
    }
}

/// Check that `events` is balanced: ends match starts and the final depth is zero.
pub fn check_well_formed(events: &[Event]) -> Result<(), Error> {
    let mut tracker = NestingTracker::default();
    for event in events {
        tracker.observe(event)?;
    }
    tracker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_increase_per_kind() {
        assert_eq!(Event::mapping_start(CollectionStyle::Block).nesting_increase(), 1);
        assert_eq!(Event::sequence_end().nesting_increase(), -1);
        assert_eq!(Event::scalar("x").nesting_increase(), 0);
        assert_eq!(Event::comment("c", false).nesting_increase(), 0);
        assert_eq!(Event::document_start(true).nesting_increase(), 0);
    }

    #[test]
    fn anchor_names_are_validated() {
        assert!(AnchorName::new("").is_err());
        assert!(AnchorName::new("a b").is_err());
        assert!(AnchorName::new("x.y").is_err());
        assert!(AnchorName::new("ok_name-1").is_ok());
        assert!(Event::alias("").is_err());
    }

    #[test]
    fn with_tag_clears_implicit_flags() {
        let ev = Event::scalar("1").with_tag("tag:yaml.org,2002:str");
        match ev.kind {
            EventKind::Scalar(s) => {
                assert!(!s.plain_implicit);
                assert!(!s.quoted_implicit);
            }
            _ => panic!("expected scalar"),
        }
    }

    #[test]
    fn unbalanced_streams_are_rejected() {
        let events = [
            Event::sequence_start(CollectionStyle::Flow),
            Event::mapping_start(CollectionStyle::Flow),
            Event::sequence_end(),
        ];
        assert!(check_well_formed(&events).is_err());
        assert!(check_well_formed(&events[..2]).is_err());
        assert!(check_well_formed(&[]).is_ok());
    }
}
