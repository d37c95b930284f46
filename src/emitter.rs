//! The emitter: [`Event`]s in, YAML text out.
//!
//! A push-based state machine. Each call to [`Emitter::emit`] queues one event; events are
//! rendered as soon as enough lookahead is available to decide layout (at most three
//! following events, to tell empty collections and simple keys apart). Comment events ride
//! along in the queue and are rendered at the position they arrive in.

use std::collections::VecDeque;
use std::fmt;

use smallvec::SmallVec;

use crate::anchors::{AnchorState, AnchorTable};
use crate::chars::{is_alpha, is_blankz, is_break, is_printable};
use crate::emitter_options::EmitterOptions;
use crate::event::{CollectionStart, EventKind, Scalar, TagDirective};
use crate::interceptor::EventInterceptor;
use crate::scalar_analysis::{analyze, is_ambiguous, ScalarAnalysis};
use crate::{CollectionStyle, Error, Event, Mark, NestingTracker, ScalarStyle};

const CORE_SCHEMA_PREFIX: &str = "tag:yaml.org,2002:";
/// Longest key written in implicit `key: value` form.
const MAX_SIMPLE_KEY_LENGTH: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    StreamStart,
    FirstDocumentStart,
    DocumentStart,
    DocumentContent,
    DocumentEnd,
    FlowSequenceFirstItem,
    FlowSequenceItem,
    FlowMappingFirstKey,
    FlowMappingKey,
    FlowMappingSimpleValue,
    FlowMappingValue,
    BlockSequenceItem,
    BlockMappingKey,
    BlockMappingSimpleValue,
    BlockMappingValue,
    End,
}

/// How a tag is written: `!handle!suffix` or verbatim `!<suffix>`.
struct TagParts {
    handle: Option<String>,
    suffix: String,
}

/// Renders an event stream as YAML into any [`fmt::Write`].
///
/// ```rust
/// use yaml_events::{CollectionStyle, Emitter, Event};
///
/// let mut out = String::new();
/// let mut emitter = Emitter::new(&mut out);
/// for event in [
///     Event::stream_start(),
///     Event::document_start(true),
///     Event::mapping_start(CollectionStyle::Block),
///     Event::scalar("name"),
///     Event::scalar("PandaTea"),
///     Event::mapping_end(),
///     Event::document_end(true),
///     Event::stream_end(),
/// ] {
///     emitter.emit(event).unwrap();
/// }
/// emitter.finish().unwrap();
/// drop(emitter);
/// assert_eq!(out, "name: PandaTea\n");
/// ```
pub struct Emitter<W> {
    out: W,
    options: EmitterOptions,
    best_width: usize,
    line_break: &'static str,
    interceptors: Vec<Box<dyn EventInterceptor>>,

    events: VecDeque<Event>,
    /// Comments that arrived between a key and its value, written once the value has started.
    deferred: Vec<Event>,
    state: State,
    states: SmallVec<[State; 16]>,
    indent: isize,
    indents: SmallVec<[isize; 16]>,
    flow_level: usize,

    root_context: bool,
    mapping_context: bool,
    simple_key_context: bool,

    column: usize,
    /// The last character written was whitespace (or nothing has been written on the line).
    whitespace: bool,
    /// Only indentation and indicators are on the current line.
    indention: bool,
    /// 1 after an open-ended root plain scalar, 2 after a `+` block scalar.
    open_ended: u8,
    /// An inline comment ends the current line; nothing else may follow on it.
    comment_on_line: bool,

    anchors: AnchorTable,
    nesting: NestingTracker,
    tag_directives: Vec<TagDirective>,
    failed: bool,
}

impl<W: fmt::Write> Emitter<W> {
    /// Emitter with default options.
    pub fn new(out: W) -> Self {
        Self::build(out, EmitterOptions::default())
    }

    /// Emitter with `options`, rejected with [`Error::Emit`] when inconsistent.
    pub fn with_options(out: W, options: EmitterOptions) -> Result<Self, Error> {
        options.consistent()?;
        Ok(Self::build(out, options))
    }

    fn build(out: W, options: EmitterOptions) -> Self {
        Self {
            out,
            best_width: options.width(),
            line_break: options.line_break.as_str(),
            options,
            interceptors: Vec::new(),
            events: VecDeque::with_capacity(8),
            deferred: Vec::new(),
            state: State::StreamStart,
            states: SmallVec::new(),
            indent: -1,
            indents: SmallVec::new(),
            flow_level: 0,
            root_context: false,
            mapping_context: false,
            simple_key_context: false,
            column: 0,
            whitespace: true,
            indention: true,
            open_ended: 0,
            comment_on_line: false,
            anchors: AnchorTable::default(),
            nesting: NestingTracker::default(),
            tag_directives: Vec::new(),
            failed: false,
        }
    }

    /// Append an interceptor. Every event passes through the interceptors in the order they
    /// were added before it is rendered.
    pub fn with_interceptor(mut self, interceptor: impl EventInterceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// Queue `event` and render whatever can be rendered.
    ///
    /// The first error is final: later calls fail too. Text written before the error stays.
    pub fn emit(&mut self, event: Event) -> Result<(), Error> {
        if self.failed {
            return Err(Error::emit(
                "emitter stopped after an earlier error",
                event.start,
            ));
        }
        let result = self.accept(event);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn accept(&mut self, mut event: Event) -> Result<(), Error> {
        for interceptor in &mut self.interceptors {
            event = interceptor.intercept(event)?;
        }
        if self.state == State::End {
            return Err(Error::emit(
                format!("{} after the end of the stream", event.describe()),
                event.start,
            ));
        }
        self.nesting.observe(&event)?;
        self.events.push_back(event);
        while !self.need_more_events() {
            let Some(event) = self.events.pop_front() else {
                break;
            };
            if event.is_comment() {
                self.comment(event)?;
                continue;
            }
            self.state_machine(&event)?;
            self.flush_deferred()?;
        }
        Ok(())
    }

    /// Fail unless the stream has been closed with `StreamEnd`.
    pub fn finish(&self) -> Result<(), Error> {
        if self.state == State::End && self.events.is_empty() {
            Ok(())
        } else {
            Err(Error::emit(
                "the event stream was not terminated with stream end",
                Mark::EMPTY,
            ))
        }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn need_more_events(&self) -> bool {
        let Some(head) = self.events.front() else {
            return true;
        };
        let accumulate = match head.kind {
            EventKind::DocumentStart { .. } => 1,
            EventKind::SequenceStart(_) => 2,
            EventKind::MappingStart(_) => 3,
            _ => return false,
        };
        let following = self.events.iter().skip(1).filter(|e| !e.is_comment()).count();
        if following >= accumulate {
            return false;
        }
        let mut level = 0i32;
        for event in &self.events {
            level += match event.kind {
                EventKind::StreamStart
                | EventKind::DocumentStart { .. }
                | EventKind::SequenceStart(_)
                | EventKind::MappingStart(_) => 1,
                EventKind::StreamEnd
                | EventKind::DocumentEnd { .. }
                | EventKind::SequenceEnd
                | EventKind::MappingEnd => -1,
                _ => 0,
            };
            if level == 0 {
                return false;
            }
        }
        true
    }

    /// The next queued event that is not a comment.
    fn next_event(&self) -> Option<&Event> {
        self.events.iter().find(|e| !e.is_comment())
    }

    fn state_machine(&mut self, event: &Event) -> Result<(), Error> {
        trace!("emitter state {:?} event {}", self.state, event.describe());
        match self.state {
            State::StreamStart => self.emit_stream_start(event),
            State::FirstDocumentStart => self.emit_document_start(event, true),
            State::DocumentStart => self.emit_document_start(event, false),
            State::DocumentContent => self.emit_document_content(event),
            State::DocumentEnd => self.emit_document_end(event),
            State::FlowSequenceFirstItem => self.emit_flow_sequence_item(event, true),
            State::FlowSequenceItem => self.emit_flow_sequence_item(event, false),
            State::FlowMappingFirstKey => self.emit_flow_mapping_key(event, true),
            State::FlowMappingKey => self.emit_flow_mapping_key(event, false),
            State::FlowMappingSimpleValue => self.emit_flow_mapping_value(event, true),
            State::FlowMappingValue => self.emit_flow_mapping_value(event, false),
            State::BlockSequenceItem => self.emit_block_sequence_item(event),
            State::BlockMappingKey => self.emit_block_mapping_key(event),
            State::BlockMappingSimpleValue => self.emit_block_mapping_value(event, true),
            State::BlockMappingValue => self.emit_block_mapping_value(event, false),
            State::End => Err(Error::emit(
                format!("{} after the end of the stream", event.describe()),
                event.start,
            )),
        }
    }

    fn pop_state(&mut self) {
        self.state = self.states.pop().unwrap_or(State::End);
    }

    fn pop_indent(&mut self) {
        self.indent = self.indents.pop().unwrap_or(-1);
    }

    fn increase_indent(&mut self, flow: bool, indentless: bool) {
        self.indents.push(self.indent);
        let step = self.options.indent_step as isize;
        if self.indent < 0 {
            self.indent = if flow { step } else { 0 };
        } else if !indentless {
            self.indent += step;
        }
    }

    fn emit_stream_start(&mut self, event: &Event) -> Result<(), Error> {
        if event.kind != EventKind::StreamStart {
            return Err(unexpected_event("stream start", event));
        }
        self.indent = -1;
        self.column = 0;
        self.whitespace = true;
        self.indention = true;
        self.state = State::FirstDocumentStart;
        Ok(())
    }

    fn emit_document_start(&mut self, event: &Event, first: bool) -> Result<(), Error> {
        match &event.kind {
            EventKind::DocumentStart {
                version,
                tags,
                implicit,
            } => {
                if let Some(version) = version {
                    if version.major != 1 {
                        return Err(Error::emit(
                            format!(
                                "incompatible %YAML directive {}.{}",
                                version.major, version.minor
                            ),
                            event.start,
                        ));
                    }
                }
                self.tag_directives.clear();
                for tag in tags {
                    check_tag_directive(tag, event.start)?;
                    if self.tag_directives.iter().any(|t| t.handle == tag.handle) {
                        return Err(Error::emit(
                            format!("duplicate %TAG directive for handle `{}`", tag.handle),
                            event.start,
                        ));
                    }
                    self.tag_directives.push(tag.clone());
                }
                for (handle, prefix) in [("!", "!"), ("!!", CORE_SCHEMA_PREFIX)] {
                    if !self.tag_directives.iter().any(|t| t.handle == handle) {
                        self.tag_directives.push(TagDirective {
                            handle: handle.to_owned(),
                            prefix: prefix.to_owned(),
                        });
                    }
                }
                self.anchors.reset();
                debug!("document start (first: {}, implicit: {})", first, implicit);

                let mut implicit = *implicit
                    && first
                    && !self.options.canonical
                    && !self.options.explicit_document_start;
                let has_directives = version.is_some() || !tags.is_empty();
                if has_directives && self.open_ended != 0 {
                    self.write_indicator("...", true, false, false)?;
                    self.write_indent()?;
                }
                self.open_ended = 0;
                if let Some(version) = version {
                    implicit = false;
                    self.write_indicator("%YAML", true, false, false)?;
                    let number = format!("{}.{}", version.major, version.minor);
                    self.write_indicator(&number, true, false, false)?;
                    self.write_indent()?;
                }
                for tag in tags {
                    implicit = false;
                    self.write_indicator("%TAG", true, false, false)?;
                    self.write_tag_handle(&tag.handle)?;
                    self.write_tag_content(&tag.prefix, true)?;
                    self.write_indent()?;
                }
                if !implicit {
                    self.write_indent()?;
                    self.write_indicator("---", true, false, false)?;
                    if self.options.canonical {
                        self.write_indent()?;
                    }
                }
                self.state = State::DocumentContent;
                self.open_ended = 0;
                Ok(())
            }
            EventKind::StreamEnd => {
                if self.open_ended == 2 {
                    self.write_indicator("...", true, false, false)?;
                    self.open_ended = 0;
                    self.write_indent()?;
                }
                if self.comment_on_line || self.column > 0 {
                    self.put_break()?;
                }
                self.state = State::End;
                Ok(())
            }
            _ => Err(unexpected_event("document start or stream end", event)),
        }
    }

    fn emit_document_content(&mut self, event: &Event) -> Result<(), Error> {
        self.states.push(State::DocumentEnd);
        self.emit_node(event, true, false, false)
    }

    fn emit_document_end(&mut self, event: &Event) -> Result<(), Error> {
        let EventKind::DocumentEnd { implicit } = event.kind else {
            return Err(unexpected_event("document end", event));
        };
        self.write_indent()?;
        if !implicit {
            self.write_indent()?;
            self.write_indicator("...", true, false, false)?;
            self.open_ended = 0;
            self.write_indent()?;
        } else if self.open_ended == 0 {
            self.open_ended = 1;
        }
        debug!("document end (implicit: {})", implicit);
        self.state = State::DocumentStart;
        self.tag_directives.clear();
        Ok(())
    }

    fn emit_flow_sequence_item(&mut self, event: &Event, first: bool) -> Result<(), Error> {
        if event.kind == EventKind::SequenceEnd {
            self.flow_level -= 1;
            self.pop_indent();
            if self.options.canonical && !first {
                self.write_indicator(",", false, false, false)?;
                self.write_indent()?;
            }
            self.write_indicator("]", false, false, false)?;
            self.pop_state();
            return Ok(());
        }
        if !first {
            self.write_indicator(",", false, false, false)?;
        }
        if self.options.canonical || self.column > self.best_width {
            self.write_indent()?;
        }
        self.states.push(State::FlowSequenceItem);
        self.emit_node(event, false, false, false)
    }

    fn emit_flow_mapping_key(&mut self, event: &Event, first: bool) -> Result<(), Error> {
        if event.kind == EventKind::MappingEnd {
            self.flow_level -= 1;
            self.pop_indent();
            if self.options.canonical && !first {
                self.write_indicator(",", false, false, false)?;
                self.write_indent()?;
            }
            self.write_indicator("}", false, false, false)?;
            self.pop_state();
            return Ok(());
        }
        if !first {
            self.write_indicator(",", false, false, false)?;
        }
        if self.options.canonical || self.column > self.best_width {
            self.write_indent()?;
        }
        if !self.options.canonical && self.check_simple_key(event) {
            self.states.push(State::FlowMappingSimpleValue);
            self.emit_node(event, false, true, true)
        } else {
            self.write_indicator("?", true, false, false)?;
            self.states.push(State::FlowMappingValue);
            self.emit_node(event, false, true, false)
        }
    }

    fn emit_flow_mapping_value(&mut self, event: &Event, simple: bool) -> Result<(), Error> {
        if simple {
            self.write_indicator(":", false, false, false)?;
        } else {
            if self.options.canonical || self.column > self.best_width {
                self.write_indent()?;
            }
            self.write_indicator(":", true, false, false)?;
        }
        self.states.push(State::FlowMappingKey);
        self.emit_node(event, false, true, false)
    }

    fn emit_block_sequence_item(&mut self, event: &Event) -> Result<(), Error> {
        if event.kind == EventKind::SequenceEnd {
            self.pop_indent();
            self.pop_state();
            return Ok(());
        }
        self.write_indent()?;
        self.write_indicator("-", true, false, true)?;
        self.states.push(State::BlockSequenceItem);
        self.emit_node(event, false, false, false)
    }

    fn emit_block_mapping_key(&mut self, event: &Event) -> Result<(), Error> {
        if event.kind == EventKind::MappingEnd {
            self.pop_indent();
            self.pop_state();
            return Ok(());
        }
        self.write_indent()?;
        if self.check_simple_key(event) {
            self.states.push(State::BlockMappingSimpleValue);
            self.emit_node(event, false, true, true)
        } else {
            self.write_indicator("?", true, false, true)?;
            self.states.push(State::BlockMappingValue);
            self.emit_node(event, false, true, false)
        }
    }

    fn emit_block_mapping_value(&mut self, event: &Event, simple: bool) -> Result<(), Error> {
        if simple {
            self.write_indicator(":", false, false, false)?;
        } else {
            self.write_indent()?;
            self.write_indicator(":", true, false, true)?;
        }
        self.states.push(State::BlockMappingKey);
        self.emit_node(event, false, true, false)
    }

    fn emit_node(
        &mut self,
        event: &Event,
        root: bool,
        mapping: bool,
        simple_key: bool,
    ) -> Result<(), Error> {
        self.root_context = root;
        self.mapping_context = mapping;
        self.simple_key_context = simple_key;
        if self.comment_on_line {
            // Continue below the comment, one step deeper than the enclosing node.
            self.increase_indent(true, false);
            self.write_indent()?;
            self.pop_indent();
        }

        match &event.kind {
            EventKind::Alias(name) => {
                if self.anchors.state(name.as_str()) != AnchorState::Defined {
                    return Err(Error::UnknownAnchor {
                        name: name.as_str().to_owned(),
                        mark: event.start,
                    });
                }
                self.write_anchor(true, name.as_str())?;
                if self.simple_key_context {
                    self.put(' ')?;
                }
                self.pop_state();
                Ok(())
            }
            EventKind::Scalar(scalar) => self.emit_scalar(scalar, event.start),
            EventKind::SequenceStart(start) => self.emit_sequence_start(start, event),
            EventKind::MappingStart(start) => self.emit_mapping_start(start, event),
            _ => Err(unexpected_event(
                "scalar, sequence start, mapping start or alias",
                event,
            )),
        }
    }

    fn define_anchor(&mut self, anchor: Option<&crate::AnchorName>) -> Result<(), Error> {
        if let Some(anchor) = anchor {
            if self.anchors.define(anchor.as_str()) {
                trace!("anchor `{}` redefined", anchor);
            }
            self.write_anchor(false, anchor.as_str())?;
        }
        Ok(())
    }

    fn emit_sequence_start(&mut self, start: &CollectionStart, event: &Event) -> Result<(), Error> {
        self.define_anchor(start.anchor.as_ref())?;
        self.write_collection_tag(start, "seq", event.start)?;
        if self.flow_collection(start.style) || self.check_empty_sequence() {
            self.write_indicator("[", true, true, false)?;
            self.increase_indent(true, false);
            self.flow_level += 1;
            self.state = State::FlowSequenceFirstItem;
        } else {
            let indentless = self.mapping_context && !self.indention;
            self.increase_indent(false, indentless);
            self.state = State::BlockSequenceItem;
        }
        Ok(())
    }

    fn emit_mapping_start(&mut self, start: &CollectionStart, event: &Event) -> Result<(), Error> {
        self.define_anchor(start.anchor.as_ref())?;
        self.write_collection_tag(start, "map", event.start)?;
        if self.flow_collection(start.style) || self.check_empty_mapping() {
            self.write_indicator("{", true, true, false)?;
            self.increase_indent(true, false);
            self.flow_level += 1;
            self.state = State::FlowMappingFirstKey;
        } else {
            self.increase_indent(false, false);
            self.state = State::BlockMappingKey;
        }
        Ok(())
    }

    fn flow_collection(&self, style: CollectionStyle) -> bool {
        self.flow_level > 0
            || self.options.canonical
            || style == CollectionStyle::Flow
            || (style == CollectionStyle::Any && self.options.default_flow)
    }

    fn write_collection_tag(
        &mut self,
        start: &CollectionStart,
        core: &str,
        mark: Mark,
    ) -> Result<(), Error> {
        let tag = match &start.tag {
            Some(tag) if self.options.canonical || !start.implicit => Some(tag.clone()),
            None if self.options.canonical => Some(format!("{CORE_SCHEMA_PREFIX}{core}")),
            _ => None,
        };
        match tag {
            Some(tag) => self.write_tag(&tag, mark),
            None => Ok(()),
        }
    }

    fn emit_scalar(&mut self, scalar: &Scalar, mark: Mark) -> Result<(), Error> {
        let analysis = analyze(&scalar.value, self.options.unicode);
        let mut tag = match &scalar.tag {
            Some(tag)
                if self.options.canonical
                    || (!scalar.plain_implicit && !scalar.quoted_implicit)
                    || tag == "!" =>
            {
                Some(tag.clone())
            }
            None if self.options.canonical => Some(format!("{CORE_SCHEMA_PREFIX}str")),
            _ => None,
        };
        let style = self.select_style(scalar, &analysis, tag.is_none(), mark)?;
        if tag.is_none() && !scalar.quoted_implicit && style != ScalarStyle::Plain {
            // Keep a plain-only scalar from being read back with a different tag.
            tag = Some("!".to_owned());
        }

        self.define_anchor(scalar.anchor.as_ref())?;
        if let Some(tag) = &tag {
            self.write_tag(tag, mark)?;
        }
        self.increase_indent(true, false);
        let allow_breaks = !self.simple_key_context;
        match style {
            ScalarStyle::Plain | ScalarStyle::Any => self.write_plain(&scalar.value, allow_breaks)?,
            ScalarStyle::SingleQuoted => self.write_single_quoted(&scalar.value, allow_breaks)?,
            ScalarStyle::DoubleQuoted => self.write_double_quoted(&scalar.value, allow_breaks)?,
            ScalarStyle::Literal => self.write_literal(&scalar.value)?,
            ScalarStyle::Folded => self.write_folded(&scalar.value)?,
        }
        self.pop_indent();
        self.pop_state();
        Ok(())
    }

    fn select_style(
        &self,
        scalar: &Scalar,
        analysis: &ScalarAnalysis,
        no_tag: bool,
        mark: Mark,
    ) -> Result<ScalarStyle, Error> {
        if no_tag && !scalar.plain_implicit && !scalar.quoted_implicit && !self.options.canonical
        {
            return Err(Error::emit(
                "scalar has neither a tag nor an implicit flag",
                mark,
            ));
        }
        let requested = scalar.style;
        let mut style = requested;
        if style == ScalarStyle::Any {
            style = if analysis.multiline
                && analysis.block_allowed
                && self.flow_level == 0
                && !self.simple_key_context
            {
                ScalarStyle::Literal
            } else {
                ScalarStyle::Plain
            };
        }
        if self.options.canonical {
            style = ScalarStyle::DoubleQuoted;
        }
        if self.simple_key_context && analysis.multiline {
            style = ScalarStyle::DoubleQuoted;
        }

        if style == ScalarStyle::Plain {
            let allowed = if self.flow_level > 0 {
                analysis.flow_plain_allowed
            } else {
                analysis.block_plain_allowed
            };
            if !allowed
                || (scalar.value.is_empty() && (self.flow_level > 0 || self.simple_key_context))
                || (no_tag && !scalar.plain_implicit)
                || (requested == ScalarStyle::Any && no_tag && is_ambiguous(&scalar.value))
            {
                style = ScalarStyle::SingleQuoted;
            }
        }
        if style == ScalarStyle::SingleQuoted && !analysis.single_quoted_allowed {
            style = ScalarStyle::DoubleQuoted;
        }
        if style.is_block()
            && (!analysis.block_allowed || self.flow_level > 0 || self.simple_key_context)
        {
            style = ScalarStyle::DoubleQuoted;
        }
        Ok(style)
    }

    fn check_empty_sequence(&self) -> bool {
        matches!(self.next_event(), Some(e) if e.kind == EventKind::SequenceEnd)
    }

    fn check_empty_mapping(&self) -> bool {
        matches!(self.next_event(), Some(e) if e.kind == EventKind::MappingEnd)
    }

    /// Whether `event` can be written as an implicit key: short, single line, and either a
    /// scalar, an alias or an empty collection.
    fn check_simple_key(&self, event: &Event) -> bool {
        let anchor_len = event.anchor().map_or(0, |a| a.as_str().len());
        let tag_len = event.tag().map_or(0, str::len);
        let length = match &event.kind {
            EventKind::Alias(name) => name.as_str().len(),
            EventKind::Scalar(scalar) => {
                if scalar.value.contains(is_break) {
                    return false;
                }
                anchor_len + tag_len + scalar.value.len()
            }
            EventKind::SequenceStart(_) => {
                if !self.check_empty_sequence() {
                    return false;
                }
                anchor_len + tag_len
            }
            EventKind::MappingStart(_) => {
                if !self.check_empty_mapping() {
                    return false;
                }
                anchor_len + tag_len
            }
            _ => return false,
        };
        length <= MAX_SIMPLE_KEY_LENGTH
    }

    // -------- comments --------

    fn comment(&mut self, event: Event) -> Result<(), Error> {
        match self.state {
            State::StreamStart | State::BlockMappingSimpleValue | State::BlockMappingValue => {
                self.deferred.push(event);
                return Ok(());
            }
            State::End => {
                return Err(Error::emit("comment after the end of the stream", event.start));
            }
            _ if self.flow_level > 0 => return Ok(()),
            _ => {}
        }
        let EventKind::Comment { value, inline } = &event.kind else {
            return Ok(());
        };
        if *inline && self.column > 0 && !self.comment_on_line {
            self.write_inline_comment(value)
        } else {
            self.write_block_comment(value)
        }
    }

    /// Write comments held back between a key and its value once the value has started.
    ///
    /// They were made in block context, so a flow value keeps them until it is closed and
    /// they end up after the closing bracket.
    fn flush_deferred(&mut self) -> Result<(), Error> {
        if self.deferred.is_empty()
            || self.flow_level > 0
            || matches!(
                self.state,
                State::StreamStart | State::BlockMappingSimpleValue | State::BlockMappingValue
            )
        {
            return Ok(());
        }
        for comment in std::mem::take(&mut self.deferred) {
            self.comment(comment)?;
        }
        Ok(())
    }

    /// ` # text` at the end of the current line; line breaks in `text` become spaces.
    fn write_inline_comment(&mut self, text: &str) -> Result<(), Error> {
        if !self.whitespace {
            self.put(' ')?;
        }
        self.put('#')?;
        let joined = text.lines().collect::<Vec<_>>().join(" ");
        if !joined.is_empty() {
            self.put(' ')?;
            self.write_str(&joined)?;
        }
        self.whitespace = false;
        self.indention = false;
        self.comment_on_line = true;
        Ok(())
    }

    /// One `# line` per line of `text`, at the current indentation.
    ///
    /// Right after a `-` or `?` indicator the first line shares the indicator's line.
    fn write_block_comment(&mut self, text: &str) -> Result<(), Error> {
        let indent = self.indent.max(0) as usize;
        let after_indicator = self.indention && self.column > 0 && !self.comment_on_line;
        for (i, line) in split_lines(text).enumerate() {
            if i > 0 || !after_indicator {
                if self.column > 0 || self.comment_on_line {
                    self.put_break()?;
                }
                while self.column < indent {
                    self.put(' ')?;
                }
            } else if !self.whitespace {
                self.put(' ')?;
            }
            self.put('#')?;
            if !line.is_empty() {
                self.put(' ')?;
                self.write_str(line)?;
            }
            self.put_break()?;
        }
        self.whitespace = true;
        self.indention = true;
        Ok(())
    }

    // -------- low-level writers --------

    fn put(&mut self, c: char) -> Result<(), Error> {
        self.out.write_char(c)?;
        self.column += 1;
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<(), Error> {
        self.out.write_str(s)?;
        self.column += s.chars().count();
        Ok(())
    }

    fn put_break(&mut self) -> Result<(), Error> {
        self.out.write_str(self.line_break)?;
        self.column = 0;
        self.comment_on_line = false;
        Ok(())
    }

    /// Write a line break taken from scalar content.
    fn write_break(&mut self, c: char) -> Result<(), Error> {
        if c == '\n' {
            self.put_break()
        } else {
            self.out.write_char(c)?;
            self.column = 0;
            self.comment_on_line = false;
            Ok(())
        }
    }

    fn write_indent(&mut self) -> Result<(), Error> {
        let indent = self.indent.max(0) as usize;
        if !self.indention
            || self.column > indent
            || (self.column == indent && !self.whitespace)
            || self.comment_on_line
        {
            self.put_break()?;
        }
        while self.column < indent {
            self.put(' ')?;
        }
        self.whitespace = true;
        self.indention = true;
        Ok(())
    }

    fn write_indicator(
        &mut self,
        indicator: &str,
        need_whitespace: bool,
        is_whitespace: bool,
        is_indention: bool,
    ) -> Result<(), Error> {
        if need_whitespace && !self.whitespace {
            self.put(' ')?;
        }
        self.write_str(indicator)?;
        self.whitespace = is_whitespace;
        self.indention = self.indention && is_indention;
        self.open_ended = 0;
        Ok(())
    }

    fn write_anchor(&mut self, alias: bool, name: &str) -> Result<(), Error> {
        self.write_indicator(if alias { "*" } else { "&" }, true, false, false)?;
        self.write_str(name)?;
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    fn write_tag(&mut self, tag: &str, mark: Mark) -> Result<(), Error> {
        if tag.is_empty() {
            return Err(Error::emit("tag value must not be empty", mark));
        }
        let parts = self.split_tag(tag);
        match parts.handle {
            Some(handle) => {
                self.write_tag_handle(&handle)?;
                if !parts.suffix.is_empty() {
                    self.write_tag_content(&parts.suffix, false)?;
                }
            }
            None => {
                self.write_indicator("!<", true, false, false)?;
                self.write_tag_content(&parts.suffix, false)?;
                self.write_indicator(">", false, false, false)?;
            }
        }
        Ok(())
    }

    /// Shorten `tag` with the longest matching `%TAG` prefix in effect.
    fn split_tag(&self, tag: &str) -> TagParts {
        if tag == "!" {
            return TagParts {
                handle: Some("!".to_owned()),
                suffix: String::new(),
            };
        }
        self.tag_directives
            .iter()
            .filter(|d| tag.len() > d.prefix.len() && tag.starts_with(&d.prefix))
            .max_by_key(|d| d.prefix.len())
            .map(|d| TagParts {
                handle: Some(d.handle.clone()),
                suffix: tag[d.prefix.len()..].to_owned(),
            })
            .unwrap_or_else(|| TagParts {
                handle: None,
                suffix: tag.to_owned(),
            })
    }

    fn write_tag_handle(&mut self, handle: &str) -> Result<(), Error> {
        if !self.whitespace {
            self.put(' ')?;
        }
        self.write_str(handle)?;
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    /// URI characters as they are, anything else `%`-escaped byte by byte.
    fn write_tag_content(&mut self, value: &str, need_whitespace: bool) -> Result<(), Error> {
        if need_whitespace && !self.whitespace {
            self.put(' ')?;
        }
        for c in value.chars() {
            if is_alpha(c)
                || matches!(
                    c,
                    ';' | '/' | '?' | ':' | '@' | '&' | '=' | '+' | '$' | ',' | '.' | '~' | '*'
                        | '\'' | '(' | ')' | '!' | '[' | ']'
                )
            {
                self.put(c)?;
            } else {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    self.write_str(&format!("%{byte:02X}"))?;
                }
            }
        }
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    fn write_plain(&mut self, value: &str, allow_breaks: bool) -> Result<(), Error> {
        if !self.whitespace && (!value.is_empty() || self.flow_level > 0) {
            self.put(' ')?;
        }
        let chars: Vec<char> = value.chars().collect();
        let mut spaces = false;
        for (i, &c) in chars.iter().enumerate() {
            if c == ' ' {
                if allow_breaks
                    && !spaces
                    && self.column > self.best_width
                    && chars.get(i + 1) != Some(&' ')
                {
                    self.write_indent()?;
                } else {
                    self.put(c)?;
                }
                spaces = true;
            } else {
                self.put(c)?;
                self.indention = false;
                spaces = false;
            }
        }
        self.whitespace = false;
        self.indention = false;
        if self.root_context {
            self.open_ended = 1;
        }
        Ok(())
    }

    fn write_single_quoted(&mut self, value: &str, allow_breaks: bool) -> Result<(), Error> {
        self.write_indicator("'", true, false, false)?;
        let chars: Vec<char> = value.chars().collect();
        let last = chars.len().saturating_sub(1);
        let mut spaces = false;
        let mut breaks = false;
        for (i, &c) in chars.iter().enumerate() {
            if c == ' ' {
                if allow_breaks
                    && !spaces
                    && self.column > self.best_width
                    && i != 0
                    && i != last
                    && chars.get(i + 1) != Some(&' ')
                {
                    self.write_indent()?;
                } else {
                    self.put(c)?;
                }
                spaces = true;
            } else if is_break(c) {
                if !breaks && c == '\n' {
                    self.put_break()?;
                }
                self.write_break(c)?;
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent()?;
                }
                if c == '\'' {
                    self.write_str("''")?;
                } else {
                    self.put(c)?;
                }
                self.indention = false;
                spaces = false;
                breaks = false;
            }
        }
        if breaks {
            self.write_indent()?;
        }
        self.write_indicator("'", false, false, false)?;
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    fn write_double_quoted(&mut self, value: &str, allow_breaks: bool) -> Result<(), Error> {
        self.write_indicator("\"", true, false, false)?;
        let chars: Vec<char> = value.chars().collect();
        let last = chars.len().saturating_sub(1);
        let mut spaces = false;
        for (i, &c) in chars.iter().enumerate() {
            if !is_printable(c)
                || (!self.options.unicode && !c.is_ascii())
                || matches!(c, '\u{FEFF}' | '"' | '\\' | '\t')
                || is_break(c)
            {
                self.write_escape(c)?;
                spaces = false;
            } else if c == ' ' {
                if allow_breaks && !spaces && self.column > self.best_width && i != 0 && i != last
                {
                    self.write_indent()?;
                    if chars.get(i + 1) == Some(&' ') {
                        self.put('\\')?;
                    }
                } else {
                    self.put(c)?;
                }
                spaces = true;
            } else {
                self.put(c)?;
                spaces = false;
            }
        }
        self.write_indicator("\"", false, false, false)?;
        self.whitespace = false;
        self.indention = false;
        Ok(())
    }

    fn write_escape(&mut self, c: char) -> Result<(), Error> {
        let named = match c {
            '\0' => Some('0'),
            '\u{7}' => Some('a'),
            '\u{8}' => Some('b'),
            '\t' => Some('t'),
            '\n' => Some('n'),
            '\u{b}' => Some('v'),
            '\u{c}' => Some('f'),
            '\r' => Some('r'),
            '\u{1b}' => Some('e'),
            '"' => Some('"'),
            '\\' => Some('\\'),
            '\u{85}' => Some('N'),
            '\u{a0}' => Some('_'),
            '\u{2028}' => Some('L'),
            '\u{2029}' => Some('P'),
            _ => None,
        };
        match named {
            Some(n) => {
                self.put('\\')?;
                self.put(n)?;
            }
            None => {
                let code = c as u32;
                let escaped = if code <= 0xFF {
                    format!("\\x{code:02X}")
                } else if code <= 0xFFFF {
                    format!("\\u{code:04X}")
                } else {
                    format!("\\U{code:08X}")
                };
                self.write_str(&escaped)?;
            }
        }
        Ok(())
    }

    /// Indentation indicator when the content starts with a space or break, chomping
    /// indicator from the trailing breaks.
    fn write_block_scalar_hints(&mut self, value: &str) -> Result<(), Error> {
        let mut hints = String::new();
        if value.starts_with(|c: char| c == ' ' || is_break(c)) {
            hints.push_str(&self.options.indent_step.to_string());
        }
        self.open_ended = 0;
        let mut tail = value.chars().rev();
        match (tail.next(), tail.next()) {
            (None, _) => hints.push('-'),
            (Some(last), _) if !is_break(last) => hints.push('-'),
            (Some(_), None) => {
                hints.push('+');
                self.open_ended = 2;
            }
            (Some(_), Some(prev)) if is_break(prev) => {
                hints.push('+');
                self.open_ended = 2;
            }
            _ => {}
        }
        if !hints.is_empty() {
            let open_ended = self.open_ended;
            self.write_indicator(&hints, false, false, false)?;
            self.open_ended = open_ended;
        }
        Ok(())
    }

    fn write_literal(&mut self, value: &str) -> Result<(), Error> {
        self.write_indicator("|", true, false, false)?;
        self.write_block_scalar_hints(value)?;
        self.put_break()?;
        self.indention = true;
        self.whitespace = true;
        let mut breaks = true;
        for c in value.chars() {
            if is_break(c) {
                self.write_break(c)?;
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent()?;
                }
                self.put(c)?;
                self.indention = false;
                breaks = false;
            }
        }
        Ok(())
    }

    fn write_folded(&mut self, value: &str) -> Result<(), Error> {
        self.write_indicator(">", true, false, false)?;
        self.write_block_scalar_hints(value)?;
        self.put_break()?;
        self.indention = true;
        self.whitespace = true;
        let chars: Vec<char> = value.chars().collect();
        let mut breaks = true;
        let mut leading_spaces = true;
        for (i, &c) in chars.iter().enumerate() {
            if is_break(c) {
                if !breaks && !leading_spaces && c == '\n' {
                    let mut k = i;
                    while k < chars.len() && is_break(chars[k]) {
                        k += 1;
                    }
                    if !is_blankz(chars.get(k).copied().unwrap_or('\0')) {
                        self.put_break()?;
                    }
                }
                self.write_break(c)?;
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent()?;
                    leading_spaces = c == ' ' || c == '\t';
                }
                if !breaks
                    && c == ' '
                    && chars.get(i + 1) != Some(&' ')
                    && self.column > self.best_width
                {
                    self.write_indent()?;
                } else {
                    self.put(c)?;
                }
                self.indention = false;
                breaks = false;
            }
        }
        Ok(())
    }
}

fn unexpected_event(expected: &str, event: &Event) -> Error {
    Error::emit(
        format!("expected {expected}, found {}", event.describe()),
        event.start,
    )
}

fn check_tag_directive(tag: &TagDirective, mark: Mark) -> Result<(), Error> {
    let handle = tag.handle.as_str();
    let well_formed = handle == "!"
        || (handle.len() >= 2
            && handle.starts_with('!')
            && handle.ends_with('!')
            && handle[1..handle.len() - 1].chars().all(is_alpha));
    if !well_formed {
        return Err(Error::emit(format!("invalid tag handle `{handle}`"), mark));
    }
    if tag.prefix.is_empty() {
        return Err(Error::emit("tag prefix must not be empty", mark));
    }
    Ok(())
}

/// Split comment text on `\r\n`, `\n` or `\r`.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).flat_map(|l| l.split('\r'))
}
