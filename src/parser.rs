//! The parser: [`Token`]s in, [`Event`]s out.
//!
//! A pull-based state machine in the libyaml tradition. The current state says what kind of
//! token may come next; a stack of return states mirrors the open collections. Comment tokens
//! never reach the state machine: they are turned into `Comment` events on the spot and queued
//! ahead of the event being produced.

use std::collections::VecDeque;
use std::io::Read;

use smallvec::SmallVec;

use crate::anchors::{AnchorState, AnchorTable};
use crate::budget::BudgetEnforcer;
use crate::event::{CollectionStart, EventKind, Scalar, TagDirective, VersionDirective};
use crate::input::{decoded_reader, CharInput, DecodedReader};
use crate::{
    AnchorName, CollectionStyle, Error, Event, Mark, ParserOptions, ScalarStyle,
    Scanner, Token, TokenKind,
};

const CORE_SCHEMA_PREFIX: &str = "tag:yaml.org,2002:";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    StreamStart,
    ImplicitDocumentStart,
    DocumentStart,
    DocumentContent,
    DocumentEnd,
    BlockNode,
    BlockSequenceFirstEntry,
    BlockSequenceEntry,
    IndentlessSequenceEntry,
    BlockMappingFirstKey,
    BlockMappingKey,
    BlockMappingValue,
    FlowSequenceFirstEntry,
    FlowSequenceEntry,
    FlowSequenceEntryMappingKey,
    FlowSequenceEntryMappingValue,
    FlowSequenceEntryMappingEnd,
    FlowMappingFirstKey,
    FlowMappingKey,
    FlowMappingValue,
    FlowMappingEmptyValue,
    End,
}

/// Node properties collected before the node content.
#[derive(Default)]
struct Properties {
    anchor: Option<AnchorName>,
    tag: Option<String>,
    start: Option<Mark>,
}

/// Event parser over any [`CharInput`].
///
/// ```rust
/// use yaml_events::{EventKind, Parser};
///
/// let mut parser = Parser::new("- a\n- b\n".chars());
/// let mut scalars = Vec::new();
/// while let Some(event) = parser.next_event().unwrap() {
///     if let EventKind::Scalar(s) = event.kind {
///         scalars.push(s.value);
///     }
/// }
/// assert_eq!(scalars, ["a", "b"]);
/// ```
pub struct Parser<I> {
    scanner: Scanner<I>,
    state: State,
    states: SmallVec<[State; 16]>,
    /// Current token, not yet consumed.
    token: Option<Token>,
    /// Events ready to hand out: queued comments, then the event that followed them.
    queue: VecDeque<Event>,
    peeked: Option<Event>,
    anchors: AnchorTable,
    /// `%TAG` directives of the current document.
    tag_directives: Vec<TagDirective>,
    budget: Option<BudgetEnforcer>,
    done: bool,
}

impl<I: CharInput> Parser<I> {
    /// Parser with default options: comments on, default budget.
    pub fn new(input: I) -> Self {
        Self::with_options(input, ParserOptions::default())
    }

    pub fn with_options(input: I, options: ParserOptions) -> Self {
        Self {
            scanner: Scanner::new(input).with_comments(options.with_comments),
            state: State::StreamStart,
            states: SmallVec::new(),
            token: None,
            queue: VecDeque::new(),
            peeked: None,
            anchors: AnchorTable::default(),
            tag_directives: Vec::new(),
            budget: options.budget.map(BudgetEnforcer::new),
            done: false,
        }
    }

    /// Next event, `Ok(None)` once `StreamEnd` has been returned or after an error.
    pub fn next_event(&mut self) -> Result<Option<Event>, Error> {
        match self.peeked.take() {
            Some(event) => Ok(Some(event)),
            None => self.produce(),
        }
    }

    /// Look at the next event without consuming it.
    pub fn peek(&mut self) -> Result<Option<&Event>, Error> {
        if self.peeked.is_none() {
            self.peeked = self.produce()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn produce(&mut self) -> Result<Option<Event>, Error> {
        if self.done {
            return Ok(None);
        }
        if self.queue.is_empty() {
            if self.state == State::End {
                self.done = true;
                return Ok(None);
            }
            match self.state_machine() {
                Ok(event) => self.queue.push_back(event),
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }
        match self.queue.pop_front() {
            Some(event) => self.deliver(event).map(Some),
            None => Ok(None),
        }
    }

    fn deliver(&mut self, event: Event) -> Result<Event, Error> {
        if let Some(enforcer) = &mut self.budget {
            let mut checked = enforcer.observe(&event);
            if checked.is_ok() && event.kind == EventKind::StreamEnd {
                checked = enforcer.check_ratio();
            }
            if let Err(breach) = checked {
                self.done = true;
                return Err(Error::Budget {
                    breach,
                    mark: event.start,
                });
            }
        }
        if event.kind == EventKind::StreamEnd {
            self.done = true;
        }
        Ok(event)
    }

    /// Current token, turning any comments in front of it into queued events.
    fn peek_token(&mut self) -> Result<&Token, Error> {
        loop {
            if self.token.is_none() {
                self.token = self.scanner.next_token()?;
            }
            match self.token.take() {
                Some(Token {
                    kind: TokenKind::Comment { text, inline },
                    start,
                    end,
                }) => {
                    self.queue.push_back(Event::new(
                        EventKind::Comment {
                            value: text,
                            inline,
                        },
                        start,
                        end,
                    ));
                }
                Some(token) => {
                    self.token = Some(token);
                    break;
                }
                None => {
                    return Err(Error::parse(
                        "unexpected end of the token stream",
                        self.scanner.mark(),
                    ));
                }
            }
        }
        self.token
            .as_ref()
            .ok_or_else(|| Error::parse("unexpected end of the token stream", Mark::EMPTY))
    }

    /// Start mark of the current token.
    fn peek_mark(&mut self) -> Result<Mark, Error> {
        Ok(self.peek_token()?.start)
    }

    fn fetch_token(&mut self) -> Result<Token, Error> {
        self.peek_token()?;
        self.token
            .take()
            .ok_or_else(|| Error::parse("unexpected end of the token stream", Mark::EMPTY))
    }

    fn skip(&mut self) {
        self.token = None;
    }

    fn push_state(&mut self, state: State) {
        self.states.push(state);
    }

    fn pop_state(&mut self) {
        self.state = self.states.pop().unwrap_or(State::End);
    }

    fn state_machine(&mut self) -> Result<Event, Error> {
        trace!("parser state {:?}", self.state);
        match self.state {
            State::StreamStart => self.stream_start(),
            State::ImplicitDocumentStart => self.document_start(true),
            State::DocumentStart => self.document_start(false),
            State::DocumentContent => self.document_content(),
            State::DocumentEnd => self.document_end(),
            State::BlockNode => self.parse_node(true, false),
            State::BlockSequenceFirstEntry => self.block_sequence_entry(true),
            State::BlockSequenceEntry => self.block_sequence_entry(false),
            State::IndentlessSequenceEntry => self.indentless_sequence_entry(),
            State::BlockMappingFirstKey => self.block_mapping_key(true),
            State::BlockMappingKey => self.block_mapping_key(false),
            State::BlockMappingValue => self.block_mapping_value(),
            State::FlowSequenceFirstEntry => self.flow_sequence_entry(true),
            State::FlowSequenceEntry => self.flow_sequence_entry(false),
            State::FlowSequenceEntryMappingKey => self.flow_sequence_entry_mapping_key(),
            State::FlowSequenceEntryMappingValue => self.flow_sequence_entry_mapping_value(),
            State::FlowSequenceEntryMappingEnd => self.flow_sequence_entry_mapping_end(),
            State::FlowMappingFirstKey => self.flow_mapping_key(true),
            State::FlowMappingKey => self.flow_mapping_key(false),
            State::FlowMappingValue => self.flow_mapping_value(false),
            State::FlowMappingEmptyValue => self.flow_mapping_value(true),
            State::End => Err(Error::parse(
                "no events after the end of the stream",
                self.scanner.mark(),
            )),
        }
    }

    fn stream_start(&mut self) -> Result<Event, Error> {
        let token = self.peek_token()?;
        let (start, end) = (token.start, token.end);
        if token.kind != TokenKind::StreamStart {
            return Err(Error::unexpected("stream start", token.describe(), start));
        }
        self.skip();
        self.state = State::ImplicitDocumentStart;
        Ok(Event::new(EventKind::StreamStart, start, end))
    }

    fn document_start(&mut self, implicit: bool) -> Result<Event, Error> {
        // Stray `...` markers between documents carry nothing.
        while self.peek_token()?.kind == TokenKind::DocumentEnd {
            self.skip();
        }

        let token = self.peek_token()?;
        let mark = token.start;
        match token.kind {
            TokenKind::StreamEnd => {
                let end = token.end;
                self.skip();
                self.state = State::End;
                Ok(Event::new(EventKind::StreamEnd, mark, end))
            }
            TokenKind::VersionDirective { .. }
            | TokenKind::TagDirective { .. }
            | TokenKind::DocumentStart => self.explicit_document_start(),
            _ if implicit => {
                self.begin_document(Vec::new());
                debug!("implicit document at {}", mark);
                self.push_state(State::DocumentEnd);
                self.state = State::BlockNode;
                Ok(Event::new(
                    EventKind::DocumentStart {
                        version: None,
                        tags: Vec::new(),
                        implicit: true,
                    },
                    mark,
                    mark,
                ))
            }
            _ => self.explicit_document_start(),
        }
    }

    fn explicit_document_start(&mut self) -> Result<Event, Error> {
        let start = self.peek_mark()?;
        let (version, tags) = self.process_directives()?;
        let token = self.peek_token()?;
        if token.kind != TokenKind::DocumentStart {
            return Err(Error::unexpected(
                "document start",
                token.describe(),
                token.start,
            ));
        }
        let end = token.end;
        self.skip();
        debug!("explicit document at {}", start);
        self.push_state(State::DocumentEnd);
        self.state = State::DocumentContent;
        Ok(Event::new(
            EventKind::DocumentStart {
                version,
                tags,
                implicit: false,
            },
            start,
            end,
        ))
    }

    /// Reset per-document state and install the document's `%TAG` directives.
    fn begin_document(&mut self, tags: Vec<TagDirective>) {
        self.anchors.reset();
        self.tag_directives = tags;
    }

    fn process_directives(
        &mut self,
    ) -> Result<(Option<VersionDirective>, Vec<TagDirective>), Error> {
        const CONTEXT: &str = "while parsing directives";
        let mut version = None;
        let mut tags: Vec<TagDirective> = Vec::new();
        loop {
            let token = self.peek_token()?;
            let mark = token.start;
            match &token.kind {
                TokenKind::VersionDirective { major, minor } => {
                    if version.is_some() {
                        return Err(Error::parse_in(
                            CONTEXT,
                            "found duplicate %YAML directive",
                            mark,
                        ));
                    }
                    if *major != 1 {
                        return Err(Error::parse_in(
                            CONTEXT,
                            format!("found incompatible YAML document (version {major}.{minor})"),
                            mark,
                        ));
                    }
                    version = Some(VersionDirective {
                        major: *major,
                        minor: *minor,
                    });
                }
                TokenKind::TagDirective { handle, prefix } => {
                    if tags.iter().any(|t| &t.handle == handle) {
                        return Err(Error::parse_in(
                            CONTEXT,
                            format!("found duplicate %TAG directive for handle `{handle}`"),
                            mark,
                        ));
                    }
                    tags.push(TagDirective {
                        handle: handle.clone(),
                        prefix: prefix.clone(),
                    });
                }
                _ => break,
            }
            self.skip();
        }
        self.begin_document(tags.clone());
        Ok((version, tags))
    }

    fn document_content(&mut self) -> Result<Event, Error> {
        let mark = self.peek_mark()?;
        match self.peek_token()?.kind {
            TokenKind::VersionDirective { .. }
            | TokenKind::TagDirective { .. }
            | TokenKind::DocumentStart
            | TokenKind::DocumentEnd
            | TokenKind::StreamEnd => {
                self.pop_state();
                Ok(empty_scalar(mark))
            }
            _ => self.parse_node(true, false),
        }
    }

    fn document_end(&mut self) -> Result<Event, Error> {
        let token = self.peek_token()?;
        let start = token.start;
        let (end, implicit) = if token.kind == TokenKind::DocumentEnd {
            let end = token.end;
            self.skip();
            (end, false)
        } else {
            (start, true)
        };
        self.tag_directives.clear();
        debug!("document end at {} (implicit: {})", start, implicit);
        // After an explicit `...` the next document may be bare.
        self.state = if implicit {
            State::DocumentStart
        } else {
            State::ImplicitDocumentStart
        };
        Ok(Event::new(EventKind::DocumentEnd { implicit }, start, end))
    }

    fn resolve_tag(&self, handle: &str, suffix: &str, mark: Mark) -> Result<String, Error> {
        if handle.is_empty() {
            return Ok(suffix.to_owned());
        }
        if let Some(directive) = self.tag_directives.iter().find(|d| d.handle == handle) {
            return Ok(format!("{}{}", directive.prefix, suffix));
        }
        match handle {
            "!" => Ok(format!("!{suffix}")),
            "!!" => Ok(format!("{CORE_SCHEMA_PREFIX}{suffix}")),
            _ => Err(Error::parse_in(
                "while parsing a node",
                format!("found undefined tag handle `{handle}`"),
                mark,
            )),
        }
    }

    fn take_anchor(&mut self, props: &mut Properties) -> Result<(), Error> {
        let token = self.fetch_token()?;
        if let TokenKind::Anchor(name) = token.kind {
            props.start.get_or_insert(token.start);
            let redefined = self.anchors.define(&name);
            if redefined {
                trace!("anchor `{}` redefined at {}", name, token.start);
            }
            props.anchor = Some(AnchorName::new(name).map_err(|_| {
                Error::parse_in("while parsing a node", "invalid anchor name", token.start)
            })?);
        }
        Ok(())
    }

    fn take_tag(&mut self, props: &mut Properties) -> Result<(), Error> {
        let token = self.fetch_token()?;
        if let TokenKind::Tag { handle, suffix } = token.kind {
            props.start.get_or_insert(token.start);
            props.tag = Some(self.resolve_tag(&handle, &suffix, token.start)?);
        }
        Ok(())
    }

    fn parse_node(&mut self, block: bool, indentless_sequence: bool) -> Result<Event, Error> {
        if matches!(self.peek_token()?.kind, TokenKind::Alias(_)) {
            self.pop_state();
            let token = self.fetch_token()?;
            let TokenKind::Alias(name) = token.kind else {
                return Err(Error::unexpected("alias", "other token", token.start));
            };
            if self.anchors.state(&name) != AnchorState::Defined {
                return Err(Error::UndefinedAlias {
                    name,
                    mark: token.start,
                });
            }
            let name = AnchorName::new(name).map_err(|_| {
                Error::parse_in("while parsing an alias", "invalid anchor name", token.start)
            })?;
            return Ok(Event::new(EventKind::Alias(name), token.start, token.end));
        }

        let mut props = Properties::default();
        match self.peek_token()?.kind {
            TokenKind::Anchor(_) => {
                self.take_anchor(&mut props)?;
                if matches!(self.peek_token()?.kind, TokenKind::Tag { .. }) {
                    self.take_tag(&mut props)?;
                }
            }
            TokenKind::Tag { .. } => {
                self.take_tag(&mut props)?;
                if matches!(self.peek_token()?.kind, TokenKind::Anchor(_)) {
                    self.take_anchor(&mut props)?;
                }
            }
            _ => {}
        }

        let token = self.peek_token()?;
        let (mark, token_end) = (token.start, token.end);
        let start = props.start.unwrap_or(mark);
        let implicit = props.tag.as_deref().is_none_or(|t| t == "!");
        let collection = |props: Properties, style| CollectionStart {
            anchor: props.anchor,
            tag: props.tag,
            implicit,
            style,
        };

        match token.kind {
            TokenKind::BlockEntry if indentless_sequence => {
                self.state = State::IndentlessSequenceEntry;
                Ok(Event::new(
                    EventKind::SequenceStart(collection(props, CollectionStyle::Block)),
                    start,
                    token_end,
                ))
            }
            TokenKind::Scalar { .. } => {
                self.pop_state();
                let token = self.fetch_token()?;
                let TokenKind::Scalar { value, style } = token.kind else {
                    return Err(Error::unexpected("scalar", "other token", token.start));
                };
                let untagged = props.tag.is_none();
                let plain_implicit =
                    (untagged && style == ScalarStyle::Plain) || props.tag.as_deref() == Some("!");
                let quoted_implicit = untagged && style != ScalarStyle::Plain;
                Ok(Event::new(
                    EventKind::Scalar(Scalar {
                        anchor: props.anchor,
                        tag: props.tag,
                        value,
                        style,
                        plain_implicit,
                        quoted_implicit,
                    }),
                    start,
                    token.end,
                ))
            }
            TokenKind::FlowSequenceStart => {
                self.state = State::FlowSequenceFirstEntry;
                Ok(Event::new(
                    EventKind::SequenceStart(collection(props, CollectionStyle::Flow)),
                    start,
                    token_end,
                ))
            }
            TokenKind::FlowMappingStart => {
                self.state = State::FlowMappingFirstKey;
                Ok(Event::new(
                    EventKind::MappingStart(collection(props, CollectionStyle::Flow)),
                    start,
                    token_end,
                ))
            }
            TokenKind::BlockSequenceStart if block => {
                self.state = State::BlockSequenceFirstEntry;
                Ok(Event::new(
                    EventKind::SequenceStart(collection(props, CollectionStyle::Block)),
                    start,
                    token_end,
                ))
            }
            TokenKind::BlockMappingStart if block => {
                self.state = State::BlockMappingFirstKey;
                Ok(Event::new(
                    EventKind::MappingStart(collection(props, CollectionStyle::Block)),
                    start,
                    token_end,
                ))
            }
            // Properties without content: an empty scalar.
            _ if props.start.is_some() => {
                self.pop_state();
                let plain_implicit = implicit;
                Ok(Event::new(
                    EventKind::Scalar(Scalar {
                        anchor: props.anchor,
                        tag: props.tag,
                        value: String::new(),
                        style: ScalarStyle::Plain,
                        plain_implicit,
                        quoted_implicit: false,
                    }),
                    start,
                    mark,
                ))
            }
            _ => Err(Error::Parse {
                problem: format!("did not find expected node content, found {}", token.describe()),
                context: Some(if block {
                    "while parsing a block node"
                } else {
                    "while parsing a flow node"
                }),
                mark,
            }),
        }
    }

    fn block_sequence_entry(&mut self, first: bool) -> Result<Event, Error> {
        if first {
            // BlockSequenceStart
            self.peek_token()?;
            self.skip();
        }
        let token = self.peek_token()?;
        let (mark, end) = (token.start, token.end);
        match token.kind {
            TokenKind::BlockEnd => {
                self.skip();
                self.pop_state();
                Ok(Event::new(EventKind::SequenceEnd, mark, end))
            }
            TokenKind::BlockEntry => {
                self.skip();
                let mark = self.peek_mark()?;
                match self.peek_token()?.kind {
                    TokenKind::BlockEntry | TokenKind::BlockEnd => {
                        self.state = State::BlockSequenceEntry;
                        Ok(empty_scalar(mark))
                    }
                    _ => {
                        self.push_state(State::BlockSequenceEntry);
                        self.parse_node(true, false)
                    }
                }
            }
            _ => Err(Error::parse_in(
                "while parsing a block collection",
                format!("did not find expected '-' indicator, found {}", token.describe()),
                mark,
            )),
        }
    }

    fn indentless_sequence_entry(&mut self) -> Result<Event, Error> {
        let mark = self.peek_mark()?;
        if self.peek_token()?.kind != TokenKind::BlockEntry {
            self.pop_state();
            return Ok(Event::new(EventKind::SequenceEnd, mark, mark));
        }
        self.skip();
        let mark = self.peek_mark()?;
        match self.peek_token()?.kind {
            TokenKind::BlockEntry | TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd => {
                self.state = State::IndentlessSequenceEntry;
                Ok(empty_scalar(mark))
            }
            _ => {
                self.push_state(State::IndentlessSequenceEntry);
                self.parse_node(true, false)
            }
        }
    }

    fn block_mapping_key(&mut self, first: bool) -> Result<Event, Error> {
        if first {
            // BlockMappingStart
            self.peek_token()?;
            self.skip();
        }
        let token = self.peek_token()?;
        let (mark, end) = (token.start, token.end);
        match token.kind {
            TokenKind::Key => {
                self.skip();
                let mark = self.peek_mark()?;
                match self.peek_token()?.kind {
                    TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd => {
                        self.state = State::BlockMappingValue;
                        Ok(empty_scalar(mark))
                    }
                    _ => {
                        self.push_state(State::BlockMappingValue);
                        self.parse_node(true, true)
                    }
                }
            }
            // A value without a key: the key is empty.
            TokenKind::Value => {
                self.state = State::BlockMappingValue;
                Ok(empty_scalar(mark))
            }
            TokenKind::BlockEnd => {
                self.skip();
                self.pop_state();
                Ok(Event::new(EventKind::MappingEnd, mark, end))
            }
            _ => Err(Error::parse_in(
                "while parsing a block mapping",
                format!("did not find expected key, found {}", token.describe()),
                mark,
            )),
        }
    }

    fn block_mapping_value(&mut self) -> Result<Event, Error> {
        let mark = self.peek_mark()?;
        if self.peek_token()?.kind != TokenKind::Value {
            self.state = State::BlockMappingKey;
            return Ok(empty_scalar(mark));
        }
        self.skip();
        let mark = self.peek_mark()?;
        match self.peek_token()?.kind {
            TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd => {
                self.state = State::BlockMappingKey;
                Ok(empty_scalar(mark))
            }
            _ => {
                self.push_state(State::BlockMappingKey);
                self.parse_node(true, true)
            }
        }
    }

    fn flow_sequence_entry(&mut self, first: bool) -> Result<Event, Error> {
        if first {
            // FlowSequenceStart
            self.peek_token()?;
            self.skip();
        }
        let token = self.peek_token()?;
        let (mark, end) = (token.start, token.end);
        match token.kind {
            TokenKind::FlowSequenceEnd => {
                self.skip();
                self.pop_state();
                return Ok(Event::new(EventKind::SequenceEnd, mark, end));
            }
            TokenKind::FlowEntry if !first => self.skip(),
            _ if !first => {
                return Err(Error::parse_in(
                    "while parsing a flow sequence",
                    format!("did not find expected ',' or ']', found {}", token.describe()),
                    mark,
                ));
            }
            _ => {}
        }

        let token = self.peek_token()?;
        let (mark, end) = (token.start, token.end);
        match token.kind {
            TokenKind::FlowSequenceEnd => {
                self.skip();
                self.pop_state();
                Ok(Event::new(EventKind::SequenceEnd, mark, end))
            }
            TokenKind::Key => {
                // `[a: b]` is a sequence holding a single-pair mapping.
                self.skip();
                self.state = State::FlowSequenceEntryMappingKey;
                Ok(Event::new(
                    EventKind::MappingStart(CollectionStart {
                        implicit: true,
                        style: CollectionStyle::Flow,
                        ..CollectionStart::default()
                    }),
                    mark,
                    end,
                ))
            }
            _ => {
                self.push_state(State::FlowSequenceEntry);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_sequence_entry_mapping_key(&mut self) -> Result<Event, Error> {
        let mark = self.peek_mark()?;
        match self.peek_token()?.kind {
            TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowSequenceEnd => {
                self.state = State::FlowSequenceEntryMappingValue;
                Ok(empty_scalar(mark))
            }
            _ => {
                self.push_state(State::FlowSequenceEntryMappingValue);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_sequence_entry_mapping_value(&mut self) -> Result<Event, Error> {
        let mark = self.peek_mark()?;
        if self.peek_token()?.kind != TokenKind::Value {
            self.state = State::FlowSequenceEntryMappingEnd;
            return Ok(empty_scalar(mark));
        }
        self.skip();
        let mark = self.peek_mark()?;
        match self.peek_token()?.kind {
            TokenKind::FlowEntry | TokenKind::FlowSequenceEnd => {
                self.state = State::FlowSequenceEntryMappingEnd;
                Ok(empty_scalar(mark))
            }
            _ => {
                self.push_state(State::FlowSequenceEntryMappingEnd);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_sequence_entry_mapping_end(&mut self) -> Result<Event, Error> {
        let mark = self.peek_mark()?;
        self.state = State::FlowSequenceEntry;
        Ok(Event::new(EventKind::MappingEnd, mark, mark))
    }

    fn flow_mapping_key(&mut self, first: bool) -> Result<Event, Error> {
        if first {
            // FlowMappingStart
            self.peek_token()?;
            self.skip();
        }
        let token = self.peek_token()?;
        let (mark, end) = (token.start, token.end);
        if token.kind == TokenKind::FlowMappingEnd {
            self.skip();
            self.pop_state();
            return Ok(Event::new(EventKind::MappingEnd, mark, end));
        }
        if !first {
            if token.kind != TokenKind::FlowEntry {
                return Err(Error::parse_in(
                    "while parsing a flow mapping",
                    format!("did not find expected ',' or '}}', found {}", token.describe()),
                    mark,
                ));
            }
            self.skip();
        }

        let token = self.peek_token()?;
        let (mark, end) = (token.start, token.end);
        match token.kind {
            TokenKind::Key => {
                self.skip();
                let mark = self.peek_mark()?;
                match self.peek_token()?.kind {
                    TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowMappingEnd => {
                        self.state = State::FlowMappingValue;
                        Ok(empty_scalar(mark))
                    }
                    _ => {
                        self.push_state(State::FlowMappingValue);
                        self.parse_node(false, false)
                    }
                }
            }
            TokenKind::Value => {
                self.state = State::FlowMappingValue;
                Ok(empty_scalar(mark))
            }
            TokenKind::FlowMappingEnd => {
                self.skip();
                self.pop_state();
                Ok(Event::new(EventKind::MappingEnd, mark, end))
            }
            _ => {
                self.push_state(State::FlowMappingEmptyValue);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_mapping_value(&mut self, empty: bool) -> Result<Event, Error> {
        let mark = self.peek_mark()?;
        self.state = State::FlowMappingKey;
        if empty || self.peek_token()?.kind != TokenKind::Value {
            return Ok(empty_scalar(mark));
        }
        self.skip();
        let mark = self.peek_mark()?;
        match self.peek_token()?.kind {
            TokenKind::FlowEntry | TokenKind::FlowMappingEnd => Ok(empty_scalar(mark)),
            _ => {
                self.push_state(State::FlowMappingKey);
                self.parse_node(false, false)
            }
        }
    }
}

impl<'a> Parser<DecodedReader<'a>> {
    /// Parser over a byte source. The encoding is sniffed from the BOM (UTF-8 by default).
    pub fn from_reader<R: Read + 'a>(reader: R) -> Self {
        Self::from_reader_with_options(reader, ParserOptions::default())
    }

    /// Like [`from_reader`](Parser::from_reader), honouring `options.max_input_bytes`.
    pub fn from_reader_with_options<R: Read + 'a>(reader: R, options: ParserOptions) -> Self {
        let input = decoded_reader(reader, options.max_input_bytes);
        Self::with_options(input, options)
    }
}

impl<I: CharInput> Iterator for Parser<I> {
    type Item = Result<Event, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

fn empty_scalar(mark: Mark) -> Event {
    Event::new(
        EventKind::Scalar(Scalar {
            value: String::new(),
            style: ScalarStyle::Plain,
            plain_implicit: true,
            ..Scalar::default()
        }),
        mark,
        mark,
    )
}
