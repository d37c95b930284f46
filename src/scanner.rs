//! The lexical scanner: characters in, [`Token`]s out.
//!
//! The scanner is lazy. Tokens are produced on demand, but a few may be held back while a
//! potential simple key is unresolved: a plain `key` only becomes `Key, Scalar` once the
//! following `:` is seen, and a `BlockMappingStart` may have to be inserted in front of it.

use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::chars::{
    as_hex, is_alpha, is_blank, is_blankz, is_break, is_breakz, is_digit, is_flow, is_printable,
    is_uri_char, is_z,
};
use crate::input::CharInput;
use crate::{Error, Mark, ScalarStyle, Token, TokenKind};

/// Longest simple key, in characters.
const MAX_SIMPLE_KEY_LENGTH: usize = 1024;

#[derive(Clone, Copy, Debug, Default)]
struct SimpleKey {
    possible: bool,
    required: bool,
    token_number: usize,
    mark: Mark,
}

/// Tokenizer over any [`CharInput`].
///
/// ```rust
/// use yaml_events::{Scanner, TokenKind};
///
/// let kinds: Vec<TokenKind> = Scanner::new("a: 1".chars())
///     .map(|t| t.map(|t| t.kind))
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(kinds[1], TokenKind::BlockMappingStart);
/// assert_eq!(kinds[2], TokenKind::Key);
/// ```
pub struct Scanner<I> {
    input: I,
    /// Lookahead; `'\0'` stands for end of input or for a rejected character.
    buffer: VecDeque<char>,
    /// No more characters are read once the input ended or yielded a rejected character.
    exhausted: bool,
    rejected: Option<char>,
    index: usize,
    /// 1-based.
    line: usize,
    /// 0-based, so it can be compared with indentation columns directly.
    col: usize,

    tokens: VecDeque<Token>,
    tokens_parsed: usize,
    token_available: bool,
    stream_start_produced: bool,
    stream_end_fetched: bool,
    done: bool,

    simple_key_allowed: bool,
    simple_keys: SmallVec<[SimpleKey; 8]>,
    indent: isize,
    indents: SmallVec<[isize; 8]>,
    flow_level: usize,
    /// Index right after a JSON-like node (quoted scalar, flow collection end), where `:` may
    /// act as a value indicator even when not followed by a blank.
    adjacent_value_allowed_at: usize,

    with_comments: bool,
    /// Line on which the last non-comment token ended, for the inline flag of comments.
    content_line: usize,
}

impl<I: CharInput> Scanner<I> {
    /// Scanner producing comment tokens.
    pub fn new(input: I) -> Self {
        Self {
            input,
            buffer: VecDeque::with_capacity(16),
            exhausted: false,
            rejected: None,
            index: 0,
            line: 1,
            col: 0,
            tokens: VecDeque::with_capacity(16),
            tokens_parsed: 0,
            token_available: false,
            stream_start_produced: false,
            stream_end_fetched: false,
            done: false,
            simple_key_allowed: false,
            simple_keys: SmallVec::new(),
            indent: -1,
            indents: SmallVec::new(),
            flow_level: 0,
            adjacent_value_allowed_at: 0,
            with_comments: true,
            content_line: 0,
        }
    }

    /// Enable or disable `Comment` tokens. Comments are always skipped correctly either way.
    pub fn with_comments(mut self, enabled: bool) -> Self {
        self.with_comments = enabled;
        self
    }

    /// Current position of the scanner.
    #[inline]
    pub fn mark(&self) -> Mark {
        Mark::new(self.index, self.line, self.col + 1)
    }

    /// Next token, `Ok(None)` once `StreamEnd` has been returned.
    pub fn next_token(&mut self) -> Result<Option<Token>, Error> {
        if self.done {
            return Ok(None);
        }
        if !self.token_available {
            if let Err(e) = self.fetch_more_tokens() {
                self.done = true;
                return Err(e);
            }
        }
        let Some(token) = self.tokens.pop_front() else {
            self.done = true;
            return Ok(None);
        };
        self.token_available = false;
        self.tokens_parsed += 1;
        if token.kind == TokenKind::StreamEnd {
            self.done = true;
        }
        trace!("token {:?} at {}", token.kind, token.start);
        Ok(Some(token))
    }

    // ---- character level -------------------------------------------------------------

    fn lookahead(&mut self, count: usize) {
        while self.buffer.len() < count {
            let next = if self.exhausted {
                None
            } else {
                self.input.next_char()
            };
            let c = match next {
                Some(c) if is_printable(c) || c == '\u{FEFF}' => c,
                Some(c) => {
                    self.rejected = Some(c);
                    self.exhausted = true;
                    '\0'
                }
                None => {
                    self.exhausted = true;
                    '\0'
                }
            };
            self.buffer.push_back(c);
        }
    }

    /// Why the `'\0'` sentinel was reached, unless it is the plain end of input.
    fn input_failure(&mut self) -> Option<Error> {
        if let Some(cause) = self.input.take_error() {
            return Some(Error::Io { cause });
        }
        self.rejected.take().map(|c| {
            Error::scan(
                "while reading the input",
                format!("found character {c:?} that is not allowed in a YAML stream"),
                self.mark(),
            )
        })
    }

    #[inline]
    fn peek(&mut self, n: usize) -> char {
        self.lookahead(n + 1);
        self.buffer.get(n).copied().unwrap_or('\0')
    }

    #[inline]
    fn ch(&mut self) -> char {
        self.peek(0)
    }

    /// Consume one character, keeping line and column current.
    fn skip(&mut self) {
        self.lookahead(2);
        let c = self.buffer.pop_front().unwrap_or('\0');
        self.index += 1;
        let line_ends = match c {
            '\r' => self.buffer.front() != Some(&'\n'),
            c => is_break(c),
        };
        if line_ends {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
    }

    fn skip_break(&mut self) {
        if self.ch() == '\r' && self.peek(1) == '\n' {
            self.skip();
        }
        self.skip();
    }

    /// Consume a line break, normalizing `\r\n`, `\r` and NEL to `\n`.
    fn read_break(&mut self, s: &mut String) {
        match self.ch() {
            '\r' | '\n' | '\u{85}' => s.push('\n'),
            c => s.push(c),
        }
        self.skip_break();
    }

    fn is_document_indicator(&mut self, c: char) -> bool {
        self.col == 0
            && self.peek(0) == c
            && self.peek(1) == c
            && self.peek(2) == c
            && is_blankz(self.peek(3))
    }

    fn at_end(&mut self) -> bool {
        is_z(self.ch())
    }

    // ---- token queue -----------------------------------------------------------------

    fn push_token(&mut self, token: Token) {
        if !matches!(token.kind, TokenKind::Comment { .. } | TokenKind::StreamStart) {
            self.content_line = token.end.line;
        }
        self.tokens.push_back(token);
    }

    fn insert_token(&mut self, pos: usize, token: Token) {
        let pos = pos.min(self.tokens.len());
        self.tokens.insert(pos, token);
    }

    fn fetch_more_tokens(&mut self) -> Result<(), Error> {
        loop {
            let need_more = if self.tokens.is_empty() {
                true
            } else {
                self.stale_simple_keys()?;
                self.simple_keys
                    .iter()
                    .any(|sk| sk.possible && sk.token_number == self.tokens_parsed)
            };
            if !need_more || self.stream_end_fetched {
                break;
            }
            self.fetch_next_token()?;
        }
        self.token_available = true;
        Ok(())
    }

    fn fetch_next_token(&mut self) -> Result<(), Error> {
        if !self.stream_start_produced {
            self.fetch_stream_start();
            return Ok(());
        }

        self.scan_to_next_token()?;
        self.stale_simple_keys()?;
        self.unroll_indent(self.col as isize);

        let c = self.ch();
        if is_z(c) {
            if let Some(err) = self.input_failure() {
                return Err(err);
            }
            return self.fetch_stream_end();
        }

        if self.col == 0 {
            if c == '%' {
                return self.fetch_directive();
            }
            if self.is_document_indicator('-') {
                return self.fetch_document_indicator(TokenKind::DocumentStart);
            }
            if self.is_document_indicator('.') {
                return self.fetch_document_indicator(TokenKind::DocumentEnd);
            }
        }

        let next = self.peek(1);
        match c {
            '[' => self.fetch_flow_collection_start(TokenKind::FlowSequenceStart),
            '{' => self.fetch_flow_collection_start(TokenKind::FlowMappingStart),
            ']' => self.fetch_flow_collection_end(TokenKind::FlowSequenceEnd),
            '}' => self.fetch_flow_collection_end(TokenKind::FlowMappingEnd),
            ',' => self.fetch_flow_entry(),
            '-' if is_blankz(next) => self.fetch_block_entry(),
            '?' if is_blankz(next) => self.fetch_key(),
            ':' if is_blankz(next)
                || (self.flow_level > 0
                    && (is_flow(next) || self.index == self.adjacent_value_allowed_at)) =>
            {
                self.fetch_value()
            }
            '*' => self.fetch_anchor(true),
            '&' => self.fetch_anchor(false),
            '!' => self.fetch_tag(),
            '|' if self.flow_level == 0 => self.fetch_block_scalar(true),
            '>' if self.flow_level == 0 => self.fetch_block_scalar(false),
            '\'' => self.fetch_flow_scalar(true),
            '"' => self.fetch_flow_scalar(false),
            '\t' => Err(Error::scan(
                "while scanning for the next token",
                "found a tab character that violates indentation",
                self.mark(),
            )),
            '%' | '@' | '`' => Err(Error::scan(
                "while scanning for the next token",
                format!("found character '{c}' that cannot start any token"),
                self.mark(),
            )),
            _ => self.fetch_plain_scalar(),
        }
    }

    /// Skip blanks and line breaks, emitting comment tokens on the way.
    fn scan_to_next_token(&mut self) -> Result<(), Error> {
        loop {
            // A BOM is allowed at the start of any line.
            if self.col == 0 && self.ch() == '\u{FEFF}' {
                self.buffer.pop_front();
                self.index += 1;
            }
            while self.ch() == ' '
                || (self.ch() == '\t' && (self.flow_level > 0 || !self.simple_key_allowed))
            {
                self.skip();
            }
            if self.ch() == '#' {
                let comment = self.scan_comment();
                if self.with_comments {
                    self.push_token(comment);
                }
            }
            if is_break(self.ch()) {
                self.skip_break();
                if self.flow_level == 0 {
                    self.simple_key_allowed = true;
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn scan_comment(&mut self) -> Token {
        let start = self.mark();
        let inline = self.content_line == self.line;
        self.skip();
        let mut text = String::new();
        while !is_breakz(self.ch()) {
            text.push(self.ch());
            self.skip();
        }
        let end = self.mark();
        let text = text.trim().to_owned();
        Token::new(TokenKind::Comment { text, inline }, start, end)
    }

    // ---- simple keys and indentation -------------------------------------------------

    fn stale_simple_keys(&mut self) -> Result<(), Error> {
        let (line, index) = (self.line, self.index);
        for sk in self.simple_keys.iter_mut() {
            if sk.possible
                && (sk.mark.line < line || sk.mark.index + MAX_SIMPLE_KEY_LENGTH < index)
            {
                if sk.required {
                    return Err(Error::scan(
                        "while scanning a simple key",
                        "could not find expected ':'",
                        sk.mark,
                    ));
                }
                sk.possible = false;
            }
        }
        Ok(())
    }

    fn save_simple_key(&mut self) -> Result<(), Error> {
        if !self.simple_key_allowed {
            return Ok(());
        }
        let required = self.flow_level == 0 && self.indent == self.col as isize;
        let sk = SimpleKey {
            possible: true,
            required,
            token_number: self.tokens_parsed + self.tokens.len(),
            mark: self.mark(),
        };
        self.remove_simple_key()?;
        if let Some(last) = self.simple_keys.last_mut() {
            *last = sk;
        }
        Ok(())
    }

    fn remove_simple_key(&mut self) -> Result<(), Error> {
        if let Some(last) = self.simple_keys.last_mut() {
            if last.possible && last.required {
                return Err(Error::scan(
                    "while scanning a simple key",
                    "could not find expected ':'",
                    last.mark,
                ));
            }
            last.possible = false;
        }
        Ok(())
    }

    fn increase_flow_level(&mut self) {
        self.simple_keys.push(SimpleKey::default());
        self.flow_level += 1;
    }

    fn decrease_flow_level(&mut self) {
        if self.flow_level > 0 {
            self.flow_level -= 1;
            self.simple_keys.pop();
        }
    }

    /// Open a block collection at `col` if it is deeper than the current indentation.
    /// `number` is the absolute token number to insert at, or `None` to append.
    fn roll_indent(&mut self, col: usize, number: Option<usize>, kind: TokenKind, mark: Mark) {
        if self.flow_level > 0 {
            return;
        }
        if self.indent < col as isize {
            self.indents.push(self.indent);
            self.indent = col as isize;
            let token = Token::new(kind, mark, mark);
            match number {
                Some(n) => self.insert_token(n.saturating_sub(self.tokens_parsed), token),
                None => self.push_token(token),
            }
        }
    }

    /// Close every block collection indented deeper than `col`.
    fn unroll_indent(&mut self, col: isize) {
        if self.flow_level > 0 {
            return;
        }
        while self.indent > col {
            let mark = self.mark();
            self.tokens
                .push_back(Token::new(TokenKind::BlockEnd, mark, mark));
            self.indent = self.indents.pop().unwrap_or(-1);
        }
    }

    // ---- fetchers --------------------------------------------------------------------

    fn fetch_stream_start(&mut self) {
        if self.ch() == '\u{FEFF}' {
            self.buffer.pop_front();
        }
        let mark = self.mark();
        self.indent = -1;
        self.stream_start_produced = true;
        self.simple_key_allowed = true;
        self.simple_keys.push(SimpleKey::default());
        self.push_token(Token::new(TokenKind::StreamStart, mark, mark));
    }

    fn fetch_stream_end(&mut self) -> Result<(), Error> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        self.stream_end_fetched = true;
        let mark = self.mark();
        self.push_token(Token::new(TokenKind::StreamEnd, mark, mark));
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<(), Error> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        if let Some(token) = self.scan_directive()? {
            self.push_token(token);
        }
        Ok(())
    }

    fn fetch_document_indicator(&mut self, kind: TokenKind) -> Result<(), Error> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.mark();
        self.skip();
        self.skip();
        self.skip();
        let end = self.mark();
        self.push_token(Token::new(kind, start, end));
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, kind: TokenKind) -> Result<(), Error> {
        self.save_simple_key()?;
        self.increase_flow_level();
        self.simple_key_allowed = true;
        let start = self.mark();
        self.skip();
        let end = self.mark();
        self.push_token(Token::new(kind, start, end));
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, kind: TokenKind) -> Result<(), Error> {
        self.remove_simple_key()?;
        self.decrease_flow_level();
        self.simple_key_allowed = false;
        let start = self.mark();
        self.skip();
        self.adjacent_value_allowed_at = self.index;
        let end = self.mark();
        self.push_token(Token::new(kind, start, end));
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<(), Error> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start = self.mark();
        self.skip();
        let end = self.mark();
        self.push_token(Token::new(TokenKind::FlowEntry, start, end));
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<(), Error> {
        let start = self.mark();
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return Err(Error::scan(
                    "while scanning a block entry",
                    "block sequence entries are not allowed in this context",
                    start,
                ));
            }
            self.roll_indent(self.col, None, TokenKind::BlockSequenceStart, start);
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        self.skip();
        let end = self.mark();
        self.push_token(Token::new(TokenKind::BlockEntry, start, end));
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<(), Error> {
        let start = self.mark();
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return Err(Error::scan(
                    "while scanning a mapping key",
                    "mapping keys are not allowed in this context",
                    start,
                ));
            }
            self.roll_indent(self.col, None, TokenKind::BlockMappingStart, start);
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = self.flow_level == 0;
        self.skip();
        let end = self.mark();
        self.push_token(Token::new(TokenKind::Key, start, end));
        Ok(())
    }

    fn fetch_value(&mut self) -> Result<(), Error> {
        let start = self.mark();
        let sk = self.simple_keys.last().copied().unwrap_or_default();
        if sk.possible {
            // The pending simple key is confirmed: insert KEY (and maybe BLOCK-MAPPING-START)
            // in front of it.
            let key = Token::new(TokenKind::Key, sk.mark, sk.mark);
            self.insert_token(sk.token_number.saturating_sub(self.tokens_parsed), key);
            self.roll_indent(
                sk.mark.column.saturating_sub(1),
                Some(sk.token_number),
                TokenKind::BlockMappingStart,
                sk.mark,
            );
            if let Some(last) = self.simple_keys.last_mut() {
                last.possible = false;
            }
            self.simple_key_allowed = false;
        } else {
            if self.flow_level == 0 {
                if !self.simple_key_allowed {
                    return Err(Error::scan(
                        "while scanning a mapping value",
                        "mapping values are not allowed in this context",
                        start,
                    ));
                }
                self.roll_indent(self.col, None, TokenKind::BlockMappingStart, start);
            }
            self.simple_key_allowed = self.flow_level == 0;
        }
        self.skip();
        let end = self.mark();
        self.push_token(Token::new(TokenKind::Value, start, end));
        Ok(())
    }

    fn fetch_anchor(&mut self, alias: bool) -> Result<(), Error> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_anchor(alias)?;
        self.push_token(token);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<(), Error> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_tag()?;
        self.push_token(token);
        Ok(())
    }

    fn fetch_block_scalar(&mut self, literal: bool) -> Result<(), Error> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let token = self.scan_block_scalar(literal)?;
        self.push_token(token);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, single: bool) -> Result<(), Error> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_flow_scalar(single)?;
        self.adjacent_value_allowed_at = self.index;
        self.push_token(token);
        Ok(())
    }

    fn fetch_plain_scalar(&mut self) -> Result<(), Error> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_plain_scalar()?;
        self.push_token(token);
        Ok(())
    }

    // ---- scanners --------------------------------------------------------------------

    fn scan_directive(&mut self) -> Result<Option<Token>, Error> {
        const CONTEXT: &str = "while scanning a directive";
        let start = self.mark();
        self.skip();

        let mut name = String::new();
        while is_alpha(self.ch()) {
            name.push(self.ch());
            self.skip();
        }
        if name.is_empty() {
            return Err(Error::scan(
                CONTEXT,
                "could not find expected directive name",
                self.mark(),
            ));
        }
        if !is_blankz(self.ch()) {
            return Err(Error::scan(
                CONTEXT,
                "found unexpected non-alphabetical character",
                self.mark(),
            ));
        }

        let kind = match name.as_str() {
            "YAML" => Some(self.scan_version_directive_value()?),
            "TAG" => Some(self.scan_tag_directive_value()?),
            _ => {
                // Reserved directives are ignored.
                while !is_breakz(self.ch()) {
                    self.skip();
                }
                None
            }
        };

        while is_blank(self.ch()) {
            self.skip();
        }
        if self.ch() != '#' && !is_breakz(self.ch()) {
            return Err(Error::scan(
                CONTEXT,
                "did not find expected comment or line break",
                self.mark(),
            ));
        }
        Ok(kind.map(|kind| Token::new(kind, start, self.mark())))
    }

    fn scan_version_directive_value(&mut self) -> Result<TokenKind, Error> {
        while is_blank(self.ch()) {
            self.skip();
        }
        let major = self.scan_version_number()?;
        if self.ch() != '.' {
            return Err(Error::scan(
                "while scanning a %YAML directive",
                "did not find expected digit or '.' character",
                self.mark(),
            ));
        }
        self.skip();
        let minor = self.scan_version_number()?;
        Ok(TokenKind::VersionDirective { major, minor })
    }

    fn scan_version_number(&mut self) -> Result<u32, Error> {
        const CONTEXT: &str = "while scanning a %YAML directive";
        let mut value: u32 = 0;
        let mut digits = 0;
        while let Some(d) = self.ch().to_digit(10) {
            digits += 1;
            if digits > 9 {
                return Err(Error::scan(
                    CONTEXT,
                    "found extremely long version number",
                    self.mark(),
                ));
            }
            value = value * 10 + d;
            self.skip();
        }
        if digits == 0 {
            return Err(Error::scan(
                CONTEXT,
                "did not find expected version number",
                self.mark(),
            ));
        }
        Ok(value)
    }

    fn scan_tag_directive_value(&mut self) -> Result<TokenKind, Error> {
        const CONTEXT: &str = "while scanning a %TAG directive";
        while is_blank(self.ch()) {
            self.skip();
        }
        let handle = self.scan_tag_handle(true)?;
        if !is_blank(self.ch()) {
            return Err(Error::scan(
                CONTEXT,
                "did not find expected whitespace",
                self.mark(),
            ));
        }
        while is_blank(self.ch()) {
            self.skip();
        }
        let prefix = self.scan_tag_uri(true, true, "")?;
        if !is_blankz(self.ch()) {
            return Err(Error::scan(
                CONTEXT,
                "did not find expected whitespace or line break",
                self.mark(),
            ));
        }
        Ok(TokenKind::TagDirective { handle, prefix })
    }

    fn scan_anchor(&mut self, alias: bool) -> Result<Token, Error> {
        let start = self.mark();
        self.skip();
        let mut name = String::new();
        while is_alpha(self.ch()) {
            name.push(self.ch());
            self.skip();
        }
        let c = self.ch();
        if name.is_empty()
            || !(is_blankz(c) || matches!(c, '?' | ':' | ',' | ']' | '}' | '%' | '@' | '`'))
        {
            return Err(Error::scan(
                if alias {
                    "while scanning an alias"
                } else {
                    "while scanning an anchor"
                },
                "did not find expected alphabetic or numeric character",
                self.mark(),
            ));
        }
        let end = self.mark();
        let kind = if alias {
            TokenKind::Alias(name)
        } else {
            TokenKind::Anchor(name)
        };
        Ok(Token::new(kind, start, end))
    }

    fn scan_tag(&mut self) -> Result<Token, Error> {
        const CONTEXT: &str = "while scanning a tag";
        let start = self.mark();
        let (handle, suffix) = if self.peek(1) == '<' {
            // Verbatim `!<uri>`.
            self.skip();
            self.skip();
            let suffix = self.scan_tag_uri(false, true, "")?;
            if self.ch() != '>' {
                return Err(Error::scan(
                    CONTEXT,
                    "did not find the expected '>'",
                    self.mark(),
                ));
            }
            self.skip();
            (String::new(), suffix)
        } else {
            let handle = self.scan_tag_handle(false)?;
            if handle.len() > 1 && handle.ends_with('!') {
                let suffix = self.scan_tag_uri(false, false, "")?;
                (handle, suffix)
            } else {
                // `!suffix`: what was read as a handle is the start of the suffix.
                let suffix = self.scan_tag_uri(false, false, &handle[1..])?;
                if suffix.is_empty() {
                    // The non-specific tag `!`.
                    (String::new(), "!".to_owned())
                } else {
                    ("!".to_owned(), suffix)
                }
            }
        };

        let c = self.ch();
        if !is_blankz(c) && !(self.flow_level > 0 && c == ',') {
            return Err(Error::scan(
                CONTEXT,
                "did not find expected whitespace or line break",
                self.mark(),
            ));
        }
        Ok(Token::new(TokenKind::Tag { handle, suffix }, start, self.mark()))
    }

    fn scan_tag_handle(&mut self, directive: bool) -> Result<String, Error> {
        let context = if directive {
            "while scanning a %TAG directive"
        } else {
            "while scanning a tag"
        };
        if self.ch() != '!' {
            return Err(Error::scan(context, "did not find expected '!'", self.mark()));
        }
        let mut handle = String::from("!");
        self.skip();
        while is_alpha(self.ch()) {
            handle.push(self.ch());
            self.skip();
        }
        if self.ch() == '!' {
            handle.push('!');
            self.skip();
        } else if directive && handle != "!" {
            // A %TAG handle must be `!`, `!!` or `!name!`.
            return Err(Error::scan(context, "did not find expected '!'", self.mark()));
        }
        Ok(handle)
    }

    /// Scan a tag URI. `head` is text already consumed that belongs to it.
    fn scan_tag_uri(&mut self, directive: bool, verbatim: bool, head: &str) -> Result<String, Error> {
        let context = if directive {
            "while parsing a %TAG directive"
        } else {
            "while parsing a tag"
        };
        let mut uri = String::from(head);
        loop {
            let c = self.ch();
            // Flow indicators end a shorthand tag but may appear in a verbatim one.
            if !is_uri_char(c) || (!verbatim && is_flow(c)) {
                break;
            }
            if c == '%' {
                self.scan_uri_escapes(context, &mut uri)?;
            } else {
                uri.push(c);
                self.skip();
            }
        }
        if uri.is_empty() && (directive || verbatim) {
            return Err(Error::scan(context, "did not find expected tag URI", self.mark()));
        }
        Ok(uri)
    }

    /// Decode a run of `%XX` escapes as UTF-8.
    fn scan_uri_escapes(&mut self, context: &'static str, uri: &mut String) -> Result<(), Error> {
        let start = self.mark();
        let mut bytes = Vec::new();
        while self.ch() == '%' {
            let (Some(hi), Some(lo)) = (as_hex(self.peek(1)), as_hex(self.peek(2))) else {
                return Err(Error::scan(
                    context,
                    "did not find URI escaped octet",
                    self.mark(),
                ));
            };
            bytes.push((hi * 16 + lo) as u8);
            self.skip();
            self.skip();
            self.skip();
        }
        match String::from_utf8(bytes) {
            Ok(s) => {
                uri.push_str(&s);
                Ok(())
            }
            Err(_) => Err(Error::scan(
                context,
                "found an incorrect UTF-8 sequence in a URI escape",
                start,
            )),
        }
    }

    fn scan_block_scalar(&mut self, literal: bool) -> Result<Token, Error> {
        const CONTEXT: &str = "while scanning a block scalar";
        let start = self.mark();
        self.skip();

        // Header: chomping and indentation indicators, in either order.
        let mut chomping: i8 = 0;
        let mut increment: usize = 0;
        let mut c = self.ch();
        if c == '+' || c == '-' {
            chomping = if c == '+' { 1 } else { -1 };
            self.skip();
            c = self.ch();
            if is_digit(c) {
                increment = self.scan_indentation_indicator(CONTEXT)?;
            }
        } else if is_digit(c) {
            increment = self.scan_indentation_indicator(CONTEXT)?;
            c = self.ch();
            if c == '+' || c == '-' {
                chomping = if c == '+' { 1 } else { -1 };
                self.skip();
            }
        }

        while is_blank(self.ch()) {
            self.skip();
        }
        // A comment on the header line is skipped; it has no place in the event stream.
        if self.ch() == '#' {
            while !is_breakz(self.ch()) {
                self.skip();
            }
        }
        if !is_breakz(self.ch()) {
            return Err(Error::scan(
                CONTEXT,
                "did not find expected comment or line break",
                self.mark(),
            ));
        }
        if is_break(self.ch()) {
            self.skip_break();
        }

        let mut end = self.mark();
        let mut indent = if increment > 0 {
            (self.indent.max(0) as usize) + increment
        } else {
            0
        };

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        self.block_scalar_breaks(&mut indent, &mut trailing_breaks)?;

        let mut leading_blank = false;
        while self.col == indent && !self.at_end() {
            let trailing_blank = is_blank(self.ch());
            if !literal && leading_break.starts_with('\n') && !leading_blank && !trailing_blank {
                if trailing_breaks.is_empty() {
                    string.push(' ');
                }
                leading_break.clear();
            } else {
                string.push_str(&leading_break);
                leading_break.clear();
            }
            string.push_str(&trailing_breaks);
            trailing_breaks.clear();

            leading_blank = is_blank(self.ch());
            while !is_breakz(self.ch()) {
                string.push(self.ch());
                self.skip();
            }
            end = self.mark();
            if self.at_end() {
                break;
            }
            self.read_break(&mut leading_break);
            self.block_scalar_breaks(&mut indent, &mut trailing_breaks)?;
        }

        if chomping != -1 {
            string.push_str(&leading_break);
        }
        if chomping == 1 {
            string.push_str(&trailing_breaks);
        }

        let style = if literal {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };
        Ok(Token::new(
            TokenKind::Scalar {
                value: string,
                style,
            },
            start,
            end,
        ))
    }

    fn scan_indentation_indicator(&mut self, context: &'static str) -> Result<usize, Error> {
        let c = self.ch();
        if c == '0' {
            return Err(Error::scan(
                context,
                "found an indentation indicator equal to 0",
                self.mark(),
            ));
        }
        self.skip();
        Ok(c.to_digit(10).unwrap_or(1) as usize)
    }

    /// Consume empty lines and indentation in a block scalar, detecting the indentation
    /// from the first non-empty line when it is not given explicitly.
    fn block_scalar_breaks(&mut self, indent: &mut usize, breaks: &mut String) -> Result<(), Error> {
        let mut max_indent = 0;
        loop {
            while (*indent == 0 || self.col < *indent) && self.ch() == ' ' {
                self.skip();
            }
            max_indent = max_indent.max(self.col);
            if (*indent == 0 || self.col < *indent) && self.ch() == '\t' {
                return Err(Error::scan(
                    "while scanning a block scalar",
                    "found a tab character where an indentation space is expected",
                    self.mark(),
                ));
            }
            if !is_break(self.ch()) {
                break;
            }
            self.read_break(breaks);
        }
        if *indent == 0 {
            let min = (self.indent + 1).max(1) as usize;
            *indent = max_indent.max(min);
        }
        Ok(())
    }

    fn scan_flow_scalar(&mut self, single: bool) -> Result<Token, Error> {
        const CONTEXT: &str = "while scanning a quoted scalar";
        let start = self.mark();
        self.skip();

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();

        loop {
            if self.is_document_indicator('-') || self.is_document_indicator('.') {
                return Err(Error::scan(
                    CONTEXT,
                    "found unexpected document indicator",
                    self.mark(),
                ));
            }
            if self.at_end() {
                return Err(self.input_failure().unwrap_or_else(|| {
                    Error::scan(CONTEXT, "found unexpected end of stream", self.mark())
                }));
            }

            let mut leading_blanks = false;
            while !is_blankz(self.ch()) {
                let c = self.ch();
                match c {
                    '\'' if single && self.peek(1) == '\'' => {
                        string.push('\'');
                        self.skip();
                        self.skip();
                    }
                    '\'' if single => break,
                    '"' if !single => break,
                    '\\' if !single && is_break(self.peek(1)) => {
                        self.skip();
                        self.skip_break();
                        leading_blanks = true;
                        break;
                    }
                    '\\' if !single => self.scan_escape(&mut string)?,
                    c => {
                        string.push(c);
                        self.skip();
                    }
                }
            }

            let c = self.ch();
            if (single && c == '\'') || (!single && c == '"') {
                break;
            }

            while is_blank(self.ch()) || is_break(self.ch()) {
                if is_blank(self.ch()) {
                    if !leading_blanks {
                        whitespaces.push(self.ch());
                    }
                    self.skip();
                } else if leading_blanks {
                    self.read_break(&mut trailing_breaks);
                } else {
                    whitespaces.clear();
                    self.read_break(&mut leading_break);
                    leading_blanks = true;
                }
            }

            if leading_blanks {
                if leading_break.is_empty() {
                    string.push_str(&trailing_breaks);
                } else if trailing_breaks.is_empty() {
                    string.push(' ');
                } else {
                    string.push_str(&trailing_breaks);
                }
                leading_break.clear();
                trailing_breaks.clear();
            } else {
                string.push_str(&whitespaces);
                whitespaces.clear();
            }
        }

        self.skip();
        let end = self.mark();
        let style = if single {
            ScalarStyle::SingleQuoted
        } else {
            ScalarStyle::DoubleQuoted
        };
        Ok(Token::new(
            TokenKind::Scalar {
                value: string,
                style,
            },
            start,
            end,
        ))
    }

    fn scan_escape(&mut self, string: &mut String) -> Result<(), Error> {
        const CONTEXT: &str = "while parsing a quoted scalar";
        let mark = self.mark();
        let code_length = match self.peek(1) {
            '0' => {
                string.push('\0');
                0
            }
            'a' => {
                string.push('\x07');
                0
            }
            'b' => {
                string.push('\x08');
                0
            }
            't' | '\t' => {
                string.push('\t');
                0
            }
            'n' => {
                string.push('\n');
                0
            }
            'v' => {
                string.push('\x0b');
                0
            }
            'f' => {
                string.push('\x0c');
                0
            }
            'r' => {
                string.push('\r');
                0
            }
            'e' => {
                string.push('\x1b');
                0
            }
            ' ' => {
                string.push(' ');
                0
            }
            '"' => {
                string.push('"');
                0
            }
            '/' => {
                string.push('/');
                0
            }
            '\\' => {
                string.push('\\');
                0
            }
            'N' => {
                string.push('\u{85}');
                0
            }
            '_' => {
                string.push('\u{a0}');
                0
            }
            'L' => {
                string.push('\u{2028}');
                0
            }
            'P' => {
                string.push('\u{2029}');
                0
            }
            'x' => 2,
            'u' => 4,
            'U' => 8,
            c => {
                return Err(Error::scan(
                    CONTEXT,
                    format!("found unknown escape character '{}'", c.escape_debug()),
                    mark,
                ));
            }
        };
        self.skip();
        self.skip();

        if code_length > 0 {
            let mut value: u32 = 0;
            for i in 0..code_length {
                let Some(digit) = as_hex(self.peek(i)) else {
                    return Err(Error::scan(
                        CONTEXT,
                        "did not find expected hexadecimal number",
                        self.mark(),
                    ));
                };
                value = (value << 4) + digit;
            }
            let Some(c) = char::from_u32(value) else {
                return Err(Error::scan(
                    CONTEXT,
                    format!("found invalid Unicode character escape code {value:#X}"),
                    mark,
                ));
            };
            string.push(c);
            for _ in 0..code_length {
                self.skip();
            }
        }
        Ok(())
    }

    fn scan_plain_scalar(&mut self) -> Result<Token, Error> {
        let indent = self.indent + 1;
        let start = self.mark();
        let mut end = start;

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();
        let mut leading_blanks = false;

        loop {
            if self.is_document_indicator('-') || self.is_document_indicator('.') {
                break;
            }
            if self.ch() == '#' {
                break;
            }

            while !is_blankz(self.ch()) {
                let (c, next) = (self.ch(), self.peek(1));
                if c == ':' && (is_blankz(next) || (self.flow_level > 0 && is_flow(next))) {
                    break;
                }
                if self.flow_level > 0 && is_flow(c) {
                    break;
                }

                if leading_blanks || !whitespaces.is_empty() {
                    if leading_blanks {
                        if leading_break.is_empty() {
                            string.push_str(&trailing_breaks);
                        } else if trailing_breaks.is_empty() {
                            string.push(' ');
                        } else {
                            string.push_str(&trailing_breaks);
                        }
                        leading_break.clear();
                        trailing_breaks.clear();
                        leading_blanks = false;
                    } else {
                        string.push_str(&whitespaces);
                        whitespaces.clear();
                    }
                }

                string.push(c);
                self.skip();
            }
            end = self.mark();

            if !(is_blank(self.ch()) || is_break(self.ch())) {
                break;
            }

            while is_blank(self.ch()) || is_break(self.ch()) {
                if is_blank(self.ch()) {
                    if leading_blanks && (self.col as isize) < indent && self.ch() == '\t' {
                        return Err(Error::scan(
                            "while scanning a plain scalar",
                            "found a tab character that violates indentation",
                            self.mark(),
                        ));
                    }
                    if !leading_blanks {
                        whitespaces.push(self.ch());
                    }
                    self.skip();
                } else if leading_blanks {
                    self.read_break(&mut trailing_breaks);
                } else {
                    whitespaces.clear();
                    self.read_break(&mut leading_break);
                    leading_blanks = true;
                }
            }

            if self.flow_level == 0 && (self.col as isize) < indent {
                break;
            }
        }

        if leading_blanks {
            self.simple_key_allowed = true;
        }
        Ok(Token::new(
            TokenKind::Scalar {
                value: string,
                style: ScalarStyle::Plain,
            },
            start,
            end,
        ))
    }
}

impl<I: CharInput> Iterator for Scanner<I> {
    type Item = Result<Token, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Scanner::new(text.chars())
            .map(|t| t.map(|t| t.kind))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn scalar(value: &str, style: ScalarStyle) -> TokenKind {
        Scalar {
            value: value.to_owned(),
            style,
        }
    }

    fn plain(value: &str) -> TokenKind {
        scalar(value, ScalarStyle::Plain)
    }

    #[test]
    fn empty_stream() {
        assert_eq!(kinds(""), vec![StreamStart, StreamEnd]);
    }

    #[test]
    fn block_mapping() {
        assert_eq!(
            kinds("a: 1\nb: 2\n"),
            vec![
                StreamStart,
                BlockMappingStart,
                Key,
                plain("a"),
                Value,
                plain("1"),
                Key,
                plain("b"),
                Value,
                plain("2"),
                BlockEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn nested_sequence_in_mapping() {
        assert_eq!(
            kinds("k:\n  - x\n  - y\n"),
            vec![
                StreamStart,
                BlockMappingStart,
                Key,
                plain("k"),
                Value,
                BlockSequenceStart,
                BlockEntry,
                plain("x"),
                BlockEntry,
                plain("y"),
                BlockEnd,
                BlockEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn flow_collections() {
        assert_eq!(
            kinds("{a: [1, 2]}"),
            vec![
                StreamStart,
                FlowMappingStart,
                Key,
                plain("a"),
                Value,
                FlowSequenceStart,
                plain("1"),
                FlowEntry,
                plain("2"),
                FlowSequenceEnd,
                FlowMappingEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn json_like_key_allows_adjacent_colon() {
        assert_eq!(
            kinds(r#"{"a":1}"#),
            vec![
                StreamStart,
                FlowMappingStart,
                Key,
                scalar("a", ScalarStyle::DoubleQuoted),
                Value,
                plain("1"),
                FlowMappingEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn double_quoted_escapes() {
        let k = kinds(r#""a\tb\x41\u00e9\U0001F600\n""#);
        assert_eq!(k[1], scalar("a\tbAé😀\n", ScalarStyle::DoubleQuoted));
    }

    #[test]
    fn single_quoted_folding() {
        let k = kinds("'it''s\n  folded\n\n  twice'");
        assert_eq!(k[1], scalar("it's folded\ntwice", ScalarStyle::SingleQuoted));
    }

    #[test]
    fn plain_multiline_folds() {
        let k = kinds("a: one\n  two\n\n  three\n");
        assert_eq!(k[5], plain("one two\nthree"));
    }

    #[test]
    fn block_scalars_and_chomping() {
        let k = kinds("a: |\n  x\n  y\n\nb: >-\n  p\n  q\n\nc: |+\n  z\n\n");
        assert_eq!(k[5], scalar("x\ny\n", ScalarStyle::Literal));
        assert_eq!(k[9], scalar("p q", ScalarStyle::Folded));
        assert_eq!(k[13], scalar("z\n\n", ScalarStyle::Literal));
    }

    #[test]
    fn explicit_indentation_indicator() {
        let k = kinds("- |2\n   leading space\n");
        assert_eq!(k[3], scalar(" leading space\n", ScalarStyle::Literal));
    }

    #[test]
    fn zero_indentation_indicator_fails() {
        let err = Scanner::new("a: |0\n x\n".chars())
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert!(err.to_string().contains("indentation indicator equal to 0"));
    }

    #[test]
    fn anchors_aliases_tags() {
        assert_eq!(
            kinds("- &a !!str x\n- *a\n- !local y\n- !<tag:x> z\n- ! w\n"),
            vec![
                StreamStart,
                BlockSequenceStart,
                BlockEntry,
                Anchor("a".into()),
                Tag {
                    handle: "!!".into(),
                    suffix: "str".into()
                },
                plain("x"),
                BlockEntry,
                Alias("a".into()),
                BlockEntry,
                Tag {
                    handle: "!".into(),
                    suffix: "local".into()
                },
                plain("y"),
                BlockEntry,
                Tag {
                    handle: "".into(),
                    suffix: "tag:x".into()
                },
                plain("z"),
                BlockEntry,
                Tag {
                    handle: "".into(),
                    suffix: "!".into()
                },
                plain("w"),
                BlockEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn directives_and_document_markers() {
        assert_eq!(
            kinds("%YAML 1.2\n%TAG !e! tag:example.com,2000:\n---\nx\n...\n"),
            vec![
                StreamStart,
                VersionDirective { major: 1, minor: 2 },
                TagDirective {
                    handle: "!e!".into(),
                    prefix: "tag:example.com,2000:".into()
                },
                DocumentStart,
                plain("x"),
                DocumentEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn comments_carry_inline_flag() {
        assert_eq!(
            kinds("# head\na: 1 # tail\n"),
            vec![
                StreamStart,
                Comment {
                    text: "head".into(),
                    inline: false
                },
                BlockMappingStart,
                Key,
                plain("a"),
                Value,
                plain("1"),
                Comment {
                    text: "tail".into(),
                    inline: true
                },
                BlockEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn comments_can_be_disabled() {
        let k: Vec<_> = Scanner::new("a: 1 # x\n".chars())
            .with_comments(false)
            .map(|t| t.unwrap().kind)
            .collect();
        assert!(!k.iter().any(|k| matches!(k, Comment { .. })));
    }

    #[test]
    fn unterminated_quote_reports_position() {
        let err = Scanner::new("a: \"open\n".chars())
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert_eq!(err.stage(), crate::Stage::Scanner);
        assert!(err.to_string().contains("unexpected end of stream"));
    }

    #[test]
    fn control_characters_are_rejected() {
        let err = Scanner::new("a: 1\n\0b: 2\n".chars())
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert_eq!(err.stage(), crate::Stage::Scanner);
        assert!(err.to_string().contains("not allowed"), "{err}");
        assert_eq!(err.mark().map(|m| (m.line(), m.column())), Some((2, 1)));

        let err = Scanner::new("a: \"x\u{1}y\"".chars())
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert!(err.to_string().contains("not allowed"), "{err}");
        assert!(Scanner::new("a: x\u{1}y".chars()).collect::<Result<Vec<_>, _>>().is_err());
    }

    #[test]
    fn tab_indentation_is_rejected() {
        let res = Scanner::new("a:\n\tb: 1\n".chars()).collect::<Result<Vec<_>, _>>();
        assert!(res.is_err());
    }

    #[test]
    fn unknown_escape_is_rejected() {
        let res = Scanner::new(r#""\q""#.chars()).collect::<Result<Vec<_>, _>>();
        assert!(res.unwrap_err().to_string().contains("unknown escape"));
    }

    #[test]
    fn overlong_simple_key_is_rejected() {
        let text = format!("{}: 1\n", "k".repeat(MAX_SIMPLE_KEY_LENGTH + 10));
        let res = Scanner::new(text.chars()).collect::<Result<Vec<_>, _>>();
        assert!(res.unwrap_err().to_string().contains("mapping values are not allowed"));
    }

    #[test]
    fn marks_are_one_based() {
        let tokens: Vec<Token> = Scanner::new("a:\n  b: c".chars())
            .collect::<Result<_, _>>()
            .unwrap();
        let b = tokens
            .iter()
            .find(|t| t.kind == plain("b"))
            .expect("b is scanned");
        assert_eq!((b.start.line(), b.start.column()), (2, 3));
        assert_eq!(b.start.index(), 5);
    }
}
