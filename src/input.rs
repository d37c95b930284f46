//! Character input for the scanner.
//!
//! Any `Iterator<Item = char>` (such as `str::chars`) can feed the scanner directly.
//! [`ReaderChars`] turns an `io::Read` into a stream of chars without loading the whole
//! input: `encoding_rs_io` sniffs the BOM (UTF-8, UTF-16LE/BE) and decodes to UTF-8 on the
//! fly, and the decoded text is consumed chunk by chunk.

use std::io::{self, BufReader, Read};

use encoding_rs_io::DecodeReaderBytesBuilder;

/// Source of characters for the [`Scanner`](crate::Scanner).
///
/// End of input is reported as `None`. Sources that can fail stash the failure and report it
/// through [`take_error`](CharInput::take_error) once they return `None`.
pub trait CharInput {
    fn next_char(&mut self) -> Option<char>;

    /// The error that ended the input early, if any.
    fn take_error(&mut self) -> Option<io::Error> {
        None
    }
}

impl<I: Iterator<Item = char>> CharInput for I {
    #[inline]
    fn next_char(&mut self) -> Option<char> {
        self.next()
    }
}

/// Size of the decoded chunk read at once.
const CHUNK_SIZE: usize = 8 * 1024;

/// Streams chars out of a reader that already produces UTF-8 bytes.
pub struct ReaderChars<R: Read> {
    reader: R,
    /// Optional hard cap on total decoded bytes.
    max_bytes: Option<usize>,
    total_bytes: usize,
    /// Decoded text not yet handed out.
    buf: String,
    /// Byte index of the next char in `buf`.
    idx: usize,
    tmp: Vec<u8>,
    /// Bytes of a UTF-8 sequence split across two reads.
    carry: Vec<u8>,
    error: Option<io::Error>,
    done: bool,
}

impl<R: Read> ReaderChars<R> {
    pub fn new(reader: R, max_bytes: Option<usize>) -> Self {
        Self {
            reader,
            max_bytes,
            total_bytes: 0,
            buf: String::new(),
            idx: 0,
            tmp: vec![0u8; CHUNK_SIZE],
            carry: Vec::new(),
            error: None,
            done: false,
        }
    }

    /// Load the next chunk into `buf`. `Ok(false)` on end of input.
    fn refill(&mut self) -> io::Result<bool> {
        // A reader returning empty chunks forever would otherwise spin.
        let mut empty_reads = 0;
        loop {
            let n = self.reader.read(&mut self.tmp)?;
            if n == 0 {
                if self.carry.is_empty() {
                    return Ok(false);
                }
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "stream ended inside a UTF-8 sequence",
                ));
            }

            if let Some(limit) = self.max_bytes {
                self.total_bytes = self.total_bytes.saturating_add(n);
                if self.total_bytes > limit {
                    return Err(io::Error::new(
                        io::ErrorKind::FileTooLarge,
                        format!("input size limit of {limit} bytes exceeded"),
                    ));
                }
            }

            self.carry.extend_from_slice(&self.tmp[..n]);
            let valid = match std::str::from_utf8(&self.carry) {
                Ok(_) => self.carry.len(),
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
            };
            if valid == 0 {
                empty_reads += 1;
                if empty_reads > 128 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "reader keeps returning incomplete UTF-8",
                    ));
                }
                continue;
            }

            let rest = self.carry.split_off(valid);
            let chunk = std::mem::replace(&mut self.carry, rest);
            self.buf = String::from_utf8(chunk)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            self.idx = 0;
            return Ok(true);
        }
    }
}

impl<R: Read> CharInput for ReaderChars<R> {
    fn next_char(&mut self) -> Option<char> {
        loop {
            if let Some(ch) = self.buf[self.idx..].chars().next() {
                self.idx += ch.len_utf8();
                return Some(ch);
            }
            if self.done {
                return None;
            }
            match self.refill() {
                Ok(true) => continue,
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(error) => {
                    self.done = true;
                    self.error = Some(error);
                    return None;
                }
            }
        }
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

/// Decoding char input over any byte reader.
pub type DecodedReader<'a> = ReaderChars<BufReader<Box<dyn Read + 'a>>>;

/// Wrap `reader` so that its bytes are transcoded to UTF-8 (BOM-sniffed) and streamed as chars.
///
/// `max_bytes` caps the number of decoded bytes; exceeding it ends the input with an
/// `io::ErrorKind::FileTooLarge` error.
pub fn decoded_reader<'a, R: Read + 'a>(reader: R, max_bytes: Option<usize>) -> DecodedReader<'a> {
    // `None` = sniff the BOM, defaulting to UTF-8.
    let decoder = DecodeReaderBytesBuilder::new().encoding(None).build(reader);
    let reader = BufReader::new(Box::new(decoder) as Box<dyn Read + 'a>);
    ReaderChars::new(reader, max_bytes)
}
