//! Adapter from `io::Write` to `fmt::Write` for the emitter.

use std::{fmt, io};

/// Forwards text to an `io::Write`, keeping the first I/O error so it can be reported
/// instead of the opaque `fmt::Error`.
pub(crate) struct IoWriter<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: io::Write> IoWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    pub(crate) fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: io::Write> fmt::Write for IoWriter<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.error.is_some() {
            return Err(fmt::Error);
        }
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    struct Broken;

    impl io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn forwards_bytes() {
        let mut out = IoWriter::new(Vec::new());
        out.write_str("a: é\n").unwrap();
        assert_eq!(out.inner, "a: é\n".as_bytes());
    }

    #[test]
    fn keeps_first_error() {
        let mut out = IoWriter::new(Broken);
        assert!(out.write_str("x").is_err());
        assert!(out.write_str("y").is_err());
        assert_eq!(out.take_error().map(|e| e.to_string()), Some("disk full".to_owned()));
    }
}
