//! Byte-source abstraction for chunked input.
//!
//! Grounded on spec.md §1/§6 "expose a byte-source trait": the teacher
//! (`roxmltree`) only ever accepts an already-loaded `&str`, leaving file
//! and network loading to the caller. This crate keeps that division —
//! [`crate::parser::parse`] and [`crate::reader::EventReader`] stay
//! `&str`-only and allocation-free at the tokenizer layer — but additionally
//! exposes [`ByteSource`], a minimal `Read`-like trait callers can implement
//! for chunked or streamed input, plus a `std`-feature-gated whole-file
//! loader built on top of it.

use crate::error::Result;

/// A source of bytes a caller can read from in chunks, independent of
/// `std::io::Read` so this crate can stay usable without the standard
/// library's I/O stack.
pub trait ByteSource {
    /// Reads up to `buf.len()` bytes into `buf`, returning the number of
    /// bytes read. Returns `Ok(0)` at end of input, matching `Read::read`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Reads every remaining byte into a freshly allocated `String`.
    ///
    /// The default implementation reads in fixed-size chunks until
    /// exhausted; implementors that already hold the full input in memory
    /// (e.g. a `&[u8]` wrapper) should override this for a single copy.
    fn read_to_string(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8(bytes).map_err(|e| crate::error::Error::Io(e.to_string()))
    }
}

/// Adapts an in-memory byte slice to [`ByteSource`], handing out one chunk
/// per `read` call.
pub struct SliceSource<'a> {
    remaining: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        SliceSource { remaining: bytes }
    }
}

impl<'a> ByteSource for SliceSource<'a> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.remaining.len());
        buf[..n].copy_from_slice(&self.remaining[..n]);
        self.remaining = &self.remaining[n..];
        Ok(n)
    }

    fn read_to_string(&mut self) -> Result<String> {
        let s = std::str::from_utf8(self.remaining).map_err(|e| crate::error::Error::Io(e.to_string()))?.to_string();
        self.remaining = &[];
        Ok(s)
    }
}

#[cfg(feature = "std")]
mod std_loader {
    use super::*;
    use std::fs;
    use std::io::Read as _;
    use std::path::Path;

    /// Adapts a `std::io::Read` stream (a file, a socket, …) to
    /// [`ByteSource`].
    pub struct ReaderSource<R> {
        inner: R,
    }

    impl<R: std::io::Read> ReaderSource<R> {
        pub fn new(inner: R) -> Self {
            ReaderSource { inner }
        }
    }

    impl<R: std::io::Read> ByteSource for ReaderSource<R> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            Ok(self.inner.read(buf)?)
        }
    }

    /// Loads an entire file into a `String`, for callers that want to go
    /// straight from a path to [`crate::parser::parse`].
    pub fn read_file_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }
}

#[cfg(feature = "std")]
pub use std_loader::{read_file_to_string, ReaderSource};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_reads_in_fixed_chunks() {
        let data = b"hello world";
        let mut src = SliceSource::new(data);
        let mut buf = [0u8; 4];
        assert_eq!(src.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"hell");
        assert_eq!(src.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"o wo");
    }

    #[test]
    fn read_to_string_drains_a_slice_source() {
        let mut src = SliceSource::new(b"abc");
        assert_eq!(src.read_to_string().unwrap(), "abc");
    }

    #[test]
    fn reader_source_wraps_an_io_read_impl() {
        use std::io::Cursor;
        let cursor = Cursor::new(b"xyz".to_vec());
        let mut src = ReaderSource::new(cursor);
        assert_eq!(src.read_to_string().unwrap(), "xyz");
    }
}
