//! Stream capabilities used by the loader and the writers

use crate::core::error::Result;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Random-access byte stream holding the container
///
/// Reads and writes may be short; callers compare the returned counts.
pub trait ByteStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn can_seek(&self) -> bool {
        true
    }

    /// Read until `buf` is full or the stream ends, returning the count
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Write as much of `buf` as the stream accepts, returning the count
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            match self.write(&buf[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }
}

/// Adapts any `Read + Write + Seek` (files, cursors) to [`ByteStream`]
#[derive(Debug)]
pub struct StreamAdapter<T> {
    inner: T,
}

impl<T: Read + Write + Seek> StreamAdapter<T> {
    pub fn new(inner: T) -> Self {
        StreamAdapter { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Seek> ByteStream for StreamAdapter<T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }
}

/// Append-only destination for freshly encoded output
pub trait BlockSink {
    /// Emit one block; `false` means the sink rejected it
    fn emit(&mut self, data: &[u8]) -> bool;
}

impl BlockSink for Vec<u8> {
    fn emit(&mut self, data: &[u8]) -> bool {
        self.extend_from_slice(data);
        true
    }
}

/// Sink backed by a closure
pub struct FnSink<F>(pub F);

impl<F: FnMut(&[u8]) -> bool> BlockSink for FnSink<F> {
    fn emit(&mut self, data: &[u8]) -> bool {
        (self.0)(data)
    }
}

/// Sink that forwards to any `Write`, flushing nothing on its own
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        WriteSink { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

impl<W: Write> BlockSink for WriteSink<W> {
    fn emit(&mut self, data: &[u8]) -> bool {
        self.inner.write_all(data).is_ok()
    }
}
