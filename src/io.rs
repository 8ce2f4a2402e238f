//! Pull sources and push sinks, and the adapters that turn their results into
//! run errors.

use std::io;

use crate::{Error, Result};

/// A pull-style byte source.
///
/// Every [`std::io::Read`] is a `Source`.
pub trait Source {
    /// Fill a prefix of `buf` and return how many bytes were placed there.
    ///
    /// `Ok(0)` signals end of input. An error aborts the run.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A push-style byte sink.
///
/// The sink must consume the whole buffer: any result other than
/// `Ok(buf.len())` aborts the run. Every [`std::io::Write`] is a `Sink`.
pub trait Sink {
    /// Consume `buf`, returning how many bytes were written.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

impl<R: io::Read + ?Sized> Source for R {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match io::Read::read(self, buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                res => return res,
            }
        }
    }
}

impl<W: io::Write + ?Sized> Sink for W {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write_all(self, buf)?;
        Ok(buf.len())
    }
}

/// Counts what a run pulls from its source.
pub(crate) struct InStream<'a, R: ?Sized> {
    source: &'a mut R,
    total: u64,
}

impl<'a, R: Source + ?Sized> InStream<'a, R> {
    pub(crate) fn new(source: &'a mut R) -> Self {
        Self { source, total: 0 }
    }

    /// One read call; `Ok(0)` is end of input. The caller classifies errors.
    pub(crate) fn pull(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.source.read(buf)?;
        if n > buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "source reported more bytes than the buffer holds",
            ));
        }
        self.total += n as u64;
        Ok(n)
    }

    /// Repeated reads until `buf` is full or the source ends. Returns the
    /// number of bytes placed in `buf`; failures are [`Error::Input`].
    pub(crate) fn pull_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.pull(&mut buf[filled..]).map_err(Error::Input)? {
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }
}

/// Counts what a run pushes to its sink and maps failed or short writes to
/// [`Error::Output`].
pub(crate) struct OutStream<'a, W: ?Sized> {
    sink: &'a mut W,
    total: u64,
}

impl<'a, W: Sink + ?Sized> OutStream<'a, W> {
    pub(crate) fn new(sink: &'a mut W) -> Self {
        Self { sink, total: 0 }
    }

    /// Hand `buf` to the sink in a single call.
    pub(crate) fn push(&mut self, buf: &[u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        match self.sink.write(buf) {
            Ok(written) if written == buf.len() => {
                self.total += written as u64;
                Ok(())
            }
            Ok(written) => Err(Error::Output {
                expected: buf.len(),
                written,
                source: None,
            }),
            Err(err) => Err(Error::Output {
                expected: buf.len(),
                written: 0,
                source: Some(err),
            }),
        }
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }
}
