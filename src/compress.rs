//! The compress stream driver.

use std::{fmt, io};

use crate::{
    alloc::{Allocator, Block},
    codec::{Encode, LzmaEncoder},
    io::{InStream, OutStream, Sink, Source},
    util::PartialBuffer,
    Error, Header, Level, Result,
};

const INPUT_CHUNK_SIZE: usize = 64 * 1024;
const OUTPUT_CHUNK_SIZE: usize = 64 * 1024;

/// Container format written by a [`Compressor`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum Format {
    /// The lzip container. Not supported; runs fail with
    /// [`Error::UnsupportedFormat`].
    Lzip,
    /// The LZMA-Alone container.
    #[default]
    Lzma,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lzip => f.write_str("lzip"),
            Self::Lzma => f.write_str("lzma-alone"),
        }
    }
}

/// Encoder configuration.
///
/// Nothing is validated here; liblzma checks the values when a run starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressOptions {
    pub(crate) lc: u8,
    pub(crate) lp: u8,
    pub(crate) pb: u8,
    pub(crate) level: Level,
    pub(crate) dict_size: u32,
    pub(crate) format: Format,
    pub(crate) uncompressed_size: u64,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            lc: 3,
            lp: 0,
            pb: 2,
            level: Level::Default,
            dict_size: 1 << 24,
            format: Format::Lzma,
            uncompressed_size: 0,
        }
    }
}

impl CompressOptions {
    /// Literal context bits.
    pub fn lc(mut self, lc: u8) -> Self {
        self.lc = lc;
        self
    }

    /// Literal position bits.
    pub fn lp(mut self, lp: u8) -> Self {
        self.lp = lp;
        self
    }

    /// Position bits.
    pub fn pb(mut self, pb: u8) -> Self {
        self.pb = pb;
        self
    }

    /// Compression level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Dictionary size in bytes.
    pub fn dict_size(mut self, dict_size: u32) -> Self {
        self.dict_size = dict_size;
        self
    }

    /// Container format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Size recorded in the header. Zero means unknown, and the header is
    /// written as streamed.
    pub fn uncompressed_size(mut self, size: u64) -> Self {
        self.uncompressed_size = size;
        self
    }

    fn header(&self) -> Header {
        Header {
            pb: self.pb,
            lp: self.lp,
            lc: self.lc,
            is_streamed: self.uncompressed_size == 0,
            uncompressed_size: self.uncompressed_size,
            dict_size: self.dict_size,
        }
    }
}

/// Where a [`Compressor`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressState {
    /// Fresh handle with default options.
    Created,
    /// Options have been set.
    Configured,
    /// The header reached the sink; no payload has gone to the engine yet.
    HeaderWritten,
    /// Payload has gone to the engine.
    Encoding,
    /// The run completed.
    Done,
    /// The run failed.
    Failed,
}

/// Engine and staging buffers owned by a single run.
struct EncodeSession {
    encoder: LzmaEncoder,
    in_buf: Block,
    out_buf: Block,
}

impl EncodeSession {
    fn new(options: &CompressOptions, allocator: &Allocator) -> Result<Self> {
        let encoder = LzmaEncoder::new(options, allocator).map_err(|err| {
            if err.kind() == io::ErrorKind::OutOfMemory {
                Error::Compress(err)
            } else {
                Error::EncodingProperties(err)
            }
        })?;
        let out_of_memory = || Error::Compress(io::ErrorKind::OutOfMemory.into());
        Ok(Self {
            encoder,
            in_buf: allocator.alloc(INPUT_CHUNK_SIZE).ok_or_else(out_of_memory)?,
            out_buf: allocator.alloc(OUTPUT_CHUNK_SIZE).ok_or_else(out_of_memory)?,
        })
    }
}

/// Compresses one source into an LZMA-Alone stream.
///
/// ```
/// use lzma_alone::{Compressor, Decompressor};
///
/// let mut compressed = Vec::new();
/// Compressor::default().run(&mut &b"hello"[..], &mut compressed)?;
///
/// let mut plain = Vec::new();
/// Decompressor::default().run(&mut &compressed[..], &mut plain)?;
/// assert_eq!(plain, b"hello");
/// # Ok::<(), lzma_alone::Error>(())
/// ```
#[derive(Debug)]
pub struct Compressor {
    allocator: Allocator,
    options: CompressOptions,
    state: CompressState,
    total_in: u64,
    total_out: u64,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(Allocator::default())
    }
}

impl Compressor {
    /// A handle whose memory comes from `allocator`.
    pub fn new(allocator: Allocator) -> Self {
        Self {
            allocator,
            options: CompressOptions::default(),
            state: CompressState::Created,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Replace the options for the upcoming run.
    pub fn configure(&mut self, options: CompressOptions) -> Result<()> {
        match self.state {
            CompressState::Created | CompressState::Configured => {
                self.options = options;
                self.state = CompressState::Configured;
                Ok(())
            }
            _ => Err(Error::BadParams("compressor already ran")),
        }
    }

    /// The options the next (or last) run uses.
    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CompressState {
        self.state
    }

    /// Bytes read from the source by the run.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Bytes written to the sink by the run, header included.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Compress everything `source` yields into `sink`.
    ///
    /// A handle runs once; later calls fail with [`Error::BadParams`].
    pub fn run<R, W>(&mut self, source: &mut R, sink: &mut W) -> Result<()>
    where
        R: Source + ?Sized,
        W: Sink + ?Sized,
    {
        if !matches!(
            self.state,
            CompressState::Created | CompressState::Configured
        ) {
            return Err(Error::BadParams("compressor already ran"));
        }

        let mut input = InStream::new(source);
        let mut output = OutStream::new(sink);
        let result = self.drive(&mut input, &mut output);

        self.total_in = input.total();
        self.total_out = output.total();
        match &result {
            Ok(()) => {
                self.state = CompressState::Done;
                tracing::debug!(
                    total_in = self.total_in,
                    total_out = self.total_out,
                    "compression finished"
                );
            }
            Err(err) => {
                self.state = CompressState::Failed;
                tracing::debug!(code = %err.code(), error = %err, "compression failed");
            }
        }
        result
    }

    fn drive<R, W>(
        &mut self,
        input: &mut InStream<'_, R>,
        output: &mut OutStream<'_, W>,
    ) -> Result<()>
    where
        R: Source + ?Sized,
        W: Sink + ?Sized,
    {
        let options = self.options;
        let mut session = EncodeSession::new(&options, &self.allocator)?;

        if options.format != Format::Lzma {
            return Err(Error::UnsupportedFormat(options.format));
        }

        let header = options.header();
        tracing::debug!(?header, level = ?options.level, "starting compression");
        output.push(&header.encode())?;
        self.state = CompressState::HeaderWritten;

        let EncodeSession {
            encoder,
            in_buf,
            out_buf,
        } = &mut session;

        loop {
            let read = input.pull(in_buf).map_err(Error::Compress)?;
            if read == 0 {
                break;
            }
            tracing::trace!(read, "encoding chunk");
            self.state = CompressState::Encoding;

            let mut chunk = PartialBuffer::new(&in_buf[..read]);
            while !chunk.is_full() {
                let mut produced = PartialBuffer::new(&mut out_buf[..]);
                encoder
                    .encode(&mut chunk, &mut produced)
                    .map_err(Error::Compress)?;
                output.push(produced.written())?;
            }
        }

        self.state = CompressState::Encoding;
        loop {
            let mut produced = PartialBuffer::new(&mut out_buf[..]);
            let done = encoder.finish(&mut produced).map_err(Error::Compress)?;
            output.push(produced.written())?;
            if done {
                return Ok(());
            }
        }
    }
}
