//! The decompress stream driver.

use std::io;

use crate::{
    alloc::{Allocator, Block},
    codec::{Decode, DecodeStatus, LzmaDecoder},
    header::HEADER_SIZE,
    io::{InStream, OutStream, Sink, Source},
    util::PartialBuffer,
    Error, Header, Result,
};

const INPUT_CHUNK_SIZE: usize = 64 * 1024;
const OUTPUT_CHUNK_SIZE: usize = 256 * 1024;

/// Where a [`Decompressor`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompressState {
    /// Fresh handle.
    Created,
    /// A valid header was read.
    HeaderRead,
    /// Decoder state and staging buffers exist; no payload has been read.
    Allocated,
    /// Payload has gone to the decoder.
    Decoding,
    /// The end-of-payload marker was reached.
    FinishedWithMark,
    /// The run failed.
    Failed,
}

/// Engine and staging buffers owned by a single run.
struct DecodeSession {
    decoder: LzmaDecoder,
    in_buf: Block,
    out_buf: Block,
}

impl DecodeSession {
    fn new(header: &Header, allocator: &Allocator) -> Result<Self> {
        let decoder = LzmaDecoder::new(header, allocator).map_err(Error::Decompress)?;
        let out_of_memory = || Error::Decompress(io::ErrorKind::OutOfMemory.into());
        Ok(Self {
            decoder,
            in_buf: allocator.alloc(INPUT_CHUNK_SIZE).ok_or_else(out_of_memory)?,
            out_buf: allocator.alloc(OUTPUT_CHUNK_SIZE).ok_or_else(out_of_memory)?,
        })
    }
}

/// Decompresses one LZMA-Alone stream.
#[derive(Debug)]
pub struct Decompressor {
    allocator: Allocator,
    state: DecompressState,
    header: Option<Header>,
    total_in: u64,
    total_out: u64,
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new(Allocator::default())
    }
}

impl Decompressor {
    /// A handle whose memory comes from `allocator`.
    pub fn new(allocator: Allocator) -> Self {
        Self {
            allocator,
            state: DecompressState::Created,
            header: None,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DecompressState {
        self.state
    }

    /// The header parsed by the run, once one has been read.
    pub fn header(&self) -> Option<Header> {
        self.header
    }

    /// Compressed bytes read from the source, header included.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Decompressed bytes written to the sink.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Decompress the stream `source` yields into `sink`.
    ///
    /// Decoding stops at the end-of-payload marker; any bytes after it are
    /// left unread or ignored. A handle runs once; later calls fail with
    /// [`Error::BadParams`].
    pub fn run<R, W>(&mut self, source: &mut R, sink: &mut W) -> Result<()>
    where
        R: Source + ?Sized,
        W: Sink + ?Sized,
    {
        if self.state != DecompressState::Created {
            return Err(Error::BadParams("decompressor already ran"));
        }

        let mut input = InStream::new(source);
        let mut output = OutStream::new(sink);
        let result = self.drive(&mut input, &mut output);

        self.total_in = input.total();
        self.total_out = output.total();
        match &result {
            Ok(()) => {
                self.state = DecompressState::FinishedWithMark;
                tracing::debug!(
                    total_in = self.total_in,
                    total_out = self.total_out,
                    "decompression finished"
                );
            }
            Err(err) => {
                self.state = DecompressState::Failed;
                tracing::debug!(code = %err.code(), error = %err, "decompression failed");
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
        let mut raw = [0; HEADER_SIZE];
        let read = input.pull_full(&mut raw)?;
        if read < HEADER_SIZE {
            return Err(Error::Input(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended after {read} of {HEADER_SIZE} header bytes"),
            )));
        }

        let header = Header::decode(&raw)?;
        self.header = Some(header);
        self.state = DecompressState::HeaderRead;
        tracing::debug!(
            ?header,
            declared_size = ?header.uncompressed_size(),
            "starting decompression"
        );

        let mut session = DecodeSession::new(&header, &self.allocator)?;
        self.state = DecompressState::Allocated;

        let DecodeSession {
            decoder,
            in_buf,
            out_buf,
        } = &mut session;
        decode_chunks(decoder, input, output, in_buf, out_buf, &mut self.state)
    }
}

/// Feed `input` to `decoder` one chunk at a time until the end marker.
///
/// Output pending inside the decoder is drained before the next chunk is read.
fn decode_chunks<D, R, W>(
    decoder: &mut D,
    input: &mut InStream<'_, R>,
    output: &mut OutStream<'_, W>,
    in_buf: &mut [u8],
    out_buf: &mut [u8],
    state: &mut DecompressState,
) -> Result<()>
where
    D: Decode,
    R: Source + ?Sized,
    W: Sink + ?Sized,
{
    loop {
        let read = input.pull(in_buf).map_err(Error::Input)?;
        if read == 0 {
            return Err(Error::InsufficientInput);
        }
        tracing::trace!(read, "decoding chunk");
        *state = DecompressState::Decoding;

        let mut chunk = PartialBuffer::new(&in_buf[..read]);
        loop {
            let pending = chunk.unwritten().len();
            let mut produced = PartialBuffer::new(&mut *out_buf);
            let status = decoder
                .decode(&mut chunk, &mut produced)
                .map_err(Error::Decompress)?;
            output.push(produced.written())?;

            if status == DecodeStatus::FinishedWithMark {
                let trailing = chunk.unwritten().len();
                if trailing > 0 {
                    tracing::warn!(trailing, "ignoring data after the end marker");
                }
                return Ok(());
            }

            let progressed =
                chunk.unwritten().len() < pending || !produced.written().is_empty();
            if !progressed {
                if chunk.is_full() {
                    break;
                }
                return Err(Error::Decompress(io::Error::other(
                    "decoder made no progress",
                )));
            }

            if chunk.is_full() && status != DecodeStatus::NotFinished {
                break;
            }
        }
    }
}
