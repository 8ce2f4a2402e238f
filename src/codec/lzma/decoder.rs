use std::{fmt, io};

use super::stream::{lzma1_options, Action, RawStream};
use crate::{
    alloc::Allocator,
    codec::{Decode, DecodeStatus},
    util::PartialBuffer,
    Header,
};

/// liblzma rounds smaller dictionaries up to this size.
const MIN_DICT_SIZE: u32 = 4096;

/// Raw LZMA1 decoding stream configured from an LZMA-Alone header.
///
/// Decoding always runs until the end-of-payload marker; the size recorded in
/// the header is not used to stop early.
pub struct LzmaDecoder {
    stream: RawStream,
}

impl fmt::Debug for LzmaDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LzmaDecoder")
            .field("stream", &self.stream)
            .finish()
    }
}

impl LzmaDecoder {
    /// Allocate decoder state, dictionary included, for the properties in
    /// `header`. All of it comes from `allocator`.
    pub fn new(header: &Header, allocator: &Allocator) -> io::Result<Self> {
        let mut lzma = lzma1_options(
            0,
            header.dict_size.max(MIN_DICT_SIZE),
            header.lc,
            header.lp,
            header.pb,
        )?;

        Ok(Self {
            stream: RawStream::decoder(&mut lzma, allocator)?,
        })
    }
}

impl Decode for LzmaDecoder {
    fn decode(
        &mut self,
        input: &mut PartialBuffer<impl AsRef<[u8]>>,
        output: &mut PartialBuffer<impl AsRef<[u8]> + AsMut<[u8]>>,
    ) -> io::Result<DecodeStatus> {
        let previous_in = self.stream.total_in();
        let previous_out = self.stream.total_out();

        let done = self
            .stream
            .process(input.unwritten(), output.unwritten_mut(), Action::Run)?;

        input.advance((self.stream.total_in() - previous_in) as usize);
        output.advance((self.stream.total_out() - previous_out) as usize);

        Ok(if done {
            DecodeStatus::FinishedWithMark
        } else if output.is_full() {
            DecodeStatus::NotFinished
        } else {
            DecodeStatus::NeedsMoreInput
        })
    }
}
