use std::{fmt, io};

use super::stream::{lzma1_options, Action, RawStream};
use crate::{alloc::Allocator, codec::Encode, util::PartialBuffer, CompressOptions};

/// Raw LZMA1 encoding stream.
///
/// Produces the bare LZMA payload, always terminated by an end-of-payload
/// marker; the container header is written by the caller.
pub struct LzmaEncoder {
    stream: RawStream,
}

impl fmt::Debug for LzmaEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LzmaEncoder")
            .field("stream", &self.stream)
            .finish()
    }
}

impl LzmaEncoder {
    /// Configure an encoder from `options`, taking all engine memory from
    /// `allocator`.
    ///
    /// The level selects the liblzma preset, then `lc`, `lp`, `pb` and the
    /// dictionary size override it. Values liblzma does not accept are
    /// reported here.
    pub fn new(options: &CompressOptions, allocator: &Allocator) -> io::Result<Self> {
        let mut lzma = lzma1_options(
            options.level.into_preset(),
            options.dict_size,
            options.lc,
            options.lp,
            options.pb,
        )?;

        Ok(Self {
            stream: RawStream::encoder(&mut lzma, allocator)?,
        })
    }

    fn process(
        &mut self,
        input: &[u8],
        output: &mut PartialBuffer<impl AsRef<[u8]> + AsMut<[u8]>>,
        action: Action,
    ) -> io::Result<(bool, usize)> {
        let previous_in = self.stream.total_in();
        let previous_out = self.stream.total_out();

        let done = self.stream.process(input, output.unwritten_mut(), action)?;

        output.advance((self.stream.total_out() - previous_out) as usize);

        Ok((done, (self.stream.total_in() - previous_in) as usize))
    }
}

impl Encode for LzmaEncoder {
    fn encode(
        &mut self,
        input: &mut PartialBuffer<impl AsRef<[u8]>>,
        output: &mut PartialBuffer<impl AsRef<[u8]> + AsMut<[u8]>>,
    ) -> io::Result<()> {
        let (_, consumed) = self.process(input.unwritten(), output, Action::Run)?;
        input.advance(consumed);
        Ok(())
    }

    fn finish(
        &mut self,
        output: &mut PartialBuffer<impl AsRef<[u8]> + AsMut<[u8]>>,
    ) -> io::Result<bool> {
        let (done, _) = self.process(&[], output, Action::Finish)?;
        Ok(done)
    }
}
