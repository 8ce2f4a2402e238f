//! The seam between the stream drivers and the codec engine.
//!
//! Drivers only talk to the engine through [`Encode`] and [`Decode`]: the
//! engine is handed a partially consumed input buffer and a partially filled
//! output buffer and advances both.

use std::io::Result;

use crate::util::PartialBuffer;

mod lzma;

pub use self::lzma::{LzmaDecoder, LzmaEncoder};

/// Progress reported by [`Decode::decode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Everything the engine could decode from the input it was given has
    /// been produced; more input is needed to continue.
    NeedsMoreInput,
    /// The output buffer was filled; the engine may hold more output even if
    /// the input is used up.
    NotFinished,
    /// The end-of-payload marker was decoded. The stream is complete.
    FinishedWithMark,
}

/// Abstraction for encoders.
pub trait Encode {
    /// Encode the provided input buffer into the provided output buffer.
    fn encode(
        &mut self,
        input: &mut PartialBuffer<impl AsRef<[u8]>>,
        output: &mut PartialBuffer<impl AsRef<[u8]> + AsMut<[u8]>>,
    ) -> Result<()>;

    /// Finish the encoding into the provided output buffer, writing the
    /// end-of-payload marker.
    ///
    /// Returns `true` iff the internal buffers have been completely flushed.
    fn finish(
        &mut self,
        output: &mut PartialBuffer<impl AsRef<[u8]> + AsMut<[u8]>>,
    ) -> Result<bool>;
}

/// Abstraction for decoders.
pub trait Decode {
    /// Decode the provided input buffer into the provided output buffer.
    ///
    /// The decoder may stop at any point where it is safe to resume, not only
    /// at block boundaries.
    fn decode(
        &mut self,
        input: &mut PartialBuffer<impl AsRef<[u8]>>,
        output: &mut PartialBuffer<impl AsRef<[u8]> + AsMut<[u8]>>,
    ) -> Result<DecodeStatus>;
}
