//! Streaming compression and decompression of the LZMA-Alone (`.lzma`) format.
//!
//! A [`Compressor`] pulls plain bytes from a [`Source`] and pushes a 13-byte
//! [`Header`] followed by the raw LZMA payload into a [`Sink`]. A
//! [`Decompressor`] reverses that, reading the compressed stream in 64 KiB
//! chunks until the end-of-payload marker. The LZMA codec itself is liblzma,
//! reached through the [`codec`] seam.
//!
//! Every [`std::io::Read`] is a [`Source`] and every [`std::io::Write`] is a
//! [`Sink`]:
//!
//! ```
//! use lzma_alone::{CompressOptions, Compressor, Decompressor, Level};
//!
//! let data = b"the quick brown fox jumps over the lazy dog".repeat(10);
//!
//! let mut compressor = Compressor::default();
//! compressor.configure(CompressOptions::default().level(Level::Best))?;
//! let mut compressed = Vec::new();
//! compressor.run(&mut &data[..], &mut compressed)?;
//!
//! let mut decompressor = Decompressor::default();
//! let mut plain = Vec::new();
//! decompressor.run(&mut &compressed[..], &mut plain)?;
//!
//! assert_eq!(plain, data);
//! assert!(decompressor.header().unwrap().is_streamed);
//! # Ok::<(), lzma_alone::Error>(())
//! ```
//!
//! Failures are reported as [`Error`], and each error maps to a stable
//! [`ErrorCode`].
//!
//! # Allocation
//!
//! Every allocation a run makes comes from the [`Allocator`] given to the
//! handle: the staging buffers exchanged with the codec and liblzma's own
//! state, dictionary included.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_copy_implementations,
    missing_debug_implementations
)]

pub mod alloc;
pub mod codec;
mod compress;
mod decompress;
mod error;
mod header;
mod io;
mod util;

pub use crate::{
    alloc::{AllocFn, Allocator, Block, FreeFn},
    compress::{CompressOptions, CompressState, Compressor, Format},
    decompress::{DecompressState, Decompressor},
    error::{Error, ErrorCode, Result, ResultExt},
    header::{Header, HEADER_SIZE, MAX_DICT_SIZE, PROPERTIES_SIZE},
    io::{Sink, Source},
    util::PartialBuffer,
};

/// Level of compression data should be compressed with.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Level {
    /// Fastest quality of compression, usually produces bigger size.
    Fastest,
    /// Best quality of compression, usually produces the smallest size.
    Best,
    /// Default quality of compression, liblzma preset 5.
    #[default]
    Default,
    /// A liblzma preset. Presets above 9 are not clamped; the run fails with
    /// [`Error::EncodingProperties`].
    Precise(u32),
}

impl Level {
    pub(crate) fn into_preset(self) -> u32 {
        match self {
            Self::Fastest => 0,
            Self::Best => 9,
            Self::Precise(quality) => quality,
            Self::Default => 5,
        }
    }
}
