use std::{fmt, io};

/// Result type used by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Stable numeric identifiers for the outcome of a run.
///
/// The discriminants are part of the public contract and never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// The run completed.
    Ok = 0,
    /// A handle was misused, e.g. run twice.
    BadParams = 10,
    /// The codec engine rejected the encoder configuration.
    EncodingPropertiesError = 11,
    /// Compression failed, including a failed source read during encoding.
    CompressError = 12,
    /// The requested container format is not supported.
    UnsupportedFormat = 13,
    /// The sink failed or consumed fewer bytes than it was given.
    OutputError = 14,
    /// The source failed, or ended inside the header.
    InputError = 15,
    /// The 13-byte header is not a valid LZMA-Alone header.
    CorruptHeader = 16,
    /// The compressed stream ended before its end-of-payload marker.
    InsufficientInput = 17,
    /// The codec engine failed while decompressing.
    DecompressError = 18,
}

impl ErrorCode {
    /// The numeric value of this code.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::BadParams => "bad parameters",
            Self::EncodingPropertiesError => "encoding properties error",
            Self::CompressError => "compress error",
            Self::UnsupportedFormat => "unsupported format",
            Self::OutputError => "output error",
            Self::InputError => "input error",
            Self::CorruptHeader => "corrupt header",
            Self::InsufficientInput => "insufficient input",
            Self::DecompressError => "decompress error",
        };
        f.write_str(name)
    }
}

/// Errors produced by compress and decompress runs.
///
/// Each variant corresponds to exactly one non-`Ok` [`ErrorCode`]. Variants that
/// originate from the codec engine or from a caller-supplied source or sink keep
/// the underlying [`io::Error`] as their source.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A handle was used outside of its state machine.
    #[error("bad parameters: {0}")]
    BadParams(&'static str),

    /// The codec engine rejected the configured encoder properties.
    #[error("encoder rejected the configured properties")]
    EncodingProperties(#[source] io::Error),

    /// Compression failed, including a failed source read during encoding.
    #[error("compression failed")]
    Compress(#[source] io::Error),

    /// Only the LZMA-Alone container is supported.
    #[error("unsupported container format: {0}")]
    UnsupportedFormat(crate::Format),

    /// The sink failed or reported a short write.
    #[error("sink accepted {written} of {expected} bytes")]
    Output {
        /// Bytes the sink was given.
        expected: usize,
        /// Bytes the sink reported as written.
        written: usize,
        /// Error reported by the sink, if any.
        #[source]
        source: Option<io::Error>,
    },

    /// The source failed while decompressing, or ended before a complete
    /// header was read.
    #[error("could not read input")]
    Input(#[source] io::Error),

    /// The header failed validation.
    #[error("corrupt LZMA-Alone header: {0}")]
    CorruptHeader(&'static str),

    /// The source reached end of input before the end-of-payload marker.
    #[error("compressed stream ended before its end marker")]
    InsufficientInput,

    /// The codec engine failed while decompressing.
    #[error("decompression failed")]
    Decompress(#[source] io::Error),
}

impl Error {
    /// The stable code identifying this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BadParams(_) => ErrorCode::BadParams,
            Self::EncodingProperties(_) => ErrorCode::EncodingPropertiesError,
            Self::Compress(_) => ErrorCode::CompressError,
            Self::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            Self::Output { .. } => ErrorCode::OutputError,
            Self::Input(_) => ErrorCode::InputError,
            Self::CorruptHeader(_) => ErrorCode::CorruptHeader,
            Self::InsufficientInput => ErrorCode::InsufficientInput,
            Self::Decompress(_) => ErrorCode::DecompressError,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err.code() {
            ErrorCode::BadParams | ErrorCode::EncodingPropertiesError => io::ErrorKind::InvalidInput,
            ErrorCode::UnsupportedFormat => io::ErrorKind::Unsupported,
            ErrorCode::OutputError => io::ErrorKind::WriteZero,
            ErrorCode::InsufficientInput => io::ErrorKind::UnexpectedEof,
            ErrorCode::CorruptHeader | ErrorCode::DecompressError => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// Extension for collapsing a run result into its [`ErrorCode`].
pub trait ResultExt {
    /// [`ErrorCode::Ok`] on success, otherwise the error's code.
    fn code(&self) -> ErrorCode;
}

impl<T> ResultExt for Result<T> {
    fn code(&self) -> ErrorCode {
        match self {
            Ok(_) => ErrorCode::Ok,
            Err(err) => err.code(),
        }
    }
}
