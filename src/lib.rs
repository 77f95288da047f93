pub mod adler32;
pub mod bits;
pub mod huffman;
pub mod inflate;
pub mod window;
pub mod zlib;


/// Error types for inflow operations.
///
/// DEFLATE-layer kinds surface from [`inflate::Inflate`]; the zlib header
/// and trailer kinds surface from [`zlib::ZlibDecoder`]. Errors are sticky:
/// once a decoder has failed, every subsequent pull repeats the same error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InflateError {
    /// The byte producer exhausted while the decoder still needed bits.
    EndOfStream,
    /// Block type field was 3 (reserved).
    InvalidBlockType,
    /// Stored-block LEN and NLEN are not one's-complements of each other.
    InvalidStoredBlockLength,
    /// Code-length vector does not describe a usable canonical prefix code.
    InvalidHuffmanData,
    /// Dynamic header assigned no code to the end-of-block symbol (256).
    MissingEndOfBlock,
    /// Code-length repeat with no previous entry, or overrunning the header.
    InvalidRepeatCode,
    /// Compressed data is invalid or corrupt.
    InvalidData,
    /// Zlib compression method is not deflate.
    UnsupportedMethod,
    /// Zlib window size exceeds the format maximum.
    InvalidWindowSize,
    /// Zlib header bytes fail the mod-31 check.
    InvalidHeaderCheck,
    /// Zlib stream requires a preset dictionary (FDICT).
    UnsupportedPreset,
    /// Trailing Adler-32 does not match the decompressed data.
    ChecksumMismatch,
}

impl std::fmt::Display for InflateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfStream => write!(f, "unexpected end of stream"),
            Self::InvalidBlockType => write!(f, "invalid block type"),
            Self::InvalidStoredBlockLength => write!(f, "invalid stored block length"),
            Self::InvalidHuffmanData => write!(f, "invalid huffman code lengths"),
            Self::MissingEndOfBlock => write!(f, "no end-of-block code in literal table"),
            Self::InvalidRepeatCode => write!(f, "invalid code-length repeat"),
            Self::InvalidData => write!(f, "invalid compressed data"),
            Self::UnsupportedMethod => write!(f, "unsupported zlib compression method"),
            Self::InvalidWindowSize => write!(f, "invalid zlib window size"),
            Self::InvalidHeaderCheck => write!(f, "zlib header check failed"),
            Self::UnsupportedPreset => write!(f, "preset dictionaries are not supported"),
            Self::ChecksumMismatch => write!(f, "adler-32 checksum mismatch"),
        }
    }
}

impl std::error::Error for InflateError {}

pub type InflateResult<T> = Result<T, InflateError>;
