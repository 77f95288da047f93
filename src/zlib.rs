/// Zlib format parsing and decompression (RFC 1950).
///
/// A zlib stream is a two-byte header (CMF, FLG), a DEFLATE stream, and a
/// four-byte big-endian Adler-32 of the decompressed data. The header is
/// validated at construction; the trailer is verified once the DEFLATE
/// stream completes cleanly, so an integrity failure only ever surfaces on
/// an otherwise well-formed stream.
use crate::inflate::Inflate;
use crate::{InflateError, InflateResult};

/// Compression method: deflate.
const CM_DEFLATE: u8 = 8;

/// Largest CINFO value the format allows (window = 1 << (8 + CINFO)).
const MAX_WINDOW_EXPONENT: u8 = 7;

/// Preset-dictionary bit in the FLG byte.
const FDICT: u8 = 1 << 5;

/// The FLEVEL hint: what effort the compressor claims to have spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    Fastest,
    Fast,
    Default,
    Best,
}

impl CompressionLevel {
    fn from_flg(flg: u8) -> Self {
        match flg >> 6 {
            0 => CompressionLevel::Fastest,
            1 => CompressionLevel::Fast,
            2 => CompressionLevel::Default,
            _ => CompressionLevel::Best,
        }
    }
}

impl std::fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionLevel::Fastest => write!(f, "fastest"),
            CompressionLevel::Fast => write!(f, "fast"),
            CompressionLevel::Default => write!(f, "default"),
            CompressionLevel::Best => write!(f, "best"),
        }
    }
}

/// Parsed zlib header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibHeader {
    /// CINFO: the compressor's window is `1 << (8 + window_exponent)`.
    pub window_exponent: u8,
    /// FLEVEL compression-effort hint.
    pub level: CompressionLevel,
}

impl ZlibHeader {
    pub fn window_size(&self) -> u32 {
        1 << (8 + self.window_exponent)
    }
}

/// Validate the CMF/FLG pair and extract the header fields.
pub fn parse_header(cmf: u8, flg: u8) -> InflateResult<ZlibHeader> {
    if cmf & 0x0F != CM_DEFLATE {
        return Err(InflateError::UnsupportedMethod);
    }
    let cinfo = cmf >> 4;
    if cinfo > MAX_WINDOW_EXPONENT {
        return Err(InflateError::InvalidWindowSize);
    }
    if (u16::from(cmf) * 256 + u16::from(flg)) % 31 != 0 {
        return Err(InflateError::InvalidHeaderCheck);
    }
    if flg & FDICT != 0 {
        return Err(InflateError::UnsupportedPreset);
    }
    Ok(ZlibHeader {
        window_exponent: cinfo,
        level: CompressionLevel::from_flg(flg),
    })
}

/// Check whether data plausibly starts a zlib stream.
pub fn is_zlib(data: &[u8]) -> bool {
    data.len() >= 2 && parse_header(data[0], data[1]).is_ok()
}

/// Streaming zlib decoder: header validation, inflate, trailer check.
pub struct ZlibDecoder<I: Iterator<Item = u8>> {
    engine: Inflate<I>,
    header: ZlibHeader,
    verified: bool,
    error: Option<InflateError>,
}

impl<I: Iterator<Item = u8>> ZlibDecoder<I> {
    /// Pull the two header bytes from `source` and validate them.
    pub fn new(mut source: I) -> InflateResult<Self> {
        let cmf = source.next().ok_or(InflateError::EndOfStream)?;
        let flg = source.next().ok_or(InflateError::EndOfStream)?;
        let header = parse_header(cmf, flg)?;
        Ok(ZlibDecoder {
            engine: Inflate::new(source),
            header,
            verified: false,
            error: None,
        })
    }

    pub fn header(&self) -> ZlibHeader {
        self.header
    }

    fn verify_trailer(&mut self) -> InflateResult<()> {
        let expected = self.engine.read_aligned_u32_be()?;
        if expected != self.engine.checksum() {
            return Err(InflateError::ChecksumMismatch);
        }
        Ok(())
    }
}

impl<I: Iterator<Item = u8>> Iterator for ZlibDecoder<I> {
    type Item = InflateResult<u8>;

    fn next(&mut self) -> Option<InflateResult<u8>> {
        if let Some(error) = &self.error {
            return Some(Err(error.clone()));
        }
        match self.engine.next() {
            // Engine errors are already sticky.
            Some(result) => Some(result),
            None => {
                if !self.verified {
                    self.verified = true;
                    if let Err(error) = self.verify_trailer() {
                        self.error = Some(error.clone());
                        return Some(Err(error));
                    }
                }
                None
            }
        }
    }
}

/// Decompress a complete zlib stream.
pub fn decompress(data: &[u8]) -> InflateResult<Vec<u8>> {
    ZlibDecoder::new(data.iter().copied())?.collect()
}
