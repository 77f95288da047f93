/// RFC 1951 DEFLATE decompression (inflate), one byte per pull.
///
/// Supports all three block types:
/// - Type 0: Stored (no compression)
/// - Type 1: Fixed Huffman codes
/// - Type 2: Dynamic Huffman codes
///
/// [`Inflate`] is an iterator over decoded bytes. Each pull either drains a
/// byte already queued in the sliding window or advances the block state
/// machine just far enough to produce one; input is consumed strictly on
/// demand and never re-read. This module is the glue between the reusable
/// [`HuffTable`](crate::huffman::HuffTable) primitive and DEFLATE-specific
/// bit ordering, block framing, and LZ77 length/distance tables.
use crate::bits::BitReader;
use crate::huffman::{
    fixed_literal_table, HuffTable, CODE_LENGTH_CODES, DISTANCE_CODES, LITERAL_CODES,
    STATIC_DISTANCE_MAP,
};
use crate::window::{Window, MAX_MATCH};
use crate::{InflateError, InflateResult};

// ---------------------------------------------------------------------------
// DEFLATE-specific constants (RFC 1951)
// ---------------------------------------------------------------------------

/// Base lengths for length codes 257..285.
pub(crate) static LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for length codes 257..285.
pub(crate) static LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base distances for distance codes 0..29. Codes 30 and 31 do not exist
/// in a valid stream and are never looked up.
pub(crate) static DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance codes 0..29.
pub(crate) static DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order of code length alphabet codes (RFC 1951 section 3.2.7).
static CODELEN_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

// ---------------------------------------------------------------------------
// Block state machine
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    /// About to read the BFINAL bit.
    ReadFinalBit,
    /// About to read the two BTYPE bits.
    ReadBlockType,
    /// About to read the byte-aligned LEN/NLEN pair of a stored block.
    ReadStoredHeader,
    /// About to install the fixed trees.
    SetupStatic,
    /// About to decode a dynamic block header.
    SetupDynamic,
    /// Decoding symbols inside a compressed block.
    DecodeBlock,
    /// Final block fully decoded.
    Done,
}

enum LiteralTable {
    Fixed,
    Dynamic(HuffTable),
}

enum DistanceCoding {
    /// Static blocks read distance codes as a direct bit-reversed 5-bit
    /// field instead of walking a table.
    Fixed,
    Dynamic(HuffTable),
}

/// Streaming DEFLATE decoder over a byte producer.
pub struct Inflate<I: Iterator<Item = u8>> {
    bits: BitReader<I>,
    window: Window,
    state: State,
    /// BFINAL of the current block.
    is_final_block: bool,
    /// Raw bytes still to pass through from a stored block.
    stored_remaining: u16,
    literal: LiteralTable,
    distance: DistanceCoding,
    error: Option<InflateError>,
}

impl<I: Iterator<Item = u8>> Inflate<I> {
    pub fn new(source: I) -> Self {
        Inflate {
            bits: BitReader::new(source),
            window: Window::new(),
            state: State::ReadFinalBit,
            is_final_block: false,
            stored_remaining: 0,
            literal: LiteralTable::Fixed,
            distance: DistanceCoding::Fixed,
            error: None,
        }
    }

    /// Adler-32 of everything decoded so far.
    pub fn checksum(&self) -> u32 {
        self.window.checksum()
    }

    /// Read a big-endian u32 from the byte-aligned tail of the input.
    /// Used by the zlib framing layer for its trailer.
    pub(crate) fn read_aligned_u32_be(&mut self) -> InflateResult<u32> {
        self.bits.align();
        let mut value = 0u32;
        for _ in 0..4 {
            value = (value << 8) | u32::from(self.bits.next_byte()?);
        }
        Ok(value)
    }

    /// Produce the next output byte, or `None` at clean end of stream.
    fn pull(&mut self) -> InflateResult<Option<u8>> {
        loop {
            if self.window.pending() > 0 {
                return Ok(Some(self.window.take()));
            }
            if self.stored_remaining > 0 {
                let byte = self.bits.next_byte()?;
                self.window.put_literal(byte);
                self.stored_remaining -= 1;
                return Ok(Some(self.window.take()));
            }
            if self.state == State::Done {
                return Ok(None);
            }
            self.window.reduce_checksum();
            self.step()?;
        }
    }

    /// Advance the block state machine by one step.
    fn step(&mut self) -> InflateResult<()> {
        match self.state {
            State::ReadFinalBit => {
                self.is_final_block = self.bits.get(1)? != 0;
                self.state = State::ReadBlockType;
            }
            State::ReadBlockType => {
                self.state = match self.bits.get(2)? {
                    0 => State::ReadStoredHeader,
                    1 => State::SetupStatic,
                    2 => State::SetupDynamic,
                    _ => return Err(InflateError::InvalidBlockType),
                };
            }
            State::ReadStoredHeader => {
                self.bits.align();
                let len = self.bits.get(8)? | (self.bits.get(8)? << 8);
                let nlen = self.bits.get(8)? | (self.bits.get(8)? << 8);
                if len != !nlen & 0xFFFF {
                    return Err(InflateError::InvalidStoredBlockLength);
                }
                self.stored_remaining = len as u16;
                self.state = self.after_block();
            }
            State::SetupStatic => {
                self.literal = LiteralTable::Fixed;
                self.distance = DistanceCoding::Fixed;
                self.state = State::DecodeBlock;
            }
            State::SetupDynamic => {
                self.read_dynamic_header()?;
                self.state = State::DecodeBlock;
            }
            State::DecodeBlock => self.decode_block()?,
            State::Done => {}
        }
        Ok(())
    }

    /// State following the end of a block.
    fn after_block(&self) -> State {
        if self.is_final_block {
            State::Done
        } else {
            State::ReadFinalBit
        }
    }

    /// Decode symbols until end-of-block or until the window no longer has
    /// room for a maximum-length match. In the latter case the state stays
    /// `DecodeBlock` and decoding resumes once the caller drains the queue.
    fn decode_block(&mut self) -> InflateResult<()> {
        let literal: &HuffTable = match &self.literal {
            LiteralTable::Fixed => fixed_literal_table(),
            LiteralTable::Dynamic(table) => table,
        };

        while self.window.free() > MAX_MATCH {
            let symbol = usize::from(literal.next_symbol(&mut self.bits)?);
            match symbol {
                0..=255 => self.window.put_literal(symbol as u8),
                256 => {
                    self.state = self.after_block();
                    return Ok(());
                }
                257..=285 => {
                    let index = symbol - 257;
                    let length = usize::from(LENGTH_BASE[index])
                        + self.bits.get(u32::from(LENGTH_EXTRA[index]))? as usize;

                    let code = usize::from(match &self.distance {
                        DistanceCoding::Fixed => read_static_distance(&mut self.bits)?,
                        DistanceCoding::Dynamic(table) => table.next_symbol(&mut self.bits)?,
                    });
                    if code >= DIST_BASE.len() {
                        return Err(InflateError::InvalidData);
                    }
                    let distance = usize::from(DIST_BASE[code])
                        + self.bits.get(u32::from(DIST_EXTRA[code]))? as usize;

                    self.window.put_copy(length, distance);
                }
                _ => return Err(InflateError::InvalidData),
            }
        }
        Ok(())
    }

    /// Decode a dynamic block header (RFC 1951 section 3.2.7) and install
    /// the two code trees it describes.
    fn read_dynamic_header(&mut self) -> InflateResult<()> {
        let hlit = self.bits.get(5)? as usize + 257;
        let hdist = self.bits.get(5)? as usize + 1;
        let hclen = self.bits.get(4)? as usize + 4;

        let mut cl_lengths = [0u8; CODE_LENGTH_CODES];
        for &position in CODELEN_ORDER.iter().take(hclen) {
            cl_lengths[position] = self.bits.get(3)? as u8;
        }
        let cl_table = HuffTable::from_lengths(&cl_lengths)?;

        // Literal/length and distance code lengths share one flat list so
        // that repeat codes may run across the boundary.
        let total = hlit + hdist;
        let mut code_list = [0u8; LITERAL_CODES + DISTANCE_CODES];
        let mut filled = 0usize;
        while filled < total {
            match cl_table.next_symbol(&mut self.bits)? {
                symbol @ 0..=15 => {
                    code_list[filled] = symbol as u8;
                    filled += 1;
                }
                16 => {
                    if filled == 0 {
                        return Err(InflateError::InvalidRepeatCode);
                    }
                    let repeat = self.bits.get(2)? as usize + 3;
                    if filled + repeat > total {
                        return Err(InflateError::InvalidRepeatCode);
                    }
                    let previous = code_list[filled - 1];
                    for _ in 0..repeat {
                        code_list[filled] = previous;
                        filled += 1;
                    }
                }
                17 => {
                    let repeat = self.bits.get(3)? as usize + 3;
                    if filled + repeat > total {
                        return Err(InflateError::InvalidRepeatCode);
                    }
                    filled += repeat;
                }
                18 => {
                    let repeat = self.bits.get(7)? as usize + 11;
                    if filled + repeat > total {
                        return Err(InflateError::InvalidRepeatCode);
                    }
                    filled += repeat;
                }
                _ => return Err(InflateError::InvalidData),
            }
        }

        let mut literal_lengths = [0u8; LITERAL_CODES];
        literal_lengths[..hlit].copy_from_slice(&code_list[..hlit]);
        if literal_lengths[256] == 0 {
            return Err(InflateError::MissingEndOfBlock);
        }
        let mut distance_lengths = [0u8; DISTANCE_CODES];
        distance_lengths[..hdist].copy_from_slice(&code_list[hlit..total]);

        self.literal = LiteralTable::Dynamic(HuffTable::from_lengths(&literal_lengths)?);
        self.distance = DistanceCoding::Dynamic(HuffTable::from_lengths(&distance_lengths)?);
        Ok(())
    }
}

/// Static-block distance code: a raw 5-bit field, bit-reversed.
fn read_static_distance<I: Iterator<Item = u8>>(
    bits: &mut BitReader<I>,
) -> InflateResult<u16> {
    let raw = bits.peek(5);
    if bits.available() < 5 {
        return Err(InflateError::EndOfStream);
    }
    bits.skip(5);
    Ok(u16::from(STATIC_DISTANCE_MAP[raw as usize]))
}

impl<I: Iterator<Item = u8>> Iterator for Inflate<I> {
    type Item = InflateResult<u8>;

    fn next(&mut self) -> Option<InflateResult<u8>> {
        if let Some(error) = &self.error {
            return Some(Err(error.clone()));
        }
        match self.pull() {
            Ok(Some(byte)) => Some(Ok(byte)),
            Ok(None) => None,
            Err(error) => {
                self.error = Some(error.clone());
                Some(Err(error))
            }
        }
    }
}

/// Decompress a complete raw DEFLATE stream (no zlib/gzip wrapper).
pub fn inflate(data: &[u8]) -> InflateResult<Vec<u8>> {
    Inflate::new(data.iter().copied()).collect()
}
