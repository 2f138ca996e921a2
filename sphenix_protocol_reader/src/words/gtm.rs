//! Decoder for the GTM (global timing module) records embedded in the DAM stream.
//!
//! A GTM record is one full demultiplexer block of 16 words. Viewed as 32 little-endian bytes:
//!
//! | bytes  | field         |
//! |--------|---------------|
//! | 0..2   | packet type   |
//! | 2..8   | BCO           |
//! | 8..12  | level-1 count |
//! | 12..16 | end-dat count |
//! | 16..22 | last BCO      |
//! | 22     | mode bits     |
use super::{words_to_le_bytes, BCO_MASK, DAM_DMA_WORD_LENGTH};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Packet type of a level-1 accept tagger.
pub const GTM_LVL1_ACCEPT_MAGIC_KEY: u16 = 0xBBF0;
/// Packet type of an end-of-data tagger.
pub const GTM_ENDAT_MAGIC_KEY: u16 = 0xBBF1;

const GTM_BYTE_LENGTH: usize = DAM_DMA_WORD_LENGTH * 2;

/// A decoded GTM tagger.
///
/// `bco` and `last_bco` hold the 40 valid bits of the global clock, widening to 64 bits happens in the
/// [assembler](crate::time_frame::assembler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GtmPayload {
    /// Either [GTM_LVL1_ACCEPT_MAGIC_KEY] or [GTM_ENDAT_MAGIC_KEY].
    pub pkt_type: u16,
    /// Global BCO of the tagger.
    pub bco: u64,
    /// Running count of level-1 accepts.
    pub lvl1_count: u32,
    /// Running count of end-of-data markers.
    pub endat_count: u32,
    /// BCO of the previous tagger.
    pub last_bco: u64,
    /// GTM mode bits.
    pub modebits: u8,
}

/// Reasons a block is rejected by [GtmPayload::from_words].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtmDecodeError {
    /// Fewer than 16 words were available.
    ShortBlock(usize),
    /// The packet type is not a known tagger.
    UnknownPacketType(u16),
}

impl fmt::Display for GtmDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GtmDecodeError::ShortBlock(len) => write!(
                f,
                "GTM block needs {DAM_DMA_WORD_LENGTH} words, only {len} available"
            ),
            GtmDecodeError::UnknownPacketType(pkt_type) => {
                write!(f, "Unknown GTM packet type {pkt_type:#06X}")
            }
        }
    }
}

impl std::error::Error for GtmDecodeError {}

impl GtmPayload {
    /// Decode a GTM tagger from the first 16 words of `block`.
    pub fn from_words(block: &[u16]) -> Result<Self, GtmDecodeError> {
        let block = block
            .get(..DAM_DMA_WORD_LENGTH)
            .ok_or(GtmDecodeError::ShortBlock(block.len()))?;
        let mut bytes = [0u8; GTM_BYTE_LENGTH];
        words_to_le_bytes(block, &mut bytes);

        let pkt_type = LittleEndian::read_u16(&bytes[0..2]);
        if pkt_type != GTM_LVL1_ACCEPT_MAGIC_KEY && pkt_type != GTM_ENDAT_MAGIC_KEY {
            return Err(GtmDecodeError::UnknownPacketType(pkt_type));
        }

        Ok(Self {
            pkt_type,
            bco: LittleEndian::read_uint(&bytes[2..8], 6) & BCO_MASK,
            lvl1_count: LittleEndian::read_u32(&bytes[8..12]),
            endat_count: LittleEndian::read_u32(&bytes[12..16]),
            last_bco: LittleEndian::read_uint(&bytes[16..22], 6) & BCO_MASK,
            modebits: bytes[22],
        })
    }

    /// Encode the tagger back into a 16 word block.
    pub fn to_words(&self) -> [u16; DAM_DMA_WORD_LENGTH] {
        let mut bytes = [0u8; GTM_BYTE_LENGTH];
        LittleEndian::write_u16(&mut bytes[0..2], self.pkt_type);
        LittleEndian::write_uint(&mut bytes[2..8], self.bco & BCO_MASK, 6);
        LittleEndian::write_u32(&mut bytes[8..12], self.lvl1_count);
        LittleEndian::write_u32(&mut bytes[12..16], self.endat_count);
        LittleEndian::write_uint(&mut bytes[16..22], self.last_bco & BCO_MASK, 6);
        bytes[22] = self.modebits;
        let mut words = [0u16; DAM_DMA_WORD_LENGTH];
        LittleEndian::read_u16_into(&bytes, &mut words);
        words
    }

    /// Level-1 accept tagger.
    #[inline]
    pub fn is_lvl1(&self) -> bool {
        self.pkt_type == GTM_LVL1_ACCEPT_MAGIC_KEY
    }

    /// End-of-data tagger.
    #[inline]
    pub fn is_endat(&self) -> bool {
        self.pkt_type == GTM_ENDAT_MAGIC_KEY
    }
}

impl fmt::Display for GtmPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_lvl1() { "LVL1" } else { "ENDAT" };
        write!(
            f,
            "{kind:<5} bco: {bco:#012X} lvl1_count: {lvl1} endat_count: {endat} last_bco: {last:#012X} modebits: {mode:#04X}",
            bco = self.bco,
            lvl1 = self.lvl1_count,
            endat = self.endat_count,
            last = self.last_bco,
            mode = self.modebits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_lvl1() {
        // bytes: F0 BB | 05 04 03 02 01 00 | 07 00 00 00 | 02 00 00 00 | 15 14 13 12 11 00 | 0A
        let mut block = [0u16; 16];
        block[0] = 0xBBF0;
        block[1] = 0x0405;
        block[2] = 0x0203;
        block[3] = 0x0001;
        block[4] = 0x0007;
        block[6] = 0x0002;
        block[8] = 0x1415;
        block[9] = 0x1213;
        block[10] = 0x0011;
        block[11] = 0x000A;

        let gtm = GtmPayload::from_words(&block).unwrap();

        assert!(gtm.is_lvl1());
        assert!(!gtm.is_endat());
        assert_eq!(gtm.bco, 0x01_0203_0405);
        assert_eq!(gtm.lvl1_count, 7);
        assert_eq!(gtm.endat_count, 2);
        assert_eq!(gtm.last_bco, 0x11_1213_1415);
        assert_eq!(gtm.modebits, 0x0A);
    }

    #[test]
    fn test_bco_masked_to_40_bits() {
        let mut block = [0u16; 16];
        block[0] = GTM_ENDAT_MAGIC_KEY;
        block[1] = 0xFFFF;
        block[2] = 0xFFFF;
        block[3] = 0xFFFF;

        let gtm = GtmPayload::from_words(&block).unwrap();

        assert!(gtm.is_endat());
        assert_eq!(gtm.bco, BCO_MASK);
    }

    #[test]
    fn test_reject_unknown_type() {
        let mut block = [0u16; 16];
        block[0] = 0xBBF2;
        assert_eq!(
            GtmPayload::from_words(&block),
            Err(GtmDecodeError::UnknownPacketType(0xBBF2))
        );
    }

    #[test]
    fn test_reject_short_block() {
        let block = [GTM_LVL1_ACCEPT_MAGIC_KEY; 15];
        assert_eq!(
            GtmPayload::from_words(&block),
            Err(GtmDecodeError::ShortBlock(15))
        );
    }

    #[test]
    fn test_encode_decode_tagger() {
        let gtm = GtmPayload {
            pkt_type: GTM_LVL1_ACCEPT_MAGIC_KEY,
            bco: 0xAB_CDEF_0123,
            lvl1_count: 42,
            endat_count: 41,
            last_bco: 0xAB_CDEF_0000,
            modebits: 3,
        };
        assert_eq!(GtmPayload::from_words(&gtm.to_words()), Ok(gtm));
    }
}
