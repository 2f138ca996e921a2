//! Fixed-layout words and records found in the TPC DAM data stream.
//!
//! Every record here is decoded from a slice of 16 bit words, the native word size of the stream.
//! Decoders never read past the slice they are handed and report a short slice as an error instead.

use byteorder::{ByteOrder, LittleEndian};

pub mod crc;
pub mod fee_header;
pub mod gl1;
pub mod gtm;

/// Length of one demultiplexer block in 16 bit words ("DAM DMA word").
pub const DAM_DMA_WORD_LENGTH: usize = 16;

/// Top byte of a word tagging a FEE data block.
pub const FEE_MAGIC_KEY: u16 = 0xBA00;
/// Top byte of a word tagging a GTM data block.
pub const GTM_MAGIC_KEY: u16 = 0xBB00;
/// Mask selecting the tag byte of a demultiplexer word.
pub const STREAM_TAG_MASK: u16 = 0xFF00;

/// Number of FEE boards multiplexed into one packet.
pub const MAX_FEECOUNT: usize = 26;

/// Width of the global BCO counter distributed by the GTM and GL1.
pub const BCO_BITS: u32 = 40;
/// Mask selecting the valid bits of a global BCO.
pub const BCO_MASK: u64 = (1 << BCO_BITS) - 1;

/// Convert a slice of 16 bit words to the little-endian byte layout the hardware writes them in.
pub(crate) fn words_to_le_bytes(words: &[u16], bytes: &mut [u8]) {
    debug_assert_eq!(words.len() * 2, bytes.len());
    LittleEndian::write_u16_into(words, bytes);
}
