//! GL1 (global level-1) packets, the source of the reference BCO.
//!
//! Payload words: BCO as a little-endian `u64` over words 0..4, event sequence as a little-endian `u32` over words 4..6.
use super::words_to_le_bytes;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Default packet id of the GL1 packets.
pub const GL1_PACKET_ID: i32 = 14001;

/// Number of payload words of a GL1 packet.
pub const GL1_PAYLOAD_WORDS: usize = 6;

const GL1_BYTE_LENGTH: usize = GL1_PAYLOAD_WORDS * 2;

/// A decoded GL1 packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gl1Packet {
    /// Packet id the record was read from.
    pub packet_id: i32,
    /// Global BCO of the trigger, not masked.
    pub bco: u64,
    /// Event sequence number of the trigger.
    pub evt_sequence: u32,
}

impl Gl1Packet {
    /// Decode a GL1 packet from its payload words, `None` if the payload is too short.
    pub fn from_words(packet_id: i32, words: &[u16]) -> Option<Self> {
        let words = words.get(..GL1_PAYLOAD_WORDS)?;
        let mut bytes = [0u8; GL1_BYTE_LENGTH];
        words_to_le_bytes(words, &mut bytes);
        Some(Self {
            packet_id,
            bco: LittleEndian::read_u64(&bytes[0..8]),
            evt_sequence: LittleEndian::read_u32(&bytes[8..12]),
        })
    }

    /// Encode the payload words of the packet.
    pub fn to_words(&self) -> [u16; GL1_PAYLOAD_WORDS] {
        let mut bytes = [0u8; GL1_BYTE_LENGTH];
        LittleEndian::write_u64(&mut bytes[0..8], self.bco);
        LittleEndian::write_u32(&mut bytes[8..12], self.evt_sequence);
        let mut words = [0u16; GL1_PAYLOAD_WORDS];
        LittleEndian::read_u16_into(&bytes, &mut words);
        words
    }
}

impl fmt::Display for Gl1Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GL1 packet {id} event {evt} bco: {bco:#012X}",
            id = self.packet_id,
            evt = self.evt_sequence,
            bco = self.bco
        )
    }
}
