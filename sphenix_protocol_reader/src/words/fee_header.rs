//! FEE packet header and the header formats used by different firmware revisions.
//!
//! Word layout shared by both formats:
//!
//! | word | content                                                          |
//! |------|------------------------------------------------------------------|
//! | 0    | packet length in words, header and trailing CRC included          |
//! | 1    | `[15:9]` BX timestamp low bits, `[8:5]` SAMPA address, `[4:0]` SAMPA channel |
//! | 2    | `[9:0]` BX timestamp                                             |
//! | 3    | `[8:0]` BX timestamp high bits                                   |
//!
//! The framing marker `0xFE` sits in the last header word (word 4 or word 6).
use std::fmt;

/// Value of the framing marker word.
pub const FEE_PACKET_MAGIC_KEY: u16 = 0xFE;

/// Header format of the FEE packets, selected by configuration as the stream carries no version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderFormat {
    /// 5 word header, framing marker at word 4.
    #[default]
    V1,
    /// 7 word header, framing marker at word 6.
    V2,
}

impl HeaderFormat {
    /// Number of header words.
    #[inline]
    pub const fn length(self) -> usize {
        match self {
            HeaderFormat::V1 => 5,
            HeaderFormat::V2 => 7,
        }
    }

    /// Position of the framing marker word within the header.
    #[inline]
    pub const fn magic_offset(self) -> usize {
        self.length() - 1
    }
}

impl fmt::Display for HeaderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderFormat::V1 => write!(f, "v1 ({} words)", self.length()),
            HeaderFormat::V2 => write!(f, "v2 ({} words)", self.length()),
        }
    }
}

impl std::str::FromStr for HeaderFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" | "5" => Ok(HeaderFormat::V1),
            "v2" | "7" => Ok(HeaderFormat::V2),
            _ => Err(format!(
                "Invalid FEE header format: {s}, expected v1 (5 words) or v2 (7 words)"
            )),
        }
    }
}

/// Decoded FEE packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeHeader {
    /// Packet length in words, header and CRC included.
    pub pkt_length: u16,
    /// SAMPA chip address on the board.
    pub sampa_address: u8,
    /// Channel on the SAMPA chip.
    pub sampa_channel: u8,
    /// Channel on the board.
    pub channel: u16,
    /// Local BX timestamp of the FEE.
    pub bx_timestamp: u16,
}

impl FeeHeader {
    /// Decode the header fields from the first four words of a packet.
    ///
    /// Returns `None` if fewer than four words are given.
    pub fn from_words(words: &[u16]) -> Option<Self> {
        let &[w0, w1, w2, w3, ..] = words else {
            return None;
        };
        Some(Self::from_head([w0, w1, w2, w3]))
    }

    /// Decode the header fields from the four leading words of a packet.
    pub fn from_head(head: [u16; 4]) -> Self {
        let [w0, w1, w2, w3] = head;
        let bx_timestamp =
            (u32::from(w3 & 0x1FF) << 11) | (u32::from(w2 & 0x3FF) << 1) | u32::from(w1 >> 9);
        Self {
            pkt_length: w0,
            sampa_address: ((w1 >> 5) & 0xF) as u8,
            sampa_channel: (w1 & 0x1F) as u8,
            channel: w1 & 0x1FF,
            // The hardware field is wider than the stored timestamp, only the low 16 bits are kept
            bx_timestamp: bx_timestamp as u16,
        }
    }
}

impl fmt::Display for FeeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "len: {len:>4} sampa: {addr:>2}/{chan:>2} channel: {ch:>3} bx: {bx:#06X}",
            len = self.pkt_length,
            addr = self.sampa_address,
            chan = self.sampa_channel,
            ch = self.channel,
            bx = self.bx_timestamp
        )
    }
}
