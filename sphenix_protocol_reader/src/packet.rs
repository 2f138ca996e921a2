//! Raw packets and the layout of the packet container files they are read from.
//!
//! A container file starts with a [FileHeader], followed by records of a [PacketHeader] and its payload words.
//! All integers are little-endian.
//!
//! | field        | bytes | |
//! |--------------|-------|-|
//! | `magic`      | 4     | `b"SPRD"` |
//! | `run_number` | 4     | |
//! | `version`    | 2     | [CONTAINER_VERSION] |
//! | reserved     | 2     | |
//!
//! | field        | bytes | |
//! |--------------|-------|-|
//! | `packet_id`  | 4     | signed |
//! | `hit_format` | 2     | see [HitFormat] |
//! | `padding`    | 2     | trailing pad words included in `length` |
//! | `length`     | 4     | payload length in 16 bit words |
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Magic bytes at the start of a packet container file.
pub const CONTAINER_MAGIC: [u8; 4] = *b"SPRD";
/// Supported container version.
pub const CONTAINER_VERSION: u16 = 1;
/// Size of the [FileHeader] in bytes.
pub const FILE_HEADER_SIZE: usize = 12;
/// Size of a [PacketHeader] in bytes.
pub const PACKET_HEADER_SIZE: usize = 12;

/// Kind of payload carried by a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitFormat {
    /// DAM payload with multiplexed FEE and GTM blocks.
    TpcFee,
    /// GL1 trigger payload.
    Gl1,
    /// Any other format, carried along but never decoded.
    Unknown(u16),
}

impl HitFormat {
    /// Wire value of the format.
    pub fn to_raw(self) -> u16 {
        match self {
            HitFormat::TpcFee => 1,
            HitFormat::Gl1 => 2,
            HitFormat::Unknown(raw) => raw,
        }
    }
}

impl From<u16> for HitFormat {
    fn from(raw: u16) -> Self {
        match raw {
            1 => HitFormat::TpcFee,
            2 => HitFormat::Gl1,
            other => HitFormat::Unknown(other),
        }
    }
}

impl fmt::Display for HitFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitFormat::TpcFee => write!(f, "TPC FEE"),
            HitFormat::Gl1 => write!(f, "GL1"),
            HitFormat::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

/// One hardware packet of a packet id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Readout partition the packet belongs to.
    pub packet_id: i32,
    /// Kind of payload.
    pub hit_format: HitFormat,
    /// Payload words, padding already stripped.
    pub words: Vec<u16>,
}

impl RawPacket {
    /// Create a TPC FEE packet.
    pub fn tpc(packet_id: i32, words: Vec<u16>) -> Self {
        Self {
            packet_id,
            hit_format: HitFormat::TpcFee,
            words,
        }
    }

    /// Create a GL1 packet.
    pub fn gl1(packet_id: i32, words: Vec<u16>) -> Self {
        Self {
            packet_id,
            hit_format: HitFormat::Gl1,
            words,
        }
    }

    /// Payload length in words.
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Header of a packet container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Run the packets were recorded in.
    pub run_number: u32,
    /// Container version.
    pub version: u16,
}

impl FileHeader {
    /// Header of the current container version.
    pub fn new(run_number: u32) -> Self {
        Self {
            run_number,
            version: CONTAINER_VERSION,
        }
    }

    /// Deserialize, `None` unless the magic bytes match.
    pub fn from_bytes(bytes: &[u8; FILE_HEADER_SIZE]) -> Option<Self> {
        if bytes[0..4] != CONTAINER_MAGIC {
            return None;
        }
        Some(Self {
            run_number: LittleEndian::read_u32(&bytes[4..8]),
            version: LittleEndian::read_u16(&bytes[8..10]),
        })
    }

    /// Serialize.
    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut bytes = [0u8; FILE_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&CONTAINER_MAGIC);
        LittleEndian::write_u32(&mut bytes[4..8], self.run_number);
        LittleEndian::write_u16(&mut bytes[8..10], self.version);
        bytes
    }
}

/// Header preceding every packet record of a container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Packet id.
    pub packet_id: i32,
    /// Kind of payload.
    pub hit_format: HitFormat,
    /// Number of trailing pad words.
    pub padding: u16,
    /// Payload words including padding.
    pub length: u32,
}

impl PacketHeader {
    /// Deserialize.
    pub fn from_bytes(bytes: &[u8; PACKET_HEADER_SIZE]) -> Self {
        Self {
            packet_id: LittleEndian::read_i32(&bytes[0..4]),
            hit_format: HitFormat::from(LittleEndian::read_u16(&bytes[4..6])),
            padding: LittleEndian::read_u16(&bytes[6..8]),
            length: LittleEndian::read_u32(&bytes[8..12]),
        }
    }

    /// Serialize.
    pub fn to_bytes(&self) -> [u8; PACKET_HEADER_SIZE] {
        let mut bytes = [0u8; PACKET_HEADER_SIZE];
        LittleEndian::write_i32(&mut bytes[0..4], self.packet_id);
        LittleEndian::write_u16(&mut bytes[4..6], self.hit_format.to_raw());
        LittleEndian::write_u16(&mut bytes[6..8], self.padding);
        LittleEndian::write_u32(&mut bytes[8..12], self.length);
        bytes
    }

    /// Payload size in bytes, padding included.
    #[inline]
    pub fn payload_bytes(&self) -> u64 {
        u64::from(self.length) * 2
    }

    /// Payload words after stripping the padding.
    #[inline]
    pub fn data_words(&self) -> usize {
        (self.length as usize).saturating_sub(usize::from(self.padding))
    }
}

impl fmt::Display for PacketHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packet {id:>6} format {format:<8} length {len:>6} padding {pad}",
            id = self.packet_id,
            format = self.hit_format.to_string(),
            len = self.length,
            pad = self.padding
        )
    }
}
