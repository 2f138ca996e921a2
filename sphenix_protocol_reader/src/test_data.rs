//! Encoders producing synthetic wire data: FEE packets, DAM payloads, GTM taggers and packet container files.
//!
//! Used by the tests and benchmarks of this crate and of its users.
use super::packet::{FileHeader, PacketHeader, RawPacket};
use super::words::crc::crc16;
use super::words::fee_header::{HeaderFormat, FEE_PACKET_MAGIC_KEY};
use super::words::gtm::{GtmPayload, GTM_ENDAT_MAGIC_KEY, GTM_LVL1_ACCEPT_MAGIC_KEY};
use super::words::{DAM_DMA_WORD_LENGTH, FEE_MAGIC_KEY};

/// Word used to fill the last FEE block of a payload.
pub const FEE_BLOCK_PAD_WORD: u16 = 0;

/// Description of a FEE packet to encode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeePacket {
    /// Header format to encode.
    pub format: HeaderFormat,
    /// SAMPA address, 4 bits.
    pub sampa_address: u8,
    /// SAMPA channel, 5 bits.
    pub sampa_channel: u8,
    /// Local BX timestamp.
    pub bx_timestamp: u16,
    /// `(start sample, ADC values)` fragments.
    pub wavelets: Vec<(u16, Vec<u16>)>,
    /// Overrides the sample count declared for the last fragment.
    pub declared_samples: Option<u16>,
}

impl FeePacket {
    /// Encoded packet length in words.
    pub fn length(&self) -> usize {
        self.format.length()
            + self
                .wavelets
                .iter()
                .map(|(_, adc)| adc.len() + 2)
                .sum::<usize>()
            + 1
    }

    /// Encode with a correct CRC.
    pub fn encode(&self) -> Vec<u16> {
        let mut words = self.header_words(self.length());
        let last = self.wavelets.len().saturating_sub(1);
        for (idx, (start, adc)) in self.wavelets.iter().enumerate() {
            let nsamp = match self.declared_samples {
                Some(declared) if idx == last => declared,
                _ => adc.len() as u16,
            };
            words.push(nsamp);
            words.push(*start);
            words.extend_from_slice(adc);
        }
        words.push(crc16(words.iter().copied()));
        words
    }

    /// Encode like a firmware dropping the last ADC word, the CRC covers what is actually sent.
    pub fn encode_missing_last_adc(&self) -> Vec<u16> {
        let mut words = self.encode();
        let _crc = words.pop();
        let _last_adc = words.pop();
        words[0] = (words.len() + 1) as u16;
        words.push(crc16(words.iter().copied()));
        words
    }

    fn header_words(&self, pkt_length: usize) -> Vec<u16> {
        let bx = self.bx_timestamp;
        let mut words = vec![
            pkt_length as u16,
            ((bx & 1) << 9)
                | (u16::from(self.sampa_address & 0xF) << 5)
                | u16::from(self.sampa_channel & 0x1F),
            (bx >> 1) & 0x3FF,
            bx >> 11,
        ];
        words.resize(self.format.magic_offset(), 0);
        words.push(FEE_PACKET_MAGIC_KEY);
        words
    }
}

/// Wrap the word stream of board `fee` into 16 word FEE blocks, the last block padded with [FEE_BLOCK_PAD_WORD].
pub fn fee_blocks(fee: u16, stream: &[u16]) -> Vec<u16> {
    let data_words = DAM_DMA_WORD_LENGTH - 1;
    let mut payload = Vec::with_capacity(stream.len().div_ceil(data_words) * DAM_DMA_WORD_LENGTH);
    for chunk in stream.chunks(data_words) {
        payload.push(FEE_MAGIC_KEY | fee);
        payload.extend_from_slice(chunk);
        payload.resize(payload.len() + data_words - chunk.len(), FEE_BLOCK_PAD_WORD);
    }
    payload
}

/// A level-1 accept tagger block.
pub fn lvl1_block(bco: u64, lvl1_count: u32) -> [u16; DAM_DMA_WORD_LENGTH] {
    GtmPayload {
        pkt_type: GTM_LVL1_ACCEPT_MAGIC_KEY,
        bco,
        lvl1_count,
        ..Default::default()
    }
    .to_words()
}

/// An end-of-data tagger block.
pub fn endat_block(bco: u64, endat_count: u32) -> [u16; DAM_DMA_WORD_LENGTH] {
    GtmPayload {
        pkt_type: GTM_ENDAT_MAGIC_KEY,
        bco,
        endat_count,
        ..Default::default()
    }
    .to_words()
}

/// Serialize packets into a packet container file.
pub fn packet_file_bytes(run_number: u32, packets: &[RawPacket]) -> Vec<u8> {
    let mut bytes = FileHeader::new(run_number).to_bytes().to_vec();
    for packet in packets {
        let header = PacketHeader {
            packet_id: packet.packet_id,
            hit_format: packet.hit_format,
            padding: 0,
            length: packet.words.len() as u32,
        };
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend(packet.words.iter().flat_map(|w| w.to_le_bytes()));
    }
    bytes
}
