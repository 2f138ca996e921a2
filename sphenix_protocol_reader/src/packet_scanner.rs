//! Contains the [PacketScanner], reading raw packets from a packet container file or stdin.
//!
//! The [PacketScanner] implements [PacketSource].

use super::bufreader_wrapper::BufferedReaderWrapper;
use super::config::filter::FilterOpt;
use super::packet::{
    FileHeader, PacketHeader, RawPacket, CONTAINER_VERSION, FILE_HEADER_SIZE, PACKET_HEADER_SIZE,
};
use super::packet_source::PacketSource;
use super::stats::{InputStatType, Stats};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read};

/// Largest payload accepted in a single packet record, in words.
pub const MAX_PACKET_WORDS: u32 = 1 << 24;

/// Scans data read through a [BufferedReaderWrapper] and sends [InputStatType] through the [`flume::Sender<InputStatType>`] channel.
///
/// Uses [FilterOpt] to skip packets of packet ids the user did not select.
#[derive(Debug)]
pub struct PacketScanner<R: ?Sized + BufferedReaderWrapper> {
    reader: Box<R>,
    file_header: Option<FileHeader>,
    filter_packet_ids: Vec<i32>,
    stats_controller_sender_ch: Option<flume::Sender<InputStatType>>,
    stats: Option<Stats>,
    bytes_read: u64,
}

impl<R: ?Sized + BufferedReaderWrapper> PacketScanner<R> {
    /// Creates a new [PacketScanner] from a config that implemenents [FilterOpt], [BufferedReaderWrapper], and a producer channel for [InputStatType].
    pub fn new(
        config: &impl FilterOpt,
        reader: Box<R>,
        stats_controller_sender_ch: Option<flume::Sender<InputStatType>>,
    ) -> Self {
        Self {
            reader,
            file_header: None,
            filter_packet_ids: config.filter_packet_ids().to_vec(),
            stats_controller_sender_ch: stats_controller_sender_ch.clone(),
            stats: stats_controller_sender_ch.map(Stats::new),
            bytes_read: 0,
        }
    }

    /// Creates a new [PacketScanner] with minimal functionality from a [BufferedReaderWrapper].
    ///
    /// No filter and no stats, the [PacketScanner] still loads all packets.
    pub fn minimal(reader: Box<R>) -> Self {
        Self {
            reader,
            file_header: Default::default(),
            filter_packet_ids: Default::default(),
            stats_controller_sender_ch: Default::default(),
            stats: Default::default(),
            bytes_read: 0,
        }
    }

    #[inline]
    fn report(&self, stat: InputStatType) {
        if let Some(stats_sender) = self.stats_controller_sender_ch.as_ref() {
            if stats_sender.send(stat).is_err() {
                log::trace!("Input stats receiver disconnected");
            }
        }
    }

    fn fatal(&self, kind: io::ErrorKind, msg: String) -> io::Error {
        self.report(InputStatType::Fatal(msg.clone().into_boxed_str()));
        io::Error::new(kind, msg)
    }

    /// Reads and validates the file header, on the first call only.
    pub fn load_file_header(&mut self) -> io::Result<FileHeader> {
        if let Some(header) = self.file_header {
            return Ok(header);
        }
        let mut bytes = [0u8; FILE_HEADER_SIZE];
        self.reader.read_exact(&mut bytes).map_err(|e| {
            self.fatal(
                io::ErrorKind::InvalidData,
                format!("Failed to read packet file header: {e}"),
            )
        })?;
        self.bytes_read += FILE_HEADER_SIZE as u64;
        let header = FileHeader::from_bytes(&bytes).ok_or_else(|| {
            self.fatal(
                io::ErrorKind::InvalidData,
                format!("Not a packet file, file header starts with {:02X?}", &bytes[..4]),
            )
        })?;
        if header.version != CONTAINER_VERSION {
            return Err(self.fatal(
                io::ErrorKind::InvalidData,
                format!(
                    "Unsupported packet file version {}, expected {CONTAINER_VERSION}",
                    header.version
                ),
            ));
        }
        log::debug!(
            "Packet file of run {run} version {version}",
            run = header.run_number,
            version = header.version
        );
        self.report(InputStatType::RunNumber(header.run_number));
        self.file_header = Some(header);
        Ok(header)
    }

    // Reads the next record header, `None` on a clean end of file
    fn load_packet_header(&mut self) -> io::Result<Option<PacketHeader>> {
        let mut bytes = [0u8; PACKET_HEADER_SIZE];
        let mut filled = 0;
        while filled < PACKET_HEADER_SIZE {
            match self.reader.read(&mut bytes[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(self.fatal(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "[{pos:#X}]: packet header truncated after {filled} bytes",
                            pos = self.bytes_read
                        ),
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        let header = PacketHeader::from_bytes(&bytes);
        if header.length > MAX_PACKET_WORDS || u32::from(header.padding) > header.length {
            return Err(self.fatal(
                io::ErrorKind::InvalidData,
                format!("[{pos:#X}]: invalid {header}", pos = self.bytes_read),
            ));
        }
        self.bytes_read += PACKET_HEADER_SIZE as u64;
        Ok(Some(header))
    }

    /// Reads the next packet that passes the packet id filter, `None` at the end of the input.
    pub fn load_packet(&mut self) -> io::Result<Option<RawPacket>> {
        let _ = self.load_file_header()?;
        loop {
            let Some(header) = self.load_packet_header()? else {
                return Ok(None);
            };
            if let Some(stats) = self.stats.as_mut() {
                stats.packet_seen();
                stats.try_add_packet_id(header.packet_id);
            }

            if !self.filter_packet_ids.is_empty()
                && !self.filter_packet_ids.contains(&header.packet_id)
            {
                if let Some(stats) = self.stats.as_mut() {
                    stats.packet_filtered();
                }
                let skip = header.payload_bytes();
                BufferedReaderWrapper::seek_relative(&mut *self.reader, skip as i64)?;
                self.bytes_read += skip;
                continue;
            }

            let mut words = vec![0u16; header.length as usize];
            self.reader
                .read_u16_into::<LittleEndian>(&mut words)
                .map_err(|e| {
                    self.fatal(
                        e.kind(),
                        format!(
                            "[{pos:#X}]: failed to read payload of {header}: {e}",
                            pos = self.bytes_read
                        ),
                    )
                })?;
            self.bytes_read += header.payload_bytes();
            if let Some(stats) = self.stats.as_mut() {
                stats.add_payload_size(header.payload_bytes());
            }
            words.truncate(header.data_words());
            log::trace!("Loaded {header}");
            return Ok(Some(RawPacket {
                packet_id: header.packet_id,
                hit_format: header.hit_format,
                words,
            }));
        }
    }

    /// Bytes consumed from the input so far.
    pub fn current_mem_pos(&self) -> u64 {
        self.bytes_read
    }
}

impl<R> PacketSource for PacketScanner<R>
where
    R: ?Sized + BufferedReaderWrapper,
{
    fn next_packet(&mut self) -> io::Result<Option<RawPacket>> {
        self.load_packet()
    }

    fn run_number(&self) -> Option<u32> {
        self.file_header.map(|header| header.run_number)
    }
}

impl<R> Drop for PacketScanner<R>
where
    R: ?Sized + BufferedReaderWrapper,
{
    fn drop(&mut self) {
        if let Some(mut stat_tracker) = self.stats.take() {
            stat_tracker.flush_stats();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::mock_config::MockConfig;
    use crate::packet::{HitFormat, PacketHeader};
    use crate::test_data::packet_file_bytes;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use temp_dir::TempDir;

    fn packets() -> Vec<RawPacket> {
        vec![
            RawPacket::tpc(4001, vec![1, 2, 3]),
            RawPacket::gl1(14001, vec![10, 0, 0, 0, 1, 0]),
            RawPacket::tpc(4002, vec![4, 5]),
            RawPacket::tpc(4001, vec![6]),
        ]
    }

    fn scanner(bytes: Vec<u8>) -> PacketScanner<Cursor<Vec<u8>>> {
        PacketScanner::minimal(Box::new(Cursor::new(bytes)))
    }

    #[test]
    fn test_load_all_packets() {
        let mut scanner = scanner(packet_file_bytes(42, &packets()));
        let mut loaded = Vec::new();
        while let Some(packet) = scanner.next_packet().unwrap() {
            loaded.push(packet);
        }
        assert_eq!(loaded, packets());
        assert_eq!(scanner.run_number(), Some(42));
    }

    #[test]
    fn test_filter_packet_ids() {
        let config = MockConfig {
            filter_packet_ids: vec![4001],
            ..Default::default()
        };
        let (send, recv) = flume::unbounded();
        let loaded: Vec<RawPacket> = {
            let mut scanner = PacketScanner::new(
                &config,
                Box::new(Cursor::new(packet_file_bytes(7, &packets()))),
                Some(send),
            );
            std::iter::from_fn(|| scanner.next_packet().unwrap()).collect()
        };

        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|p| p.packet_id == 4001));
        let stats: Vec<InputStatType> = recv.try_iter().collect();
        assert!(stats.contains(&InputStatType::RunNumber(7)));
        assert!(stats.contains(&InputStatType::PacketsSeen(4)));
        assert!(stats.contains(&InputStatType::PacketsFiltered(2)));
        assert!(stats.contains(&InputStatType::PacketIdObserved(14001)));
    }

    #[test]
    fn test_padding_stripped() {
        let mut bytes = packet_file_bytes(1, &[]);
        let header = PacketHeader {
            packet_id: 4001,
            hit_format: HitFormat::TpcFee,
            padding: 2,
            length: 4,
        };
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend([1u8, 0, 2, 0, 0, 0, 0, 0]);

        let packet = scanner(bytes).next_packet().unwrap().unwrap();

        assert_eq!(packet.words, vec![1, 2]);
    }

    #[test]
    fn test_bad_magic_is_fatal() {
        let mut bytes = packet_file_bytes(1, &packets());
        bytes[0] = b'X';
        let (send, recv) = flume::unbounded();
        let mut scanner = PacketScanner::new(
            &MockConfig::default(),
            Box::new(Cursor::new(bytes)),
            Some(send),
        );

        let err = scanner.next_packet().unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(recv.try_recv(), Ok(InputStatType::Fatal(_))));
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = packet_file_bytes(1, &packets()[..1]);
        let _ = bytes.pop();
        let err = scanner(bytes).next_packet().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_from_file() {
        let tmp_d = TempDir::new().unwrap();
        let test_file_path = tmp_d.child("test.sprd");
        std::fs::write(&test_file_path, packet_file_bytes(3, &packets())).unwrap();

        let reader = crate::init_reader(Some(&test_file_path)).unwrap();
        let config = MockConfig {
            filter_packet_ids: vec![4002],
            ..Default::default()
        };
        let mut scanner = PacketScanner::new(&config, reader, None);

        assert_eq!(
            scanner.next_packet().unwrap(),
            Some(RawPacket::tpc(4002, vec![4, 5]))
        );
        assert_eq!(scanner.next_packet().unwrap(), None);
    }
}
