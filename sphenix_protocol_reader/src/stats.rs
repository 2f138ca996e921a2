//! Contains the [InputStatType] enum for which kind of statistics are gathered, and the [Stats] struct for tracking and reporting statistics about the input data.

#[allow(variant_size_differences)] // Allow in this case, the string is already a pointer.
#[derive(Debug, Clone, PartialEq)]
/// Possible stats that can be sent to the StatsController.
pub enum InputStatType {
    /// Fatal error, stop processing.
    Fatal(Box<str>),
    /// Run number from the file header.
    RunNumber(u32),
    /// A packet id was seen for the first time.
    PacketIdObserved(i32),
    /// Increment the total packets seen.
    PacketsSeen(u32),
    /// Increment the total packets skipped by the packet id filter.
    PacketsFiltered(u32),
    /// Increment the total payload size in bytes.
    PayloadSize(u64),
}

const REPORT_EVERY_PACKETS: u32 = 1000;
const REPORT_EVERY_BYTES: u64 = 10 * 1048576; // 10 MB

/// Struct for tracking and reporting statistics about the input data.
#[derive(Debug)]
pub struct Stats {
    reporter: flume::Sender<InputStatType>,
    packets_seen: u32,
    packets_filtered: u32,
    payload_size_seen: u64,
    unique_packet_ids_observed: Vec<i32>,
}

impl Stats {
    /// Create a new [Stats] instance.
    pub fn new(reporter: flume::Sender<InputStatType>) -> Self {
        Self {
            reporter,
            packets_seen: 0,
            packets_filtered: 0,
            payload_size_seen: 0,
            unique_packet_ids_observed: Vec::new(),
        }
    }

    fn send(&self, stat: InputStatType) {
        if self.reporter.send(stat).is_err() {
            log::trace!("Input stats receiver disconnected");
        }
    }

    /// Attempt to add a packet id to the observed packet ids (is only added if not already present in the list).
    pub fn try_add_packet_id(&mut self, packet_id: i32) {
        if !self.unique_packet_ids_observed.contains(&packet_id) {
            self.unique_packet_ids_observed.push(packet_id);
            self.send(InputStatType::PacketIdObserved(packet_id));
        }
    }

    /// Increment the packets seen counter.
    pub fn packet_seen(&mut self) {
        self.packets_seen += 1;
        if self.packets_seen == REPORT_EVERY_PACKETS {
            self.send(InputStatType::PacketsSeen(REPORT_EVERY_PACKETS));
            self.packets_seen = 0;
        }
    }

    /// Increment the packets filtered counter.
    pub fn packet_filtered(&mut self) {
        self.packets_filtered += 1;
        if self.packets_filtered == REPORT_EVERY_PACKETS {
            self.send(InputStatType::PacketsFiltered(REPORT_EVERY_PACKETS));
            self.packets_filtered = 0;
        }
    }

    /// Add a payload size to the total payload size seen.
    pub fn add_payload_size(&mut self, payload_size: u64) {
        self.payload_size_seen += payload_size;
        if self.payload_size_seen > REPORT_EVERY_BYTES {
            self.send(InputStatType::PayloadSize(self.payload_size_seen));
            self.payload_size_seen = 0;
        }
    }

    /// Flush the stats to the reporter channel (sends all the current stats).
    pub fn flush_stats(&mut self) {
        self.send(InputStatType::PacketsSeen(self.packets_seen));
        self.send(InputStatType::PacketsFiltered(self.packets_filtered));
        self.send(InputStatType::PayloadSize(self.payload_size_seen));
        self.packets_seen = 0;
        self.packets_filtered = 0;
        self.payload_size_seen = 0;
    }
}
