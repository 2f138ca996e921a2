//! Contains the [InputStats] struct, that holds stats about the packets read from the input
use crate::util::*;

/// Stores stats about the packets read from the packet files.
#[derive(Default, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputStats {
    /// Run number from the file header.
    run_number: Option<u32>,
    /// Total packets seen.
    packets_seen: u64,
    /// Total packets skipped by the packet id filter.
    packets_filtered: u64,
    /// Total payload size in bytes.
    payload_size: u64,
    /// Packet ids observed.
    packet_ids: Vec<i32>,
}

impl InputStats {
    pub(super) fn collect(&mut self, stat: InputStatType) {
        match stat {
            InputStatType::PacketIdObserved(id) => self.record_packet_id(id),
            InputStatType::PacketsSeen(n) => self.packets_seen += u64::from(n),
            InputStatType::PacketsFiltered(n) => self.packets_filtered += u64::from(n),
            InputStatType::PayloadSize(sz) => self.payload_size += sz,
            InputStatType::RunNumber(run) => self.record_run_number(run),
            InputStatType::Fatal(e) => log::trace!("Fatal input stat ignored by input stats: {e}"),
        }
    }

    /// Stores the run number, the first one recorded is kept.
    pub fn record_run_number(&mut self, run_number: u32) {
        match self.run_number {
            None => self.run_number = Some(run_number),
            Some(run) if run != run_number => {
                log::debug!("Run number {run_number} reported, keeping {run}")
            }
            Some(_) => (),
        }
    }

    /// Stores a packet id as observed if not already seen.
    pub fn record_packet_id(&mut self, packet_id: i32) {
        if !self.packet_ids.contains(&packet_id) {
            self.packet_ids.push(packet_id);
        }
    }

    pub(super) fn finalize(&mut self) {
        self.packet_ids.sort_unstable();
    }

    /// Run number of the data, if it was recorded.
    pub fn run_number(&self) -> Option<u32> {
        self.run_number
    }

    /// Total packets seen.
    pub fn packets_seen(&self) -> u64 {
        self.packets_seen
    }

    /// Total packets filtered.
    pub fn packets_filtered(&self) -> u64 {
        self.packets_filtered
    }

    /// Total payload size in bytes.
    pub fn payload_size(&self) -> u64 {
        self.payload_size
    }

    /// Packet ids observed.
    pub fn packet_ids_as_slice(&self) -> &[i32] {
        &self.packet_ids
    }
}
