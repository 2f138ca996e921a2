//! Contains the [PacketSource] trait, anything raw packets can be pulled from.
use super::packet::RawPacket;
use std::collections::VecDeque;
use std::io;

/// Pull based source of raw packets.
pub trait PacketSource {
    /// The next packet, `None` when the source is exhausted.
    fn next_packet(&mut self) -> io::Result<Option<RawPacket>>;

    /// Run number of the data, once known.
    fn run_number(&self) -> Option<u32>;
}

impl PacketSource for VecDeque<RawPacket> {
    fn next_packet(&mut self) -> io::Result<Option<RawPacket>> {
        Ok(self.pop_front())
    }

    fn run_number(&self) -> Option<u32> {
        None
    }
}

impl<T> PacketSource for Box<T>
where
    T: PacketSource + ?Sized,
{
    fn next_packet(&mut self) -> io::Result<Option<RawPacket>> {
        (**self).next_packet()
    }

    fn run_number(&self) -> Option<u32> {
        (**self).run_number()
    }
}

/// In-memory packets of a known run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PacketQueue {
    run_number: u32,
    packets: VecDeque<RawPacket>,
}

impl PacketQueue {
    /// Queue `packets` recorded in `run_number`.
    pub fn new(run_number: u32, packets: impl IntoIterator<Item = RawPacket>) -> Self {
        Self {
            run_number,
            packets: packets.into_iter().collect(),
        }
    }

    /// Append a packet.
    pub fn push(&mut self, packet: RawPacket) {
        self.packets.push_back(packet);
    }

    /// Packets left.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// No packets left.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

impl PacketSource for PacketQueue {
    fn next_packet(&mut self) -> io::Result<Option<RawPacket>> {
        self.packets.next_packet()
    }

    fn run_number(&self) -> Option<u32> {
        Some(self.run_number)
    }
}
