//! Contains the [Gl1PoolInput], the reference pool reading the GL1 trigger packets.
use super::pool::{PoolError, PoolInput, ReferencePool};
use crate::util::*;
use std::collections::VecDeque;

/// Reads GL1 packets and provides their BCOs as the reference for the time frames.
pub struct Gl1PoolInput<S: PacketSource> {
    name: String,
    source: S,
    // Widened BCO and the packet it was read from
    queue: VecDeque<(u64, Gl1Packet)>,
    unwrapper: BcoUnwrapper,
    last_event_sequence: Option<u32>,
    stats_send_ch: Option<flume::Sender<StatType>>,
    exhausted: bool,
}

impl<S: PacketSource> Gl1PoolInput<S> {
    /// Create a pool reading `source`, data errors are reported through `stats_send_ch`.
    pub fn new(
        name: impl Into<String>,
        source: S,
        stats_send_ch: Option<flume::Sender<StatType>>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            queue: VecDeque::new(),
            unwrapper: BcoUnwrapper::default(),
            last_event_sequence: None,
            stats_send_ch,
            exhausted: false,
        }
    }

    /// Read one packet from the source, returns false if the source is exhausted.
    fn read_one(&mut self) -> Result<bool, PoolError> {
        if self.exhausted {
            return Ok(false);
        }
        let Some(packet) = self.source.next_packet()? else {
            log::debug!("{}: source exhausted", self.name);
            self.exhausted = true;
            return Ok(false);
        };
        if packet.hit_format != HitFormat::Gl1 {
            log::debug!(
                "{}: skipping packet {} with hit format {}",
                self.name,
                packet.packet_id,
                packet.hit_format
            );
            return Ok(true);
        }
        match Gl1Packet::from_words(packet.packet_id, &packet.words) {
            Some(gl1) => {
                let bco = self.unwrapper.widen(gl1.bco & BCO_MASK);
                self.queue.push_back((bco, gl1));
            }
            None => self.report_error(format!(
                "GL1 packet {} too short: {} words",
                packet.packet_id,
                packet.len()
            )),
        }
        Ok(true)
    }

    fn report_error(&self, msg: String) {
        match self.stats_send_ch.as_ref() {
            Some(ch) => {
                if ch.send(StatType::Error(msg.into())).is_err() {
                    log::trace!("{}: stats receiver disconnected", self.name);
                }
            }
            None => log::warn!("{msg}"),
        }
    }

    fn record_event_sequence(&mut self, evt_sequence: u32) {
        if let Some(last) = self.last_event_sequence {
            if evt_sequence != last.wrapping_add(1) {
                log::debug!(
                    "{}: GL1 event sequence jumped from {last} to {evt_sequence}",
                    self.name
                );
            }
        }
        self.last_event_sequence = Some(evt_sequence);
    }
}

impl<S: PacketSource> PoolInput for Gl1PoolInput<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill_pool(&mut self, until_bco: u64) -> Result<(), PoolError> {
        while self.queue.back().map_or(true, |(bco, _)| *bco < until_bco) {
            if !self.read_one()? {
                break;
            }
        }
        Ok(())
    }

    fn run_number(&self) -> Option<u32> {
        self.source.run_number()
    }

    fn cleanup_before(&mut self, bco: u64) {
        let before = self.queue.len();
        self.queue.retain(|(gl1_bco, _)| *gl1_bco >= bco);
        if self.queue.len() < before {
            log::debug!(
                "{}: dropped {} references below {bco:#012X}",
                self.name,
                before - self.queue.len()
            );
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted && self.queue.is_empty()
    }
}

impl<S: PacketSource> ReferencePool for Gl1PoolInput<S> {
    fn next_reference(&mut self) -> Result<Option<u64>, PoolError> {
        while self.queue.is_empty() {
            if !self.read_one()? {
                return Ok(None);
            }
        }
        Ok(self.queue.pop_front().map(|(bco, gl1)| {
            self.record_event_sequence(gl1.evt_sequence);
            bco
        }))
    }

    fn last_event_sequence(&self) -> Option<u32> {
        self.last_event_sequence
    }
}
