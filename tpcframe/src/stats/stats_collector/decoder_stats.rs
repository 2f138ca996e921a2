//! Contains the [DecoderStats] struct, that accumulates the quality counters of the time frame builders
use crate::util::*;

/// Accumulated decoder counters of all packet ids.
#[derive(Default, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DecoderStats {
    packets: Vec<PacketDecoderStats>,
}

/// Decoder counters of one packet id.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PacketDecoderStats {
    packet_id: i32,
    packet_words: PacketWords,
    counters: BTreeMap<String, u64>,
    fees: Vec<FeeDecoderStats>,
}

/// Decoder counters of one FEE board.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FeeDecoderStats {
    fee: u16,
    counters: BTreeMap<String, u64>,
}

/// Distribution of the packet payload lengths.
#[derive(Default, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacketWords {
    count: u64,
    min: u64,
    max: u64,
    sum: u64,
}

impl PacketWords {
    fn record(&mut self, words: u64) {
        if self.count == 0 {
            self.min = words;
            self.max = words;
        } else {
            self.min = self.min.min(words);
            self.max = self.max.max(words);
        }
        self.count += 1;
        self.sum += words;
    }

    /// Number of packets measured.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Shortest payload in words.
    pub fn min(&self) -> u64 {
        self.min
    }

    /// Longest payload in words.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Mean payload length in words.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

impl DecoderStats {
    /// Record a counter increment.
    pub fn record(&mut self, stat: DecoderStat) {
        let packet = self.packet_entry(stat.packet_id);
        if stat.counter == DecoderCounter::PacketWords {
            packet.packet_words.record(stat.amount);
            return;
        }
        *packet
            .counters
            .entry(stat.counter.label().to_owned())
            .or_default() += stat.amount;
        if let Some(fee) = stat.fee {
            let fee_stats = match packet.fees.iter().position(|f| f.fee == fee) {
                Some(idx) => &mut packet.fees[idx],
                None => {
                    packet.fees.push(FeeDecoderStats {
                        fee,
                        counters: BTreeMap::new(),
                    });
                    let last = packet.fees.len() - 1;
                    &mut packet.fees[last]
                }
            };
            *fee_stats
                .counters
                .entry(stat.counter.label().to_owned())
                .or_default() += stat.amount;
        }
    }

    fn packet_entry(&mut self, packet_id: i32) -> &mut PacketDecoderStats {
        let idx = match self.packets.iter().position(|p| p.packet_id == packet_id) {
            Some(idx) => idx,
            None => {
                self.packets.push(PacketDecoderStats {
                    packet_id,
                    packet_words: PacketWords::default(),
                    counters: BTreeMap::new(),
                    fees: Vec::new(),
                });
                self.packets.len() - 1
            }
        };
        &mut self.packets[idx]
    }

    pub(super) fn finalize(&mut self) {
        self.packets.sort_unstable_by_key(|p| p.packet_id);
        self.packets
            .iter_mut()
            .for_each(|p| p.fees.sort_unstable_by_key(|f| f.fee));
    }

    /// Decoder stats per packet id.
    pub fn packets(&self) -> &[PacketDecoderStats] {
        &self.packets
    }

    /// Sum of a counter over all packet ids.
    pub fn total(&self, counter: DecoderCounter) -> u64 {
        self.packets.iter().map(|p| p.count(counter)).sum()
    }

    /// Whether any decoder stats were recorded.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

impl PacketDecoderStats {
    /// The packet id.
    pub fn packet_id(&self) -> i32 {
        self.packet_id
    }

    /// Value of a counter for this packet id.
    pub fn count(&self, counter: DecoderCounter) -> u64 {
        self.counters.get(counter.label()).copied().unwrap_or(0)
    }

    /// Payload length distribution.
    pub fn packet_words(&self) -> PacketWords {
        self.packet_words
    }

    /// Per FEE counters.
    pub fn fees(&self) -> &[FeeDecoderStats] {
        &self.fees
    }

    pub(super) fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }
}

impl FeeDecoderStats {
    /// The FEE board.
    pub fn fee(&self) -> u16 {
        self.fee
    }

    /// Value of a counter for this board.
    pub fn count(&self, counter: DecoderCounter) -> u64 {
        self.counters.get(counter.label()).copied().unwrap_or(0)
    }

    pub(super) fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stat(packet_id: i32, fee: Option<u16>, counter: DecoderCounter, amount: u64) -> DecoderStat {
        DecoderStat {
            packet_id,
            fee,
            counter,
            amount,
        }
    }

    #[test]
    fn test_record_per_packet_and_fee() {
        let mut stats = DecoderStats::default();
        stats.record(stat(4002, Some(3), DecoderCounter::RawHit, 2));
        stats.record(stat(4001, Some(5), DecoderCounter::RawHit, 1));
        stats.record(stat(4001, Some(5), DecoderCounter::RawHit, 1));
        stats.record(stat(4001, None, DecoderCounter::Lvl1Tagger, 1));
        stats.finalize();

        assert_eq!(stats.total(DecoderCounter::RawHit), 4);
        assert_eq!(stats.packets()[0].packet_id(), 4001);
        assert_eq!(stats.packets()[0].count(DecoderCounter::RawHit), 2);
        assert_eq!(stats.packets()[0].count(DecoderCounter::Lvl1Tagger), 1);
        assert_eq!(stats.packets()[0].fees()[0].fee(), 5);
        assert_eq!(stats.packets()[0].fees()[0].count(DecoderCounter::RawHit), 2);
        assert_eq!(stats.packets()[1].fees()[0].count(DecoderCounter::RawHit), 2);
    }

    #[test]
    fn test_packet_words_distribution() {
        let mut stats = DecoderStats::default();
        for words in [10, 4, 30] {
            stats.record(stat(4001, None, DecoderCounter::PacketWords, words));
        }
        let words = stats.packets()[0].packet_words();
        assert_eq!(words.count(), 3);
        assert_eq!(words.min(), 4);
        assert_eq!(words.max(), 30);
        assert_eq!(words.mean(), Some(44.0 / 3.0));
        assert_eq!(stats.total(DecoderCounter::PacketWords), 0);
    }
}
