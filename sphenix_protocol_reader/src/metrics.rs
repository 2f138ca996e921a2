//! Quality counters emitted while decoding, and the [MetricsSink] trait that receives them.
//!
//! Every component that counts something is handed a sink at construction instead of reaching for a global registry.
//! [CounterSink] keeps the counts in memory, a [flume::Sender] forwards them to another thread,
//! and `()` discards them.
use std::collections::BTreeMap;
use std::fmt;

/// The counters recorded by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DecoderCounter {
    /// A raw packet was handed to a builder.
    Packet,
    /// Payload length of a raw packet in words (distribution, not a count).
    PacketWords,
    /// Level-1 accept tagger decoded.
    Lvl1Tagger,
    /// End-of-data tagger decoded.
    EnDatTagger,
    /// A FEE packet header passed the framing check.
    ChannelPacket,
    /// Waveform fragment decoded.
    Waveform,
    /// Words committed as part of a valid FEE packet.
    WordValid,
    /// Words dropped one at a time to regain framing.
    WordSkipped,
    /// Hit emitted.
    RawHit,
    /// Header length or fragment layout inconsistent with the packet length.
    HitFormatError,
    /// Last fragment one sample short at the packet boundary.
    MissingLastAdc,
    /// FEE packet discarded due to a CRC mismatch.
    HitCrcError,
    /// FEE block tagged with a board index out of range.
    InvalidFeeId,
    /// Demultiplexer block with an unknown tag.
    UnknownStreamTag,
    /// Demultiplexer block cut short by the end of the packet.
    TruncatedBlock,
    /// GTM block with an unknown packet type.
    InvalidGtmPayload,
    /// End-of-data tagger without a preceding level-1 accept.
    UnpairedEnDat,
    /// Hit matched to a BCO that was already drained.
    LateHit,
    /// Hit removed by the retention prune before it was drained.
    StaleHitPruned,
    /// Hit dropped while waiting for trigger information.
    UnmatchedHitDropped,
}

impl DecoderCounter {
    /// All counters in report order.
    pub const ALL: [DecoderCounter; 20] = [
        DecoderCounter::Packet,
        DecoderCounter::PacketWords,
        DecoderCounter::Lvl1Tagger,
        DecoderCounter::EnDatTagger,
        DecoderCounter::ChannelPacket,
        DecoderCounter::Waveform,
        DecoderCounter::WordValid,
        DecoderCounter::WordSkipped,
        DecoderCounter::RawHit,
        DecoderCounter::HitFormatError,
        DecoderCounter::MissingLastAdc,
        DecoderCounter::HitCrcError,
        DecoderCounter::InvalidFeeId,
        DecoderCounter::UnknownStreamTag,
        DecoderCounter::TruncatedBlock,
        DecoderCounter::InvalidGtmPayload,
        DecoderCounter::UnpairedEnDat,
        DecoderCounter::LateHit,
        DecoderCounter::StaleHitPruned,
        DecoderCounter::UnmatchedHitDropped,
    ];

    /// Label used in reports and serialized stats.
    pub fn label(self) -> &'static str {
        match self {
            DecoderCounter::Packet => "Packet",
            DecoderCounter::PacketWords => "PacketWords",
            DecoderCounter::Lvl1Tagger => "Lv1-Taggers",
            DecoderCounter::EnDatTagger => "EnDat-Taggers",
            DecoderCounter::ChannelPacket => "ChannelPackets",
            DecoderCounter::Waveform => "Waveforms",
            DecoderCounter::WordValid => "WordValid",
            DecoderCounter::WordSkipped => "WordSkipped",
            DecoderCounter::RawHit => "RawHit",
            DecoderCounter::HitFormatError => "HitFormatError",
            DecoderCounter::MissingLastAdc => "MissingLastADC",
            DecoderCounter::HitCrcError => "HitCRCError",
            DecoderCounter::InvalidFeeId => "InvalidFeeId",
            DecoderCounter::UnknownStreamTag => "UnknownStreamTag",
            DecoderCounter::TruncatedBlock => "TruncatedBlock",
            DecoderCounter::InvalidGtmPayload => "InvalidGtmPayload",
            DecoderCounter::UnpairedEnDat => "UnpairedEnDat",
            DecoderCounter::LateHit => "LateHit",
            DecoderCounter::StaleHitPruned => "StaleHitPruned",
            DecoderCounter::UnmatchedHitDropped => "UnmatchedHitDropped",
        }
    }

    /// Look up a counter by its [label](DecoderCounter::label).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Counters that indicate corrupt or inconsistent input data.
    pub fn is_data_error(self) -> bool {
        matches!(
            self,
            DecoderCounter::WordSkipped
                | DecoderCounter::HitFormatError
                | DecoderCounter::HitCrcError
                | DecoderCounter::InvalidFeeId
                | DecoderCounter::UnknownStreamTag
                | DecoderCounter::TruncatedBlock
                | DecoderCounter::InvalidGtmPayload
        )
    }

    /// Counters kept per FEE board.
    pub fn is_per_fee(self) -> bool {
        matches!(
            self,
            DecoderCounter::WordValid
                | DecoderCounter::WordSkipped
                | DecoderCounter::RawHit
                | DecoderCounter::HitFormatError
                | DecoderCounter::MissingLastAdc
                | DecoderCounter::HitCrcError
        )
    }
}

impl fmt::Display for DecoderCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One counter increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderStat {
    /// Packet id of the builder that recorded it.
    pub packet_id: i32,
    /// FEE board, for per board counters.
    pub fee: Option<u16>,
    /// What is counted.
    pub counter: DecoderCounter,
    /// Increment, or the measured value for distributions.
    pub amount: u64,
}

impl fmt::Display for DecoderStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fee {
            Some(fee) => write!(
                f,
                "packet {} FEE {fee}: {} += {}",
                self.packet_id, self.counter, self.amount
            ),
            None => write!(
                f,
                "packet {}: {} += {}",
                self.packet_id, self.counter, self.amount
            ),
        }
    }
}

/// Receives the counters recorded by the decoder.
pub trait MetricsSink {
    /// Record one counter increment.
    fn record(&mut self, stat: DecoderStat);
}

impl MetricsSink for () {
    #[inline]
    fn record(&mut self, _stat: DecoderStat) {}
}

impl<T> MetricsSink for &mut T
where
    T: MetricsSink,
{
    fn record(&mut self, stat: DecoderStat) {
        (**self).record(stat)
    }
}

impl<T> MetricsSink for Box<T>
where
    T: MetricsSink + ?Sized,
{
    fn record(&mut self, stat: DecoderStat) {
        (**self).record(stat)
    }
}

/// Forwards every increment through the channel, converted to the receiver's message type.
///
/// A disconnected receiver is not an error for the decoder, the increment is dropped.
impl<T> MetricsSink for flume::Sender<T>
where
    T: From<DecoderStat>,
{
    fn record(&mut self, stat: DecoderStat) {
        if self.send(T::from(stat)).is_err() {
            log::trace!("Metrics receiver disconnected, dropped {stat}");
        }
    }
}

/// In-memory counters, summed over packet ids.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CounterSink {
    totals: BTreeMap<DecoderCounter, u64>,
    per_fee: BTreeMap<(DecoderCounter, u16), u64>,
    records: u64,
}

impl CounterSink {
    /// Total of a counter over all boards.
    pub fn total(&self, counter: DecoderCounter) -> u64 {
        self.totals.get(&counter).copied().unwrap_or(0)
    }

    /// Count of a per board counter for one board.
    pub fn fee_count(&self, counter: DecoderCounter, fee: u16) -> u64 {
        self.per_fee.get(&(counter, fee)).copied().unwrap_or(0)
    }

    /// Number of increments recorded.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Sum of all data error counters.
    pub fn data_errors(&self) -> u64 {
        self.totals
            .iter()
            .filter(|(c, _)| c.is_data_error())
            .map(|(_, n)| n)
            .sum()
    }
}

impl MetricsSink for CounterSink {
    fn record(&mut self, stat: DecoderStat) {
        self.records += 1;
        *self.totals.entry(stat.counter).or_default() += stat.amount;
        if let Some(fee) = stat.fee {
            *self.per_fee.entry((stat.counter, fee)).or_default() += stat.amount;
        }
    }
}

/// Binds a [MetricsSink] to the packet id of the component recording into it.
#[derive(Debug)]
pub struct MetricsRecorder<M> {
    packet_id: i32,
    sink: M,
}

impl<M: MetricsSink> MetricsRecorder<M> {
    /// Record into `sink` on behalf of `packet_id`.
    pub fn new(packet_id: i32, sink: M) -> Self {
        Self { packet_id, sink }
    }

    /// Packet id the increments are recorded for.
    #[inline]
    pub fn packet_id(&self) -> i32 {
        self.packet_id
    }

    /// Increment `counter` by one.
    #[inline]
    pub fn count(&mut self, counter: DecoderCounter) {
        self.add(counter, None, 1);
    }

    /// Increment the per board `counter` of `fee` by one.
    #[inline]
    pub fn count_fee(&mut self, counter: DecoderCounter, fee: u16) {
        self.add(counter, Some(fee), 1);
    }

    /// Increment `counter` by `amount`.
    pub fn add(&mut self, counter: DecoderCounter, fee: Option<u16>, amount: u64) {
        self.sink.record(DecoderStat {
            packet_id: self.packet_id,
            fee,
            counter,
            amount,
        });
    }

    /// The wrapped sink.
    pub fn sink(&self) -> &M {
        &self.sink
    }

    /// Take back the wrapped sink.
    pub fn into_sink(self) -> M {
        self.sink
    }
}
