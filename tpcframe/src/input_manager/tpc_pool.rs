//! Contains the [TpcPoolInput], the pool decoding TPC packets into time frames, one builder per packet id.
use super::pool::{merge_frames, PoolError, PoolInput, TpcPool};
use crate::util::*;

/// Decodes the TPC packets of one source, with a [TimeFrameBuilder] per packet id created on first sight.
pub struct TpcPoolInput<S: PacketSource, M: MetricsSink + Clone> {
    name: String,
    source: S,
    builders: BTreeMap<i32, TimeFrameBuilder<M>>,
    sink: M,
    header_format: HeaderFormat,
    bco_matcher: MatcherKind,
    retention_bco: u64,
    exhausted: bool,
    skipped_packets: u64,
}

impl<S: PacketSource, M: MetricsSink + Clone> TpcPoolInput<S, M> {
    /// Create a pool reading `source`, with builders set up from `config` reporting to `sink`.
    pub fn new(name: impl Into<String>, source: S, config: &impl DecoderOpt, sink: M) -> Self {
        Self {
            name: name.into(),
            source,
            builders: BTreeMap::new(),
            sink,
            header_format: config.header_format(),
            bco_matcher: config.bco_matcher(),
            retention_bco: config.retention_bco(),
            exhausted: false,
            skipped_packets: 0,
        }
    }

    /// Packet ids decoded so far.
    pub fn packet_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.builders.keys().copied()
    }

    /// Hits held by all builders, drained or not yet matched.
    pub fn buffered_hits(&self) -> usize {
        self.builders
            .values()
            .map(|b| b.hit_count() + b.pending_count())
            .sum()
    }

    /// The newest GTM BCO all builders that decoded any tagger have reached.
    fn newest_gtm_bco(&self) -> Option<u64> {
        self.builders
            .values()
            .filter_map(TimeFrameBuilder::newest_gtm_bco)
            .min()
    }

    fn builder(&mut self, packet_id: i32) -> &mut TimeFrameBuilder<M> {
        let (header_format, bco_matcher, retention_bco) =
            (self.header_format, self.bco_matcher, self.retention_bco);
        let sink = &self.sink;
        self.builders.entry(packet_id).or_insert_with(|| {
            TimeFrameBuilder::with_parts(
                packet_id,
                header_format,
                bco_matcher.build(),
                retention_bco,
                sink.clone(),
            )
        })
    }
}

impl<S: PacketSource, M: MetricsSink + Clone> PoolInput for TpcPoolInput<S, M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill_pool(&mut self, until_bco: u64) -> Result<(), PoolError> {
        while self.newest_gtm_bco().map_or(true, |newest| newest < until_bco) {
            if !self.fill_next()? {
                break;
            }
        }
        Ok(())
    }

    fn run_number(&self) -> Option<u32> {
        self.source.run_number()
    }

    fn cleanup_before(&mut self, bco: u64) {
        let released: usize = self
            .builders
            .values_mut()
            .map(|builder| builder.cleanup_before(bco))
            .sum();
        if released > 0 {
            log::trace!("{}: released {released} hits below {bco:#012X}", self.name);
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<S: PacketSource, M: MetricsSink + Clone> TpcPool for TpcPoolInput<S, M> {
    fn drain_window(&mut self, lo: u64, hi: u64) -> Vec<TimeFrame> {
        merge_frames(
            self.builders
                .values_mut()
                .flat_map(|builder| builder.drain_window(lo, hi)),
        )
    }

    fn fill_next(&mut self) -> Result<bool, PoolError> {
        if self.exhausted {
            return Ok(false);
        }
        let Some(packet) = self.source.next_packet()? else {
            log::debug!(
                "{}: source exhausted, {} packet ids decoded, {} packets skipped",
                self.name,
                self.builders.len(),
                self.skipped_packets
            );
            self.exhausted = true;
            return Ok(false);
        };
        match packet.hit_format {
            HitFormat::TpcFee => self.builder(packet.packet_id).process_packet(&packet)?,
            other => {
                self.skipped_packets += 1;
                log::debug!(
                    "{}: skipping packet {} with hit format {other}",
                    self.name,
                    packet.packet_id
                );
            }
        }
        Ok(true)
    }

    fn next_lvl1_after(&self, after: Option<u64>) -> Option<u64> {
        self.builders
            .values()
            .filter_map(|builder| builder.next_lvl1_after(after))
            .min()
    }

    fn gtm_taggers(&self, lo: u64, hi: u64) -> Vec<(i32, u64, GtmPayload)> {
        self.builders
            .values()
            .flat_map(|builder| {
                builder
                    .gtm_taggers()
                    .filter(|(bco, _)| (lo..=hi).contains(bco))
                    .map(|(bco, gtm)| (builder.packet_id(), bco, *gtm))
            })
            .sorted_by_key(|(_, bco, _)| *bco)
            .collect()
    }
}
