//! Buckets matched hits by global BCO and releases them in time order.
use super::bco::BcoUnwrapper;
use super::gtm_sequence::{GtmSequence, SequenceEvent};
use super::matcher::BcoMatcher;
use super::TimeFrame;
use crate::metrics::{DecoderCounter, MetricsRecorder, MetricsSink};
use crate::raw_hit::RawHit;
use crate::words::gtm::GtmPayload;
use std::collections::{BTreeMap, VecDeque};

/// Default distance behind the newest BCO after which buckets are pruned.
pub const DEFAULT_RETENTION_BCO: u64 = 65536;
/// Default number of hits waiting for trigger information.
pub const DEFAULT_PENDING_CAPACITY: usize = 16384;

/// Owns the hits of one packet id from matching until they are drained.
#[derive(Debug)]
pub struct TimeFrameAssembler {
    matcher: Box<dyn BcoMatcher>,
    frames: BTreeMap<u64, Vec<RawHit>>,
    gtm: BTreeMap<u64, GtmPayload>,
    unwrapper: BcoUnwrapper,
    sequence: GtmSequence,
    pending: VecDeque<RawHit>,
    pending_capacity: usize,
    retention: u64,
    drain_watermark: Option<u64>,
    newest_gtm_bco: Option<u64>,
}

impl TimeFrameAssembler {
    /// Create an assembler matching hits with `matcher` and pruning buckets older than `retention` BCO.
    pub fn new(matcher: Box<dyn BcoMatcher>, retention: u64) -> Self {
        Self {
            matcher,
            frames: BTreeMap::new(),
            gtm: BTreeMap::new(),
            unwrapper: BcoUnwrapper::default(),
            sequence: GtmSequence::new(),
            pending: VecDeque::new(),
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            retention,
            drain_watermark: None,
            newest_gtm_bco: None,
        }
    }

    /// Change how many unmatched hits are kept waiting.
    pub fn with_pending_capacity(mut self, capacity: usize) -> Self {
        self.pending_capacity = capacity;
        self
    }

    /// Record a decoded GTM tagger, widening its BCO.
    pub fn add_gtm<M: MetricsSink>(&mut self, gtm: GtmPayload, metrics: &mut MetricsRecorder<M>) {
        let bco = self.unwrapper.widen(gtm.bco);
        self.newest_gtm_bco = Some(self.newest_gtm_bco.map_or(bco, |newest| newest.max(bco)));
        let _ = self.gtm.insert(bco, gtm);

        if gtm.is_lvl1() {
            let _ = self.sequence.lvl1();
            self.matcher.on_lvl1(bco);
            self.match_pending(metrics);
        } else if self.sequence.endat() == SequenceEvent::UnpairedEnDat {
            log::debug!(
                "Packet {pid}: end-of-data at {bco:#012X} without level-1 accept",
                pid = metrics.packet_id()
            );
            metrics.count(DecoderCounter::UnpairedEnDat);
        }
    }

    /// Match `hit` and file it into its bucket, or keep it waiting for trigger information.
    pub fn add_hit<M: MetricsSink>(&mut self, hit: RawHit, metrics: &mut MetricsRecorder<M>) {
        match self.matcher.match_hit(&hit) {
            Some(bco) => self.place(hit, bco, metrics),
            None => {
                if self.pending.len() >= self.pending_capacity {
                    if let Some(dropped) = self.pending.pop_front() {
                        metrics.count_fee(DecoderCounter::UnmatchedHitDropped, dropped.fee);
                    }
                }
                self.pending.push_back(hit);
            }
        }
    }

    fn match_pending<M: MetricsSink>(&mut self, metrics: &mut MetricsRecorder<M>) {
        let waiting = std::mem::take(&mut self.pending);
        for hit in waiting {
            match self.matcher.match_hit(&hit) {
                Some(bco) => self.place(hit, bco, metrics),
                None => self.pending.push_back(hit),
            }
        }
    }

    fn place<M: MetricsSink>(
        &mut self,
        mut hit: RawHit,
        bco: u64,
        metrics: &mut MetricsRecorder<M>,
    ) {
        if self.drain_watermark.is_some_and(|watermark| bco < watermark) {
            log::trace!(
                "Packet {pid}: late hit at {bco:#012X} dropped",
                pid = metrics.packet_id()
            );
            metrics.count_fee(DecoderCounter::LateHit, hit.fee);
            return;
        }
        hit.gtm_bco = bco;
        self.frames.entry(bco).or_default().push(hit);
    }

    /// Remove buckets and GTM taggers older than the retention distance behind `reference`.
    ///
    /// Returns the number of hits removed. Pruning twice with the same reference removes nothing the second time.
    pub fn prune<M: MetricsSink>(&mut self, reference: u64, metrics: &mut MetricsRecorder<M>) -> usize {
        self.remove_before(reference.saturating_sub(self.retention), metrics)
    }

    /// Remove all buckets and GTM taggers below `bco`, hits arriving for them later are dropped as late.
    pub fn cleanup_before<M: MetricsSink>(&mut self, bco: u64, metrics: &mut MetricsRecorder<M>) -> usize {
        self.raise_watermark(bco);
        self.remove_before(bco, metrics)
    }

    fn remove_before<M: MetricsSink>(&mut self, cutoff: u64, metrics: &mut MetricsRecorder<M>) -> usize {
        let kept = self.frames.split_off(&cutoff);
        let stale = std::mem::replace(&mut self.frames, kept);
        let kept_gtm = self.gtm.split_off(&cutoff);
        self.gtm = kept_gtm;

        let stale_hits: usize = stale.values().map(Vec::len).sum();
        if stale_hits > 0 {
            log::trace!(
                "Packet {pid}: removed {stale_hits} hits below {cutoff:#012X}",
                pid = metrics.packet_id()
            );
            metrics.add(DecoderCounter::StaleHitPruned, None, stale_hits as u64);
        }
        stale_hits
    }

    fn raise_watermark(&mut self, bco: u64) {
        self.drain_watermark = Some(self.drain_watermark.map_or(bco, |wm| wm.max(bco)));
    }

    /// Remove and return the buckets with BCO in `[lo, hi]` in ascending BCO order.
    ///
    /// Hits matched to a BCO below `hi` after this call are dropped as late.
    pub fn drain_window(&mut self, lo: u64, hi: u64) -> Vec<TimeFrame> {
        if lo > hi {
            return Vec::new();
        }
        let keys: Vec<u64> = self.frames.range(lo..=hi).map(|(bco, _)| *bco).collect();
        let frames = keys
            .into_iter()
            .filter_map(|bco| {
                self.frames
                    .remove(&bco)
                    .map(|hits| TimeFrame { bco, hits })
            })
            .collect();
        self.raise_watermark(hi);
        frames
    }

    /// Newest widened GTM BCO seen.
    pub fn newest_gtm_bco(&self) -> Option<u64> {
        self.newest_gtm_bco
    }

    /// First level-1 accept with a BCO above `after`, or the first one if `after` is `None`.
    pub fn next_lvl1_after(&self, after: Option<u64>) -> Option<u64> {
        let lower = match after {
            Some(bco) => std::ops::Bound::Excluded(bco),
            None => std::ops::Bound::Unbounded,
        };
        self.gtm
            .range((lower, std::ops::Bound::Unbounded))
            .find(|(_, gtm)| gtm.is_lvl1())
            .map(|(bco, _)| *bco)
    }

    /// GTM taggers currently retained, by widened BCO.
    pub fn gtm_taggers(&self) -> impl Iterator<Item = (u64, &GtmPayload)> {
        self.gtm.iter().map(|(bco, gtm)| (*bco, gtm))
    }

    /// Number of buckets.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of hits in all buckets.
    pub fn hit_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    /// Number of hits waiting for trigger information.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Name of the matching strategy.
    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }
}
