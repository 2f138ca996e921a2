//! Contains the [TimeFrameBuilder], decoding the raw packets of one packet id into time frames.
//!
//! Per packet the builder demultiplexes the payload into the board streams, feeds the GTM taggers to the
//! assembler, parses every board stream and files the resulting hits. Afterwards the assembler is pruned
//! relative to the newest GTM BCO.
use super::config::decoder::DecoderOpt;
use super::demux::{demultiplex, FeeStreams};
use super::fee_parser::FeeParser;
use super::metrics::{DecoderCounter, MetricsRecorder, MetricsSink};
use super::packet::{HitFormat, RawPacket};
use super::raw_hit::RawHit;
use super::time_frame::assembler::TimeFrameAssembler;
use super::time_frame::matcher::BcoMatcher;
use super::time_frame::TimeFrame;
use super::words::fee_header::HeaderFormat;
use super::words::gtm::GtmPayload;
use std::fmt;

/// Errors that stop a [TimeFrameBuilder], they indicate unrelated data streams getting mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    /// The packet belongs to another packet id.
    PacketIdMismatch {
        /// Packet id of the builder.
        expected: i32,
        /// Packet id of the packet.
        found: i32,
    },
    /// The packet does not carry TPC FEE data.
    UnexpectedHitFormat {
        /// Packet id of the packet.
        packet_id: i32,
        /// Format of the packet.
        hit_format: HitFormat,
    },
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderError::PacketIdMismatch { expected, found } => write!(
                f,
                "Packet id mismatch: builder for packet {expected} received packet {found}"
            ),
            BuilderError::UnexpectedHitFormat {
                packet_id,
                hit_format,
            } => write!(
                f,
                "Packet {packet_id} carries {hit_format} data, expected TPC FEE data"
            ),
        }
    }
}

impl std::error::Error for BuilderError {}

/// Decodes the raw packets of one packet id, holding the decoded hits until they are drained.
#[derive(Debug)]
pub struct TimeFrameBuilder<M: MetricsSink> {
    packet_id: i32,
    streams: FeeStreams,
    parser: FeeParser,
    assembler: TimeFrameAssembler,
    metrics: MetricsRecorder<M>,
    gtm_scratch: Vec<GtmPayload>,
    hit_scratch: Vec<RawHit>,
    packets_processed: u64,
}

impl<M: MetricsSink> TimeFrameBuilder<M> {
    /// Create a builder for `packet_id` set up from a config implementing [DecoderOpt].
    pub fn new(packet_id: i32, config: &impl DecoderOpt, sink: M) -> Self {
        Self::with_parts(
            packet_id,
            config.header_format(),
            config.bco_matcher().build(),
            config.retention_bco(),
            sink,
        )
    }

    /// Create a builder from its individual parts.
    pub fn with_parts(
        packet_id: i32,
        header_format: HeaderFormat,
        matcher: Box<dyn BcoMatcher>,
        retention_bco: u64,
        sink: M,
    ) -> Self {
        log::debug!(
            "Packet {packet_id}: time frame builder with FEE header {header_format}, matcher {}, retention {retention_bco}",
            matcher.name()
        );
        Self {
            packet_id,
            streams: FeeStreams::default(),
            parser: FeeParser::new(header_format),
            assembler: TimeFrameAssembler::new(matcher, retention_bco),
            metrics: MetricsRecorder::new(packet_id, sink),
            gtm_scratch: Vec::new(),
            hit_scratch: Vec::new(),
            packets_processed: 0,
        }
    }

    /// Decode one raw packet.
    ///
    /// Data errors are recovered and counted, only a packet that does not belong to this builder is an error.
    pub fn process_packet(&mut self, packet: &RawPacket) -> Result<(), BuilderError> {
        if packet.packet_id != self.packet_id {
            return Err(BuilderError::PacketIdMismatch {
                expected: self.packet_id,
                found: packet.packet_id,
            });
        }
        if packet.hit_format != HitFormat::TpcFee {
            return Err(BuilderError::UnexpectedHitFormat {
                packet_id: packet.packet_id,
                hit_format: packet.hit_format,
            });
        }
        self.packets_processed += 1;
        self.metrics.count(DecoderCounter::Packet);
        self.metrics
            .add(DecoderCounter::PacketWords, None, packet.len() as u64);

        demultiplex(
            &packet.words,
            &mut self.streams,
            &mut self.gtm_scratch,
            &mut self.metrics,
        );
        for gtm in self.gtm_scratch.drain(..) {
            self.assembler.add_gtm(gtm, &mut self.metrics);
        }

        for (fee, stream) in self.streams.iter_mut() {
            self.parser
                .parse_stream(fee, stream, &mut self.hit_scratch, &mut self.metrics);
        }
        for hit in self.hit_scratch.drain(..) {
            self.assembler.add_hit(hit, &mut self.metrics);
        }

        if let Some(newest) = self.assembler.newest_gtm_bco() {
            let _ = self.assembler.prune(newest, &mut self.metrics);
        }
        log::trace!(
            "Packet {pid}: {frames} frames, {pending} pending hits, {words} buffered words",
            pid = self.packet_id,
            frames = self.assembler.frame_count(),
            pending = self.assembler.pending_count(),
            words = self.streams.buffered_words()
        );
        Ok(())
    }

    /// Remove and return the time frames with BCO in `[lo, hi]`, in ascending BCO order.
    pub fn drain_window(&mut self, lo: u64, hi: u64) -> Vec<TimeFrame> {
        self.assembler.drain_window(lo, hi)
    }

    /// Release everything below `bco`.
    pub fn cleanup_before(&mut self, bco: u64) -> usize {
        self.assembler.cleanup_before(bco, &mut self.metrics)
    }

    /// Packet id the builder decodes.
    pub fn packet_id(&self) -> i32 {
        self.packet_id
    }

    /// Newest widened GTM BCO decoded.
    pub fn newest_gtm_bco(&self) -> Option<u64> {
        self.assembler.newest_gtm_bco()
    }

    /// First retained level-1 accept above `after`.
    pub fn next_lvl1_after(&self, after: Option<u64>) -> Option<u64> {
        self.assembler.next_lvl1_after(after)
    }

    /// GTM taggers currently retained, by widened BCO.
    pub fn gtm_taggers(&self) -> impl Iterator<Item = (u64, &GtmPayload)> {
        self.assembler.gtm_taggers()
    }

    /// Hits held in undrained time frames.
    pub fn hit_count(&self) -> usize {
        self.assembler.hit_count()
    }

    /// Hits waiting for trigger information.
    pub fn pending_count(&self) -> usize {
        self.assembler.pending_count()
    }

    /// Words buffered over all board streams.
    pub fn buffered_words(&self) -> usize {
        self.streams.buffered_words()
    }

    /// Number of packets processed.
    pub fn packets_processed(&self) -> u64 {
        self.packets_processed
    }

    /// The metrics sink.
    pub fn metrics(&self) -> &M {
        self.metrics.sink()
    }

    /// Drop all buffered words and return the metrics sink.
    pub fn finish(mut self) -> M {
        let leftover = self.streams.buffered_words();
        if leftover > 0 {
            log::debug!(
                "Packet {pid}: {leftover} words of incomplete FEE packets left at shutdown",
                pid = self.packet_id
            );
        }
        self.streams.clear();
        self.metrics.into_sink()
    }
}
