//! Includes all the basics for working with the sPHENIX TPC reader.

pub use super::bufreader_wrapper::BufferedReaderWrapper;
pub use super::init_reader;
pub use super::packet_scanner::PacketScanner;
pub use super::packet_source::{PacketQueue, PacketSource};
pub use super::stats::InputStatType;
pub use super::stdin_reader::StdInReaderSeeker;
// Packets and decoded records
pub use super::packet::{HitFormat, RawPacket};
pub use super::raw_hit::{RawHit, RawHitV1, VersionedRawHit, ADC_SENTINEL};
pub use super::time_frame::TimeFrame;
pub use super::words::fee_header::{FeeHeader, HeaderFormat};
pub use super::words::gl1::{Gl1Packet, GL1_PACKET_ID};
pub use super::words::gtm::GtmPayload;
pub use super::words::{BCO_MASK, MAX_FEECOUNT};
// Decoding
pub use super::builder::{BuilderError, TimeFrameBuilder};
pub use super::metrics::{CounterSink, DecoderCounter, DecoderStat, MetricsSink};
pub use super::time_frame::bco::BcoUnwrapper;
pub use super::time_frame::matcher::{BcoMatcher, MatcherKind};

// Configuration/options
pub use super::config::decoder::DecoderOpt;
pub use super::config::filter::FilterOpt;
