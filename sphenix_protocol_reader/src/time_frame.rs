//! Time frame assembly: matching hits to the global BCO and releasing them in BCO order.
//!
//! The [TimeFrameAssembler](assembler::TimeFrameAssembler) owns the hits of one packet id from the moment they are
//! decoded until they are drained, the [BcoMatcher](matcher::BcoMatcher) decides which global BCO a hit belongs to.
use super::raw_hit::RawHit;

pub mod assembler;
pub mod bco;
pub mod gtm_sequence;
pub mod matcher;

/// The hits matched to one global BCO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFrame {
    /// Widened global BCO.
    pub bco: u64,
    /// Hits in arrival order.
    pub hits: Vec<RawHit>,
}
