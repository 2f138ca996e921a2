//! Contains the [DecoderOpt] trait with the settings of the TPC time frame decoder.
use crate::time_frame::matcher::MatcherKind;
use crate::words::fee_header::HeaderFormat;

/// Options for decoding FEE data into time frames.
pub trait DecoderOpt {
    /// Header format of the FEE packets, the stream does not identify it.
    fn header_format(&self) -> HeaderFormat;
    /// Distance in BCO behind the newest GTM BCO after which undrained hits are pruned.
    fn retention_bco(&self) -> u64;
    /// Strategy for matching hits to the global BCO.
    fn bco_matcher(&self) -> MatcherKind;
}

impl<T> DecoderOpt for &T
where
    T: DecoderOpt,
{
    fn header_format(&self) -> HeaderFormat {
        (*self).header_format()
    }
    fn retention_bco(&self) -> u64 {
        (*self).retention_bco()
    }
    fn bco_matcher(&self) -> MatcherKind {
        (*self).bco_matcher()
    }
}

impl<T> DecoderOpt for Box<T>
where
    T: DecoderOpt,
{
    fn header_format(&self) -> HeaderFormat {
        (**self).header_format()
    }
    fn retention_bco(&self) -> u64 {
        (**self).retention_bco()
    }
    fn bco_matcher(&self) -> MatcherKind {
        (**self).bco_matcher()
    }
}

impl<T> DecoderOpt for std::sync::Arc<T>
where
    T: DecoderOpt,
{
    fn header_format(&self) -> HeaderFormat {
        (**self).header_format()
    }
    fn retention_bco(&self) -> u64 {
        (**self).retention_bco()
    }
    fn bco_matcher(&self) -> MatcherKind {
        (**self).bco_matcher()
    }
}
