//! The pool traits the [TimeFrameInputManager](super::TimeFrameInputManager) pulls data through.
//!
//! A pool wraps one packet source and buffers what was decoded from it until the manager releases it.
use crate::util::*;

/// Errors reading or decoding the packets of a pool.
#[derive(Debug)]
pub enum PoolError {
    /// Reading the packet source failed.
    Io(io::Error),
    /// A packet was handed to the wrong time frame builder.
    Builder(BuilderError),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Io(e) => write!(f, "Failed reading packets: {e}"),
            PoolError::Builder(e) => write!(f, "Failed decoding packet: {e}"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Io(e) => Some(e),
            PoolError::Builder(e) => Some(e),
        }
    }
}

impl From<io::Error> for PoolError {
    fn from(e: io::Error) -> Self {
        PoolError::Io(e)
    }
}

impl From<BuilderError> for PoolError {
    fn from(e: BuilderError) -> Self {
        PoolError::Builder(e)
    }
}

/// A buffered source of decoded data.
pub trait PoolInput {
    /// Name used in logs and errors.
    fn name(&self) -> &str;
    /// Read from the source until the data up to `until_bco` is buffered, or the source is exhausted.
    fn fill_pool(&mut self, until_bco: u64) -> Result<(), PoolError>;
    /// Run number of the source, once known.
    fn run_number(&self) -> Option<u32>;
    /// Release everything buffered below `bco`.
    fn cleanup_before(&mut self, bco: u64);
    /// Whether the source has no more packets.
    fn is_exhausted(&self) -> bool;
}

/// A pool of TPC hits bucketed into time frames.
pub trait TpcPool: PoolInput {
    /// Remove and return the time frames with BCO in `[lo, hi]`, in ascending BCO order.
    fn drain_window(&mut self, lo: u64, hi: u64) -> Vec<TimeFrame>;
    /// Decode the next packet of the source, returns false if the source is exhausted.
    fn fill_next(&mut self) -> Result<bool, PoolError>;
    /// First level-1 accept decoded from the data above `after`.
    fn next_lvl1_after(&self, after: Option<u64>) -> Option<u64>;
    /// GTM taggers buffered with BCO in `[lo, hi]`, with the packet id they were decoded from.
    fn gtm_taggers(&self, lo: u64, hi: u64) -> Vec<(i32, u64, GtmPayload)>;
}

/// A pool providing the reference BCO.
pub trait ReferencePool: PoolInput {
    /// The next reference BCO, widened to 64 bits, `None` when the source is exhausted.
    fn next_reference(&mut self) -> Result<Option<u64>, PoolError>;
    /// Event sequence number of the last reference, if the source carries one.
    fn last_event_sequence(&self) -> Option<u32>;
}

/// Sort time frames by BCO and merge the frames of equal BCO, keeping the hits in order.
pub(crate) fn merge_frames(frames: impl IntoIterator<Item = TimeFrame>) -> Vec<TimeFrame> {
    frames
        .into_iter()
        .sorted_by_key(|frame| frame.bco)
        .coalesce(|mut prev, frame| {
            if prev.bco == frame.bco {
                prev.hits.extend(frame.hits);
                Ok(prev)
            } else {
                Err((prev, frame))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(bco: u64, fees: &[u16]) -> TimeFrame {
        TimeFrame {
            bco,
            hits: fees.iter().map(|&fee| RawHit::new(4001, fee)).collect(),
        }
    }

    #[test]
    fn test_merge_frames() {
        let merged = merge_frames([frame(0x200, &[1]), frame(0x100, &[2]), frame(0x200, &[3, 4])]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].bco, 0x100);
        assert_eq!(
            merged[1].hits.iter().map(|h| h.fee).collect::<Vec<_>>(),
            [1, 3, 4]
        );
    }
}
