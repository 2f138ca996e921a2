//! Widening of the 40 bit global BCO to a monotonic 64 bit value.
use crate::words::{BCO_BITS, BCO_MASK};

const BCO_RANGE: u64 = 1 << BCO_BITS;
const BCO_HALF_RANGE: u64 = BCO_RANGE / 2;

/// Tracks rollovers of the 40 bit BCO counter.
///
/// A backward jump of more than half the counter range is a rollover and starts a new epoch.
/// A forward jump of more than half the range right after a rollover is a late value from the previous epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BcoUnwrapper {
    last: Option<u64>,
    epoch: u64,
}

impl BcoUnwrapper {
    /// Widen `bco`, only its lower 40 bits are used.
    pub fn widen(&mut self, bco: u64) -> u64 {
        let bco = bco & BCO_MASK;
        if let Some(last) = self.last {
            if last > bco && last - bco > BCO_HALF_RANGE {
                self.epoch += BCO_RANGE;
                log::debug!(
                    "BCO rollover {last:#012X} -> {bco:#012X}, epoch {}",
                    self.epoch >> BCO_BITS
                );
            } else if bco > last && bco - last > BCO_HALF_RANGE && self.epoch >= BCO_RANGE {
                return self.epoch - BCO_RANGE + bco;
            }
        }
        self.last = Some(bco);
        self.epoch + bco
    }

    /// Last widened value, if any.
    pub fn last(&self) -> Option<u64> {
        self.last.map(|last| self.epoch + last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_rollover() {
        let mut unwrapper = BcoUnwrapper::default();
        assert_eq!(unwrapper.last(), None);
        assert_eq!(unwrapper.widen(100), 100);
        assert_eq!(unwrapper.widen(90), 90);
        assert_eq!(unwrapper.widen(1000), 1000);
        assert_eq!(unwrapper.last(), Some(1000));
    }

    #[test]
    fn test_rollover() {
        let mut unwrapper = BcoUnwrapper::default();
        assert_eq!(unwrapper.widen(BCO_MASK - 5), BCO_MASK - 5);
        assert_eq!(unwrapper.widen(3), BCO_RANGE + 3);
        // Late value from before the rollover
        assert_eq!(unwrapper.widen(BCO_MASK - 1), BCO_MASK - 1);
        assert_eq!(unwrapper.widen(10), BCO_RANGE + 10);
    }

    #[test]
    fn test_upper_bits_ignored() {
        let mut unwrapper = BcoUnwrapper::default();
        assert_eq!(unwrapper.widen(0xFF00_0000_0000_0042), 0x42);
    }
}
