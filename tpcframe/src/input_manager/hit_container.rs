//! The output container the time frame hits are delivered to.
use crate::util::*;

/// Hard cap on the hits held by the output container before it is forcibly reset.
pub const MAX_CONTAINER_HITS: usize = 500_000;

/// Receives the hits drained from the time frames.
pub trait HitContainer {
    /// Take ownership of a hit.
    fn add_hit(&mut self, hit: RawHit);
    /// Number of hits held.
    fn count(&self) -> usize;
    /// Drop all hits.
    fn reset(&mut self);
    /// Remove and return all hits, in the order they were added.
    fn take_hits(&mut self) -> Vec<RawHit>;

    /// Reset the container if it holds more than `max_hits`, returns true if it was reset.
    fn enforce_capacity(&mut self, max_hits: usize) -> bool {
        if self.count() > max_hits {
            self.reset();
            true
        } else {
            false
        }
    }
}

/// In-memory container of TPC hits.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TpcRawHitContainer {
    hits: Vec<RawHit>,
}

impl TpcRawHitContainer {
    /// The hits held, in the order they were added.
    pub fn hits(&self) -> &[RawHit] {
        &self.hits
    }
}

impl HitContainer for TpcRawHitContainer {
    fn add_hit(&mut self, hit: RawHit) {
        self.hits.push(hit);
    }

    fn count(&self) -> usize {
        self.hits.len()
    }

    fn reset(&mut self) {
        self.hits.clear();
        self.hits.shrink_to(MAX_CONTAINER_HITS / 16);
    }

    fn take_hits(&mut self) -> Vec<RawHit> {
        std::mem::take(&mut self.hits)
    }
}

impl<T: HitContainer + ?Sized> HitContainer for &mut T {
    fn add_hit(&mut self, hit: RawHit) {
        (**self).add_hit(hit)
    }

    fn count(&self) -> usize {
        (**self).count()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn take_hits(&mut self) -> Vec<RawHit> {
        (**self).take_hits()
    }
}
