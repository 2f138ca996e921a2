//! Strategies assigning a global (GTM) BCO to hits that only carry the local FEE clock.
use crate::raw_hit::RawHit;
use crate::words::MAX_FEECOUNT;
use std::fmt;

/// Range of the local FEE clock carried in a hit.
pub const FEE_BCO_RANGE: u64 = 1 << 16;

/// Maximum distance between a board's projected BCO and a new level-1 accept before the board re-syncs.
pub const DEFAULT_FEE_SYNC_TOLERANCE: u64 = 512;

/// Assigns the global BCO to decoded hits.
pub trait BcoMatcher: fmt::Debug + Send {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// A level-1 accept at the widened global BCO `gtm_bco` was decoded.
    fn on_lvl1(&mut self, gtm_bco: u64);

    /// Global BCO of `hit`, or `None` while there is not enough trigger information to place it.
    fn match_hit(&mut self, hit: &RawHit) -> Option<u64>;
}

/// Selects a [BcoMatcher] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatcherKind {
    /// [LastLvl1Matcher].
    #[default]
    LastLvl1,
    /// [FeeBcoSyncMatcher] with [DEFAULT_FEE_SYNC_TOLERANCE].
    FeeSync,
}

impl MatcherKind {
    /// Instantiate the selected matcher.
    pub fn build(self) -> Box<dyn BcoMatcher> {
        match self {
            MatcherKind::LastLvl1 => Box::<LastLvl1Matcher>::default(),
            MatcherKind::FeeSync => Box::new(FeeBcoSyncMatcher::new(DEFAULT_FEE_SYNC_TOLERANCE)),
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatcherKind::LastLvl1 => write!(f, "last-lvl1"),
            MatcherKind::FeeSync => write!(f, "fee-sync"),
        }
    }
}

impl std::str::FromStr for MatcherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-lvl1" | "last_lvl1" => Ok(MatcherKind::LastLvl1),
            "fee-sync" | "fee_sync" => Ok(MatcherKind::FeeSync),
            _ => Err(format!(
                "Invalid BCO matcher: {s}, expected last-lvl1 or fee-sync"
            )),
        }
    }
}

/// Places every hit at the most recent level-1 accept.
#[derive(Debug, Default, Clone, Copy)]
pub struct LastLvl1Matcher {
    last_lvl1: Option<u64>,
}

impl BcoMatcher for LastLvl1Matcher {
    fn name(&self) -> &'static str {
        "last-lvl1"
    }

    fn on_lvl1(&mut self, gtm_bco: u64) {
        self.last_lvl1 = Some(gtm_bco);
    }

    fn match_hit(&mut self, _hit: &RawHit) -> Option<u64> {
        self.last_lvl1
    }
}

#[derive(Debug, Clone, Copy)]
struct FeeSync {
    fee_ref: u16,
    gtm_ref: u64,
}

impl FeeSync {
    /// Global BCO of `fee_bco`, taking the shortest distance to the pinned FEE clock.
    ///
    /// Forward steps of half the clock range or more are steps backward across the wrap.
    fn project(&self, fee_bco: u16) -> u64 {
        let delta = u64::from(fee_bco.wrapping_sub(self.fee_ref));
        if delta < FEE_BCO_RANGE / 2 {
            self.gtm_ref + delta
        } else {
            self.gtm_ref.saturating_sub(FEE_BCO_RANGE - delta)
        }
    }
}

/// Tracks the offset between the local clock of every board and the global clock.
///
/// The first hit of a board after a level-1 accept pins the board's reference pair, later hits
/// are projected from it. When a new level-1 accept arrives, the next hit of each board checks its
/// projection against it and re-pins if it drifted more than the tolerance.
#[derive(Debug, Clone)]
pub struct FeeBcoSyncMatcher {
    tolerance: u64,
    last_lvl1: Option<u64>,
    sync: [Option<FeeSync>; MAX_FEECOUNT],
    check_pending: [bool; MAX_FEECOUNT],
    resyncs: u64,
}

impl FeeBcoSyncMatcher {
    /// Create a matcher re-syncing boards that drift more than `tolerance` BCO.
    pub fn new(tolerance: u64) -> Self {
        Self {
            tolerance,
            last_lvl1: None,
            sync: [None; MAX_FEECOUNT],
            check_pending: [false; MAX_FEECOUNT],
            resyncs: 0,
        }
    }

    /// Number of times a board re-synced.
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }
}

impl BcoMatcher for FeeBcoSyncMatcher {
    fn name(&self) -> &'static str {
        "fee-sync"
    }

    fn on_lvl1(&mut self, gtm_bco: u64) {
        self.last_lvl1 = Some(gtm_bco);
        self.check_pending = [true; MAX_FEECOUNT];
    }

    fn match_hit(&mut self, hit: &RawHit) -> Option<u64> {
        let lvl1 = self.last_lvl1?;
        let fee = usize::from(hit.fee);
        if fee >= MAX_FEECOUNT {
            return Some(lvl1);
        }
        // The hit carries the 16 bit FEE clock
        let fee_bco = hit.bco as u16;
        let pin = FeeSync {
            fee_ref: fee_bco,
            gtm_ref: lvl1,
        };

        let Some(sync) = self.sync[fee] else {
            self.sync[fee] = Some(pin);
            self.check_pending[fee] = false;
            return Some(lvl1);
        };

        let projected = sync.project(fee_bco);
        if std::mem::take(&mut self.check_pending[fee]) && projected.abs_diff(lvl1) > self.tolerance
        {
            log::debug!(
                "FEE {fee}: projected BCO {projected:#012X} drifted from level-1 accept {lvl1:#012X}, re-syncing"
            );
            self.resyncs += 1;
            self.sync[fee] = Some(pin);
            return Some(lvl1);
        }
        Some(projected)
    }
}
