//! Contains the [TimeFrameOpt] Trait for the options of the time frame acceptance window.
//!
//! Hits are accepted into the frame of a reference BCO when their matched BCO lies within
//! `[reference + bco_range_min, reference + bco_range_max]`.

/// Default lower bound of the acceptance window, relative to the reference BCO.
pub const DEFAULT_BCO_RANGE_MIN: i64 = -256;
/// Default upper bound of the acceptance window, relative to the reference BCO.
pub const DEFAULT_BCO_RANGE_MAX: i64 = 256;

/// Time frame window options set by the user
pub trait TimeFrameOpt {
    /// Lower bound of the window relative to the reference BCO.
    fn bco_range_min(&self) -> i64;
    /// Upper bound of the window relative to the reference BCO.
    fn bco_range_max(&self) -> i64;
}

impl<T> TimeFrameOpt for &T
where
    T: TimeFrameOpt,
{
    fn bco_range_min(&self) -> i64 {
        (*self).bco_range_min()
    }
    fn bco_range_max(&self) -> i64 {
        (*self).bco_range_max()
    }
}

impl<T> TimeFrameOpt for Box<T>
where
    T: TimeFrameOpt,
{
    fn bco_range_min(&self) -> i64 {
        (**self).bco_range_min()
    }
    fn bco_range_max(&self) -> i64 {
        (**self).bco_range_max()
    }
}

impl<T> TimeFrameOpt for std::sync::Arc<T>
where
    T: TimeFrameOpt,
{
    fn bco_range_min(&self) -> i64 {
        (**self).bco_range_min()
    }
    fn bco_range_max(&self) -> i64 {
        (**self).bco_range_max()
    }
}
