//! Contains the [TimeFrameInputManager], which coordinates the reference pool and the TPC pools,
//! and releases the hits of each reference BCO window into the output [HitContainer].
//!
//! Each [step](TimeFrameInputManager::step):
//! 1. takes the next reference BCO, from the GL1 pool if there is one, otherwise from the level-1 taggers of the TPC data.
//! 2. fills every TPC pool until its newest GTM BCO reaches the end of the window.
//! 3. drains the time frames within `[reference + min, reference + max]` into the container in ascending BCO order.
//! 4. releases everything below the window from every pool.
//! 5. resets the container if it holds more than [MAX_CONTAINER_HITS].

pub mod gl1_pool;
pub mod hit_container;
pub mod pool;
pub mod tpc_pool;

use crate::util::*;

/// Errors that stop the input manager.
#[derive(Debug)]
pub enum InputManagerError {
    /// Two sources belong to different runs.
    RunNumberMismatch {
        /// Run number of the first source.
        expected: u32,
        /// Run number of the mismatching source.
        found: u32,
        /// Name of the mismatching source.
        pool: String,
    },
    /// A pool failed reading or decoding its source.
    Pool {
        /// Name of the failing pool.
        name: String,
        /// The error.
        source: PoolError,
    },
}

impl fmt::Display for InputManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputManagerError::RunNumberMismatch {
                expected,
                found,
                pool,
            } => write!(
                f,
                "Run number mismatch: {pool} is from run {found}, expected run {expected}"
            ),
            InputManagerError::Pool { name, source } => write!(f, "{name}: {source}"),
        }
    }
}

impl std::error::Error for InputManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputManagerError::Pool { source, .. } => Some(source),
            InputManagerError::RunNumberMismatch { .. } => None,
        }
    }
}

fn pool_err(pool: &(impl PoolInput + ?Sized), source: PoolError) -> InputManagerError {
    InputManagerError::Pool {
        name: pool.name().to_owned(),
        source,
    }
}

/// Summary of one step of the [TimeFrameInputManager].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameWindow {
    /// The reference BCO.
    pub reference_bco: u64,
    /// GL1 event sequence of the reference, if read from a GL1 source.
    pub event_sequence: Option<u32>,
    /// Lower bound of the window.
    pub lo: u64,
    /// Upper bound of the window.
    pub hi: u64,
    /// BCO and hit count of every time frame drained.
    pub frames: Vec<(u64, usize)>,
    /// Hits added to the container.
    pub hits: usize,
    /// Whether the container was reset after the hits were added.
    pub container_reset: bool,
}

enum ReferenceSource {
    Gl1(Box<dyn ReferencePool>),
    /// The level-1 taggers decoded by the TPC pools.
    TpcLvl1,
}

/// Coordinates the pools and delivers the hits of each reference BCO window to the output container.
pub struct TimeFrameInputManager<C: HitContainer> {
    reference: ReferenceSource,
    tpc_pools: Vec<Box<dyn TpcPool>>,
    container: C,
    bco_range: (i64, i64),
    max_container_hits: usize,
    last_reference: Option<u64>,
    run_number: Option<u32>,
    stats_send_ch: Option<flume::Sender<StatType>>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl<C: HitContainer> TimeFrameInputManager<C> {
    /// Create a manager delivering into `container` with the BCO window of `config`.
    pub fn new(config: &impl TimeFrameOpt, container: C) -> Self {
        Self {
            reference: ReferenceSource::TpcLvl1,
            tpc_pools: Vec::new(),
            container,
            bco_range: (config.bco_range_min(), config.bco_range_max()),
            max_container_hits: MAX_CONTAINER_HITS,
            last_reference: None,
            run_number: None,
            stats_send_ch: None,
            stop_flag: None,
        }
    }

    /// Take the reference BCOs from `pool` instead of the level-1 taggers of the TPC data.
    pub fn with_reference_pool(mut self, pool: Box<dyn ReferencePool>) -> Self {
        self.reference = ReferenceSource::Gl1(pool);
        self
    }

    /// Add a TPC pool.
    pub fn with_tpc_pool(mut self, pool: Box<dyn TpcPool>) -> Self {
        self.tpc_pools.push(pool);
        self
    }

    /// Report frames and container resets through `stats_send_ch`.
    pub fn with_stats_channel(mut self, stats_send_ch: flume::Sender<StatType>) -> Self {
        self.stats_send_ch = Some(stats_send_ch);
        self
    }

    /// Stop at the next step when `stop_flag` is raised.
    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(stop_flag);
        self
    }

    /// Override the capacity of the container.
    pub fn with_max_container_hits(mut self, max_hits: usize) -> Self {
        self.max_container_hits = max_hits;
        self
    }

    /// The output container.
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Mutable access to the output container, e.g. to consume the hits after a step.
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// Run number shared by all sources, once known.
    pub fn run_number(&self) -> Option<u32> {
        self.run_number
    }

    /// GTM taggers buffered by the TPC pools with BCO in `[lo, hi]`.
    pub fn gtm_taggers(&self, lo: u64, hi: u64) -> Vec<(i32, u64, GtmPayload)> {
        self.tpc_pools
            .iter()
            .flat_map(|pool| pool.gtm_taggers(lo, hi))
            .sorted_by_key(|(_, bco, _)| *bco)
            .collect()
    }

    /// Process the window of the next reference BCO.
    ///
    /// Returns `None` when the reference source is exhausted or the stop flag is raised.
    pub fn step(&mut self) -> Result<Option<FrameWindow>, InputManagerError> {
        if self.stopped() {
            return Ok(None);
        }
        let Some(reference_bco) = self.next_reference()? else {
            log::debug!("Reference source exhausted");
            return Ok(None);
        };
        self.check_run_numbers()?;
        let event_sequence = match &self.reference {
            ReferenceSource::Gl1(pool) => pool.last_event_sequence(),
            ReferenceSource::TpcLvl1 => None,
        };

        let (min, max) = self.bco_range;
        let lo = reference_bco.saturating_add_signed(min);
        let hi = reference_bco.saturating_add_signed(max);

        for pool in self.tpc_pools.iter_mut() {
            pool.fill_pool(hi).map_err(|e| pool_err(pool.as_ref(), e))?;
        }
        if self.stopped() {
            return Ok(None);
        }

        let frames = pool::merge_frames(
            self.tpc_pools
                .iter_mut()
                .flat_map(|pool| pool.drain_window(lo, hi)),
        );
        let frame_summary = frames
            .iter()
            .map(|frame| (frame.bco, frame.hits.len()))
            .collect_vec();
        let hits: usize = frame_summary.iter().map(|(_, n)| n).sum();
        frames
            .into_iter()
            .flat_map(|frame| frame.hits)
            .for_each(|hit| self.container.add_hit(hit));
        log::trace!(
            "Reference {reference_bco:#012X}: {} frames, {hits} hits in [{lo:#012X}, {hi:#012X}]",
            frame_summary.len()
        );
        self.send_stat(StatType::TimeFrame {
            reference_bco,
            hits: hits as u64,
        });

        for pool in self.tpc_pools.iter_mut() {
            pool.cleanup_before(lo);
        }
        if let ReferenceSource::Gl1(pool) = &mut self.reference {
            pool.cleanup_before(lo);
        }

        let container_reset = self.container.enforce_capacity(self.max_container_hits);
        if container_reset {
            log::warn!(
                "Hit container exceeded {} hits at reference {reference_bco:#012X}, it was reset",
                self.max_container_hits
            );
            self.send_stat(StatType::ContainerReset);
        }

        Ok(Some(FrameWindow {
            reference_bco,
            event_sequence,
            lo,
            hi,
            frames: frame_summary,
            hits,
            container_reset,
        }))
    }

    fn stopped(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn next_reference(&mut self) -> Result<Option<u64>, InputManagerError> {
        let reference = match &mut self.reference {
            ReferenceSource::Gl1(pool) => {
                pool.next_reference().map_err(|e| pool_err(pool.as_ref(), e))?
            }
            ReferenceSource::TpcLvl1 => self.next_tpc_lvl1()?,
        };
        if let (Some(last), Some(next)) = (self.last_reference, reference) {
            if next <= last {
                log::debug!("Reference BCO {next:#012X} not after {last:#012X}");
            }
        }
        if reference.is_some() {
            self.last_reference = reference;
        }
        Ok(reference)
    }

    /// The earliest level-1 accept after the last reference over all TPC pools,
    /// reading one packet per pool at a time until one is found.
    fn next_tpc_lvl1(&mut self) -> Result<Option<u64>, InputManagerError> {
        loop {
            let next = self
                .tpc_pools
                .iter()
                .filter_map(|pool| pool.next_lvl1_after(self.last_reference))
                .min();
            if next.is_some() {
                return Ok(next);
            }
            let mut any_read = false;
            for pool in self.tpc_pools.iter_mut() {
                any_read |= pool.fill_next().map_err(|e| pool_err(pool.as_ref(), e))?;
            }
            if !any_read {
                return Ok(None);
            }
        }
    }

    fn check_run_numbers(&mut self) -> Result<(), InputManagerError> {
        let reference_run = match &self.reference {
            ReferenceSource::Gl1(pool) => Some((pool.name().to_owned(), pool.run_number())),
            ReferenceSource::TpcLvl1 => None,
        };
        let runs = reference_run.into_iter().chain(
            self.tpc_pools
                .iter()
                .map(|pool| (pool.name().to_owned(), pool.run_number())),
        );
        for (name, run) in runs {
            let Some(run) = run else { continue };
            match self.run_number {
                None => {
                    log::info!("Run number {run} from {name}");
                    self.run_number = Some(run);
                }
                Some(expected) if expected != run => {
                    return Err(InputManagerError::RunNumberMismatch {
                        expected,
                        found: run,
                        pool: name,
                    });
                }
                Some(_) => (),
            }
        }
        Ok(())
    }

    fn send_stat(&self, stat: StatType) {
        if let Some(ch) = self.stats_send_ch.as_ref() {
            if ch.send(stat).is_err() {
                log::trace!("Stats receiver disconnected");
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::gl1_pool::Gl1PoolInput;
    use super::test_util::{gl1_packet, tpc_packet};
    use super::tpc_pool::TpcPoolInput;
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    fn tpc_pool(name: &str, packets: Vec<RawPacket>) -> Box<dyn TpcPool> {
        Box::new(TpcPoolInput::new(
            name,
            VecDeque::from(packets),
            &MockConfig::default(),
            (),
        ))
    }

    fn manager_with_window(min: i64, max: i64) -> TimeFrameInputManager<TpcRawHitContainer> {
        let config = MockConfig {
            bco_range_min: min,
            bco_range_max: max,
            ..Default::default()
        };
        TimeFrameInputManager::new(&config, TpcRawHitContainer::default())
    }

    #[test]
    fn test_gl1_reference_windows() {
        let gl1 = VecDeque::from([gl1_packet(0x1000, 1), gl1_packet(0x2000, 2)]);
        let mut manager = manager_with_window(-16, 16)
            .with_reference_pool(Box::new(Gl1PoolInput::new("gl1", gl1, None)))
            .with_tpc_pool(tpc_pool(
                "tpc",
                vec![
                    tpc_packet(4001, 0x1000, &[0, 1]),
                    tpc_packet(4001, 0x1800, &[2]),
                    tpc_packet(4001, 0x2008, &[3]),
                ],
            ));

        let first = manager.step().unwrap().unwrap();
        assert_eq!(first.reference_bco, 0x1000);
        assert_eq!(first.event_sequence, Some(1));
        assert_eq!(first.frames, [(0x1000, 2)]);
        assert_eq!(manager.container_mut().take_hits().len(), 2);

        let second = manager.step().unwrap().unwrap();
        assert_eq!(second.reference_bco, 0x2000);
        assert_eq!(second.frames, [(0x2008, 1)]);
        assert_eq!(manager.container().hits()[0].fee, 3);

        assert_eq!(manager.step().unwrap(), None);
    }

    #[test]
    fn test_tpc_lvl1_reference_drains_in_order_across_pools() {
        let mut manager = manager_with_window(-256, 256)
            .with_tpc_pool(tpc_pool(
                "tpc0",
                vec![
                    tpc_packet(4001, 0x100, &[0]),
                    tpc_packet(4001, 0x1000, &[1]),
                ],
            ))
            .with_tpc_pool(tpc_pool(
                "tpc1",
                vec![
                    tpc_packet(4002, 0x80, &[5]),
                    tpc_packet(4002, 0x1000, &[6]),
                ],
            ));

        let first = manager.step().unwrap().unwrap();
        assert_eq!(first.reference_bco, 0x80);
        assert_eq!(first.frames, [(0x80, 1), (0x100, 1)]);
        assert_eq!(
            manager
                .container_mut()
                .take_hits()
                .iter()
                .map(|h| h.fee)
                .collect::<Vec<_>>(),
            [5, 0]
        );

        // The frame of 0x100 was drained with the first window
        let second = manager.step().unwrap().unwrap();
        assert_eq!(second.reference_bco, 0x100);
        assert!(second.frames.is_empty());
        let third = manager.step().unwrap().unwrap();
        assert_eq!(third.reference_bco, 0x1000);
        assert_eq!(third.frames, [(0x1000, 2)]);
        assert_eq!(manager.step().unwrap(), None);
    }

    #[test]
    fn test_run_number_mismatch() {
        let gl1 = PacketQueue::new(1, [gl1_packet(0x100, 1)]);
        let tpc = PacketQueue::new(2, [tpc_packet(4001, 0x100, &[0])]);
        let mut manager = manager_with_window(-256, 256)
            .with_reference_pool(Box::new(Gl1PoolInput::new("gl1", gl1, None)))
            .with_tpc_pool(Box::new(TpcPoolInput::new(
                "tpc",
                tpc,
                &MockConfig::default(),
                (),
            )));

        let err = manager.step().unwrap_err();
        assert!(matches!(
            err,
            InputManagerError::RunNumberMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_container_reset_reported_once() {
        let (send, recv) = flume::unbounded();
        let mut manager = manager_with_window(-256, 256)
            .with_max_container_hits(2)
            .with_stats_channel(send)
            .with_tpc_pool(tpc_pool("tpc", vec![tpc_packet(4001, 0x100, &[0, 1, 2])]));

        let window = manager.step().unwrap().unwrap();
        assert_eq!(window.hits, 3);
        assert!(window.container_reset);
        assert_eq!(manager.container().count(), 0);
        drop(manager);

        let stats: Vec<StatType> = recv.iter().collect();
        assert_eq!(
            stats
                .iter()
                .filter(|s| **s == StatType::ContainerReset)
                .count(),
            1
        );
        assert!(stats.contains(&StatType::TimeFrame {
            reference_bco: 0x100,
            hits: 3
        }));
    }

    #[test]
    fn test_stop_flag() {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let mut manager = manager_with_window(-256, 256)
            .with_stop_flag(stop_flag.clone())
            .with_tpc_pool(tpc_pool("tpc", vec![tpc_packet(4001, 0x100, &[0])]));
        stop_flag.store(true, Ordering::SeqCst);
        assert_eq!(manager.step().unwrap(), None);
    }
}
