//! Contains the [FrameStats] struct with the stats of the time frames delivered to the output container
use crate::util::*;

/// Stats about the time frames filled into the output container.
#[derive(Default, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FrameStats {
    time_frames: u64,
    hits_output: u64,
    max_frame_hits: u64,
    container_resets: u64,
    first_reference_bco: Option<u64>,
    last_reference_bco: Option<u64>,
}

impl FrameStats {
    pub(super) fn record_frame(&mut self, reference_bco: u64, hits: u64) {
        self.time_frames += 1;
        self.hits_output += hits;
        self.max_frame_hits = self.max_frame_hits.max(hits);
        if self.first_reference_bco.is_none() {
            self.first_reference_bco = Some(reference_bco);
        }
        self.last_reference_bco = Some(reference_bco);
    }

    pub(super) fn record_container_reset(&mut self) {
        self.container_resets += 1;
    }

    /// Number of time frames.
    pub fn time_frames(&self) -> u64 {
        self.time_frames
    }

    /// Total hits delivered.
    pub fn hits_output(&self) -> u64 {
        self.hits_output
    }

    /// Most hits delivered in a single time frame.
    pub fn max_frame_hits(&self) -> u64 {
        self.max_frame_hits
    }

    /// Times the output container was reset for exceeding its capacity.
    pub fn container_resets(&self) -> u64 {
        self.container_resets
    }

    /// Reference BCO of the first and the last time frame.
    pub fn reference_bco_range(&self) -> Option<(u64, u64)> {
        self.first_reference_bco.zip(self.last_reference_bco)
    }
}
