#![allow(missing_docs)]

use super::window::{DEFAULT_BCO_RANGE_MAX, DEFAULT_BCO_RANGE_MIN};
use crate::util::*;
use sphenix_protocol_reader::time_frame::assembler::DEFAULT_RETENTION_BCO;

#[derive(Debug, Clone)]
/// Complete configurable Mock config for testing
pub struct MockConfig {
    pub view: Option<ViewCommands>,
    pub filter_packet_ids: Vec<i32>,
    pub header_format: HeaderFormat,
    pub retention_bco: u64,
    pub bco_matcher: MatcherKind,
    pub bco_range_min: i64,
    pub bco_range_max: i64,
    pub verbosity: u8,
    pub max_tolerate_errors: u32,
    pub input_file: Option<PathBuf>,
    pub gl1_file: Option<PathBuf>,
    pub any_errors_exit_code: Option<u8>,
    pub mute_errors: bool,
    pub disable_styled_views: bool,
    pub stats_output_mode: DataOutputMode,
    pub stats_output_format: Option<DataOutputFormat>,
    pub input_stats_file: Option<PathBuf>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConfig {
    pub fn new() -> Self {
        Self {
            view: None,
            filter_packet_ids: Vec::new(),
            header_format: HeaderFormat::V1,
            retention_bco: DEFAULT_RETENTION_BCO,
            bco_matcher: MatcherKind::LastLvl1,
            bco_range_min: DEFAULT_BCO_RANGE_MIN,
            bco_range_max: DEFAULT_BCO_RANGE_MAX,
            verbosity: 0,
            max_tolerate_errors: 0,
            input_file: None,
            gl1_file: None,
            any_errors_exit_code: None,
            mute_errors: false,
            disable_styled_views: false,
            stats_output_mode: DataOutputMode::None,
            stats_output_format: None,
            input_stats_file: None,
        }
    }
}

impl Config for MockConfig {}

impl ViewOpt for MockConfig {
    fn view(&self) -> Option<ViewCommands> {
        self.view
    }
}

impl FilterOpt for MockConfig {
    fn filter_packet_ids(&self) -> &[i32] {
        &self.filter_packet_ids
    }
}

impl DecoderOpt for MockConfig {
    fn header_format(&self) -> HeaderFormat {
        self.header_format
    }

    fn retention_bco(&self) -> u64 {
        self.retention_bco
    }

    fn bco_matcher(&self) -> MatcherKind {
        self.bco_matcher
    }
}

impl TimeFrameOpt for MockConfig {
    fn bco_range_min(&self) -> i64 {
        self.bco_range_min
    }

    fn bco_range_max(&self) -> i64 {
        self.bco_range_max
    }
}

impl InputOutputOpt for MockConfig {
    fn input_file(&self) -> Option<&PathBuf> {
        self.input_file.as_ref()
    }

    fn gl1_file(&self) -> Option<&PathBuf> {
        self.gl1_file.as_ref()
    }

    fn stats_output_mode(&self) -> DataOutputMode {
        self.stats_output_mode.clone()
    }

    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        self.stats_output_format
    }

    fn input_stats_file(&self) -> Option<&Path> {
        self.input_stats_file.as_deref()
    }
}

impl UtilOpt for MockConfig {
    fn verbosity(&self) -> u8 {
        self.verbosity
    }

    fn max_tolerate_errors(&self) -> u32 {
        self.max_tolerate_errors
    }

    fn any_errors_exit_code(&self) -> Option<u8> {
        self.any_errors_exit_code
    }

    fn mute_errors(&self) -> bool {
        self.mute_errors
    }

    fn disable_styled_views(&self) -> bool {
        self.disable_styled_views
    }
}
