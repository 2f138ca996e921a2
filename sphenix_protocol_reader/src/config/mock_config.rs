use super::decoder::DecoderOpt;
use super::filter::FilterOpt;
use crate::time_frame::assembler::DEFAULT_RETENTION_BCO;
use crate::time_frame::matcher::MatcherKind;
use crate::words::fee_header::HeaderFormat;

#[derive(Debug, Clone)]
pub(crate) struct MockConfig {
    pub filter_packet_ids: Vec<i32>,
    pub header_format: HeaderFormat,
    pub retention_bco: u64,
    pub bco_matcher: MatcherKind,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            filter_packet_ids: Vec::new(),
            header_format: HeaderFormat::V1,
            retention_bco: DEFAULT_RETENTION_BCO,
            bco_matcher: MatcherKind::LastLvl1,
        }
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
