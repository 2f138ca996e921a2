//! All stat collecting functionality, the [StatType] messages sent to the [Controller](crate::controller::Controller).
//!
//! Stats are produced by the packet scanners ([InputStatType]), the time frame builders ([DecoderStat]) and the
//! [TimeFrameInputManager](crate::input_manager::TimeFrameInputManager), and collected by the [StatsCollector](stats_collector::StatsCollector).

use sphenix_protocol_reader::prelude::{DecoderStat, InputStatType};

pub mod stats_collector;
pub mod stats_report;

#[derive(Debug, Clone, PartialEq)]
/// Possible stats that can be sent to the Controller.
pub enum StatType {
    /// Fatal error, stop processing.
    Fatal(Box<str>),
    /// Non-fatal error, reported but processing continues.
    Error(Box<str>),
    /// Run number of the input data.
    RunNumber(u32),
    /// Stats about the packets read from the input.
    Input(InputStatType),
    /// A quality counter of a time frame builder.
    Decoder(DecoderStat),
    /// A time frame was filled into the output container.
    TimeFrame {
        /// Reference BCO of the frame.
        reference_bco: u64,
        /// Hits added to the container.
        hits: u64,
    },
    /// The output container exceeded its capacity and was reset.
    ContainerReset,
}

impl From<DecoderStat> for StatType {
    fn from(stat: DecoderStat) -> Self {
        StatType::Decoder(stat)
    }
}

impl From<InputStatType> for StatType {
    fn from(stat: InputStatType) -> Self {
        match stat {
            InputStatType::Fatal(e) => StatType::Fatal(e),
            InputStatType::RunNumber(run) => StatType::RunNumber(run),
            other => StatType::Input(other),
        }
    }
}

impl StatType {
    /// Whether the stat reports an error in the input data.
    pub fn is_data_error(&self) -> bool {
        match self {
            StatType::Error(_) => true,
            StatType::Decoder(stat) => stat.counter.is_data_error(),
            _ => false,
        }
    }
}

impl std::fmt::Display for StatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatType::Fatal(e) => write!(f, "Fatal error: {e}"),
            StatType::Error(e) => write!(f, "Error: {e}"),
            StatType::RunNumber(run) => write!(f, "Run number: {run}"),
            StatType::Input(stat) => write!(f, "Input: {stat:?}"),
            StatType::Decoder(stat) => write!(f, "Decoder: {stat}"),
            StatType::TimeFrame {
                reference_bco,
                hits,
            } => write!(f, "Time frame {reference_bco:#012X}: {hits} hits"),
            StatType::ContainerReset => write!(f, "Hit container reset"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sphenix_protocol_reader::prelude::DecoderCounter;

    fn decoder_stat(counter: DecoderCounter) -> DecoderStat {
        DecoderStat {
            packet_id: 4001,
            fee: Some(3),
            counter,
            amount: 1,
        }
    }

    #[test]
    fn test_from_input_stat() {
        assert_eq!(
            StatType::from(InputStatType::Fatal("bad".into())),
            StatType::Fatal("bad".into())
        );
        assert_eq!(
            StatType::from(InputStatType::RunNumber(25926)),
            StatType::RunNumber(25926)
        );
        assert_eq!(
            StatType::from(InputStatType::PacketsSeen(3)),
            StatType::Input(InputStatType::PacketsSeen(3))
        );
    }

    #[test]
    fn test_data_errors() {
        assert!(StatType::from(decoder_stat(DecoderCounter::HitCrcError)).is_data_error());
        assert!(!StatType::from(decoder_stat(DecoderCounter::RawHit)).is_data_error());
        assert!(StatType::Error("GL1 packet too short".into()).is_data_error());
        assert!(!StatType::ContainerReset.is_data_error());
    }

    #[test]
    fn test_all_stattype_display() {
        let stats = [
            StatType::Fatal("Test fatal error".into()),
            StatType::Error("Test error".into()),
            StatType::RunNumber(1),
            StatType::Input(InputStatType::PayloadSize(10)),
            StatType::Decoder(decoder_stat(DecoderCounter::Waveform)),
            StatType::TimeFrame {
                reference_bco: 0x100,
                hits: 5,
            },
            StatType::ContainerReset,
        ];
        for stat in stats {
            assert!(!stat.to_string().is_empty());
        }
    }
}
