//! Contains the [StatsCollector] that collects stats from the input, the decoders and the output container.
pub mod decoder_stats;
pub(super) mod error_stats;
pub mod frame_stats;
pub mod input_stats;

use crate::util::*;
use decoder_stats::DecoderStats;
use error_stats::ErrorStats;
use frame_stats::FrameStats;
use input_stats::InputStats;

/// Collects stats from processing.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsCollector {
    is_finalized: bool,
    input_stats: InputStats,
    frame_stats: FrameStats,
    error_stats: ErrorStats,
    decoder_stats: DecoderStats,
}

impl StatsCollector {
    /// Record a stat.
    pub fn collect(&mut self, stat: StatType) {
        match stat {
            StatType::Fatal(m) => self.error_stats.add_fatal_err(m),
            StatType::Error(m) => self.error_stats.add_err(m),
            StatType::RunNumber(run) => self.input_stats.record_run_number(run),
            StatType::Input(s) => self.input_stats.collect(s),
            StatType::Decoder(s) => {
                if s.counter.is_data_error() {
                    self.error_stats.add_data_errors(s.amount);
                }
                self.decoder_stats.record(s);
            }
            StatType::TimeFrame {
                reference_bco,
                hits,
            } => self.frame_stats.record_frame(reference_bco, hits),
            StatType::ContainerReset => self.frame_stats.record_container_reset(),
        }
    }

    /// Finalize stats collection. Meaning no more stats can be collected.
    ///
    /// Does nothing if already finalized.
    pub fn finalize(&mut self) {
        if self.is_finalized {
            return;
        }
        self.input_stats.finalize();
        self.decoder_stats.finalize();
        self.error_stats.finalize();
        self.is_finalized = true;
    }

    /// Returns a reference to the [InputStats].
    pub fn input_stats(&self) -> &InputStats {
        &self.input_stats
    }

    /// Returns a reference to the [FrameStats].
    pub fn frame_stats(&self) -> &FrameStats {
        &self.frame_stats
    }

    /// Returns a reference to the [DecoderStats].
    pub fn decoder_stats(&self) -> &DecoderStats {
        &self.decoder_stats
    }

    /// Returns the processed payload size in bytes
    pub fn payload_size(&self) -> u64 {
        self.input_stats.payload_size()
    }

    /// Returns the number of errors reported.
    pub fn err_count(&self) -> u64 {
        self.error_stats.err_count()
    }

    /// Returns the number of errors counted by the decoders.
    pub fn data_error_count(&self) -> u64 {
        self.error_stats.data_error_count()
    }

    /// Return if any errors were reported.
    pub fn any_errors(&self) -> bool {
        self.error_stats.err_count() > 0
    }

    /// Returns if a fatal error was reported.
    pub fn fatal_err(&self) -> bool {
        self.error_stats.fatal_err().is_some()
    }

    /// Takes the reported fatal error.
    pub fn take_fatal_err(&mut self) -> Option<Box<str>> {
        self.error_stats.take_fatal_err()
    }

    /// Errors reported as messages.
    pub fn reported_errors_as_slice(&self) -> &[Box<str>] {
        self.error_stats.reported_errors_as_slice()
    }

    /// Flattens the stats that are compared against a stats file into `name -> value` pairs.
    fn comparable_stats(&self) -> BTreeMap<String, String> {
        let mut stats = BTreeMap::new();
        let input = &self.input_stats;
        let _ = stats.insert(
            "run_number".to_owned(),
            input
                .run_number()
                .map_or_else(|| "none".to_owned(), |r| r.to_string()),
        );
        let _ = stats.insert("packets_seen".to_owned(), input.packets_seen().to_string());
        let _ = stats.insert(
            "packets_filtered".to_owned(),
            input.packets_filtered().to_string(),
        );
        let _ = stats.insert("payload_size".to_owned(), input.payload_size().to_string());
        let _ = stats.insert(
            "packet_ids".to_owned(),
            input.packet_ids_as_slice().iter().join(","),
        );
        let frames = &self.frame_stats;
        let _ = stats.insert("time_frames".to_owned(), frames.time_frames().to_string());
        let _ = stats.insert("hits_output".to_owned(), frames.hits_output().to_string());
        let _ = stats.insert(
            "container_resets".to_owned(),
            frames.container_resets().to_string(),
        );
        let _ = stats.insert(
            "data_errors".to_owned(),
            self.data_error_count().to_string(),
        );
        for packet in self.decoder_stats.packets() {
            let id = packet.packet_id();
            for (counter, value) in packet.counters() {
                let _ = stats.insert(format!("packet {id} {counter}"), value.to_string());
            }
            for fee in packet.fees() {
                for (counter, value) in fee.counters() {
                    let _ = stats.insert(
                        format!("packet {id} FEE {fee_id} {counter}", fee_id = fee.fee()),
                        value.to_string(),
                    );
                }
            }
        }
        stats
    }

    /// Compares the stats against stats collected by a previous run, e.g. loaded from a stats file.
    ///
    /// Returns a description of every mismatch. Each mismatch is also reported as an error unless `mute_errors` is set.
    pub fn validate_other_stats(
        &mut self,
        other: &StatsCollector,
        mute_errors: bool,
    ) -> Result<(), Vec<String>> {
        let ours = self.comparable_stats();
        let theirs = other.comparable_stats();
        let mismatches: Vec<String> = ours
            .keys()
            .chain(theirs.keys())
            .unique()
            .filter_map(|key| {
                let (mine, expected) = (ours.get(key), theirs.get(key));
                (mine != expected).then(|| {
                    format!(
                        "{key} mismatch, expected: {expected}, found: {mine}",
                        expected = expected.map_or("missing", String::as_str),
                        mine = mine.map_or("missing", String::as_str)
                    )
                })
            })
            .collect();

        if mismatches.is_empty() {
            return Ok(());
        }
        for mismatch in &mismatches {
            if !mute_errors {
                display_error(mismatch);
            }
            self.error_stats.add_err(mismatch.as_str().into());
        }
        Err(mismatches)
    }

    /// Loads stats from a JSON or TOML stats file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed reading stats file {}: {e}", path.display()))?;
        match DataOutputFormat::from_path(path) {
            Some(DataOutputFormat::JSON) => serde_json::from_str(&content)
                .map_err(|e| format!("Failed parsing JSON stats file: {e}")),
            Some(DataOutputFormat::TOML) => {
                toml::from_str(&content).map_err(|e| format!("Failed parsing TOML stats file: {e}"))
            }
            None => Err(format!(
                "Unknown stats file format: {}, expected .json or .toml",
                path.display()
            )),
        }
    }

    pub(crate) fn write_stats(&self, mode: &DataOutputMode, format: DataOutputFormat) -> io::Result<()> {
        if *mode == DataOutputMode::None {
            return Ok(());
        }
        let stats_str = match format {
            DataOutputFormat::JSON => serde_json::to_string_pretty(&self).map_err(io::Error::other)?,
            DataOutputFormat::TOML => toml::to_string_pretty(&self).map_err(io::Error::other)?,
        };
        write_stats_str(mode, &stats_str)
    }
}

fn write_stats_str(mode: &DataOutputMode, stats_str: &str) -> io::Result<()> {
    match mode {
        DataOutputMode::File(path) => fs::write(path, stats_str),
        DataOutputMode::Stdout => writeln!(io::stdout(), "{stats_str}"),
        DataOutputMode::None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn collect_sample(stats_collector: &mut StatsCollector) {
        stats_collector.collect(StatType::RunNumber(25926));
        stats_collector.collect(StatType::Input(InputStatType::PacketIdObserved(4002)));
        stats_collector.collect(StatType::Input(InputStatType::PacketIdObserved(4001)));
        stats_collector.collect(StatType::Input(InputStatType::PacketsSeen(2)));
        stats_collector.collect(StatType::Input(InputStatType::PayloadSize(128)));
        stats_collector.collect(StatType::Decoder(DecoderStat {
            packet_id: 4001,
            fee: Some(3),
            counter: DecoderCounter::RawHit,
            amount: 1,
        }));
        stats_collector.collect(StatType::Decoder(DecoderStat {
            packet_id: 4001,
            fee: Some(3),
            counter: DecoderCounter::HitCrcError,
            amount: 1,
        }));
        stats_collector.collect(StatType::Decoder(DecoderStat {
            packet_id: 4001,
            fee: None,
            counter: DecoderCounter::PacketWords,
            amount: 64,
        }));
        stats_collector.collect(StatType::TimeFrame {
            reference_bco: 0x100,
            hits: 1,
        });
    }

    #[test]
    fn test_serde() {
        let mut stats_collector = StatsCollector::default();
        collect_sample(&mut stats_collector);
        stats_collector.collect(StatType::Error("error".into()));
        stats_collector.collect(StatType::Fatal("fatal error".into()));
        stats_collector.collect(StatType::ContainerReset);
        stats_collector.finalize();

        let json = serde_json::to_string(&stats_collector).unwrap();
        let from_json = serde_json::from_str::<StatsCollector>(&json).unwrap();
        println!(
            "{}",
            serde_json::to_string_pretty(&stats_collector).unwrap()
        );
        assert_eq!(stats_collector, from_json);

        let toml = toml::to_string(&stats_collector).unwrap();
        let from_toml = toml::from_str::<StatsCollector>(&toml).unwrap();
        println!("{toml}");
        assert_eq!(stats_collector, from_toml);
    }

    #[test]
    fn test_collect_counts_errors() {
        let mut stats_collector = StatsCollector::default();
        collect_sample(&mut stats_collector);
        stats_collector.collect(StatType::Error("GL1 packet too short".into()));
        stats_collector.finalize();

        assert_eq!(stats_collector.err_count(), 2);
        assert_eq!(stats_collector.data_error_count(), 1);
        assert!(!stats_collector.fatal_err());
        assert_eq!(
            stats_collector.input_stats().packet_ids_as_slice(),
            &[4001, 4002]
        );
        assert_eq!(stats_collector.frame_stats().hits_output(), 1);
    }

    #[test]
    fn test_validate_other_stats() {
        let mut stats_collector = StatsCollector::default();
        collect_sample(&mut stats_collector);
        stats_collector.finalize();
        let mut other = StatsCollector::default();
        collect_sample(&mut other);
        other.finalize();

        assert!(stats_collector.validate_other_stats(&other, true).is_ok());

        other.collect(StatType::TimeFrame {
            reference_bco: 0x200,
            hits: 3,
        });
        let mismatches = stats_collector
            .validate_other_stats(&other, true)
            .unwrap_err();
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches
            .iter()
            .any(|m| m.starts_with("hits_output mismatch, expected: 4, found: 1")));
        assert_eq!(stats_collector.err_count(), 3);
    }

    #[test]
    fn test_write_and_load_stats_file() {
        let tmp_d = TempDir::new().unwrap();
        let mut stats_collector = StatsCollector::default();
        collect_sample(&mut stats_collector);
        stats_collector.finalize();

        for (name, format) in [
            ("stats.json", DataOutputFormat::JSON),
            ("stats.toml", DataOutputFormat::TOML),
        ] {
            let path = tmp_d.child(name);
            stats_collector
                .write_stats(&DataOutputMode::File(path.clone().into_boxed_path()), format)
                .unwrap();
            let loaded = StatsCollector::from_file(&path).unwrap();
            assert_eq!(loaded, stats_collector);
        }
    }
}
