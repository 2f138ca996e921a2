#![warn(unused_extern_crates)]
#![warn(missing_docs)]
#![warn(missing_copy_implementations)]
// Readability lints
#![warn(
    clippy::option_filter_map,
    clippy::manual_filter_map,
    clippy::if_not_else,
    clippy::nonminimal_bool,
    clippy::single_match_else,
    clippy::range_plus_one,
    clippy::int_plus_one,
    clippy::needless_range_loop,
    clippy::needless_continue,
    clippy::shadow_same,
    clippy::shadow_unrelated
)]
// Performance lints
#![warn(variant_size_differences)]
#![warn(
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::mutex_integer,
    clippy::mem_forget,
    clippy::maybe_infinite_iter
)]
// Safety lints
#![warn(unused_results)]
#![warn(unused_import_braces)]
#![warn(trivial_casts, trivial_numeric_casts)]
// Unhandled results (allow unwrap and expect as there are many cases where the unwrap is totally safe)
#![warn(clippy::map_unwrap_or)]

//! tpcframe decodes raw TPC data of the sPHENIX detector into time frames of waveform hits.
//!
//! Packets are read from a packet container file or stdin, decoded per packet id, matched to the global BCO
//! and delivered window by window around a reference BCO. The reference comes from a GL1 packet file if one is given,
//! otherwise from the level-1 taggers in the TPC data itself.
//!
//! # Usage
//!
//! ## Decode a file and print a report of the decoder stats
//! ```shell
//! $ tpcframe <input_file>
//! ```
//!
//! ## Use the GL1 packets of another file as the reference, with a narrower window
//! ```shell
//! $ tpcframe <input_file> --gl1 <gl1_file> --bco-range-min -64 --bco-range-max 64
//! ```
//!
//! ## Only decode packet ids 4001 and 4002, with the 7 word FEE header
//! ```shell
//! $ tpcframe <input_file> -p 4001,4002 --header-format v2
//! ```
//!
//! ## Reading data from stdin and printing a view of the time frames
//! ```shell
//! $ cat <input_file> | tpcframe view frames
//! ```
//!
//! ## Write the stats as JSON and compare a later run against them
//! ```shell
//! $ tpcframe <input_file> --output-stats stats.json --stats-format json
//! $ tpcframe <input_file> --input-stats-file stats.json
//! ```

use crate::util::*;
use input_manager::{gl1_pool::Gl1PoolInput, tpc_pool::TpcPoolInput};
use view::ViewGenerator;

/// Write an error message to stderr.
/// All error messages should be written through this function to ensure consistency.
#[inline]
pub fn display_error(err_msg: &str) {
    log::error!("{}", err_msg.red());
}

pub mod config;
pub mod controller;
pub mod init;
pub mod input_manager;
pub mod stats;
pub mod util;
pub mod view;

/// Does the setup for processing the TPC packets read by `reader`, then processes them with [process].
///
/// A failure is also reported to the controller as a [StatType::Fatal].
#[allow(clippy::needless_pass_by_value)]
pub fn init_processing(
    config: &'static impl Config,
    reader: Box<dyn BufferedReaderWrapper>,
    stat_send: flume::Sender<StatType>,
    stop_flag: Arc<AtomicBool>,
) -> io::Result<()> {
    let (input_stats_send, input_stats_recv): (
        flume::Sender<InputStatType>,
        flume::Receiver<InputStatType>,
    ) = flume::unbounded();
    let forwarder = {
        let stat_send = stat_send.clone();
        Builder::new()
            .name("input_stats_forwarder".to_string())
            .spawn(move || forward_input_stats_to_stats_collector(&input_stats_recv, &stat_send))?
    };

    let scanner = PacketScanner::new(config, reader, Some(input_stats_send));
    // The scanner owns the input stats sender, the forwarder stops once the manager is dropped
    let result = init_manager(config, scanner, &stat_send, stop_flag)
        .and_then(|manager| process(config, manager));

    if let Err(e) = &result {
        if stat_send.send(StatType::Fatal(e.to_string().into())).is_err() {
            log::trace!("Stats receiver disconnected");
        }
    }
    if forwarder.join().is_err() {
        log::error!("Input stats forwarder thread panicked");
    }
    result
}

/// Sets up the [TimeFrameInputManager] with a TPC pool reading `scanner`, and a GL1 pool if a GL1 file is configured.
pub fn init_manager(
    config: &'static impl Config,
    scanner: impl PacketSource + 'static,
    stat_send: &flume::Sender<StatType>,
    stop_flag: Arc<AtomicBool>,
) -> io::Result<TimeFrameInputManager<TpcRawHitContainer>> {
    let tpc_pool = TpcPoolInput::new("TPC", scanner, config, stat_send.clone());
    let mut manager = TimeFrameInputManager::new(config, TpcRawHitContainer::default())
        .with_tpc_pool(Box::new(tpc_pool))
        .with_stats_channel(stat_send.clone())
        .with_stop_flag(stop_flag);

    if let Some(gl1_file) = config.gl1_file() {
        let gl1_reader = init_reader(Some(gl1_file)).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed opening GL1 file {}: {e}", gl1_file.display()),
            )
        })?;
        let gl1_pool = Gl1PoolInput::new(
            "GL1",
            PacketScanner::minimal(gl1_reader),
            Some(stat_send.clone()),
        );
        manager = manager.with_reference_pool(Box::new(gl1_pool));
    }
    Ok(manager)
}

/// Runs the [TimeFrameInputManager] until the reference source is exhausted or the stop flag is raised.
///
/// If a view is configured, the hits of each window are printed, otherwise they are released after each step.
pub fn process(
    config: &'static impl Config,
    mut manager: TimeFrameInputManager<TpcRawHitContainer>,
) -> io::Result<()> {
    let mut view_generator = config
        .view()
        .map(|view| ViewGenerator::new(view, config.disable_styled_views(), io::stdout().lock()));

    let mut windows: u64 = 0;
    while let Some(window) = manager.step().map_err(io::Error::other)? {
        windows += 1;
        let hits = manager.container_mut().take_hits();
        let Some(generator) = view_generator.as_mut() else {
            continue;
        };
        let gtm_taggers = if generator.needs_gtm_taggers() {
            manager.gtm_taggers(window.lo, window.hi)
        } else {
            Vec::new()
        };
        if let Err(e) = generator.write_window(&window, &hits, &gtm_taggers) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                log::warn!("Broken pipe, stdout was closed, stopping view");
                break;
            }
            return Err(e);
        }
    }
    if let Some(mut generator) = view_generator {
        if let Err(e) = generator.flush() {
            log::debug!("Failed flushing view: {e}");
        }
    }
    log::info!(
        "Processed {windows} reference windows of run {}",
        manager
            .run_number()
            .map_or_else(|| "unknown".to_owned(), |run| run.to_string())
    );
    Ok(())
}

// Converts the stats the scanner sends to the stats the controller expects
fn forward_input_stats_to_stats_collector(
    input_stats_recv: &flume::Receiver<InputStatType>,
    stats_send: &flume::Sender<StatType>,
) {
    while let Ok(input_stat) = input_stats_recv.recv() {
        if stats_send.send(StatType::from(input_stat)).is_err() {
            log::trace!("Stats receiver disconnected, stopping input stats forwarding");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_manager::test_util::{gl1_packet, tpc_packet};
    use pretty_assertions::assert_eq;
    use sphenix_protocol_reader::test_data::packet_file_bytes;
    use temp_dir::TempDir;

    fn collect_stats(receiver: &flume::Receiver<StatType>) -> Vec<StatType> {
        receiver.iter().collect()
    }

    static CFG_TEST_INIT_PROCESSING: OnceLock<MockConfig> = OnceLock::new();

    #[test]
    fn test_init_processing() {
        let tmp_d = TempDir::new().unwrap();
        let test_file_path = tmp_d.child("tpc.sprd");
        let packets = [
            tpc_packet(4001, 0x1000, &[0, 1]),
            tpc_packet(4001, 0x2000, &[2]),
        ];
        std::fs::write(&test_file_path, packet_file_bytes(25926, &packets)).unwrap();

        let mut mock_config = MockConfig::new();
        mock_config.input_file = Some(test_file_path);
        CFG_TEST_INIT_PROCESSING.set(mock_config).unwrap();
        let config = CFG_TEST_INIT_PROCESSING.get().unwrap();

        let reader = init_reader(config.input_file()).unwrap();
        let (sender, receiver): (flume::Sender<StatType>, flume::Receiver<StatType>) =
            flume::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));

        init_processing(config, reader, sender, stop_flag.clone()).unwrap();

        let stats = collect_stats(&receiver);
        let frames: Vec<(u64, u64)> = stats
            .iter()
            .filter_map(|s| match s {
                StatType::TimeFrame {
                    reference_bco,
                    hits,
                } => Some((*reference_bco, *hits)),
                StatType::Error(e) | StatType::Fatal(e) => panic!("Error or Fatal: {e}"),
                _ => None,
            })
            .collect();
        assert_eq!(frames, [(0x1000, 2), (0x2000, 1)]);
        assert!(stats.contains(&StatType::RunNumber(25926)));
        assert!(!stop_flag.load(Ordering::SeqCst));
    }

    static CFG_TEST_GL1_REFERENCE: OnceLock<MockConfig> = OnceLock::new();

    #[test]
    fn test_init_processing_with_gl1() {
        let tmp_d = TempDir::new().unwrap();
        let tpc_path = tmp_d.child("tpc.sprd");
        let gl1_path = tmp_d.child("gl1.sprd");
        std::fs::write(
            &tpc_path,
            packet_file_bytes(
                7,
                &[
                    tpc_packet(4001, 0x1000, &[0]),
                    tpc_packet(4001, 0x1010, &[1]),
                    tpc_packet(4001, 0x3000, &[2]),
                ],
            ),
        )
        .unwrap();
        std::fs::write(&gl1_path, packet_file_bytes(7, &[gl1_packet(0x1008, 1)])).unwrap();

        let mock_config = MockConfig {
            input_file: Some(tpc_path),
            gl1_file: Some(gl1_path),
            ..Default::default()
        };
        CFG_TEST_GL1_REFERENCE.set(mock_config).unwrap();
        let config = CFG_TEST_GL1_REFERENCE.get().unwrap();

        let reader = init_reader(config.input_file()).unwrap();
        let (sender, receiver) = flume::unbounded();
        init_processing(config, reader, sender, Arc::new(AtomicBool::new(false))).unwrap();

        let stats = collect_stats(&receiver);
        assert!(stats.contains(&StatType::TimeFrame {
            reference_bco: 0x1008,
            hits: 2
        }));
    }

    static CFG_TEST_MISSING_GL1: OnceLock<MockConfig> = OnceLock::new();

    #[test]
    fn test_missing_gl1_file_is_fatal() {
        let tmp_d = TempDir::new().unwrap();
        let tpc_path = tmp_d.child("tpc.sprd");
        std::fs::write(&tpc_path, packet_file_bytes(7, &[])).unwrap();
        let mock_config = MockConfig {
            input_file: Some(tpc_path),
            gl1_file: Some(tmp_d.child("missing.sprd")),
            ..Default::default()
        };
        CFG_TEST_MISSING_GL1.set(mock_config).unwrap();
        let config = CFG_TEST_MISSING_GL1.get().unwrap();

        let reader = init_reader(config.input_file()).unwrap();
        let (sender, receiver) = flume::unbounded();
        let err = init_processing(config, reader, sender, Arc::new(AtomicBool::new(false)))
            .unwrap_err();

        assert!(err.to_string().contains("GL1"));
        assert!(collect_stats(&receiver)
            .iter()
            .any(|s| matches!(s, StatType::Fatal(_))));
    }
}
