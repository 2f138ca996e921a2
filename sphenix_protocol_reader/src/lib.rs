#![forbid(unused_extern_crates)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(missing_copy_implementations)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused_results)]
#![warn(unused_import_braces)]
#![warn(variant_size_differences)]
#![warn(
    clippy::option_filter_map,
    clippy::manual_filter_map,
    clippy::if_not_else,
    clippy::nonminimal_bool
)]
// Performance lints
#![warn(
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::mutex_integer,
    clippy::mem_forget,
    clippy::maybe_infinite_iter
)]

//! This crate decodes raw TPC data of the sPHENIX detector into time ordered frames of waveform hits.
//!
//! Packets are read from a packet container file or stdin by the [PacketScanner](packet_scanner::PacketScanner),
//! and every packet id is decoded by its own [TimeFrameBuilder](builder::TimeFrameBuilder):
//!
//! 1. The [demultiplexer](demux) splits the payload into the word streams of the 26 FEE boards and the GTM taggers.
//! 2. The [FEE parser](fee_parser) turns each board stream into [RawHit](raw_hit::RawHit)s, checking framing and CRC.
//! 3. The [assembler](time_frame::assembler) matches the hits to the global BCO and buckets them.
//! 4. The caller drains the buckets of a BCO window in ascending order.
//!
//! Data errors never stop decoding, they are counted through a [MetricsSink](metrics::MetricsSink).
//!
//! # Example
//! First add the `sphenix_protocol_reader` crate to your project
//! ```shell
//! $ cargo add sphenix_protocol_reader
//! ```
//! Then use the convenience `init_reader()`-function to add the appropriate reader (stdin or file) at runtime.
//! Instantiate the `PacketScanner` with the reader and feed the packets to a `TimeFrameBuilder`.
//! ```text
//! use sphenix_protocol_reader::prelude::*;
//!
//! let reader = init_reader(Some(&test_file_path)).unwrap();
//! let mut scanner = PacketScanner::minimal(reader);
//! let mut builder = TimeFrameBuilder::with_parts(4001, HeaderFormat::V1, MatcherKind::LastLvl1.build(), 65536, CounterSink::default());
//!
//! while let Some(packet) = scanner.next_packet().unwrap() {
//!     if packet.packet_id == 4001 {
//!         builder.process_packet(&packet).unwrap();
//!     }
//! }
//! for frame in builder.drain_window(0, u64::MAX) {
//!     println!("BCO {:#012X}: {} hits", frame.bco, frame.hits.len());
//! }
//! ```
//!
//! ## Customize the scanner and the builder with a config
//!
//! Implement `FilterOpt` and `DecoderOpt` on your own config struct.
//!
//! ```text
//! use sphenix_protocol_reader::prelude::*;
//!
//! struct MyCfg;
//!
//! impl FilterOpt for MyCfg {
//!     fn filter_packet_ids(&self) -> &[i32] {
//!         &[4001, 4002]
//!     }
//! }
//!
//! impl DecoderOpt for MyCfg {
//!     fn header_format(&self) -> HeaderFormat { HeaderFormat::V2 }
//!     fn retention_bco(&self) -> u64 { 65536 }
//!     fn bco_matcher(&self) -> MatcherKind { MatcherKind::FeeSync }
//! }
//!
//! let reader = init_reader(Some(&test_file_path)).unwrap();
//! let mut scanner = PacketScanner::new(&MyCfg, reader, None); // None: Option<flume::Sender<InputStatType>>
//! let mut builder = TimeFrameBuilder::new(4001, &MyCfg, ());
//! ```

pub mod bufreader_wrapper;
pub mod builder;
pub mod config;
pub mod demux;
pub mod fee_parser;
pub mod metrics;
pub mod packet;
pub mod packet_scanner;
pub mod packet_source;
pub mod prelude;
pub mod raw_hit;
pub mod stats;
pub mod stdin_reader;
pub mod test_data;
pub mod time_frame;
pub mod words;

use prelude::BufferedReaderWrapper;
use std::{io::IsTerminal, path::PathBuf};
use stdin_reader::StdInReaderSeeker;

const READER_BUFFER_SIZE: usize = 1024 * 50; // 50KB

/// Initializes the reader based on the input mode (file or stdin) and returns it
///
/// The input mode is determined by the presence of the input file path in the config
#[inline]
pub fn init_reader(
    input_file: Option<&PathBuf>,
) -> Result<Box<dyn BufferedReaderWrapper>, std::io::Error> {
    if let Some(path) = input_file {
        let f = std::fs::OpenOptions::new().read(true).open(path)?;
        Ok(Box::new(std::io::BufReader::with_capacity(
            READER_BUFFER_SIZE,
            f,
        )))
    } else if !std::io::stdin().is_terminal() {
        Ok(Box::new(StdInReaderSeeker {
            reader: std::io::stdin(),
        }))
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "stdin not redirected!",
        ))
    }
}
