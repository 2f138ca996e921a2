#![allow(dead_code)]
/// Re-export some common utilities for system tests
pub use assert_cmd::prelude::*; // Add methods on commands
pub use assert_cmd::Command; // Get the methods for the Commands struct
pub use assert_fs::prelude::*;
pub use assert_fs::TempDir;
pub use predicate::str::is_match;
pub use predicates::prelude::*; // Used for writing assertions // Create temporary directories
#[allow(unused_imports)]
use pretty_assertions::{assert_eq, assert_ne, assert_str_eq};
use sphenix_protocol_reader::prelude::{Gl1Packet, RawPacket, GL1_PACKET_ID};
use sphenix_protocol_reader::test_data::{fee_blocks, lvl1_block, packet_file_bytes, FeePacket};

pub const RUN_NUMBER: u32 = 25926;
pub const TPC_PACKET_ID: i32 = 4001;

/// Helper function to match the raw output of stderr or stdout, with a pattern a fixed amount of times
pub fn match_on_output(
    byte_output: &[u8],
    re_str: &str,
    match_count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    // Build regex pattern
    let re = fancy_regex::Regex::new(re_str).unwrap();
    // Make the predicate function
    let pred_regex = predicate::function(|&x| re.find_iter(x).count() == match_count);
    // Convert the output to string as utf-8
    let str_res = std::str::from_utf8(byte_output).expect("invalid utf-8 sequence");
    // Evaluate the output with the predicate
    assert!(pred_regex.eval(&str_res));
    Ok(())
}

/// Helper function to match the raw output of stderr or stdout, with a pattern a fixed amount of times, case insensitive
pub fn match_on_out_no_case(
    byte_output: &[u8],
    re_str: &str,
    expect_match: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    // Convert the output to string as utf-8
    let str_res = std::str::from_utf8(byte_output).expect("invalid utf-8 sequence");
    // Build regex pattern
    let re = fancy_regex::Regex::new(&("(?i)".to_owned() + re_str)).unwrap();
    // Count the number of matches
    let match_count = re.find_iter(str_res).count();
    // Assert that the number of matches is equal to the expected number of matches
    assert_eq!(
        match_count, expect_match,
        "regex: {re_str} - expected match count: {expect_match}, got {match_count}\nFailed to match on:\n{str_res}"
    );
    Ok(())
}

/// Helper function takes in the output of stderr and asserts that there are no errors or warnings
pub fn assert_no_errors_or_warn(
    stderr_byte_output: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    match_on_out_no_case(stderr_byte_output, "error - ", 0)?;
    match_on_out_no_case(stderr_byte_output, "warn - ", 0)?;
    Ok(())
}

/// A TPC packet with a level-1 tagger at `bco` followed by one hit per board in `fees`.
pub fn tpc_packet(bco: u64, fees: &[u16]) -> RawPacket {
    tpc_packet_with(bco, fees, FeePacket::encode)
}

/// Like [tpc_packet] but every hit has a corrupted CRC.
pub fn tpc_packet_bad_crc(bco: u64, fees: &[u16]) -> RawPacket {
    tpc_packet_with(bco, fees, |fee_packet| {
        let mut words = fee_packet.encode();
        if let Some(crc) = words.last_mut() {
            *crc ^= 0xFFFF;
        }
        words
    })
}

fn tpc_packet_with(bco: u64, fees: &[u16], encode: impl Fn(&FeePacket) -> Vec<u16>) -> RawPacket {
    let mut payload = lvl1_block(bco, 1).to_vec();
    for &fee in fees {
        let fee_packet = FeePacket {
            sampa_channel: (fee % 32) as u8,
            wavelets: vec![(0, vec![10, 20, 30])],
            ..Default::default()
        };
        payload.extend(fee_blocks(fee, &encode(&fee_packet)));
    }
    RawPacket::tpc(TPC_PACKET_ID, payload)
}

/// A GL1 packet with the given BCO and event sequence.
pub fn gl1_packet(bco: u64, evt_sequence: u32) -> RawPacket {
    let gl1 = Gl1Packet {
        packet_id: GL1_PACKET_ID,
        bco,
        evt_sequence,
    };
    RawPacket::gl1(GL1_PACKET_ID, gl1.to_words().to_vec())
}

/// Write `packets` as a packet container file named `name` in `dir`, returns the path as a string.
pub fn write_packet_file(
    dir: &TempDir,
    name: &str,
    packets: &[RawPacket],
) -> Result<String, Box<dyn std::error::Error>> {
    let file = dir.child(name);
    file.write_binary(&packet_file_bytes(RUN_NUMBER, packets))?;
    Ok(file.path().to_string_lossy().into_owned())
}

/// Two level-1 accepts, the first with hits from boards 0 and 1, the second with a hit from board 2.
pub fn write_two_lvl1_file(dir: &TempDir) -> Result<String, Box<dyn std::error::Error>> {
    write_packet_file(
        dir,
        "two_lvl1.sprd",
        &[tpc_packet(0x1000, &[0, 1]), tpc_packet(0x2000, &[2])],
    )
}
