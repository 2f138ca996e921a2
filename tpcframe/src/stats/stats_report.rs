pub mod report;
pub(super) mod stat_format_utils;
mod table_formatter_utils;

use self::stat_format_utils::{
    format_bco_range, format_data_size, format_fee_ids, format_nums_max_lines_width,
    format_packet_ids,
};
use super::stats_collector::decoder_stats::DecoderStats;
use crate::util::*;
use tabled::{Table, Tabled};

/// Row of the FEE data error table
#[derive(Tabled)]
struct FeeErrorSummary {
    #[tabled(rename = "Packet")]
    packet_id: i32,
    #[tabled(rename = "FEE")]
    fee: u16,
    #[tabled(rename = "Hits")]
    hits: u64,
    #[tabled(rename = "Skipped words")]
    skipped_words: u64,
    #[tabled(rename = "Format errors")]
    format_errors: u64,
    #[tabled(rename = "CRC errors")]
    crc_errors: u64,
    #[tabled(rename = "Missing last ADC")]
    missing_last_adc: u64,
}

/// Helper function that makes the report
pub fn make_report(processing_time: Duration, stats_collector: &mut StatsCollector) -> Report {
    stats_collector.finalize();

    let mut report = Report::new(processing_time);

    if let Some(fatal_err) = stats_collector.take_fatal_err() {
        report.add_fatal_error(fatal_err.into_string());
    }

    add_global_stats_to_report(&mut report, stats_collector);

    let decoder_stats = stats_collector.decoder_stats();
    if !decoder_stats.is_empty() {
        report.add_decoder_stats(Table::new(summarize_decoder_counters(decoder_stats)));
        let fee_errors = summarize_fee_errors(decoder_stats);
        if !fee_errors.is_empty() {
            report.add_fee_stats(Table::new(fee_errors));
        }
    }

    add_detected_attributes_to_report(&mut report, stats_collector);

    report
}

/// Helper function that adds the global stats to the report
fn add_global_stats_to_report(report: &mut Report, stats_collector: &StatsCollector) {
    if stats_collector.err_count() == 0 {
        report.add_stat(StatSummary::new(
            "Total Errors".green().to_string(),
            stats_collector.err_count().green().to_string(),
            None,
        ));
    } else {
        let data_errors = stats_collector.data_error_count();
        report.add_stat(StatSummary::new(
            "Total Errors".red().to_string(),
            stats_collector.err_count().red().to_string(),
            (data_errors > 0).then(|| format!("{data_errors} in decoded data")),
        ));
    }

    let input = stats_collector.input_stats();
    report.add_stat(StatSummary::new(
        "Total Packets".to_string(),
        input.packets_seen().to_string(),
        (input.packets_filtered() > 0)
            .then(|| format!("{} filtered out", input.packets_filtered())),
    ));
    report.add_stat(StatSummary::new(
        "Data size".to_string(),
        format_data_size(stats_collector.payload_size()),
        None,
    ));

    let frames = stats_collector.frame_stats();
    report.add_stat(StatSummary::new(
        "Time frames".to_string(),
        frames.time_frames().to_string(),
        Some(format_bco_range(frames.reference_bco_range())),
    ));
    report.add_stat(StatSummary::new(
        "Hits output".to_string(),
        frames.hits_output().to_string(),
        (frames.time_frames() > 0).then(|| format!("max {} per frame", frames.max_frame_hits())),
    ));
    if frames.container_resets() > 0 {
        report.add_stat(StatSummary::new(
            "Container resets".red().to_string(),
            frames.container_resets().red().to_string(),
            Some(format!("Hit container capacity {MAX_CONTAINER_HITS} exceeded")),
        ));
    }
}

/// Totals of all non-zero decoder counters, with the values per packet id as notes
fn summarize_decoder_counters(decoder_stats: &DecoderStats) -> Vec<StatSummary> {
    let mut summaries: Vec<StatSummary> = DecoderCounter::ALL
        .into_iter()
        .filter(|counter| *counter != DecoderCounter::PacketWords)
        .filter_map(|counter| {
            let total = decoder_stats.total(counter);
            if total == 0 {
                return None;
            }
            let per_packet: Vec<String> = decoder_stats
                .packets()
                .iter()
                .filter(|p| p.count(counter) > 0)
                .map(|p| format!("{}:{}", p.packet_id(), p.count(counter)))
                .collect();
            let notes = (decoder_stats.packets().len() > 1)
                .then(|| format_nums_max_lines_width(40, Some(3), &per_packet));
            let statistic = if counter.is_data_error() {
                counter.label().red().to_string()
            } else {
                counter.label().to_string()
            };
            Some(StatSummary::new(statistic, total.to_string(), notes))
        })
        .collect();

    let (count, min, max) = decoder_stats
        .packets()
        .iter()
        .map(|p| p.packet_words())
        .filter(|w| w.count() > 0)
        .fold((0, u64::MAX, 0), |(count, min, max), w| {
            (count + w.count(), min.min(w.min()), max.max(w.max()))
        });
    if count > 0 {
        summaries.push(StatSummary::new(
            "Packet words".to_string(),
            format!("{min} - {max}"),
            Some(format!("over {count} packets")),
        ));
    }
    summaries
}

/// One row per FEE board that reported data errors
fn summarize_fee_errors(decoder_stats: &DecoderStats) -> Vec<FeeErrorSummary> {
    decoder_stats
        .packets()
        .iter()
        .flat_map(|p| p.fees().iter().map(move |fee| (p.packet_id(), fee)))
        .filter_map(|(packet_id, fee)| {
            let row = FeeErrorSummary {
                packet_id,
                fee: fee.fee(),
                hits: fee.count(DecoderCounter::RawHit),
                skipped_words: fee.count(DecoderCounter::WordSkipped),
                format_errors: fee.count(DecoderCounter::HitFormatError),
                crc_errors: fee.count(DecoderCounter::HitCrcError),
                missing_last_adc: fee.count(DecoderCounter::MissingLastAdc),
            };
            (row.skipped_words + row.format_errors + row.crc_errors + row.missing_last_adc > 0)
                .then_some(row)
        })
        .collect()
}

/// Helper function that adds the detected attributes to the report
fn add_detected_attributes_to_report(report: &mut Report, stats_collector: &StatsCollector) {
    let input = stats_collector.input_stats();
    report.add_detected_attribute(
        "Run Number".to_string(),
        match input.run_number() {
            Some(run) => run.to_string(),
            None => String::from("none").red().to_string(),
        },
    );
    report.add_detected_attribute(
        "Packet IDs".to_string(),
        format_packet_ids(input.packet_ids_as_slice()),
    );

    let (fees, fees_with_errors) = stats_collector
        .decoder_stats()
        .packets()
        .iter()
        .flat_map(|p| p.fees())
        .fold((Vec::new(), Vec::new()), |(mut fees, mut with_errors), fee| {
            if !fees.contains(&fee.fee()) {
                fees.push(fee.fee());
            }
            let has_errors = DecoderCounter::ALL
                .into_iter()
                .any(|c| c.is_data_error() && fee.count(c) > 0);
            if has_errors && !with_errors.contains(&fee.fee()) {
                with_errors.push(fee.fee());
            }
            (fees, with_errors)
        });
    report.add_detected_attribute("FEE boards".to_string(), format_fee_ids(&fees, &fees_with_errors));
}
