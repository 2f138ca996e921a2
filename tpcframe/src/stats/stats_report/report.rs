//! The [Report] is printed by the [Controller](crate::controller::Controller) at the end of execution
//!
//! Report contains several [StatSummary] structs that are used to generate the report table
use tabled::{
    settings::{object::Rows, Alignment, Format, Modify, Panel},
    Table, Tabled,
};

use super::table_formatter_utils::{
    format_global_stats_sub_table, format_sub_table, format_super_table, SubtableColor,
};
use crate::util::*;

/// Describes the columns of the report table
#[derive(Tabled, Default)]
pub struct StatSummary {
    pub statistic: String,
    pub value: String,
    pub notes: String,
}

impl StatSummary {
    pub fn new(statistic: String, value: String, notes: Option<String>) -> Self {
        Self {
            statistic,
            value,
            notes: notes.unwrap_or_default(),
        }
    }
}

/// Describes the columns of the detected attributes table
#[derive(Tabled)]
struct DetectedAttribute {
    pub attribute: String,
    pub detected: String,
}

/// Structures the report printed at the end of execution
///
/// Contains convenience methods to add stats to the report, and to generate the report table
pub struct Report {
    pub(crate) stats: Vec<StatSummary>,
    decoder_stats_table: Option<Table>,
    fee_stats_table: Option<Table>,
    detected_attributes: Vec<DetectedAttribute>,
    processing_time: Duration,
    fatal_error: Option<String>,
}

impl Report {
    pub fn new(processing_time: Duration) -> Self {
        Self {
            stats: Vec::new(),
            detected_attributes: Vec::new(),
            processing_time,
            decoder_stats_table: None,
            fee_stats_table: None,
            fatal_error: None,
        }
    }

    pub fn add_decoder_stats(&mut self, decoder_stats_table: Table) {
        self.decoder_stats_table = Some(decoder_stats_table);
    }

    pub fn add_fee_stats(&mut self, fee_stats_table: Table) {
        self.fee_stats_table = Some(fee_stats_table);
    }

    pub fn add_stat(&mut self, stat: StatSummary) {
        self.stats.push(stat);
    }

    pub fn add_detected_attribute(&mut self, attribute: String, detected: String) {
        self.detected_attributes.push(DetectedAttribute {
            attribute,
            detected,
        });
    }

    pub fn add_fatal_error(&mut self, error: String) {
        self.fatal_error = Some(error);
    }

    /// Assembles the report table.
    pub fn table(&mut self) -> Table {
        let mut global_stats_table = Table::new(&self.stats);
        format_global_stats_sub_table(&mut global_stats_table);
        let detected_attributes_table = format_sub_table(
            Table::new(&self.detected_attributes),
            "Detected Attributes".to_string(),
            SubtableColor::Yellow,
        );

        let mut multi_table = match self.decoder_stats_table.take() {
            Some(decoder_table) => {
                let decoder_table = format_sub_table(
                    decoder_table,
                    "Decoder Stats".to_string(),
                    SubtableColor::Purple,
                );
                tabled::col![
                    global_stats_table,
                    tabled::row![detected_attributes_table, decoder_table]
                ]
            }
            None => tabled::col![global_stats_table, tabled::row![detected_attributes_table]],
        };
        if let Some(fee_table) = self.fee_stats_table.take() {
            let fee_table =
                format_sub_table(fee_table, "FEE Data Errors".to_string(), SubtableColor::Red);
            multi_table = tabled::col![multi_table, fee_table];
        }
        let multi_table = multi_table.with(tabled::settings::Style::rounded());
        let mut report_table = format_super_table(multi_table, self.processing_time);

        if self.fatal_error.is_some() {
            let _ = report_table
                .with(Panel::header("FATAL ERROR - EARLY TERMINATION"))
                .with(Modify::new(Rows::single(0)).with(Alignment::center()).with(
                    Format::content(|x| {
                        let x = x.to_uppercase();
                        x.red().to_string()
                    }),
                ));
        }
        report_table
    }

    pub fn print(&mut self) {
        println!("{final_report}", final_report = self.table());
    }
}
