//! Contains the [ErrorStats] struct which stores errors observed in the raw data
use crate::util::*;

/// Stores errors observed during decoding
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    fatal_error: Option<Box<str>>,
    reported_errors: Vec<Box<str>>,
    /// Sum of the data error counters of the decoder
    data_errors: u64,
    total_errors: u64,
}

impl ErrorStats {
    pub(super) fn err_count(&self) -> u64 {
        self.total_errors
    }

    pub(super) fn data_error_count(&self) -> u64 {
        self.data_errors
    }

    pub(super) fn add_err(&mut self, error_msg: Box<str>) {
        self.total_errors += 1;
        self.reported_errors.push(error_msg);
    }

    pub(super) fn add_data_errors(&mut self, count: u64) {
        self.total_errors += count;
        self.data_errors += count;
    }

    pub(super) fn add_fatal_err(&mut self, error_msg: Box<str>) {
        if self.fatal_error.is_some() {
            log::error!("Fatal error already set, ignoring: {error_msg}");
        } else {
            self.fatal_error = Some(error_msg);
        }
    }

    pub(super) fn fatal_err(&self) -> Option<&str> {
        self.fatal_error.as_deref()
    }

    pub(super) fn take_fatal_err(&mut self) -> Option<Box<str>> {
        self.fatal_error.take()
    }

    pub(super) fn reported_errors_as_slice(&self) -> &[Box<str>] {
        &self.reported_errors
    }

    pub(super) fn finalize(&mut self) {
        self.reported_errors.dedup();
    }
}
