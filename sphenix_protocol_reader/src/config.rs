//! Option traits a user config implements to customize the reader and the decoder.
//!
//! [FilterOpt](filter::FilterOpt) selects which packet ids are read, [DecoderOpt](decoder::DecoderOpt) sets up the
//! [TimeFrameBuilder](crate::builder::TimeFrameBuilder).

pub mod decoder;
pub mod filter;
#[cfg(test)]
pub(crate) mod mock_config;
