//! Re-exports

pub use super::inputoutput::DataOutputFormat;
pub use super::inputoutput::DataOutputMode;
pub use super::inputoutput::InputOutputOpt;
pub use super::lib::Config;
pub use super::test_util::MockConfig;
pub use super::util::UtilOpt;
pub use super::view::ViewCommands;
pub use super::view::ViewOpt;
pub use super::window::TimeFrameOpt;
pub use sphenix_protocol_reader::prelude::DecoderOpt;
pub use sphenix_protocol_reader::prelude::FilterOpt;
