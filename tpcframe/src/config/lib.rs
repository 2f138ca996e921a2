//! Contains the [Config] super trait, and all the sub traits required by it
//!
//! Implementing the [Config] super trait is required by configs passed to structs in other modules as part of instantiation.

use super::prelude::{InputOutputOpt, TimeFrameOpt, UtilOpt, ViewOpt};
use super::inputoutput::DataOutputFormat;
use sphenix_protocol_reader::prelude::{DecoderOpt, FilterOpt};

/// Super trait for all the traits that needed to be implemented by the config struct
// Generic traits that are required by the config struct
pub trait Config: Send + Sync + std::marker::Sized
where
    // Subtraits that group together related configuration options
    Self: UtilOpt + FilterOpt + DecoderOpt + InputOutputOpt + TimeFrameOpt + ViewOpt,
{
    /// Validate the arguments of the config
    fn validate_args(&self) -> Result<(), String> {
        if self.any_errors_exit_code().is_some_and(|val| val == 0) {
            return Err("Invalid config: Exit code for any errors cannot be 0".to_string());
        }
        if self.bco_range_min() > self.bco_range_max() {
            return Err(format!(
                "Invalid config: BCO range min ({min}) is larger than BCO range max ({max})",
                min = self.bco_range_min(),
                max = self.bco_range_max()
            ));
        }
        let window_width = self.bco_range_max().abs_diff(self.bco_range_min());
        if self.retention_bco() < window_width {
            return Err(format!(
                "Invalid config: Retention ({retention} BCO) is shorter than the BCO window ({window_width} BCO), hits would be pruned before they are drained",
                retention = self.retention_bco()
            ));
        }
        // Validate input stats file
        if let Some(path_str) = self.input_stats_file() {
            if !path_str.is_file() {
                return Err(format!(
                    "Invalid config: Input stats file does not exist (got: {})",
                    path_str.to_string_lossy()
                ));
            } else if path_str.extension().is_none() {
                return Err(format!(
                    "Invalid config: Input stats file has no extension (got: {})",
                    path_str.to_string_lossy()
                ));
            } else if DataOutputFormat::from_path(path_str).is_none() {
                return Err(format!(
                    "Invalid config: Input stats file has invalid extension, should be JSON or TOML, got: {})",
                    path_str.to_string_lossy()
                ));
            }
        }
        Ok(())
    }

    /// The acceptance window `(min, max)` relative to the reference BCO.
    fn bco_window(&self) -> (i64, i64) {
        (self.bco_range_min(), self.bco_range_max())
    }
}

impl<T> Config for &T
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (*self).validate_args()
    }
}

impl<T> Config for Box<T>
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (**self).validate_args()
    }
}
impl<T> Config for std::sync::Arc<T>
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (**self).validate_args()
    }
}
