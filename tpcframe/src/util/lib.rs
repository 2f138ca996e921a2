//! Miscellaneous utility functions

use crate::config::prelude::*;
use crate::config::Cfg;
use std::sync::{atomic::AtomicBool, Arc};

/// Start the [stderrlog] instance for the modules of the CLI and the reader library.
pub fn init_error_logger(cfg: &(impl UtilOpt + InputOutputOpt + ViewOpt)) {
    if let Err(e) = stderrlog::new()
        .modules(["tpcframe", "sphenix_protocol_reader"])
        .verbosity(cfg.verbosity() as usize)
        .init()
    {
        eprintln!("Failed to initialize logger: {e}");
    }
    match cfg.input_file() {
        Some(path) => log::trace!("Reading TPC packets from {}", path.display()),
        None => log::trace!("Reading TPC packets from stdin"),
    }
    match cfg.gl1_file() {
        Some(path) => log::trace!("Reference BCO from GL1 packets in {}", path.display()),
        None => log::trace!("Reference BCO from the TPC level-1 taggers"),
    }
    log::trace!("Views enabled: {:#?}", cfg.view());
}

/// Initializes the Ctrl+C handler to facilitate graceful shutdown on Ctrl+C
///
/// Also handles SIGTERM and SIGHUP if the `termination` feature is enabled
pub fn init_ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    // Handles SIGINT, SIGTERM and SIGHUP (as the `termination` feature is  enabled)
    let res = ctrlc::set_handler({
        let mut stop_sig_count = 0;
        move || {
            log::warn!(
                "Stop Ctrl+C, SIGTERM, or SIGHUP received, stopping gracefully, please wait..."
            );
            stop_flag.store(true, std::sync::atomic::Ordering::SeqCst);
            stop_sig_count += 1;
            if stop_sig_count > 1 {
                log::warn!("Second stop signal received, ungraceful shutdown.");
                std::process::exit(1);
            }
        }
    });
    if let Err(e) = res {
        log::error!("Error setting Ctrl-C handler: {e}");
    }
}

/// Exits the program with the appropriate exit code
pub fn exit(exit_code: u8, any_errors_flag: &AtomicBool) -> std::process::ExitCode {
    exit_with(
        exit_code,
        Cfg::global().any_errors_exit_code(),
        any_errors_flag,
    )
}

fn exit_with(
    exit_code: u8,
    any_errors_exit_code: Option<u8>,
    any_errors_flag: &AtomicBool,
) -> std::process::ExitCode {
    if exit_code != 0 {
        return std::process::ExitCode::from(exit_code);
    }
    log::debug!("Exit successful from data processing");
    match any_errors_exit_code {
        Some(code) if any_errors_flag.load(std::sync::atomic::Ordering::Relaxed) => {
            std::process::ExitCode::from(code)
        }
        _ => std::process::ExitCode::SUCCESS,
    }
}
