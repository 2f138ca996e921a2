//! Contains the [run] function that is the entry point for tpcframe
use crate::util::lib::{exit, init_ctrlc_handler, init_error_logger};
use crate::{config::init_config, controller::init_controller, init_processing, util::*};

/// Entry point for tpcframe
pub fn run() -> ExitCode {
    human_panic::setup_panic!();

    if let Err(e) = init_config() {
        eprintln!("{e}");
        return ExitCode::from(1);
    };

    init_error_logger(Cfg::global());

    if let Some(shell) = Cfg::global().generate_completions {
        Cfg::generate_completion_script(shell);
        log::warn!("Completions generated for {shell:?}. Exiting...");
        return ExitCode::from(0);
    }

    // Launch controller thread
    // If max allowed errors is reached, the controller thread signals every other thread to stop
    let (controller, stat_send_chan, stop_flag, any_errors_flag) =
        match init_controller(Cfg::global()) {
            Ok(controller_parts) => controller_parts,
            Err(e) => {
                display_error(&format!("Failed to start the stats controller: {e}"));
                return ExitCode::from(1);
            }
        };

    // Handles SIGINT, SIGTERM and SIGHUP (as the `termination` feature is  enabled)
    init_ctrlc_handler(stop_flag.clone());

    let exit_code: u8 = match init_reader(Cfg::global().input_file()) {
        Ok(readable) => match init_processing(Cfg::global(), readable, stat_send_chan, stop_flag) {
            Ok(()) => 0,
            Err(e) => {
                log::error!("Processing failed: {e}");
                1
            }
        },
        Err(e) => {
            if stat_send_chan
                .send(StatType::Fatal(e.to_string().into()))
                .is_err()
            {
                display_error(&format!("{e}"));
            }
            drop(stat_send_chan);
            1
        }
    };

    if controller.join().is_err() {
        log::error!("Failed to join stats thread");
    }

    exit(exit_code, &any_errors_flag)
}
