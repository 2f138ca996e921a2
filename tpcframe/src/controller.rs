//! Contains the [Controller] that collects stats and reports errors.
//! It also controls the stop flag, which is raised if a fatal error occurs, or if the config contains a max number of errors to tolerate.
//! When the event loop breaks (at the end of execution), it prints a summary of the stats collected, using the [Report] struct.
//!
//! Also contains the convenience [init_controller] function, which spawns a thread with the [Controller] running, and returns the thread handle, the channel to send stats to, and the flags.

use crate::util::*;

/// Spawns a thread with the [Controller] running, and returns the thread handle, the channel to send stats to, the stop flag and the any errors flag.
pub fn init_controller<C: Config + 'static>(
    config: &'static C,
) -> io::Result<(
    JoinHandle<()>,
    flume::Sender<StatType>,
    Arc<AtomicBool>,
    Arc<AtomicBool>,
)> {
    log::trace!("Initializing stats controller");
    let mut stats = Controller::new(config);
    let stats_send_chan = stats.send_channel();
    let thread_stop_flag = stats.end_processing_flag();
    let any_errors_flag = stats.any_errors_flag();

    let stats_thread = Builder::new()
        .name("stats_thread".to_string())
        .spawn(move || {
            stats.run();
        })?;
    Ok((
        stats_thread,
        stats_send_chan,
        thread_stop_flag,
        any_errors_flag,
    ))
}

/// The Controller receives stats and builds a summary report that is printed at the end of execution.
pub struct Controller<C: Config + 'static> {
    stats_collector: StatsCollector,
    /// Time from [Controller] is instantiated, to all producers disconnected their [StatType] channel.
    pub processing_time: Instant,
    config: &'static C,
    max_tolerate_errors: u32,
    stats_recv_chan: flume::Receiver<StatType>,
    // Set to None when the event loop starts, the loop breaks when all senders are dropped.
    stats_send_chan: Option<flume::Sender<StatType>>,
    end_processing_flag: Arc<AtomicBool>,
    any_errors_flag: Arc<AtomicBool>,
    spinner: Option<ProgressBar>,
    spinner_message: String,
}

impl<C: Config + 'static> Controller<C> {
    /// Creates a new [Controller] from a [Config].
    pub fn new(global_config: &'static C) -> Self {
        let (stats_send_chan, stats_recv_chan): (
            flume::Sender<StatType>,
            flume::Receiver<StatType>,
        ) = flume::unbounded();
        Controller {
            stats_collector: StatsCollector::default(),
            config: global_config,
            processing_time: Instant::now(),
            max_tolerate_errors: global_config.max_tolerate_errors(),
            stats_recv_chan,
            stats_send_chan: Some(stats_send_chan),
            end_processing_flag: Arc::new(AtomicBool::new(false)),
            any_errors_flag: Arc::new(AtomicBool::new(false)),
            spinner: if global_config.view().is_some()
                || global_config.stats_output_mode() == DataOutputMode::Stdout
            {
                None
            } else {
                Some(new_styled_spinner())
            },
            spinner_message: String::new(),
        }
    }

    /// Returns a clone of the channel that is used to send stats to the Controller.
    ///
    /// # Panics
    /// If called after [run](Controller::run) started.
    pub fn send_channel(&self) -> flume::Sender<StatType> {
        match self.stats_send_chan.as_ref() {
            Some(chan) => chan.clone(),
            None => panic!("Controller send channel is none, it is already running and does not accept new producers"),
        }
    }

    /// Returns a cloned reference to the end processing flag.
    pub fn end_processing_flag(&self) -> Arc<AtomicBool> {
        self.end_processing_flag.clone()
    }

    /// Returns a cloned reference to the any errors flag
    ///
    /// The flag is set if there's any errors at the end of processing.
    pub fn any_errors_flag(&self) -> Arc<AtomicBool> {
        self.any_errors_flag.clone()
    }

    /// Starts the event loop for the Controller
    /// This function will block until all senders are dropped
    pub fn run(&mut self) {
        self.stats_send_chan = None;

        while let Ok(stats_update) = self.stats_recv_chan.recv() {
            self.update(stats_update);
        }

        // Avoid printing the report in the middle of a view, or when stats are piped to stdout
        if self.config.view().is_some()
            || self.config.stats_output_mode() == DataOutputMode::Stdout
        {
            log::info!("View active or stats are written to stdout, skipping report summary printout.");
            self.stats_collector.finalize();
        } else {
            self.process_stats();
            self.new_spinner_with_prefix("Generating report".to_string());
            self.print();
        }

        if let Some(format) = self.config.stats_output_format() {
            if let Err(e) = self
                .stats_collector
                .write_stats(&self.config.stats_output_mode(), format)
            {
                display_error(&format!("Failed writing stats output: {e}"));
            }
        }

        if let Some(input_stats) = self.config.input_stats_file() {
            self.validate_input_stats(input_stats);
        }

        if self.stats_collector.any_errors() {
            self.any_errors_flag.store(true, Ordering::SeqCst);
        }
    }

    /// Compares the collected stats against a stats file from a previous run
    fn validate_input_stats(&mut self, input_stats: &Path) {
        log::info!("Validating input stats file against collected stats");
        match StatsCollector::from_file(input_stats) {
            Ok(input_stats_collector) => {
                if self
                    .stats_collector
                    .validate_other_stats(&input_stats_collector, self.config.mute_errors())
                    .is_err()
                {
                    self.any_errors_flag.store(true, Ordering::SeqCst);
                    log::warn!("Input stats did not match collected stats");
                } else {
                    log::info!("Input stats matched collected stats");
                }
            }
            Err(e) => {
                display_error(&e);
                self.any_errors_flag.store(true, Ordering::SeqCst);
            }
        }
    }

    fn update(&mut self, stat: StatType) {
        match stat {
            StatType::RunNumber(run) => {
                log::debug!("Run number determined to be {run}");
                self.stats_collector.collect(stat);
            }
            StatType::Input(_) | StatType::ContainerReset => self.stats_collector.collect(stat),
            StatType::TimeFrame { .. } => {
                self.stats_collector.collect(stat);
                if let Some(spinner) = self.spinner.as_ref() {
                    spinner.set_prefix(format!(
                        "Built {frames} time frames",
                        frames = self.stats_collector.frame_stats().time_frames()
                    ));
                }
            }
            StatType::Decoder(_) | StatType::Error(_) => {
                if self.stats_collector.fatal_err() {
                    log::trace!("Fatal error already seen, ignoring: {stat}");
                    return;
                }
                let is_error = stat.is_data_error();
                self.stats_collector.collect(stat);
                if is_error {
                    self.on_error();
                }
            }
            StatType::Fatal(err) => {
                if self.stats_collector.fatal_err() {
                    log::trace!("Fatal error already seen, ignoring error: {err}");
                    return;
                }
                self.end_processing_flag.store(true, Ordering::SeqCst);
                log::error!("FATAL: {err}\nShutting down...");
                self.stats_collector.collect(StatType::Fatal(err));
            }
        }
    }

    fn on_error(&mut self) {
        let err_count = self.stats_collector.err_count();
        self.set_spinner_msg(format!("{err_count} Errors in data!").red().to_string());

        if self.max_tolerate_errors > 0 && err_count >= u64::from(self.max_tolerate_errors) {
            if !self.end_processing_flag.load(Ordering::SeqCst) {
                log::trace!("Errors reached maximum tolerated errors, exiting...");
            }
            self.end_processing_flag.store(true, Ordering::SeqCst);
        }
    }

    fn process_stats(&mut self) {
        if self.stats_collector.err_count() > 0 {
            self.new_spinner_with_prefix(
                format!(
                    "Processing {err_count} errors",
                    err_count = self.stats_collector.err_count()
                )
                .yellow()
                .to_string(),
            );
        }
        self.stats_collector.finalize();

        if !self.config.mute_errors() {
            let max_errors = match self.config.max_tolerate_errors() {
                0 => usize::MAX,
                max => max as usize,
            };
            self.stats_collector
                .reported_errors_as_slice()
                .iter()
                .take(max_errors)
                .for_each(|e| display_error(e));
            let data_errors = self.stats_collector.data_error_count();
            if data_errors > 0 {
                display_error(&format!(
                    "{data_errors} errors in decoded data, see the decoder stats"
                ));
            }
        }
    }

    /// Builds and prints the report
    fn print(&mut self) {
        let mut report = make_report(self.processing_time.elapsed(), &mut self.stats_collector);
        self.append_spinner_msg("... completed");
        if let Some(spinner) = self.spinner.as_ref() {
            spinner.abandon();
        }

        let mut lock = io::stdout().lock();
        if let Err(e) = writeln!(lock, "{}", report.table()) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                log::warn!("Broken pipe, stdout was closed before report could be written");
            } else {
                log::error!("Failed to write report to stdout: {e}");
            }
        }
    }

    /// Completes and abandons the current spinner, replacing it with a new one with the given prefix
    fn new_spinner_with_prefix(&mut self, prefix: String) {
        if let Some(spinner) = self.spinner.take() {
            self.spinner_message.push_str("... completed ");
            spinner.set_message(self.spinner_message.clone());
            spinner.abandon();
        } else if self.config.view().is_some()
            || self.config.stats_output_mode() == DataOutputMode::Stdout
        {
            return;
        }
        let spinner = new_styled_spinner();
        spinner.set_prefix(prefix);
        self.spinner = Some(spinner);
        self.spinner_message.clear();
    }

    fn set_spinner_msg(&mut self, new_msg: String) {
        if let Some(spinner) = self.spinner.as_ref() {
            self.spinner_message = new_msg;
            spinner.set_message(self.spinner_message.clone());
        }
    }

    fn append_spinner_msg(&mut self, to_append: &str) {
        if let Some(spinner) = self.spinner.as_ref() {
            self.spinner_message.push_str(to_append);
            self.spinner_message.push(' ');
            spinner.set_message(self.spinner_message.clone());
        }
    }
}

fn new_styled_spinner() -> ProgressBar {
    let spinner_style = ProgressStyle::with_template("{spinner} [ {prefix:.bold.blue} ] {wide_msg}")
        .map(|style| {
            style.tick_strings(&[
                "▹▹▹▹▹",
                "▸▹▹▹▹",
                "▹▸▹▹▹",
                "▹▹▸▹▹",
                "▹▹▹▸▹",
                "▹▹▹▹▸",
                "▪▪▪▪▪",
            ])
        })
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
