//! Contains the [Cfg] struct that parses and stores the command line arguments
//!
//! [Cfg] uses procedural macros from the `clap` library to implement most of the argument parsing and validation logic.
//! The [Cfg] struct implements several options and subcommands, as well as convenience functions to get various parts of the configuration

use crate::util::*;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

pub mod inputoutput;
pub mod lib;
pub mod prelude;
pub mod test_util;
pub mod util;
pub mod view;
pub mod window;

/// The [CONFIG] static variable is used to store the [Cfg] created from the parsed command line arguments
pub static CONFIG: OnceLock<Cfg> = OnceLock::new();

/// The [Cfg] struct uses procedural macros and implements the [Config] trait, to provide convenient access to the command line arguments.
#[derive(Parser, Debug)]
#[command(name = "tpcframe - sPHENIX TPC time frame decoder")]
#[command(bin_name = "tpcframe", version)]
#[command(about = "tpcframe decodes raw TPC data of the sPHENIX detector into time frames.")]
#[command(
    long_about = "\ntpcframe decodes raw TPC data of the sPHENIX detector.\n\
The FEE data streams are demultiplexed, the channel packets are checked\n\
and decoded into waveform hits, and the hits are matched to the global BCO\n\
and collected into time frames around a reference BCO.\n\
\n\
It can report decoding errors, and display the decoded data in a human\n\
readable way."
)]
#[command(propagate_version = true)]
#[command(styles = styles())]
pub struct Cfg {
    /// TPC packet file (default: stdin)
    #[arg(name = "TPC Packet File", global = true, value_hint = clap::ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// Commands such as `View` that accepts further subcommands
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Packet file with the GL1 packets providing the reference BCO (default: level-1 accepts of the TPC data)
    #[arg(
        long = "gl1",
        visible_alias = "gl1-file",
        global = true,
        value_hint = clap::ValueHint::FilePath
    )]
    gl1_file: Option<PathBuf>,

    /// Verbosity level 0-4 (Errors, Warnings, Info, Debug, Trace)
    #[arg(short = 'v', long = "verbosity", default_value_t = 1, global = true)]
    verbosity: u8,

    /// Max tolerate errors before exiting, if set to 0 -> no limit to errors
    #[arg(
        short = 'e',
        long = "max-tolerate-errors",
        visible_aliases = ["max-errors", "tolerate-errors", "stop-at-error-count"],
        default_value_t = 0,
        global = true
    )]
    max_tolerate_errors: u32,

    /// Set the exit code for if any errors are detected in the input data (cannot be 0)
    #[arg(
        short = 'E',
        long = "any-errors-exit-code",
        visible_alias = "exit-code",
        global = true
    )]
    any_errors_exit_code: Option<u8>,

    /// Packet ids to decode, separated by commas (e.g. 4001,4002). Default: all
    #[arg(
        short = 'p',
        long = "packet-ids",
        visible_aliases = ["packets", "filter-packet-ids"],
        value_delimiter = ',',
        allow_negative_numbers = true,
        global = true
    )]
    filter_packet_ids: Vec<i32>,

    /// FEE packet header format: v1 (5 words) or v2 (7 words)
    #[arg(long = "header-format", default_value = "v1", global = true)]
    header_format: HeaderFormat,

    /// Lower bound of the time frame window relative to the reference BCO
    #[arg(
        long = "bco-range-min",
        default_value_t = DEFAULT_BCO_RANGE_MIN,
        allow_negative_numbers = true,
        global = true
    )]
    bco_range_min: i64,

    /// Upper bound of the time frame window relative to the reference BCO
    #[arg(
        long = "bco-range-max",
        default_value_t = DEFAULT_BCO_RANGE_MAX,
        allow_negative_numbers = true,
        global = true
    )]
    bco_range_max: i64,

    /// Distance in BCO behind the newest GTM tagger after which undrained hits are pruned
    #[arg(
        long = "retention",
        visible_alias = "retention-bco",
        default_value_t = DEFAULT_RETENTION_BCO,
        global = true
    )]
    retention_bco: u64,

    /// Policy matching the FEE hits to the global BCO: last-lvl1 or fee-sync
    #[arg(long = "matcher", default_value = "last-lvl1", global = true)]
    bco_matcher: MatcherKind,

    /// Don't show error messages - helpful if there's a large amount of errors and you just want to see the report
    #[arg(short, long, default_value_t = false, global = true)]
    mute_errors: bool,

    /// Output stats (default: none), requires setting a data format option (JSON, TOML)
    #[arg(
        name = "OUTPUT FINAL STATS",
        short = 'S',
        long = "output-stats",
        default_value_t = DataOutputMode::None,
        visible_aliases = ["output-stats-report","output-final-stats"],
        global = true,
        requires = "STATS FORMAT",
    )]
    stats_output: DataOutputMode,

    /// Output stats format (JSON/TOML), requires setting a stats output option
    #[arg(
        name = "STATS FORMAT",
        short = 'D',
        long = "stats-format",
        visible_alias = "stats-data-format",
        global = true,
        requires = "OUTPUT FINAL STATS"
    )]
    stats_output_format: Option<DataOutputFormat>,

    /// Input stats file to read from and verify match with collected stats at end of analysis.
    /// The file extension determines the format (JSON/TOML)
    #[arg(
        name = "INPUT STATS FILE",
        short = 'i',
        long = "input-stats-file",
        visible_aliases = ["input-stats", "stats-file", "verify-stats"],
        global = true,
        value_hint = clap::ValueHint::FilePath
    )]
    input_stats_file: Option<PathBuf>,

    /// Generate completion scripts for the specified shell.
    /// Note: The completion script is printed to stdout
    #[arg(
        long = "generate-completions",
        value_hint = clap::ValueHint::Other,
        value_name = "SHELL"
    )]
    pub generate_completions: Option<clap_complete::Shell>,

    /// Output from view commands is styled by default, set this flag to disable styled views
    #[arg(short = 'd', long, global = true, default_value_t = false)]
    disable_styled_views: bool,
}

impl Cfg {
    /// Get a reference to the global config
    pub fn global() -> &'static Cfg {
        CONFIG.get().expect("Config is not initialized")
    }

    /// Generate completion scripts for the specified shell.
    pub fn generate_completion_script(shell: Shell) {
        clap_complete::generate(
            shell,
            &mut <Cfg as clap::CommandFactory>::command(),
            "tpcframe",
            &mut io::stdout(),
        );
    }
}

/// Implementing the config super trait requires implementing all the sub traits
impl Config for Cfg {}

impl ViewOpt for Cfg {
    #[inline]
    fn view(&self) -> Option<ViewCommands> {
        self.cmd.as_ref().map(|sub_cmd| match sub_cmd {
            Command::View(view_sub_cmd) => view_sub_cmd.cmd,
        })
    }
}

impl FilterOpt for Cfg {
    #[inline]
    fn filter_packet_ids(&self) -> &[i32] {
        &self.filter_packet_ids
    }
}

impl DecoderOpt for Cfg {
    fn header_format(&self) -> HeaderFormat {
        self.header_format
    }

    fn retention_bco(&self) -> u64 {
        self.retention_bco
    }

    fn bco_matcher(&self) -> MatcherKind {
        self.bco_matcher
    }
}

impl TimeFrameOpt for Cfg {
    #[inline]
    fn bco_range_min(&self) -> i64 {
        self.bco_range_min
    }

    #[inline]
    fn bco_range_max(&self) -> i64 {
        self.bco_range_max
    }
}

impl InputOutputOpt for Cfg {
    #[inline]
    fn input_file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    fn gl1_file(&self) -> Option<&PathBuf> {
        self.gl1_file.as_ref()
    }

    fn stats_output_mode(&self) -> DataOutputMode {
        self.stats_output.clone()
    }

    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        self.stats_output_format
    }

    fn input_stats_file(&self) -> Option<&Path> {
        self.input_stats_file.as_deref()
    }
}

impl UtilOpt for Cfg {
    #[inline]
    fn verbosity(&self) -> u8 {
        self.verbosity
    }
    #[inline]
    fn max_tolerate_errors(&self) -> u32 {
        self.max_tolerate_errors
    }
    fn any_errors_exit_code(&self) -> Option<u8> {
        self.any_errors_exit_code
    }
    fn mute_errors(&self) -> bool {
        self.mute_errors
    }
    #[inline]
    fn disable_styled_views(&self) -> bool {
        self.disable_styled_views
    }
}

/// Holds the [ViewCommands] subcommands
#[derive(Debug, Args, Clone, Copy)]
#[command(args_conflicts_with_subcommands = true)]
#[command(arg_required_else_help = true)]
pub struct ViewArgs {
    #[command(subcommand)]
    cmd: ViewCommands,
}

#[derive(Debug, Subcommand, Clone)]
/// Subcommands to enable views, needs to be followed by a [ViewCommands] subcommand.
pub enum Command {
    /// Enable view mode, requires a `focus` type subcommand e.g. `hits` or `frames`
    #[command(arg_required_else_help = true)]
    View(ViewArgs),
}

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

/// Get the [config][super::config::Cfg] from the command line arguments and set the static [CONFIG] variable.
pub fn init_config() -> Result<(), String> {
    let cfg = <super::config::Cfg as clap::Parser>::parse();
    cfg.validate_args()?;
    CONFIG
        .set(cfg)
        .map_err(|_| "Config already initialized".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cfg {
        <Cfg as Parser>::try_parse_from(std::iter::once("tpcframe").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&["data.sprd"]);
        assert_eq!(cfg.input_file(), Some(&PathBuf::from("data.sprd")));
        assert_eq!(cfg.header_format(), HeaderFormat::V1);
        assert_eq!(cfg.bco_matcher(), MatcherKind::LastLvl1);
        assert_eq!(cfg.bco_window(), (-256, 256));
        assert_eq!(cfg.retention_bco(), 65536);
        assert_eq!(cfg.verbosity(), 1);
        assert!(cfg.filter_packet_ids().is_empty());
        assert_eq!(cfg.stats_output_mode(), DataOutputMode::None);
        assert!(cfg.view().is_none());
        assert!(cfg.validate_args().is_ok());
    }

    #[test]
    fn test_decoder_options() {
        let cfg = parse(&[
            "data.sprd",
            "-p",
            "4001,4002",
            "--header-format",
            "v2",
            "--matcher",
            "fee-sync",
            "--bco-range-min",
            "-100",
            "--bco-range-max",
            "50",
            "--gl1",
            "gl1.sprd",
        ]);
        assert_eq!(cfg.filter_packet_ids(), &[4001, 4002]);
        assert_eq!(cfg.header_format(), HeaderFormat::V2);
        assert_eq!(cfg.bco_matcher(), MatcherKind::FeeSync);
        assert_eq!(cfg.bco_window(), (-100, 50));
        assert_eq!(cfg.gl1_file(), Some(&PathBuf::from("gl1.sprd")));
    }

    #[test]
    fn test_view_subcommand() {
        let cfg = parse(&["data.sprd", "view", "frames"]);
        assert_eq!(cfg.view(), Some(ViewCommands::Frames));
        let cfg = parse(&["view", "gtm"]);
        assert_eq!(cfg.view(), Some(ViewCommands::Gtm));
        assert!(cfg.input_file().is_none());
    }

    #[test]
    fn test_invalid_header_format() {
        let res = <Cfg as Parser>::try_parse_from(["tpcframe", "--header-format", "v3"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_stats_output_requires_format() {
        let res = <Cfg as Parser>::try_parse_from(["tpcframe", "-S", "stdout"]);
        assert!(res.is_err());
        let cfg = parse(&["-S", "stdout", "-D", "json"]);
        assert_eq!(cfg.stats_output_mode(), DataOutputMode::Stdout);
        assert_eq!(cfg.stats_output_format(), Some(DataOutputFormat::JSON));
    }
}
