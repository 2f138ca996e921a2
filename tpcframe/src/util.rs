//! Miscellaneous utility functions
pub mod lib;

pub(crate) use {
    crate::{
        config::{
            inputoutput::{DataOutputFormat, DataOutputMode},
            prelude::*,
            window::{DEFAULT_BCO_RANGE_MAX, DEFAULT_BCO_RANGE_MIN},
            Cfg,
        },
        display_error,
        input_manager::{
            hit_container::{HitContainer, TpcRawHitContainer, MAX_CONTAINER_HITS},
            pool::{PoolError, PoolInput, ReferencePool, TpcPool},
            InputManagerError, TimeFrameInputManager,
        },
        stats::{
            stats_collector::StatsCollector,
            stats_report::{
                make_report,
                report::{Report, StatSummary},
            },
            StatType,
        },
    },
    clap::builder::{
        styling::{AnsiColor, Effects},
        Styles,
    },
    indicatif::{ProgressBar, ProgressStyle},
    itertools::Itertools,
    owo_colors::OwoColorize,
    serde::{Deserialize, Serialize},
    sphenix_protocol_reader::{
        prelude::*, time_frame::assembler::DEFAULT_RETENTION_BCO, time_frame::TimeFrame,
    },
    std::{
        collections::BTreeMap,
        fmt, fs,
        io::{self, Write},
        path::{Path, PathBuf},
        process::ExitCode,
        str::FromStr,
        sync::{
            atomic::{self, AtomicBool, Ordering},
            Arc, OnceLock,
        },
        thread::{self, Builder, JoinHandle},
        time::{Duration, Instant},
    },
};
