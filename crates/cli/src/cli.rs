//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

const EXAMPLES: &str = "\
Examples:
  Send the echoed message to both stdout and a file called greetings.txt:

    $ echo \"Hello\" | gtee greetings.txt
    Hello";

/// gtee - Duplicate standard input
#[derive(Parser, Debug)]
#[command(
    name = "gtee",
    version,
    about = "Duplicate standard input",
    long_about = "Copies standard input to standard output and to every FILE.\n\n\
                  A FILE of '-' names a file called '-', never standard output. \n\
                  Repeated FILEs are written once.",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Ignore the SIGINT signal
    #[arg(short, long)]
    pub ignore: bool,

    /// Append the output to the files rather than overwriting them
    #[arg(short, long)]
    pub append: bool,

    /// Log internal events to stderr (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "GTEE_VERBOSE")]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact", env = "GTEE_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Files to copy standard input into
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
