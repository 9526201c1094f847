use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages (default)
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Wrapping applied to a printed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocCommand {
    /// `{"add": {"doc": ...}}`
    Add,
    /// Atomic update list
    Update,
}

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "quarry - assemble search-index documents from repository resources")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (YAML, JSON or TOML)
    #[arg(short = 'C', long, global = true, env = "QUARRY_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Level requested on the command line; `--log-level` wins over `-v`
    pub fn level(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, true) => LevelFilter::DEBUG,
            (None, false) => LevelFilter::INFO,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on (overrides server.listen)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Assemble one document and print it as JSON
    Doc {
        /// Repository URI or path below the repository endpoint
        uri: String,

        /// Wrap the document as a Solr update command
        #[arg(long, value_enum)]
        command: Option<DocCommand>,

        /// Overall deadline in milliseconds (overrides pipeline.request_timeout_ms)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Validate the configuration and stage names, then exit
    CheckConfig,
}
