//! Argument handling and setup shared by all commands.

use super::config::Config;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by all commands
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file (default is `nix-version-index.toml`)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

impl CommonArgs {
    /// Initialize logging and load the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded
    pub fn setup(&self) -> Result<Config> {
        init_logging(self.log_level);
        Config::load(Utf8Path::new("."), self.config.as_ref())
    }
}

/// Initialize logger based on log level
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // a logger may already be installed when commands run more than once in a process
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}
