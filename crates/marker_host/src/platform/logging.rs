//! Logger initialization for the native messaging host.
//!
//! Stdout carries protocol frames, so terminal output goes to stderr only.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use super::config::{HostConfig, LogDestination};

/// Initialize the global logger from the host config.
///
/// For `LogDestination::File` or `Both`, truncates the configured log file.
pub fn initialize(config: &HostConfig) {
    let level = config.log_level.filter();
    let log_config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match config.log_destination {
        LogDestination::File => match create_file_logger(&config.log_file, level, log_config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Terminal => vec![stderr_logger(level, log_config)],
        LogDestination::Both => {
            let mut loggers: Vec<Box<dyn SharedLogger>> =
                vec![stderr_logger(level, log_config.clone())];
            if let Some(file_logger) = create_file_logger(&config.log_file, level, log_config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn stderr_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
