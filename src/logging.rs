//! Logger setup: terminal output plus `film-room.log` in the config directory.

use std::fs::{self, File};
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE_NAME: &str = "film-room.log";

/// Any value other than empty or `0` raises the level to `Debug`.
pub const DEBUG_ENV: &str = "FILM_ROOM_DEBUG";

fn level_for(debug: Option<&str>) -> LevelFilter {
    match debug.map(str::trim) {
        None | Some("") | Some("0") => LevelFilter::Info,
        Some(_) => LevelFilter::Debug,
    }
}

pub fn initialize(log_dir: &Path) {
    let level = level_for(std::env::var(DEBUG_ENV).ok().as_deref());

    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(file_logger) = create_file_logger(log_dir, level, config) {
        loggers.push(file_logger);
    }

    // A logger may already be installed (tests); keep that one.
    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        // iced and its renderer stack are very chatty at info.
        .add_filter_ignore_str("wgpu")
        .add_filter_ignore_str("naga")
        .add_filter_ignore_str("cosmic_text")
        .build()
}

fn create_file_logger(
    log_dir: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    if let Err(err) = fs::create_dir_all(log_dir) {
        eprintln!(
            "Warning: Could not create log directory {:?}: {}",
            log_dir, err
        );
        return None;
    }

    let log_path = log_dir.join(LOG_FILE_NAME);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}

#[cfg(test)]
pub fn initialize_for_tests() {
    let _ = CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
