//! Logging to the terminal and, optionally, to a file.
use log::{LevelFilter, info};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot create log file: {0}")]
    File(#[from] std::io::Error),
    #[error("logger already initialized: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Installs the global logger: the terminal always, plus `file` if given.
pub fn init_logger<P: AsRef<Path>>(level: LevelFilter, file: Option<P>) -> Result<(), LoggingError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let path = file.map(|p| p.as_ref().to_path_buf());
    if let Some(path) = &path {
        loggers.push(WriteLogger::new(level, Config::default(), File::create(path)?));
    }
    CombinedLogger::init(loggers)?;
    if let Some(path) = path {
        info!("logging to {}", path.display());
    }
    Ok(())
}
