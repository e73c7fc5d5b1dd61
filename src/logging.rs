use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Names a file that log lines are appended to.
pub const LOG_FILE_ENV: &str = "TSM_LOG_FILE";

/// Where logs go when no log file is configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogOutput {
    /// Discard; the terminal belongs to the dashboard.
    Sink,
    Stderr,
}

pub fn init_logging(fallback: LogOutput) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = match open_log_file(std::env::var(LOG_FILE_ENV).ok()) {
        Some(Ok(file)) => Some(file),
        Some(Err(err)) => {
            // no subscriber yet, and the dashboard has not taken the terminal
            eprintln!("{LOG_FILE_ENV}: cannot open log file ({err}), logging disabled");
            None
        }
        None => None,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match (file, fallback) {
        (Some(file), _) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        (None, LogOutput::Stderr) => builder.with_writer(io::stderr).try_init(),
        (None, LogOutput::Sink) => builder.with_writer(io::sink).try_init(),
    };
}

/// `None` when no log file is configured.
fn open_log_file(path: Option<String>) -> Option<io::Result<File>> {
    let path = path.filter(|p| !p.trim().is_empty())?;
    Some(OpenOptions::new().create(true).append(true).open(path))
}
