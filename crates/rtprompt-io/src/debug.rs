//! Debug logging to a file.
//!
//! Stdout belongs to the prompt, so `log` records go to a file instead. The
//! sink is only installed when `RTPROMPT_DEBUG` is `1` or `true`.

use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

pub const ENV_ENABLE_LOG: &str = "RTPROMPT_DEBUG";

static LOGGER: OnceLock<FileLogger> = OnceLock::new();

/// `log` sink appending one line per record to a file.
pub struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl FileLogger {
    pub fn open(path: impl AsRef<Path>, level: LevelFilter) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            level,
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(
            file,
            "[{timestamp}] {:<5} {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
        let _ = file.flush();
    }

    fn flush(&self) {
        let _ = self.file.lock().unwrap_or_else(PoisonError::into_inner).flush();
    }
}

fn is_enabled_value(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

/// Whether `RTPROMPT_DEBUG` asks for logging.
pub fn is_enabled() -> bool {
    is_enabled_value(std::env::var(ENV_ENABLE_LOG).ok().as_deref())
}

/// `tmp/rtprompt-debug.log` when a `tmp` directory exists, else the system one.
pub fn log_path() -> &'static str {
    if Path::new("tmp").is_dir() {
        "tmp/rtprompt-debug.log"
    } else {
        "/tmp/rtprompt-debug.log"
    }
}

/// Install the file logger if `RTPROMPT_DEBUG` is set.
///
/// Returns the log path when logging was enabled by this call. Later calls
/// and calls after another logger was installed do nothing.
pub fn init() -> Option<&'static str> {
    if !is_enabled() || LOGGER.get().is_some() {
        return None;
    }

    let path = log_path();
    let logger = match FileLogger::open(path, LevelFilter::Trace) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to open debug log file {path}: {e}");
            return None;
        }
    };

    let logger = LOGGER.get_or_init(|| logger);
    if log::set_logger(logger).is_err() {
        return None;
    }
    log::set_max_level(LevelFilter::Trace);
    eprintln!("rtprompt debug log enabled: {path}");
    Some(path)
}
