// Logger - Leveled diagnostics for the emulation core
//
// Provides:
// - A global, leveled logger shared by every component
// - Per-component tags ("membus", "ppu", "65816", ...)
// - Optional in-memory capture for tests
//
// The core never panics through the logger; fatal conditions are reported
// by the components themselves (see the CPU's unknown-opcode path).

use std::sync::Mutex;

/// Log level, ordered from quietest to noisiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// No logging
    None,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warning,
    /// Info, warnings, and errors
    Info,
    /// Debug information
    Debug,
    /// Verbose trace logging
    Trace,
}

struct LoggerState {
    level: LogLevel,
    capture: Option<Vec<String>>,
}

static LOGGER: Mutex<LoggerState> = Mutex::new(LoggerState {
    level: LogLevel::Warning,
    capture: None,
});

/// Set the global log level.
pub fn set_log_level(level: LogLevel) {
    LOGGER.lock().unwrap().level = level;
}

/// Get the current global log level.
pub fn log_level() -> LogLevel {
    LOGGER.lock().unwrap().level
}

/// Start capturing log lines in memory instead of writing to stderr.
///
/// Used by tests to assert on warnings without polluting output.
pub fn capture_logs(enable: bool) {
    let mut logger = LOGGER.lock().unwrap();
    logger.capture = if enable { Some(Vec::new()) } else { None };
}

/// Take the captured log lines, leaving the capture buffer empty.
pub fn take_captured_logs() -> Vec<String> {
    let mut logger = LOGGER.lock().unwrap();
    match logger.capture.as_mut() {
        Some(buf) => std::mem::take(buf),
        None => Vec::new(),
    }
}

fn emit(level: LogLevel, prefix: &str, tag: &str, message: &str) {
    let mut logger = LOGGER.lock().unwrap();
    if logger.level < level {
        return;
    }

    let line = format!("[{}] {}: {}", prefix, tag, message);
    match logger.capture.as_mut() {
        Some(buf) => buf.push(line),
        None => eprintln!("{}", line),
    }
}

/// Log an error message.
pub fn error(tag: &str, message: impl AsRef<str>) {
    emit(LogLevel::Error, "E", tag, message.as_ref());
}

/// Log a warning message.
pub fn warn(tag: &str, message: impl AsRef<str>) {
    emit(LogLevel::Warning, "W", tag, message.as_ref());
}

/// Log an informational message.
pub fn info(tag: &str, message: impl AsRef<str>) {
    emit(LogLevel::Info, "I", tag, message.as_ref());
}

/// Log a debug message.
pub fn debug(tag: &str, message: impl AsRef<str>) {
    emit(LogLevel::Debug, "D", tag, message.as_ref());
}
