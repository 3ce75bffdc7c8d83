// Debug module - Diagnostics shared by the emulation core
//
// Components log through a global leveled logger, and the CPU keeps a
// short ring of formatted instruction traces that is dumped when decoding
// fails. Neither facility is required for emulation; both default to
// quiet.

pub mod execution_log;
pub mod logger;

pub use execution_log::ExecutionLog;
pub use logger::{
    capture_logs, debug, error, info, log_level, set_log_level, take_captured_logs, warn, LogLevel,
};
