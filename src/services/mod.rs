pub mod log_writer;
pub mod run_log;

pub use log_writer::FileLog;
pub use run_log::{LogSink, MemoryLog, RunLog, TracingLog};
