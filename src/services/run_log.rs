//! 运行日志 - 业务能力层
//!
//! 用户可见的执行日志，和 tracing 诊断日志分开。每行带 `[YYYY-MM-DD HH:MM:SS] ` 前缀，
//! 同时分发给所有注册的输出端。

use std::sync::{Arc, Mutex};

use tracing::info;

/// 时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 运行日志输出端
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// 给一行消息加上本地时间前缀
pub fn timestamped(message: &str) -> String {
    format!("[{}] {}", chrono::Local::now().format(TIMESTAMP_FORMAT), message)
}

/// 运行日志
#[derive(Clone, Default)]
pub struct RunLog {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Arc<dyn LogSink>) {
        self.sinks.push(sink);
    }

    /// 记录一行
    pub fn log(&self, message: impl AsRef<str>) {
        let line = timestamped(message.as_ref());
        for sink in &self.sinks {
            sink.write_line(&line);
        }
    }
}

impl std::fmt::Debug for RunLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLog")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

/// 内存输出端，测试和界面展示用
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 带时间戳的完整行
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 去掉时间戳前缀后的消息
    pub fn messages(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .map(|line| match line.split_once("] ") {
                Some((_, message)) => message.to_string(),
                None => line,
            })
            .collect()
    }
}

impl LogSink for MemoryLog {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
    }
}

/// 转发到 tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn write_line(&self, line: &str) {
        info!(target: "run_log", "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_prefix_shape() {
        let line = timestamped("Page refreshed.");
        // [2024-01-02 03:04:05] Page refreshed.
        assert_eq!(&line[0..1], "[");
        assert_eq!(&line[20..22], "] ");
        assert!(line.ends_with("Page refreshed."));
        assert!(chrono::NaiveDateTime::parse_from_str(&line[1..20], TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_fan_out_to_every_sink() {
        let first = MemoryLog::new();
        let second = MemoryLog::new();
        let log = RunLog::new()
            .with_sink(first.clone())
            .with_sink(second.clone());
        log.log("Delay for 1 seconds.");
        assert_eq!(first.messages(), vec!["Delay for 1 seconds."]);
        assert_eq!(second.lines().len(), 1);
    }
}
