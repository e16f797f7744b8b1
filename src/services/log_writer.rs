//! 日志文件写入服务 - 业务能力层
//!
//! 只负责"把运行日志追加到文件"能力，不关心流程

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::services::run_log::LogSink;

/// 追加写入文件的运行日志输出端
///
/// 写入失败只记 tracing 警告，不影响脚本执行。
#[derive(Debug, Clone)]
pub struct FileLog {
    path: PathBuf,
}

impl FileLog {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

impl LogSink for FileLog {
    fn write_line(&self, line: &str) {
        if let Err(e) = self.append(line) {
            warn!("写入运行日志失败 {}: {}", self.path.display(), e);
        }
    }
}
