/// 日志工具模块
///
/// 诊断日志（tracing）的初始化，以及运行日志文件、启动信息和统计输出的辅助函数
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// `RUST_LOG` 优先；否则默认 `info`，verbose 时 `debug`。重复调用是无害的。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件，写入标题
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    if let Some(parent) = log_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建日志目录失败: {}", parent.display()))?;
        }
    }
    let log_header = format!(
        "{}\n测试运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    std::fs::write(log_file_path, log_header)
        .with_context(|| format!("写入日志文件失败: {}", log_file_path.display()))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(browser: &str, target: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始执行: {}", target);
    info!("🌐 浏览器: {}", browser);
    info!("{}", "=".repeat(60));
}

/// 打印套件统计信息
pub fn print_suite_stats(completed: usize, aborted: usize, total: usize, stopped_early: bool) {
    info!("\n{}", "=".repeat(60));
    info!("📊 套件执行完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 完成: {}/{}", completed, total);
    info!("❌ 中止: {}", aborted);
    if stopped_early {
        info!("⏹ 因脚本中止提前停止，剩余 {} 个未执行", total.saturating_sub(completed + aborted));
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("测试运行", 10), "测试运行");
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        init_log_file(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("测试运行日志"));
    }
}
