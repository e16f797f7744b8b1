use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::connection::{spawn_handler, SETTLE_DELAY};
use crate::error::{ScriptError, ScriptResult};

/// 启动一个新的 Chromium 内核浏览器（Chrome 或 Edge）
///
/// `executable` 为空时由 chromiumoxide 自动探测 Chrome。
pub async fn launch_browser(
    executable: Option<&Path>,
    headless: bool,
) -> ScriptResult<(Browser, Page, JoinHandle<()>)> {
    info!("🚀 启动浏览器 (headless: {})...", headless);

    let mut builder = BrowserConfig::builder();
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = executable {
        debug!("浏览器路径: {}", path.display());
        builder = builder.chrome_executable(path);
    }

    let config = builder
        .args(vec![
            "--disable-gpu",           // Windows 无头模式必须禁用 GPU
            "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage", // 防止共享内存不足
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            ScriptError::browser(format!("invalid browser config: {}", e))
        })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        ScriptError::browser(format!("cannot launch browser: {}", e))
    })?;
    debug!("浏览器启动成功");

    let handler_task = spawn_handler(handler);
    sleep(SETTLE_DELAY).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        ScriptError::browser(e)
    })?;

    Ok((browser, page, handler_task))
}
