use chromiumoxide::handler::Handler;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{ScriptError, ScriptResult};

/// 等待浏览器状态同步
pub(crate) const SETTLE_DELAY: std::time::Duration = std::time::Duration::from_millis(300);

/// 在后台处理浏览器事件
pub(crate) fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

/// 连接到已经以调试端口启动的浏览器，并打开一个新标签页
///
/// 用于复用用户自己开着的 Chrome / Edge（`--remote-debugging-port=<port>`）。
pub async fn connect_to_browser(port: u16) -> ScriptResult<(Browser, Page, JoinHandle<()>)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        ScriptError::browser(format!("cannot attach to {}: {}", browser_url, e))
    })?;
    debug!("浏览器连接成功");

    let handler_task = spawn_handler(handler);
    sleep(SETTLE_DELAY).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建空白页面失败: {}", e);
        ScriptError::browser(e)
    })?;

    Ok((browser, page, handler_task))
}
