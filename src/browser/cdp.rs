//! Chrome / Edge 后端（Chrome DevTools Protocol）

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    GetNavigationHistoryParams, NavigateToHistoryEntryParams,
};
use chromiumoxide::{Browser, Element};
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::connection::connect_to_browser;
use crate::browser::launch::launch_browser;
use crate::browser::{BrowserDriver, DomQuery, Locator, PageElement};
use crate::error::{ScriptError, ScriptResult};
use crate::infrastructure::JsExecutor;

const CLEAR_FN: &str = "function() {
    this.focus();
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
}";

/// CDP 浏览器连接
pub struct CdpDriver {
    browser: Browser,
    executor: JsExecutor,
    handler_task: JoinHandle<()>,
    /// 自己启动的浏览器关闭时整个退出；附加到的浏览器只关掉自己的标签页
    owned: bool,
}

impl CdpDriver {
    /// 启动新浏览器
    pub async fn launch(executable: Option<&Path>, headless: bool) -> ScriptResult<Self> {
        let (browser, page, handler_task) = launch_browser(executable, headless).await?;
        Ok(Self {
            browser,
            executor: JsExecutor::new(page),
            handler_task,
            owned: true,
        })
    }

    /// 附加到调试端口上已运行的浏览器
    pub async fn attach(port: u16) -> ScriptResult<Self> {
        let (browser, page, handler_task) = connect_to_browser(port).await?;
        Ok(Self {
            browser,
            executor: JsExecutor::new(page),
            handler_task,
            owned: false,
        })
    }

    /// 在历史记录中前进或后退 `offset` 条并等待页面加载；已在两端时什么也不做
    async fn history(&self, offset: i64) -> ScriptResult<()> {
        let page = self.executor.page();
        let history = page
            .execute(GetNavigationHistoryParams::default())
            .await
            .map_err(ScriptError::browser)?;

        let entries = &history.result.entries;
        let Some(idx) = history_index(history.result.current_index, offset, entries.len()) else {
            debug!("已在历史记录一端，保持当前页面");
            return Ok(());
        };
        let entry = &entries[idx];

        page.execute(NavigateToHistoryEntryParams::new(entry.id))
            .await
            .map_err(ScriptError::browser)?;
        page.wait_for_navigation()
            .await
            .map_err(ScriptError::browser)?;
        let href = self.executor.eval_as::<String>("location.href").await?;
        debug!("历史记录跳转到: {}", href);
        Ok(())
    }
}

/// 当前位置移动 `offset` 后的历史记录下标，越界返回 None
fn history_index(current: i64, offset: i64, len: usize) -> Option<usize> {
    usize::try_from(current + offset).ok().filter(|idx| *idx < len)
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn navigate(&mut self, url: &str) -> ScriptResult<()> {
        self.executor
            .page()
            .goto(url)
            .await
            .map_err(|e| ScriptError::browser(format!("cannot open {}: {}", url, e)))?;
        Ok(())
    }

    async fn back(&mut self) -> ScriptResult<()> {
        self.history(-1).await
    }

    async fn forward(&mut self) -> ScriptResult<()> {
        self.history(1).await
    }

    async fn refresh(&mut self) -> ScriptResult<()> {
        self.executor
            .page()
            .reload()
            .await
            .map_err(ScriptError::browser)?;
        Ok(())
    }

    async fn find_element(&mut self, locator: &Locator) -> ScriptResult<Box<dyn PageElement>> {
        let page = self.executor.page();
        let found = match locator.to_query() {
            DomQuery::Css(css) => {
                debug!("CSS 查询: {}", css);
                page.find_element(css).await
            }
            DomQuery::XPath(xpath) => {
                debug!("XPath 查询: {}", xpath);
                page.find_xpath(xpath).await
            }
        };
        let element = found.map_err(|e| locator.not_found(e))?;
        Ok(Box::new(CdpElement { element }))
    }

    async fn close(&mut self) -> ScriptResult<()> {
        let result = if self.owned {
            let closed = self.browser.close().await.map_err(ScriptError::browser);
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
            closed.map(|_| ())
        } else {
            self.executor
                .page()
                .clone()
                .close()
                .await
                .map_err(ScriptError::browser)
        };
        self.handler_task.abort();
        result
    }
}

/// CDP 页面元素
pub struct CdpElement {
    element: Element,
}

impl CdpElement {
    /// 以元素为 `this` 调用一个 JS 函数，取返回值
    async fn call_fn(&self, declaration: String) -> ScriptResult<Option<JsonValue>> {
        let returns = self
            .element
            .call_js_fn(declaration, false)
            .await
            .map_err(ScriptError::browser)?;
        if let Some(details) = returns.exception_details {
            return Err(ScriptError::browser(details.text));
        }
        Ok(returns.result.value)
    }
}

#[async_trait]
impl PageElement for CdpElement {
    async fn click(&self) -> ScriptResult<()> {
        self.element.click().await.map_err(ScriptError::browser)?;
        Ok(())
    }

    async fn clear(&self) -> ScriptResult<()> {
        self.call_fn(CLEAR_FN.to_string()).await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> ScriptResult<()> {
        self.element.focus().await.map_err(ScriptError::browser)?;
        self.element
            .type_str(text)
            .await
            .map_err(ScriptError::browser)?;
        Ok(())
    }

    async fn text(&self) -> ScriptResult<String> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(ScriptError::browser)?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> ScriptResult<Option<String>> {
        // 优先取 DOM 属性（src 会被解析成绝对地址），没有再退回 HTML 特性
        let declaration = format!(
            "function() {{
                const name = {};
                const value = this[name];
                if (typeof value === 'string') return value;
                return this.getAttribute(name);
            }}",
            serde_json::to_string(name)?
        );
        let value = self.call_fn(declaration).await?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn select_by_visible_text(&self, text: &str) -> ScriptResult<()> {
        let declaration = format!(
            "function() {{
                const label = {};
                const norm = s => s.replace(/\\s+/g, ' ').trim();
                if (this.tagName !== 'SELECT') return 'element is not a <select>';
                const option = Array.from(this.options).find(o => norm(o.text) === norm(label));
                if (!option) return 'no option with visible text ' + JSON.stringify(label);
                option.selected = true;
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return null;
            }}",
            serde_json::to_string(text)?
        );
        match self.call_fn(declaration).await? {
            Some(JsonValue::String(reason)) => Err(ScriptError::browser(reason)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_index_moves_within_entries() {
        assert_eq!(history_index(1, -1, 3), Some(0));
        assert_eq!(history_index(1, 1, 3), Some(2));
    }

    #[test]
    fn test_history_index_at_either_end_is_none() {
        assert_eq!(history_index(0, -1, 3), None);
        assert_eq!(history_index(2, 1, 3), None);
        assert_eq!(history_index(0, 1, 1), None);
    }
}
