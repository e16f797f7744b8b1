//! Firefox 后端（W3C WebDriver，需要本地运行 geckodriver）

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator as WdLocator};
use serde_json::json;
use tracing::{debug, info};

use crate::browser::{BrowserDriver, DomQuery, Locator, PageElement};
use crate::error::{ScriptError, ScriptResult};
use crate::models::LocatorStrategy;

/// WebDriver 浏览器连接
pub struct WebDriverDriver {
    client: Client,
}

impl WebDriverDriver {
    /// 连接 WebDriver 服务并新建 Firefox 会话
    pub async fn connect(webdriver_url: &str, headless: bool) -> ScriptResult<Self> {
        info!("🦊 连接 WebDriver: {}", webdriver_url);

        let mut caps = serde_json::Map::new();
        if headless {
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);
        let client = builder
            .connect(webdriver_url)
            .await
            .map_err(|e| {
                ScriptError::browser(format!("cannot start session at {}: {}", webdriver_url, e))
            })?;
        debug!("WebDriver 会话已建立");
        Ok(Self { client })
    }
}

#[async_trait]
impl BrowserDriver for WebDriverDriver {
    async fn navigate(&mut self, url: &str) -> ScriptResult<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| ScriptError::browser(format!("cannot open {}: {}", url, e)))
    }

    async fn back(&mut self) -> ScriptResult<()> {
        self.client.back().await.map_err(ScriptError::browser)
    }

    async fn forward(&mut self) -> ScriptResult<()> {
        self.client.forward().await.map_err(ScriptError::browser)
    }

    async fn refresh(&mut self) -> ScriptResult<()> {
        self.client.refresh().await.map_err(ScriptError::browser)
    }

    async fn find_element(&mut self, locator: &Locator) -> ScriptResult<Box<dyn PageElement>> {
        let query = locator.to_query();
        let found = match (locator.strategy, &query) {
            (LocatorStrategy::Id, _) => self.client.find(WdLocator::Id(&locator.identifier)).await,
            (LocatorStrategy::LinkText, _) => {
                self.client
                    .find(WdLocator::LinkText(&locator.identifier))
                    .await
            }
            (_, DomQuery::Css(css)) => self.client.find(WdLocator::Css(css)).await,
            (_, DomQuery::XPath(xpath)) => self.client.find(WdLocator::XPath(xpath)).await,
        };
        let element = found.map_err(|e| locator.not_found(e))?;
        Ok(Box::new(WebDriverElement { element }))
    }

    async fn close(&mut self) -> ScriptResult<()> {
        self.client
            .clone()
            .close()
            .await
            .map_err(ScriptError::browser)
    }
}

/// WebDriver 页面元素
pub struct WebDriverElement {
    element: Element,
}

#[async_trait]
impl PageElement for WebDriverElement {
    async fn click(&self) -> ScriptResult<()> {
        self.element.click().await.map_err(ScriptError::browser)
    }

    async fn clear(&self) -> ScriptResult<()> {
        self.element.clear().await.map_err(ScriptError::browser)
    }

    async fn send_keys(&self, text: &str) -> ScriptResult<()> {
        self.element
            .send_keys(text)
            .await
            .map_err(ScriptError::browser)
    }

    async fn text(&self) -> ScriptResult<String> {
        self.element.text().await.map_err(ScriptError::browser)
    }

    async fn attribute(&self, name: &str) -> ScriptResult<Option<String>> {
        // 和 CDP 后端一致：先取 DOM 属性再退回 HTML 特性
        let prop = self.element.prop(name).await.map_err(ScriptError::browser)?;
        if prop.is_some() {
            return Ok(prop);
        }
        self.element.attr(name).await.map_err(ScriptError::browser)
    }

    async fn select_by_visible_text(&self, text: &str) -> ScriptResult<()> {
        self.element
            .select_by_label(text)
            .await
            .map_err(ScriptError::browser)
    }
}
