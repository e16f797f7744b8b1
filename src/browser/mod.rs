//! 浏览器后端
//!
//! 执行引擎只依赖这里的 trait：
//! - [`BrowserDriver`] 一个浏览器连接能做的事（导航、找元素、关闭）
//! - [`PageElement`] 找到的元素能做的事（点击、输入、读取文本/属性、下拉选择）
//! - [`BrowserConnector`] 按后端名称打开一个 [`BrowserSession`]
//!
//! Chrome / Edge 走 CDP（chromiumoxide），Firefox 走 W3C WebDriver（fantoccini）。

pub mod cdp;
pub mod connection;
pub mod connector;
pub mod launch;
pub mod webdriver;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{ScriptError, ScriptResult};
use crate::models::LocatorStrategy;

pub use connector::{BrowserOptions, LiveBrowserConnector};

/// 支持的浏览器后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserKind {
    Chrome,
    Edge,
    Firefox,
}

impl BrowserKind {
    pub fn name(self) -> &'static str {
        match self {
            BrowserKind::Chrome => "Chrome",
            BrowserKind::Edge => "Edge",
            BrowserKind::Firefox => "Firefox",
        }
    }
}

impl FromStr for BrowserKind {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "edge" => Ok(BrowserKind::Edge),
            "firefox" => Ok(BrowserKind::Firefox),
            _ => Err(ScriptError::UnsupportedBackend(format!(
                "browser '{}' (expected Chrome, Edge or Firefox)",
                s
            ))),
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 元素定位器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub identifier: String,
}

/// 定位器翻译成 DOM 查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomQuery {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn new(strategy: LocatorStrategy, identifier: impl Into<String>) -> Self {
        Self {
            strategy,
            identifier: identifier.into(),
        }
    }

    /// 统一翻译成 CSS 或 XPath
    pub fn to_query(&self) -> DomQuery {
        let id = &self.identifier;
        match self.strategy {
            LocatorStrategy::Id => DomQuery::Css(format!("[id={}]", css_string(id))),
            LocatorStrategy::Name => DomQuery::Css(format!("[name={}]", css_string(id))),
            LocatorStrategy::ClassName => DomQuery::Css(format!("[class~={}]", css_string(id))),
            LocatorStrategy::CssSelector | LocatorStrategy::TagName => DomQuery::Css(id.clone()),
            LocatorStrategy::LinkText => {
                DomQuery::XPath(format!("//a[normalize-space(.)={}]", xpath_literal(id)))
            }
            LocatorStrategy::PartialLinkText => {
                DomQuery::XPath(format!("//a[contains(., {})]", xpath_literal(id)))
            }
            LocatorStrategy::XPath => DomQuery::XPath(id.clone()),
        }
    }

    /// 构造定位失败错误
    pub fn not_found(&self, reason: impl fmt::Display) -> ScriptError {
        ScriptError::locator_not_found(self.strategy.as_str(), &self.identifier, reason)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.strategy, self.identifier)
    }
}

/// CSS 属性值字符串
fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// XPath 字符串字面量，同时含单双引号时用 concat()
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// 页面元素能力
#[async_trait]
pub trait PageElement: Send + Sync {
    async fn click(&self) -> ScriptResult<()>;

    async fn clear(&self) -> ScriptResult<()>;

    async fn send_keys(&self, text: &str) -> ScriptResult<()>;

    /// 可见文本
    async fn text(&self) -> ScriptResult<String>;

    async fn attribute(&self, name: &str) -> ScriptResult<Option<String>>;

    /// 按可见文本选择 `<select>` 的选项
    async fn select_by_visible_text(&self, text: &str) -> ScriptResult<()>;
}

/// 浏览器连接能力
#[async_trait]
pub trait BrowserDriver: Send {
    async fn navigate(&mut self, url: &str) -> ScriptResult<()>;

    async fn back(&mut self) -> ScriptResult<()>;

    async fn forward(&mut self) -> ScriptResult<()>;

    async fn refresh(&mut self) -> ScriptResult<()>;

    /// 查找元素，找不到返回 [`ScriptError::LocatorNotFound`]
    async fn find_element(&mut self, locator: &Locator) -> ScriptResult<Box<dyn PageElement>>;

    async fn close(&mut self) -> ScriptResult<()>;
}

/// 按后端打开浏览器会话
#[async_trait]
pub trait BrowserConnector: Send + Sync {
    async fn open(&self, kind: BrowserKind) -> ScriptResult<BrowserSession>;
}

/// 一个活动的浏览器连接
///
/// 由单次脚本运行独占，或由套件运行器在整个套件期间持有。
pub struct BrowserSession {
    kind: BrowserKind,
    driver: Box<dyn BrowserDriver>,
}

impl BrowserSession {
    pub fn new(kind: BrowserKind, driver: Box<dyn BrowserDriver>) -> Self {
        Self { kind, driver }
    }

    pub fn kind(&self) -> BrowserKind {
        self.kind
    }

    pub fn driver(&mut self) -> &mut dyn BrowserDriver {
        self.driver.as_mut()
    }

    /// 关闭会话，消耗自身保证只关闭一次
    pub async fn close(mut self) -> ScriptResult<()> {
        self.driver.close().await
    }
}

impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_kind_parse() {
        assert_eq!("Chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert_eq!(" edge ".parse::<BrowserKind>().unwrap(), BrowserKind::Edge);
        assert_eq!("FIREFOX".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
        assert!(matches!(
            "Safari".parse::<BrowserKind>(),
            Err(ScriptError::UnsupportedBackend(_))
        ));
    }

    #[test]
    fn test_locator_to_css() {
        let id = Locator::new(LocatorStrategy::Id, "q");
        assert_eq!(id.to_query(), DomQuery::Css("[id=\"q\"]".to_string()));

        let class = Locator::new(LocatorStrategy::ClassName, "btn");
        assert_eq!(class.to_query(), DomQuery::Css("[class~=\"btn\"]".to_string()));

        let quoted = Locator::new(LocatorStrategy::Name, "a\"b");
        assert_eq!(quoted.to_query(), DomQuery::Css("[name=\"a\\\"b\"]".to_string()));
    }

    #[test]
    fn test_locator_to_xpath() {
        let link = Locator::new(LocatorStrategy::LinkText, "Sign in");
        assert_eq!(
            link.to_query(),
            DomQuery::XPath("//a[normalize-space(.)='Sign in']".to_string())
        );

        let raw = Locator::new(LocatorStrategy::XPath, "//button[1]");
        assert_eq!(raw.to_query(), DomQuery::XPath("//button[1]".to_string()));
    }

    #[test]
    fn test_xpath_literal_quotes() {
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal("it's \"x\""),
            "concat('it', \"'\", 's \"x\"')"
        );
    }
}
