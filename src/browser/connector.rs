use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::browser::cdp::CdpDriver;
use crate::browser::webdriver::WebDriverDriver;
use crate::browser::{BrowserConnector, BrowserKind, BrowserSession};
use crate::config::Config;
use crate::error::ScriptResult;

/// Edge 在 Windows 上的默认安装位置
const DEFAULT_EDGE_EXECUTABLE: &str =
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe";

/// 打开真实浏览器需要的选项
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub edge_executable: Option<PathBuf>,
    /// 设置后 Chrome / Edge 附加到这个调试端口上的浏览器，而不是新启动
    pub debug_port: Option<u16>,
    /// Firefox 使用的 WebDriver 地址
    pub webdriver_url: String,
}

impl From<&Config> for BrowserOptions {
    fn from(config: &Config) -> Self {
        Self {
            headless: config.headless,
            chrome_executable: config.chrome_executable.clone(),
            edge_executable: config.edge_executable.clone(),
            debug_port: config.browser_debug_port,
            webdriver_url: config.webdriver_url.clone(),
        }
    }
}

/// 打开真实浏览器的连接器
#[derive(Debug, Clone)]
pub struct LiveBrowserConnector {
    options: BrowserOptions,
}

impl LiveBrowserConnector {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl BrowserConnector for LiveBrowserConnector {
    async fn open(&self, kind: BrowserKind) -> ScriptResult<BrowserSession> {
        info!("🌐 打开浏览器: {}", kind);
        let driver: Box<dyn crate::browser::BrowserDriver> = match kind {
            BrowserKind::Firefox => Box::new(
                WebDriverDriver::connect(&self.options.webdriver_url, self.options.headless)
                    .await?,
            ),
            BrowserKind::Chrome | BrowserKind::Edge => match self.options.debug_port {
                Some(port) => Box::new(CdpDriver::attach(port).await?),
                None => {
                    let executable = match kind {
                        BrowserKind::Edge => Some(
                            self.options
                                .edge_executable
                                .clone()
                                .unwrap_or_else(|| PathBuf::from(DEFAULT_EDGE_EXECUTABLE)),
                        ),
                        _ => self.options.chrome_executable.clone(),
                    };
                    Box::new(CdpDriver::launch(executable.as_deref(), self.options.headless).await?)
                }
            },
        };
        Ok(BrowserSession::new(kind, driver))
    }
}
