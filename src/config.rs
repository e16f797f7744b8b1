use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Deserialize;

use crate::models::{SnapRule, SnapTieBreak};
use crate::orchestrator::SuitePolicy;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 默认浏览器后端（Chrome / Edge / Firefox）
    pub browser: String,
    /// 是否无头运行
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub edge_executable: Option<PathBuf>,
    /// 浏览器调试端口，设置后附加到已运行的 Chrome / Edge
    pub browser_debug_port: Option<u16>,
    /// Firefox 使用的 WebDriver（geckodriver）地址
    pub webdriver_url: String,
    /// 测试用例目录
    pub test_cases_folder: PathBuf,
    /// 测试套件目录
    pub test_suites_folder: PathBuf,
    /// 运行日志文件，不设置则只输出到终端
    pub run_log_file: Option<PathBuf>,
    // --- 编辑器吸附 ---
    pub snap_threshold: f64,
    pub snap_tie_break: SnapTieBreak,
    // --- 套件 ---
    pub suite_policy: SuitePolicy,
    /// SQL Server 是否信任自签名证书
    pub mssql_trust_cert: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        let snap = SnapRule::default();
        Self {
            browser: "Chrome".to_string(),
            headless: false,
            chrome_executable: None,
            edge_executable: None,
            browser_debug_port: None,
            webdriver_url: "http://localhost:4444".to_string(),
            test_cases_folder: PathBuf::from("projects/Test Cases"),
            test_suites_folder: PathBuf::from("projects/Test Suites"),
            run_log_file: None,
            snap_threshold: snap.threshold,
            snap_tie_break: snap.tie_break,
            suite_policy: SuitePolicy::default(),
            mssql_trust_cert: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取，缺少的键使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("配置文件格式错误: {}", path.display()))
    }

    /// 配置文件（可选）→ 环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 环境变量覆盖，无法解析的值保持原值
    ///
    /// 浏览器用 `ACTION_SCRIPT_BROWSER`，`BROWSER` 常被系统设成 xdg-open 之类的程序路径，不读取
    pub fn with_env_overrides(self) -> Self {
        Self {
            browser: std::env::var("ACTION_SCRIPT_BROWSER").unwrap_or(self.browser),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from).or(self.chrome_executable),
            edge_executable: std::env::var("EDGE_EXECUTABLE").ok().map(PathBuf::from).or(self.edge_executable),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            webdriver_url: std::env::var("WEBDRIVER_URL").unwrap_or(self.webdriver_url),
            test_cases_folder: std::env::var("TEST_CASES_FOLDER").ok().map(PathBuf::from).unwrap_or(self.test_cases_folder),
            test_suites_folder: std::env::var("TEST_SUITES_FOLDER").ok().map(PathBuf::from).unwrap_or(self.test_suites_folder),
            run_log_file: std::env::var("RUN_LOG_FILE").ok().map(PathBuf::from).or(self.run_log_file),
            snap_threshold: env_parse("SNAP_THRESHOLD").unwrap_or(self.snap_threshold),
            snap_tie_break: env_enum("SNAP_TIE_BREAK").unwrap_or(self.snap_tie_break),
            suite_policy: env_enum("SUITE_POLICY").unwrap_or(self.suite_policy),
            mssql_trust_cert: env_parse("MSSQL_TRUST_CERT").unwrap_or(self.mssql_trust_cert),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    pub fn snap_rule(&self) -> SnapRule {
        SnapRule::new(self.snap_threshold, self.snap_tie_break)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// snake_case 枚举值，例如 `continue_on_abort`
fn env_enum<T: DeserializeOwned>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    let deserializer: serde::de::value::StringDeserializer<serde::de::value::Error> =
        value.into_deserializer();
    T::deserialize(deserializer).ok()
}
