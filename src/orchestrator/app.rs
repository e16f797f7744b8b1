//! 应用入口 - 编排层
//!
//! 持有配置和后端连接器，把命令行的每个子命令落到执行流程或套件运行器上。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::browser::{BrowserConnector, BrowserOptions, LiveBrowserConnector};
use crate::config::Config;
use crate::database::{DatabaseConnector, LiveDatabaseConnector};
use crate::models::{ExecutionPlan, ScriptDocument, Suite};
use crate::orchestrator::suite_runner::{SuiteReport, SuiteRunner};
use crate::services::{FileLog, RunLog, TracingLog};
use crate::utils::logging::{init_log_file, log_startup};
use crate::workflow::{RunReport, ScriptFlow};

/// 应用主结构
pub struct App {
    config: Config,
    browsers: Arc<dyn BrowserConnector>,
    databases: Arc<dyn DatabaseConnector>,
    run_log: RunLog,
}

impl App {
    /// 使用真实浏览器和数据库初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let browsers = Arc::new(LiveBrowserConnector::new(BrowserOptions::from(&config)));
        let databases = Arc::new(LiveDatabaseConnector::new(config.mssql_trust_cert));

        let mut run_log = RunLog::new().with_sink(Arc::new(TracingLog));
        if let Some(path) = &config.run_log_file {
            init_log_file(path)?;
            run_log.add_sink(Arc::new(FileLog::with_path(path)));
        }

        Ok(Self::with_connectors(config, browsers, databases, run_log))
    }

    /// 指定连接器和运行日志
    pub fn with_connectors(
        config: Config,
        browsers: Arc<dyn BrowserConnector>,
        databases: Arc<dyn DatabaseConnector>,
        run_log: RunLog,
    ) -> Self {
        Self {
            config,
            browsers,
            databases,
            run_log,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn flow(&self) -> ScriptFlow {
        ScriptFlow::new(
            self.browsers.clone(),
            self.databases.clone(),
            self.run_log.clone(),
        )
    }

    fn browser_or_default<'a>(&'a self, browser: Option<&'a str>) -> &'a str {
        browser.unwrap_or(&self.config.browser)
    }

    /// 找脚本文件：原路径存在就用，否则在测试用例目录下找（可省略 `.json`）
    pub fn resolve_script(&self, script: &Path) -> PathBuf {
        if script.exists() || script.is_absolute() {
            return script.to_path_buf();
        }
        let in_folder = self.config.test_cases_folder.join(script);
        if in_folder.exists() {
            return in_folder;
        }
        let with_ext = in_folder.with_extension("json");
        if with_ext.exists() {
            return with_ext;
        }
        script.to_path_buf()
    }

    /// 执行单个脚本
    pub async fn run_script(&self, script: &Path, browser: Option<&str>) -> Result<RunReport> {
        let path = self.resolve_script(script);
        let doc = ScriptDocument::open(&path).await?;
        let browser = self.browser_or_default(browser);
        log_startup(browser, &path.display().to_string());

        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let report = self
            .flow()
            .run_labeled(&label, &doc.build_order(), browser, None)
            .await;
        Ok(report)
    }

    /// 加载脚本并返回执行计划
    pub async fn plan(&self, script: &Path) -> Result<ExecutionPlan> {
        let path = self.resolve_script(script);
        let doc = ScriptDocument::open(&path).await?;
        let plan = doc.build_order();
        info!("📋 {} 的执行顺序 ({} 步):", path.display(), plan.len());
        for step in &plan.steps {
            info!(
                "{:>3}. {:<16} {:?}",
                step.sequence,
                step.action.kind().label(),
                step.action
            );
        }
        Ok(plan)
    }

    /// 移动执行计划中第 `step` 步对应的块，按配置的吸附规则对齐后写回脚本
    pub async fn move_step(
        &self,
        script: &Path,
        step: usize,
        dx: f64,
        dy: f64,
    ) -> Result<ExecutionPlan> {
        let path = self.resolve_script(script);
        let mut doc = ScriptDocument::open(&path).await?;
        let block_id = doc
            .build_order()
            .steps
            .iter()
            .find(|s| s.sequence == step)
            .map(|s| s.block_id)
            .with_context(|| format!("{} 没有第 {} 步", path.display(), step))?;

        doc.move_and_snap(block_id, dx, dy, &self.config.snap_rule());
        doc.save_to(&path).await?;

        let plan = doc.build_order();
        if let Some(moved) = plan.steps.iter().find(|s| s.block_id == block_id) {
            info!("↕️ 第 {} 步移动后排在第 {} 步", step, moved.sequence);
        }
        Ok(plan)
    }

    /// 新建套件
    pub async fn suite_new(&self, name: &str, scripts: &[PathBuf]) -> Result<Suite> {
        let dir = &self.config.test_suites_folder;
        if Suite::file_path(dir, name).exists() {
            anyhow::bail!("套件已存在: {}", name);
        }
        let mut suite = Suite::create(dir, name).await?;
        if !scripts.is_empty() {
            suite.replace_members(scripts.iter().cloned());
            suite.save(dir).await?;
        }
        Ok(suite)
    }

    /// 整体替换套件成员
    pub async fn suite_edit(&self, name: &str, scripts: &[PathBuf]) -> Result<Suite> {
        let dir = &self.config.test_suites_folder;
        let mut suite = Suite::load_named(dir, name).await?;
        suite.replace_members(scripts.iter().cloned());
        suite.save(dir).await?;
        info!("✓ 套件 {} 已更新: {} 个脚本", name, suite.scripts.len());
        Ok(suite)
    }

    pub async fn suite_show(&self, name: &str) -> Result<Suite> {
        let suite = Suite::load_named(&self.config.test_suites_folder, name).await?;
        info!("📦 套件 {} ({} 个脚本)", suite.name, suite.scripts.len());
        for (idx, script) in suite.scripts.iter().enumerate() {
            info!("{:>3}. {}", idx + 1, script.display());
        }
        Ok(suite)
    }

    /// 执行套件，参数可以是套件名或套件文件路径
    pub async fn suite_run(&self, suite: &str, browser: Option<&str>) -> Result<SuiteReport> {
        let as_path = Path::new(suite);
        let suite = if as_path.is_file() {
            Suite::load(as_path).await?
        } else {
            Suite::load_named(&self.config.test_suites_folder, suite).await?
        };

        let scripts: Vec<PathBuf> = suite
            .scripts
            .iter()
            .map(|s| self.resolve_script(s))
            .collect();
        let browser = self.browser_or_default(browser);
        log_startup(browser, &format!("套件 {}", suite.name));

        let runner = SuiteRunner::new(self.flow(), self.config.suite_policy);
        runner
            .run(&scripts, browser)
            .await
            .with_context(|| format!("套件 {} 无法执行", suite.name))
    }
}
