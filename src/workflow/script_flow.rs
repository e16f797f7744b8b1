//! 脚本执行流程 - 流程层
//!
//! 核心职责：按执行计划逐步解释一个脚本
//!
//! - 每一步按动作类型分派到浏览器或数据库
//! - 每个结果写一行运行日志
//! - 唯一的故障边界：任何失败都中止剩余步骤，只记录一次
//!   `Error during testing: {cause}`，不重试、不向上抛出
//! - 只有静态内容不匹配和空字段跳过在本地恢复

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::{
    BrowserConnector, BrowserDriver, BrowserKind, BrowserSession, Locator, PageElement,
};
use crate::database::{DatabaseConnector, DatabaseSession, DbBackend, SelectQuery};
use crate::error::{ScriptError, ScriptResult};
use crate::models::{
    Action, ContentType, DbCredentials, ElementTarget, ExecutionPlan, LocatorStrategy,
    NavDirection, RetrieveSpec,
};
use crate::services::RunLog;
use crate::utils::logging::truncate_text;
use crate::workflow::run_ctx::{RunCtx, RunState};

/// 单步结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 执行完成（包括静态内容不匹配）
    Done,
    /// 必填字段为空，静默跳过
    Skipped,
}

/// 一次运行的结果
#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    pub executed: usize,
    pub skipped: usize,
    /// 失败步骤的序号，打开会话前就失败时为 None
    pub failed_step: Option<usize>,
    pub error: Option<ScriptError>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }
}

/// 脚本执行流程
///
/// - 不持有浏览器会话，按需借用或临时打开
/// - 数据库会话归属于每次运行的 [`RunCtx`]
pub struct ScriptFlow {
    browsers: Arc<dyn BrowserConnector>,
    databases: Arc<dyn DatabaseConnector>,
    log: RunLog,
}

impl ScriptFlow {
    pub fn new(
        browsers: Arc<dyn BrowserConnector>,
        databases: Arc<dyn DatabaseConnector>,
        log: RunLog,
    ) -> Self {
        Self {
            browsers,
            databases,
            log,
        }
    }

    pub fn browsers(&self) -> &Arc<dyn BrowserConnector> {
        &self.browsers
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// 执行一个计划
    ///
    /// 传入会话时借用它且不关闭；否则按 `backend` 临时打开一个，结束时关闭。
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        backend: &str,
        session: Option<&mut BrowserSession>,
    ) -> RunReport {
        self.run_labeled("script", plan, backend, session).await
    }

    /// 同 [`ScriptFlow::run`]，带脚本名用于诊断日志
    pub async fn run_labeled(
        &self,
        label: &str,
        plan: &ExecutionPlan,
        backend: &str,
        session: Option<&mut BrowserSession>,
    ) -> RunReport {
        let mut ctx = RunCtx::new(label, plan.len());

        let kind = match backend.parse::<BrowserKind>() {
            Ok(kind) => kind,
            Err(e) => return self.finish(ctx, Err(e)),
        };

        ctx.state = RunState::Running;
        info!("▶ 开始执行 {} ({} 步, 浏览器 {})", label, plan.len(), kind);

        let result = match session {
            Some(session) => self.execute(plan, session, &mut ctx).await,
            None => match self.browsers.open(kind).await {
                Ok(mut owned) => {
                    let result = self.execute(plan, &mut owned, &mut ctx).await;
                    if let Err(e) = owned.close().await {
                        warn!("{} 关闭浏览器失败: {}", ctx, e);
                    }
                    result
                }
                Err(e) => Err(e),
            },
        };

        ctx.release_database().await;
        self.finish(ctx, result)
    }

    fn finish(&self, ctx: RunCtx, result: ScriptResult<()>) -> RunReport {
        match result {
            Ok(()) => {
                info!(
                    "✓ {} 执行完成: 执行 {} 步, 跳过 {} 步",
                    ctx.script, ctx.executed, ctx.skipped
                );
                RunReport {
                    state: RunState::Completed,
                    executed: ctx.executed,
                    skipped: ctx.skipped,
                    failed_step: None,
                    error: None,
                }
            }
            Err(e) => {
                self.log.log(format!("Error during testing: {}", e));
                error!("❌ {} 执行中止: {}", ctx, e);
                RunReport {
                    state: RunState::Aborted,
                    executed: ctx.executed,
                    skipped: ctx.skipped,
                    failed_step: (ctx.step > 0).then_some(ctx.step),
                    error: Some(e),
                }
            }
        }
    }

    async fn execute(
        &self,
        plan: &ExecutionPlan,
        session: &mut BrowserSession,
        ctx: &mut RunCtx,
    ) -> ScriptResult<()> {
        for step in &plan.steps {
            ctx.enter(step.sequence);
            debug!("{} {}", ctx, step.action.kind().label());
            match self.dispatch(&step.action, session.driver(), ctx).await? {
                StepOutcome::Done => ctx.executed += 1,
                StepOutcome::Skipped => {
                    debug!("{} 字段为空，跳过", ctx);
                    ctx.skipped += 1;
                }
            }
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        action: &Action,
        driver: &mut dyn BrowserDriver,
        ctx: &mut RunCtx,
    ) -> ScriptResult<StepOutcome> {
        match action {
            Action::LaunchWeb { url } => {
                if url.is_empty() {
                    return Ok(StepOutcome::Skipped);
                }
                driver.navigate(url).await?;
                self.log.log(format!("Launched {}.", url));
            }
            Action::Navigate { direction } => match direction {
                NavDirection::Backward => {
                    driver.back().await?;
                    self.log.log("Navigated backward.");
                }
                NavDirection::Forward => {
                    driver.forward().await?;
                    self.log.log("Navigated forward.");
                }
                NavDirection::Refresh => {
                    driver.refresh().await?;
                    self.log.log("Page refreshed.");
                }
            },
            Action::Input { target, text } => {
                let Some((strategy, identifier)) = resolve_with_text(target, text) else {
                    return Ok(StepOutcome::Skipped);
                };
                let element = locate(driver, strategy, identifier).await?;
                element.clear().await?;
                element.send_keys(text).await?;
                self.log.log(format!(
                    "Input '{}' into {}.",
                    text,
                    found_by(strategy, identifier)
                ));
            }
            Action::DropdownSelect { target, option } => {
                let Some((strategy, identifier)) = resolve_with_text(target, option) else {
                    return Ok(StepOutcome::Skipped);
                };
                let element = locate(driver, strategy, identifier).await?;
                element.select_by_visible_text(option).await?;
                self.log.log(format!(
                    "Selected option '{}' in {}.",
                    option,
                    found_by(strategy, identifier)
                ));
            }
            Action::Click { target } => {
                let Some((strategy, identifier)) = target.resolve() else {
                    return Ok(StepOutcome::Skipped);
                };
                locate(driver, strategy, identifier).await?.click().await?;
                self.log.log(format!(
                    "Clicked on {}.",
                    found_by(strategy, identifier)
                ));
            }
            Action::RadioSelect { target } => {
                let Some((strategy, identifier)) = target.resolve() else {
                    return Ok(StepOutcome::Skipped);
                };
                locate(driver, strategy, identifier).await?.click().await?;
                self.log.log(format!(
                    "Clicked radio button found by {} with identifier '{}'.",
                    strategy, identifier
                ));
            }
            Action::StaticContentCheck {
                content,
                target,
                expected,
            } => {
                let Some(strategy) = target.strategy else {
                    return Ok(StepOutcome::Skipped);
                };
                self.check_static(driver, *content, strategy, &target.identifier, expected)
                    .await?;
            }
            Action::Delay { seconds } => {
                if seconds.is_empty() {
                    return Ok(StepOutcome::Skipped);
                }
                let secs = seconds
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ScriptError::InvalidDelay(seconds.clone()))?;
                sleep(Duration::from_secs(secs)).await;
                // 日志保留字段原文
                self.log.log(format!("Delay for {} seconds.", seconds));
            }
            Action::DatabaseConnect(credentials) => {
                self.connect_database(credentials, ctx).await?;
            }
            Action::RetrieveData(spec) => {
                self.retrieve(spec, ctx).await?;
            }
        }
        Ok(StepOutcome::Done)
    }

    /// 静态内容校验，不匹配只记录不中止
    async fn check_static(
        &self,
        driver: &mut dyn BrowserDriver,
        content: ContentType,
        strategy: LocatorStrategy,
        identifier: &str,
        expected: &str,
    ) -> ScriptResult<()> {
        let element = locate(driver, strategy, identifier).await?;
        let location = found_by(strategy, identifier);
        match content {
            ContentType::Text => {
                let actual = element.text().await?;
                if actual == expected {
                    self.log
                        .log(format!("Verified text '{}' in {}.", expected, location));
                } else {
                    warn!("文本不匹配: {}", truncate_text(&actual, 80));
                    self.log.log(format!(
                        "Text mismatch: expected '{}', found '{}' in {}.",
                        expected, actual, location
                    ));
                }
            }
            ContentType::Image | ContentType::Icon => {
                let actual = element.attribute("src").await?.unwrap_or_default();
                if actual == expected {
                    self.log.log(format!(
                        "Verified {} '{}' in {}.",
                        content.as_str().to_lowercase(),
                        expected,
                        location
                    ));
                } else {
                    warn!("资源地址不匹配: {}", truncate_text(&actual, 80));
                    self.log.log(format!(
                        "Source mismatch: expected '{}', found '{}' in {}.",
                        expected, actual, location
                    ));
                }
            }
        }
        Ok(())
    }

    async fn connect_database(
        &self,
        credentials: &DbCredentials,
        ctx: &mut RunCtx,
    ) -> ScriptResult<()> {
        let backend = credentials.backend.parse::<DbBackend>()?;
        let target = credentials.target();
        self.log.log(format!(
            "Connecting to {} at {} as {}.",
            backend, target, credentials.username
        ));

        match self.databases.connect(backend, credentials).await {
            Ok(conn) => {
                ctx.replace_database(DatabaseSession::new(backend, conn))
                    .await;
                self.log
                    .log(format!("Connected to {} database.", backend));
                Ok(())
            }
            Err(e) => {
                let reason = match e {
                    ScriptError::BackendConnectionFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                self.log.log(format!(
                    "Failed to connect to {} database at {}: {}",
                    backend, target, reason
                ));
                Err(ScriptError::connection_failed(backend.name(), target, reason))
            }
        }
    }

    async fn retrieve(&self, spec: &RetrieveSpec, ctx: &mut RunCtx) -> ScriptResult<()> {
        let session = ctx.database().ok_or(ScriptError::DatabaseNotConnected)?;
        let query = SelectQuery::build(spec, session.backend());
        match session.fetch_one(&query).await? {
            Some(row) => {
                debug!("查询结果: {:?}", row);
                self.log.log("Data retrieved successfully.");
            }
            None => self.log.log("No data found."),
        }
        Ok(())
    }
}

/// 定位方式、标识和文本都非空时返回定位参数
fn resolve_with_text<'a>(
    target: &'a ElementTarget,
    text: &str,
) -> Option<(LocatorStrategy, &'a str)> {
    if text.is_empty() {
        return None;
    }
    target.resolve()
}

async fn locate(
    driver: &mut dyn BrowserDriver,
    strategy: LocatorStrategy,
    identifier: &str,
) -> ScriptResult<Box<dyn PageElement>> {
    driver
        .find_element(&Locator::new(strategy, identifier))
        .await
}

fn found_by(strategy: LocatorStrategy, identifier: &str) -> String {
    format!(
        "element found by {} with identifier '{}'",
        strategy, identifier
    )
}
