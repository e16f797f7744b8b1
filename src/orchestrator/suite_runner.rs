//! 套件运行器 - 编排层
//!
//! ## 职责
//!
//! 按顺序执行一组脚本文件，所有脚本共享同一个浏览器会话。
//!
//! ## 规则
//!
//! 1. 先解析浏览器后端，不支持的后端在打开任何资源之前就失败
//! 2. 空列表什么也不打开
//! 3. 只打开一次浏览器，最后一个脚本之后关闭一次（包括中途中止）
//! 4. 每个脚本有自己的数据库会话，脚本之间不共享
//! 5. 某个脚本中止后是否继续由 [`SuitePolicy`] 决定

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::browser::BrowserKind;
use crate::error::ScriptResult;
use crate::models::ScriptDocument;
use crate::utils::logging::print_suite_stats;
use crate::workflow::{RunReport, ScriptFlow};

/// 脚本中止后的继续策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuitePolicy {
    #[default]
    StopOnAbort,
    ContinueOnAbort,
}

/// 单个脚本在套件中的结果
#[derive(Debug)]
pub enum ScriptOutcome {
    Ran(RunReport),
    /// 脚本文件无法加载，按中止处理
    LoadFailed(String),
}

impl ScriptOutcome {
    pub fn is_aborted(&self) -> bool {
        match self {
            ScriptOutcome::Ran(report) => !report.is_completed(),
            ScriptOutcome::LoadFailed(_) => true,
        }
    }
}

#[derive(Debug)]
pub struct ScriptReport {
    pub path: PathBuf,
    pub outcome: ScriptOutcome,
}

/// 套件执行结果
#[derive(Debug, Default)]
pub struct SuiteReport {
    pub scripts: Vec<ScriptReport>,
    /// 按 StopOnAbort 策略提前停止
    pub stopped_early: bool,
}

impl SuiteReport {
    pub fn completed(&self) -> usize {
        self.scripts
            .iter()
            .filter(|s| !s.outcome.is_aborted())
            .count()
    }

    pub fn aborted(&self) -> usize {
        self.scripts
            .iter()
            .filter(|s| s.outcome.is_aborted())
            .count()
    }
}

/// 套件运行器
pub struct SuiteRunner {
    flow: ScriptFlow,
    policy: SuitePolicy,
}

impl SuiteRunner {
    pub fn new(flow: ScriptFlow, policy: SuitePolicy) -> Self {
        Self { flow, policy }
    }

    pub fn flow(&self) -> &ScriptFlow {
        &self.flow
    }

    /// 依次执行脚本文件
    ///
    /// 后端不支持或浏览器打不开时返回错误（同时写入运行日志），
    /// 单个脚本的失败体现在 [`SuiteReport`] 中。
    pub async fn run(&self, scripts: &[PathBuf], backend: &str) -> ScriptResult<SuiteReport> {
        let kind = match backend.parse::<BrowserKind>() {
            Ok(kind) => kind,
            Err(e) => {
                self.flow.log().log(format!("Error during testing: {}", e));
                return Err(e);
            }
        };

        let mut report = SuiteReport::default();
        if scripts.is_empty() {
            info!("套件为空，不打开浏览器");
            return Ok(report);
        }

        info!("📦 开始执行套件: {} 个脚本, 浏览器 {}", scripts.len(), kind);
        let mut session = match self.flow.browsers().open(kind).await {
            Ok(session) => session,
            Err(e) => {
                self.flow.log().log(format!("Error during testing: {}", e));
                return Err(e);
            }
        };

        for (idx, path) in scripts.iter().enumerate() {
            info!(
                "\n📄 [{}/{}] {}",
                idx + 1,
                scripts.len(),
                path.display()
            );

            let outcome = match ScriptDocument::open(path).await {
                Ok(doc) => {
                    let plan = doc.build_order();
                    let label = script_label(path);
                    ScriptOutcome::Ran(
                        self.flow
                            .run_labeled(&label, &plan, kind.name(), Some(&mut session))
                            .await,
                    )
                }
                Err(e) => {
                    warn!("⚠️ 加载脚本失败 {}: {:#}", path.display(), e);
                    self.flow.log().log(format!("Error during testing: {:#}", e));
                    ScriptOutcome::LoadFailed(format!("{:#}", e))
                }
            };

            let aborted = outcome.is_aborted();
            report.scripts.push(ScriptReport {
                path: path.clone(),
                outcome,
            });

            if aborted && self.policy == SuitePolicy::StopOnAbort && idx + 1 < scripts.len() {
                warn!("⏹ 脚本中止，按策略停止套件");
                report.stopped_early = true;
                break;
            }
        }

        if let Err(e) = session.close().await {
            warn!("关闭浏览器失败: {}", e);
        }

        print_suite_stats(
            report.completed(),
            report.aborted(),
            scripts.len(),
            report.stopped_early,
        );
        Ok(report)
    }
}

fn script_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default_and_serde() {
        assert_eq!(SuitePolicy::default(), SuitePolicy::StopOnAbort);
        let parsed: SuitePolicy = serde_json::from_str("\"continue_on_abort\"").unwrap();
        assert_eq!(parsed, SuitePolicy::ContinueOnAbort);
    }

    #[test]
    fn test_load_failure_counts_as_abort() {
        let report = SuiteReport {
            scripts: vec![ScriptReport {
                path: PathBuf::from("missing.json"),
                outcome: ScriptOutcome::LoadFailed("not found".to_string()),
            }],
            stopped_early: false,
        };
        assert_eq!(report.aborted(), 1);
        assert_eq!(report.completed(), 0);
    }
}
