//! 脚本运行上下文
//!
//! 封装"我正在执行哪个脚本的第几步"，并独占本次运行的数据库会话

use std::fmt::Display;

use tracing::{debug, warn};

use crate::database::DatabaseSession;

/// 单次运行的状态机：`Idle → Running → {Completed, Aborted}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// 脚本运行上下文
#[derive(Debug)]
pub struct RunCtx {
    /// 脚本名称（仅用于日志显示）
    pub script: String,

    pub state: RunState,

    /// 当前步骤序号（从1开始，0 表示尚未开始）
    pub step: usize,

    pub total_steps: usize,

    pub executed: usize,

    pub skipped: usize,

    db: Option<DatabaseSession>,
}

impl RunCtx {
    pub fn new(script: impl Into<String>, total_steps: usize) -> Self {
        Self {
            script: script.into(),
            state: RunState::Idle,
            step: 0,
            total_steps,
            executed: 0,
            skipped: 0,
            db: None,
        }
    }

    pub fn enter(&mut self, sequence: usize) {
        self.step = sequence;
    }

    pub fn database(&mut self) -> Option<&mut DatabaseSession> {
        self.db.as_mut()
    }

    /// 换上新的数据库会话，旧会话先关闭
    pub async fn replace_database(&mut self, session: DatabaseSession) {
        self.release_database().await;
        self.db = Some(session);
    }

    /// 关闭并释放数据库会话
    pub async fn release_database(&mut self) {
        if let Some(session) = self.db.take() {
            let backend = session.backend();
            match session.close().await {
                Ok(()) => debug!("{} 已关闭 {} 连接", self, backend),
                Err(e) => warn!("{} 关闭 {} 连接失败: {}", self, backend, e),
            }
        }
    }
}

impl Display for RunCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[脚本 {} 步骤 {}/{}]",
            self.script, self.step, self.total_steps
        )
    }
}
