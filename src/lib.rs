//! # Action Script
//!
//! 用"动作块"拼出浏览器测试脚本，按位置推导执行顺序，驱动真实浏览器和数据库回放，
//! 输出带时间戳的运行日志。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 动作块、脚本文档、执行顺序、套件，以及 JSON 读写
//! - `ExecutionPlan` - 由坐标推导出的显式执行序列
//!
//! ### ② 基础设施与后端（Infrastructure / Backends）
//! - `infrastructure/` - 持有稀缺资源（CDP Page），只暴露 eval() 能力
//! - `browser/` - Chrome / Edge（CDP）与 Firefox（WebDriver）
//! - `database/` - MySQL / PostgreSQL（sqlx）与 SQL Server（tiberius）
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 运行日志及其输出端（内存、tracing、文件）
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个脚本"的完整执行流程和故障边界
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/suite_runner` - 多个脚本共享一个浏览器会话
//! - `orchestrator/app` - 命令行入口
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod database;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{BrowserConnector, BrowserKind, BrowserSession};
pub use config::Config;
pub use database::{DatabaseConnector, DatabaseSession, DbBackend};
pub use error::{ScriptError, ScriptResult};
pub use infrastructure::JsExecutor;
pub use models::{Action, ExecutionPlan, ScriptDocument, Suite};
pub use orchestrator::{App, SuitePolicy, SuiteReport, SuiteRunner};
pub use services::{LogSink, RunLog};
pub use workflow::{RunReport, RunState, ScriptFlow};
