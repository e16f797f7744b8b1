//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责资源调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 持有配置、浏览器/数据库连接器和运行日志
//! - 把命令行子命令落到流程上（运行脚本、打印计划、管理套件）
//!
//! ### `suite_runner` - 套件运行器
//! - 依次执行套件中的脚本
//! - 唯一在多个脚本之间持有 BrowserSession 的模块
//! - 按 SuitePolicy 决定中止后是否继续
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! suite_runner (处理 Vec<脚本>)
//!     ↓
//! workflow::ScriptFlow (处理单个脚本)
//!     ↓
//! browser / database (后端能力)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod app;
pub mod suite_runner;

// 重新导出主要类型
pub use app::App;
pub use suite_runner::{ScriptOutcome, ScriptReport, SuitePolicy, SuiteReport, SuiteRunner};
