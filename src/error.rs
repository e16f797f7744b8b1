use thiserror::Error;

/// 脚本执行错误类型
///
/// 运行期间的错误全部汇聚到这里，由执行引擎的故障边界统一记录，
/// 不会向上抛出导致进程崩溃。
#[derive(Error, Debug)]
pub enum ScriptError {
    /// 脚本文件内容无法识别（类型未知、values 数量不对等）
    #[error("Malformed script: {0}")]
    MalformedScript(String),

    /// 浏览器或数据库后端名称不受支持
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// 延时字段不是非负整数
    #[error("Invalid delay value: '{0}'")]
    InvalidDelay(String),

    /// 元素定位失败
    #[error("Element not found by {strategy} with identifier '{identifier}': {reason}")]
    LocatorNotFound {
        strategy: String,
        identifier: String,
        reason: String,
    },

    /// 数据库连接失败（不包含密码）
    #[error("Failed to connect to {backend} database at {target}: {reason}")]
    BackendConnectionFailed {
        backend: String,
        target: String,
        reason: String,
    },

    /// 在 DatabaseConnect 之前执行了 RetrieveData
    #[error("No database connection is open")]
    DatabaseNotConnected,

    /// 其他浏览器命令失败（导航、点击、输入等）
    #[error("Browser command failed: {0}")]
    Browser(String),

    /// SQL 执行失败
    #[error("Query failed: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ========== 便捷构造函数 ==========

impl ScriptError {
    /// 创建脚本格式错误
    pub fn malformed(message: impl Into<String>) -> Self {
        ScriptError::MalformedScript(message.into())
    }

    /// 创建元素定位错误
    pub fn locator_not_found(
        strategy: impl Into<String>,
        identifier: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        ScriptError::LocatorNotFound {
            strategy: strategy.into(),
            identifier: identifier.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建数据库连接错误
    pub fn connection_failed(
        backend: impl Into<String>,
        target: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        ScriptError::BackendConnectionFailed {
            backend: backend.into(),
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建浏览器命令错误
    pub fn browser(reason: impl std::fmt::Display) -> Self {
        ScriptError::Browser(reason.to_string())
    }

    /// 创建查询错误
    pub fn query(reason: impl std::fmt::Display) -> Self {
        ScriptError::Query(reason.to_string())
    }
}

// ========== Result 类型别名 ==========

/// 脚本执行结果类型
pub type ScriptResult<T> = Result<T, ScriptError>;
