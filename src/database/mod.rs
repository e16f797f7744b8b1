//! 数据库后端
//!
//! `DatabaseConnect` 步骤通过 [`DatabaseConnector`] 打开一个 [`DatabaseSession`]，
//! 之后的 `RetrieveData` 步骤在同一个会话上执行单行查询。
//! MySQL / PostgreSQL 走 sqlx，SQL Server 走 tiberius。

pub mod mssql;
pub mod query;
pub mod sql;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ScriptError, ScriptResult};
use crate::models::DbCredentials;

pub use query::SelectQuery;

/// 支持的数据库后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbBackend {
    MySql,
    Postgres,
    SqlServer,
}

impl DbBackend {
    /// 脚本文件中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            DbBackend::MySql => "MySQL",
            DbBackend::Postgres => "PostgreSQL",
            DbBackend::SqlServer => "Microsoft SQL Server",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            DbBackend::MySql => 3306,
            DbBackend::Postgres => 5432,
            DbBackend::SqlServer => 1433,
        }
    }

    /// 第 n 个（从 1 开始）绑定参数的占位符
    pub fn placeholder(self, n: usize) -> String {
        match self {
            DbBackend::MySql => "?".to_string(),
            DbBackend::Postgres => format!("${}", n),
            DbBackend::SqlServer => format!("@P{}", n),
        }
    }
}

impl FromStr for DbBackend {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [DbBackend::MySql, DbBackend::Postgres, DbBackend::SqlServer]
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScriptError::UnsupportedBackend(format!("database '{}'", s)))
    }
}

impl fmt::Display for DbBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 查询到的一行，列值尽量转成文本，无法转换的列为 None
pub type DbRow = Vec<Option<String>>;

/// 一个打开的数据库连接
#[async_trait]
pub trait DbConnection: Send {
    /// 执行参数化查询，最多取一行
    async fn fetch_one(&mut self, sql: &str, params: &[String]) -> ScriptResult<Option<DbRow>>;

    async fn close(&mut self) -> ScriptResult<()>;
}

/// 按后端打开数据库连接
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(
        &self,
        backend: DbBackend,
        credentials: &DbCredentials,
    ) -> ScriptResult<Box<dyn DbConnection>>;
}

/// 一次运行中的数据库会话
pub struct DatabaseSession {
    backend: DbBackend,
    conn: Box<dyn DbConnection>,
}

impl DatabaseSession {
    pub fn new(backend: DbBackend, conn: Box<dyn DbConnection>) -> Self {
        Self { backend, conn }
    }

    pub fn backend(&self) -> DbBackend {
        self.backend
    }

    /// 执行 RetrieveData 查询
    pub async fn fetch_one(&mut self, query: &SelectQuery) -> ScriptResult<Option<DbRow>> {
        debug!("执行 SQL: {} 参数: {:?}", query.sql, query.params);
        self.conn.fetch_one(&query.sql, &query.params).await
    }

    pub async fn close(mut self) -> ScriptResult<()> {
        self.conn.close().await
    }
}

impl fmt::Debug for DatabaseSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSession")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

/// 拆分 `host[:port]`
pub(crate) fn split_host_port(host: &str, default_port: u16) -> ScriptResult<(String, u16)> {
    let host = host.trim();
    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() => {
            let port = port
                .parse::<u16>()
                .map_err(|_| ScriptError::query(format!("invalid port in host '{}'", host)))?;
            Ok((name.to_string(), port))
        }
        _ => Ok((host.to_string(), default_port)),
    }
}

/// 连接真实数据库的连接器
#[derive(Debug, Clone, Default)]
pub struct LiveDatabaseConnector {
    /// SQL Server 是否信任自签名证书
    pub mssql_trust_cert: bool,
}

impl LiveDatabaseConnector {
    pub fn new(mssql_trust_cert: bool) -> Self {
        Self { mssql_trust_cert }
    }
}

#[async_trait]
impl DatabaseConnector for LiveDatabaseConnector {
    async fn connect(
        &self,
        backend: DbBackend,
        credentials: &DbCredentials,
    ) -> ScriptResult<Box<dyn DbConnection>> {
        let conn: Box<dyn DbConnection> = match backend {
            DbBackend::MySql | DbBackend::Postgres => {
                Box::new(sql::SqlxConnection::connect(backend, credentials).await?)
            }
            DbBackend::SqlServer => Box::new(
                mssql::MssqlConnection::connect(credentials, self.mssql_trust_cert).await?,
            ),
        };
        Ok(conn)
    }
}
