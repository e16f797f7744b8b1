//! MySQL / PostgreSQL（sqlx）

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{ConnectOptions, Connection, Row};
use tracing::debug;

use crate::database::{split_host_port, DbBackend, DbConnection, DbRow};
use crate::error::{ScriptError, ScriptResult};
use crate::models::DbCredentials;

enum Inner {
    MySql(MySqlConnection),
    Postgres(PgConnection),
}

/// sqlx 连接
pub struct SqlxConnection {
    inner: Option<Inner>,
}

impl SqlxConnection {
    pub async fn connect(backend: DbBackend, credentials: &DbCredentials) -> ScriptResult<Self> {
        let (host, port) = split_host_port(&credentials.host, backend.default_port())?;
        debug!("sqlx 连接 {}:{} ({})", host, port, backend);

        let inner = match backend {
            DbBackend::MySql => {
                let conn = MySqlConnectOptions::new()
                    .host(&host)
                    .port(port)
                    .username(&credentials.username)
                    .password(&credentials.password)
                    .database(&credentials.database)
                    .connect()
                    .await
                    .map_err(|e| {
                        ScriptError::connection_failed(backend.name(), credentials.target(), e)
                    })?;
                Inner::MySql(conn)
            }
            DbBackend::Postgres => {
                let conn = PgConnectOptions::new()
                    .host(&host)
                    .port(port)
                    .username(&credentials.username)
                    .password(&credentials.password)
                    .database(&credentials.database)
                    .connect()
                    .await
                    .map_err(|e| {
                        ScriptError::connection_failed(backend.name(), credentials.target(), e)
                    })?;
                Inner::Postgres(conn)
            }
            DbBackend::SqlServer => {
                return Err(ScriptError::UnsupportedBackend(format!(
                    "{} is not served by sqlx",
                    backend
                )))
            }
        };
        Ok(Self { inner: Some(inner) })
    }
}

fn mysql_row(row: &MySqlRow) -> DbRow {
    (0..row.len())
        .map(|i| row.try_get::<Option<String>, _>(i).ok().flatten())
        .collect()
}

fn pg_row(row: &PgRow) -> DbRow {
    (0..row.len())
        .map(|i| row.try_get::<Option<String>, _>(i).ok().flatten())
        .collect()
}

#[async_trait]
impl DbConnection for SqlxConnection {
    async fn fetch_one(&mut self, sql: &str, params: &[String]) -> ScriptResult<Option<DbRow>> {
        match self.inner.as_mut() {
            Some(Inner::MySql(conn)) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = query.bind(param.as_str());
                }
                let row = query
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(ScriptError::query)?;
                Ok(row.as_ref().map(mysql_row))
            }
            Some(Inner::Postgres(conn)) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = query.bind(param.as_str());
                }
                let row = query
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(ScriptError::query)?;
                Ok(row.as_ref().map(pg_row))
            }
            None => Err(ScriptError::DatabaseNotConnected),
        }
    }

    async fn close(&mut self) -> ScriptResult<()> {
        match self.inner.take() {
            Some(Inner::MySql(conn)) => conn.close().await.map_err(ScriptError::query),
            Some(Inner::Postgres(conn)) => conn.close().await.map_err(ScriptError::query),
            None => Ok(()),
        }
    }
}
