//! Microsoft SQL Server（tiberius）

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, Row, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use crate::database::{split_host_port, DbBackend, DbConnection, DbRow};
use crate::error::{ScriptError, ScriptResult};
use crate::models::DbCredentials;

/// tiberius 连接
pub struct MssqlConnection {
    client: Option<Client<Compat<TcpStream>>>,
}

impl MssqlConnection {
    pub async fn connect(credentials: &DbCredentials, trust_cert: bool) -> ScriptResult<Self> {
        let backend = DbBackend::SqlServer;
        let (host, port) = split_host_port(&credentials.host, backend.default_port())?;
        debug!("tiberius 连接 {}:{}", host, port);

        let failed = |e: &dyn std::fmt::Display| {
            ScriptError::connection_failed(backend.name(), credentials.target(), e)
        };

        let mut config = Config::new();
        config.host(&host);
        config.port(port);
        config.database(&credentials.database);
        config.authentication(AuthMethod::sql_server(
            &credentials.username,
            &credentials.password,
        ));
        if trust_cert {
            config.trust_cert();
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| failed(&e))?;
        tcp.set_nodelay(true).map_err(|e| failed(&e))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| failed(&e))?;
        Ok(Self {
            client: Some(client),
        })
    }
}

fn row_values(row: &Row) -> DbRow {
    (0..row.len())
        .map(|i| {
            row.try_get::<&str, usize>(i)
                .ok()
                .flatten()
                .map(str::to_string)
        })
        .collect()
}

#[async_trait]
impl DbConnection for MssqlConnection {
    async fn fetch_one(&mut self, sql: &str, params: &[String]) -> ScriptResult<Option<DbRow>> {
        let client = self.client.as_mut().ok_or(ScriptError::DatabaseNotConnected)?;
        let bound: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let stream = client
            .query(sql, &bound)
            .await
            .map_err(ScriptError::query)?;
        let row = stream.into_row().await.map_err(ScriptError::query)?;
        Ok(row.as_ref().map(row_values))
    }

    async fn close(&mut self) -> ScriptResult<()> {
        match self.client.take() {
            Some(client) => client.close().await.map_err(ScriptError::query),
            None => Ok(()),
        }
    }
}
