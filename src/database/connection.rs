//! SQL Server connections over TDS.
//!
//! Every protocol operation opens its own connection through [`TdsConnector`]
//! and closes it before returning; there is no pool.

use super::driver::{Connection, Connector, DriverError};
use super::outcome::QueryOutcome;
use super::types::{SqlValue, TypeMapper};
use crate::config::{AuthMode, ConnectionDescriptor};
use futures_util::TryStreamExt;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, QueryItem};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

/// Type alias for a raw tiberius connection.
pub type RawConnection = Client<Compat<TcpStream>>;

/// Opens connections to SQL Server with tiberius.
#[derive(Debug, Clone, Copy, Default)]
pub struct TdsConnector;

impl TdsConnector {
    /// Create a new connector.
    pub fn new() -> Self {
        Self
    }
}

/// Build a tiberius `Config` from a connection descriptor.
///
/// Returns the config together with the instance name when the host has the
/// form `host\instance`.
pub fn create_config(
    descriptor: &ConnectionDescriptor,
) -> Result<(Config, Option<String>), DriverError> {
    let mut config = Config::new();

    let (host, instance) = match descriptor.host.split_once('\\') {
        Some((host, instance)) => (host, Some(instance.to_string())),
        None => (descriptor.host.as_str(), None),
    };
    // "." is the local machine shorthand used by LocalDB and named instances
    let host = if host == "." || host.is_empty() {
        "localhost"
    } else {
        host
    };

    config.host(host);
    config.port(descriptor.effective_port());
    if let Some(ref instance) = instance {
        config.instance_name(instance);
    }
    config.database(&descriptor.database);
    config.application_name(&descriptor.application_name);

    if descriptor.encrypt {
        config.encryption(EncryptionLevel::Required);
    } else {
        config.encryption(EncryptionLevel::Off);
    }
    if descriptor.trust_server_certificate {
        config.trust_cert();
    }

    if let Some(ref version) = descriptor.provider_hints.tds_version {
        debug!(
            "TDS version {} requested; the driver negotiates the protocol version itself",
            version
        );
    }

    match &descriptor.auth {
        AuthMode::SqlAuth { user, password } => {
            config.authentication(AuthMethod::sql_server(user, password));
        }
        #[cfg(windows)]
        AuthMode::WindowsAuth => {
            config.authentication(AuthMethod::Integrated);
        }
        #[cfg(not(windows))]
        AuthMode::WindowsAuth => {
            return Err(DriverError::new(
                "Windows authentication is only available on Windows hosts",
            ));
        }
    }

    Ok((config, instance))
}

impl Connector for TdsConnector {
    type Connection = TdsConnection;

    async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<TdsConnection, DriverError> {
        let (config, instance) = create_config(descriptor)?;

        let tcp = match instance {
            Some(instance) => {
                use tiberius::SqlBrowser;
                debug!("Resolving named instance {} through SQL Browser", instance);
                TcpStream::connect_named(&config).await?
            }
            None => {
                let address = config.get_addr();
                debug!("Creating connection to {}", address);
                TcpStream::connect(address).await?
            }
        };
        tcp.set_nodelay(true)?;

        let mut client = Client::connect(config, tcp.compat_write()).await?;

        // Changes are only kept after an explicit commit
        client
            .simple_query("SET IMPLICIT_TRANSACTIONS ON")
            .await?
            .into_results()
            .await?;

        debug!("Connection established successfully");
        Ok(TdsConnection { client })
    }
}

/// An open SQL Server connection.
pub struct TdsConnection {
    client: RawConnection,
}

impl TdsConnection {
    /// Row count of the last statement in the previous batch.
    async fn last_row_count(&mut self) -> Result<Option<i64>, DriverError> {
        let row = self
            .client
            .simple_query("SELECT CAST(@@ROWCOUNT AS BIGINT)")
            .await?
            .into_row()
            .await?;

        Ok(match row {
            Some(row) => row.try_get::<i64, _>(0)?,
            None => None,
        })
    }
}

impl Connection for TdsConnection {
    async fn execute(&mut self, sql: &str) -> Result<QueryOutcome, DriverError> {
        let mut stream = self.client.simple_query(sql).await?;

        let mut result_sets = 0usize;
        let mut columns: Option<Vec<String>> = None;
        let mut rows: Vec<Vec<SqlValue>> = Vec::new();

        // Drain the whole stream so the connection stays usable
        while let Some(item) = stream.try_next().await? {
            match item {
                QueryItem::Metadata(meta) => {
                    result_sets += 1;
                    if result_sets == 1 {
                        columns = Some(meta.columns().iter().map(|c| c.name().to_string()).collect());
                    }
                }
                QueryItem::Row(row) => {
                    if result_sets == 1 {
                        rows.push(TypeMapper::extract_row(&row));
                    }
                }
            }
        }
        drop(stream);

        if result_sets > 1 {
            debug!("Batch produced {} result sets; only the first is returned", result_sets);
        }

        if let Some(columns) = columns {
            return Ok(QueryOutcome::rows(columns, rows));
        }

        Ok(match self.last_row_count().await? {
            Some(count) => QueryOutcome::affected(count),
            None => QueryOutcome::affected_unknown(),
        })
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.client
            .simple_query("IF @@TRANCOUNT > 0 COMMIT TRANSACTION")
            .await?
            .into_results()
            .await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.client
            .simple_query("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION")
            .await?
            .into_results()
            .await?;
        Ok(())
    }

    async fn close(self) -> Result<(), DriverError> {
        self.client.close().await?;
        Ok(())
    }
}
