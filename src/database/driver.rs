//! Driver capability used by the protocol operations.
//!
//! The gateway never talks to a concrete client library directly: it opens
//! connections through a [`Connector`] and runs statements on the returned
//! [`Connection`]. [`TdsConnector`](super::TdsConnector) is the SQL Server
//! implementation; tests substitute in-memory fakes.

use super::QueryOutcome;
use crate::config::ConnectionDescriptor;
use std::future::Future;
use thiserror::Error;
use tracing::warn;

/// A failure reported by the database driver.
///
/// The message is passed through to callers unchanged, so it must come from
/// the driver or server and never be built from connection credentials.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    code: Option<u32>,
}

impl DriverError {
    /// Create a driver error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create a driver error carrying a SQL Server error number.
    pub fn with_code(message: impl Into<String>, code: u32) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    /// The driver message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// SQL Server error number, when the server reported one.
    pub fn code(&self) -> Option<u32> {
        self.code
    }
}

impl From<tiberius::error::Error> for DriverError {
    fn from(e: tiberius::error::Error) -> Self {
        match &e {
            tiberius::error::Error::Server(token) => Self::with_code(e.to_string(), token.code()),
            _ => Self::new(e.to_string()),
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        Self::new(format!("IO error: {}", e))
    }
}

/// Opens database connections from a descriptor.
pub trait Connector: Send + Sync + 'static {
    /// Connection type produced by this connector.
    type Connection: Connection;

    /// Open a new connection.
    fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> impl Future<Output = Result<Self::Connection, DriverError>> + Send;
}

/// An open database connection.
///
/// Statements run inside an implicit transaction: changes are kept only
/// after [`commit`](Connection::commit). Dropping a connection releases it
/// without committing.
pub trait Connection: Send {
    /// Execute raw SQL text and describe what it produced.
    ///
    /// Statements producing a result set yield [`QueryOutcome::Rows`] for
    /// the first result set; everything else yields [`QueryOutcome::Affected`].
    ///
    /// [`TdsConnection`](crate::database::TdsConnection) reads the count from
    /// `@@ROWCOUNT`, which always has a value, so it never reports an unknown
    /// count: DDL such as `CREATE TABLE` comes back as `Rows affected: 0`.
    fn execute(
        &mut self,
        sql: &str,
    ) -> impl Future<Output = Result<QueryOutcome, DriverError>> + Send;

    /// Commit the open transaction, if any.
    fn commit(&mut self) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Roll back the open transaction, if any.
    fn rollback(&mut self) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Close the connection.
    fn close(self) -> impl Future<Output = Result<(), DriverError>> + Send;
}

/// Close a connection, logging instead of failing when the close itself fails.
pub async fn release<C: Connection>(connection: C) {
    if let Err(e) = connection.close().await {
        warn!("Failed to close database connection: {}", e);
    }
}
