//! Error types for the MSSQL MCP gateway.
//!
//! `ServerError` is the failure channel of the protocol operations. Which
//! operations surface which variants is deliberate: resource reads fail
//! loudly, tool executions report driver failures as text, and resource
//! listing degrades to an empty list.

use crate::database::DriverError;
use rmcp::ErrorData;
use thiserror::Error;

/// Domain-specific errors raised by the gateway operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Required configuration is missing or unusable.
    #[error("{0}")]
    Config(String),

    /// Resource URI does not use the `mssql://` scheme.
    #[error("Invalid URI scheme: {0}")]
    InvalidUri(String),

    /// Table identifier failed validation.
    #[error("Invalid table name: {0}")]
    InvalidIdentifier(String),

    /// Driver failure while reading a resource.
    #[error("Database error: {0}")]
    DatabaseOperation(#[source] DriverError),

    /// Tool name does not match the exposed tool.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments are invalid.
    #[error("{0}")]
    Validation(String),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier(name.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Get a user-friendly suggestion for how to fix this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Config(_) => Some(
                "Set MSSQL_DATABASE, and MSSQL_USER/MSSQL_PASSWORD unless MSSQL_WINDOWS_AUTH=true",
            ),
            Self::InvalidUri(_) => Some("Resource URIs have the form mssql://<table>/data"),
            Self::InvalidIdentifier(_) => {
                Some("Table names may contain letters, digits and underscores, optionally schema-qualified")
            }
            Self::Validation(_) => Some("Pass the SQL text in the 'query' argument"),
            _ => None,
        }
    }
}

/// Convert ServerError to rmcp's ErrorData for protocol responses.
///
/// Tool execution failures never reach this conversion; they are returned
/// as text results instead.
impl From<ServerError> for ErrorData {
    fn from(e: ServerError) -> Self {
        let message = e.to_string();
        match e {
            ServerError::Config(_) => ErrorData::invalid_request(message, None),
            ServerError::InvalidUri(_)
            | ServerError::InvalidIdentifier(_)
            | ServerError::UnknownTool(_)
            | ServerError::Validation(_) => ErrorData::invalid_params(message, None),
            ServerError::DatabaseOperation(_) => ErrorData::internal_error(message, None),
        }
    }
}
