//! Configuration management for the MSSQL MCP gateway.
//!
//! Configuration is loaded from environment variables following the 12-factor app pattern.
//! Connection settings are resolved into a fresh [`ConnectionDescriptor`] on every
//! protocol operation, so environment changes are picked up by the next call.

use crate::constants::{
    APPLICATION_NAME, AZURE_SQL_DOMAIN, AZURE_TDS_VERSION, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_TOOL_NAME, ENV_COMMAND, ENV_DATABASE, ENV_DEBUG, ENV_ENCRYPT, ENV_HOST, ENV_MCP_DEBUG,
    ENV_PASSWORD, ENV_PORT, ENV_SERVER, ENV_TRUST_CERT, ENV_USER, ENV_WINDOWS_AUTH, LOCALDB_PREFIX,
};
use crate::error::ServerError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{error, info, warn};

/// Message used for every missing-configuration failure.
const MISSING_CONFIG: &str = "Missing required database configuration";

/// Source of configuration variables.
///
/// The process environment is the production source; maps are used by tests
/// and by embedders that want to supply settings directly.
pub trait EnvSource: Send + Sync {
    /// Look up a variable, returning `None` when it is unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads variables from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Parse a boolean-like flag value.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn flag(env: &dyn EnvSource, key: &str) -> bool {
    env.var(key).map(|v| parse_flag(&v)).unwrap_or(false)
}

/// Non-empty value of a variable.
fn non_empty(env: &dyn EnvSource, key: &str) -> Option<String> {
    env.var(key).filter(|v| !v.is_empty())
}

/// Authentication mode for a connection.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// SQL Server authentication (username/password)
    SqlAuth { user: String, password: String },

    /// Windows authentication (Integrated Security)
    WindowsAuth,
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::SqlAuth { user, .. } => f
                .debug_struct("SqlAuth")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            AuthMode::WindowsAuth => f.write_str("WindowsAuth"),
        }
    }
}

/// Driver-specific adjustments derived from the target host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderHints {
    /// TDS protocol version the server requires, if any.
    pub tds_version: Option<String>,
}

/// Everything needed to open one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionDescriptor {
    /// SQL Server host, optionally `host\instance`
    pub host: String,

    /// TCP port; `None` means the driver default (1433)
    pub port: Option<u16>,

    /// Authentication mode
    #[serde(skip)]
    pub auth: AuthMode,

    /// Database name (always present)
    pub database: String,

    /// Require TLS encryption
    pub encrypt: bool,

    /// Trust server certificate (for self-signed certs)
    pub trust_server_certificate: bool,

    /// Application name sent to SQL Server
    pub application_name: String,

    /// Provider-specific hints
    pub provider_hints: ProviderHints,
}

impl ConnectionDescriptor {
    /// Resolve a descriptor from configuration variables.
    ///
    /// # Environment Variables
    ///
    /// ## Required
    /// - `MSSQL_DATABASE`: Database name
    /// - `MSSQL_USER` / `MSSQL_PASSWORD`: SQL Server credentials (unless Windows auth)
    ///
    /// ## Optional
    /// - `MSSQL_SERVER` (or `MSSQL_HOST`): Hostname (default: localhost)
    /// - `MSSQL_PORT`: Port number (default: 1433, invalid values are ignored)
    /// - `MSSQL_WINDOWS_AUTH`: Use Windows authentication (default: false)
    /// - `MSSQL_ENCRYPT`: Require TLS (default: false, always on for Azure SQL)
    /// - `MSSQL_TRUST_CERT`: Trust server certificate (default: false)
    pub fn resolve(env: &dyn EnvSource) -> Result<Self, ServerError> {
        let raw_host = env.var(ENV_SERVER).or_else(|| env.var(ENV_HOST));
        info!(
            "{} environment variable: {}",
            ENV_SERVER,
            raw_host.as_deref().unwrap_or("NOT SET")
        );
        let mut host = raw_host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        info!("Using server: {}", host);

        if let Some(instance) = host.strip_prefix(LOCALDB_PREFIX) {
            host = format!(".\\{}", instance);
            info!("Detected LocalDB connection, converted to: {}", host);
        }

        let port = match env.var(ENV_PORT) {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!(
                        "Invalid {} value: {}. Using default port {}.",
                        ENV_PORT, raw, DEFAULT_PORT
                    );
                    None
                }
            },
            None => None,
        };

        let mut provider_hints = ProviderHints::default();
        let mut encrypt = flag(env, ENV_ENCRYPT);
        if host.contains(AZURE_SQL_DOMAIN) {
            provider_hints.tds_version = Some(AZURE_TDS_VERSION.to_string());
            encrypt = true;
            info!(
                "Detected Azure SQL connection, using TDS version {}",
                AZURE_TDS_VERSION
            );
        }

        let database = non_empty(env, ENV_DATABASE);

        let (auth, database) = if flag(env, ENV_WINDOWS_AUTH) {
            let database = database.ok_or_else(|| {
                error!("{} is required", ENV_DATABASE);
                ServerError::config(MISSING_CONFIG)
            })?;
            info!("Using Windows Authentication");
            (AuthMode::WindowsAuth, database)
        } else {
            match (non_empty(env, ENV_USER), non_empty(env, ENV_PASSWORD), database) {
                (Some(user), Some(password), Some(database)) => {
                    (AuthMode::SqlAuth { user, password }, database)
                }
                _ => {
                    error!("Missing required database configuration. Please check environment variables:");
                    error!(
                        "{}, {}, and {} are required",
                        ENV_USER, ENV_PASSWORD, ENV_DATABASE
                    );
                    return Err(ServerError::config(MISSING_CONFIG));
                }
            }
        };

        Ok(Self {
            host,
            port,
            auth,
            database,
            encrypt,
            trust_server_certificate: flag(env, ENV_TRUST_CERT),
            application_name: APPLICATION_NAME.to_string(),
            provider_hints,
        })
    }

    /// Port to connect to, falling back to the SQL Server default.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Log-safe summary of the connection target: `host[:port]/database as user`.
    pub fn summary(&self) -> String {
        let mut target = self.host.clone();
        if let Some(port) = self.port {
            target.push_str(&format!(":{}", port));
        }
        let principal = match &self.auth {
            AuthMode::SqlAuth { user, .. } => user.as_str(),
            AuthMode::WindowsAuth => "Windows Auth",
        };
        format!("{}/{} as {}", target, self.database, principal)
    }
}

/// Settings resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Name of the exposed SQL tool
    pub tool_name: String,

    /// Debug logging requested
    pub debug: bool,
}

impl ServerSettings {
    /// Load server settings from configuration variables.
    ///
    /// - `MSSQL_COMMAND`: Tool name (default: execute_sql)
    /// - `MSSQL_DEBUG` / `MCP_DEBUG`: Enable debug logging
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let tool_name =
            non_empty(env, ENV_COMMAND).unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());
        let debug = flag(env, ENV_DEBUG) || flag(env, ENV_MCP_DEBUG);

        Self { tool_name, debug }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            debug: false,
        }
    }
}
