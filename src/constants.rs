//! Centralized constants for the MSSQL MCP gateway.
//!
//! This module contains the defaults, environment variable names and SQL text
//! used throughout the codebase, making them easy to find, understand, and modify.

// =============================================================================
// Connection Defaults
// =============================================================================

/// Host used when no server variable is set.
pub const DEFAULT_HOST: &str = "localhost";

/// Default SQL Server TCP port.
pub const DEFAULT_PORT: u16 = 1433;

/// Application name sent to SQL Server.
pub const APPLICATION_NAME: &str = "mssql-mcp-gateway";

/// Prefix identifying a LocalDB developer instance, e.g. `(localdb)\MSSQLLocalDB`.
pub const LOCALDB_PREFIX: &str = "(localdb)\\";

/// Domain suffix of Azure SQL Database hosts.
pub const AZURE_SQL_DOMAIN: &str = ".database.windows.net";

/// TDS protocol version Azure SQL Database requires.
pub const AZURE_TDS_VERSION: &str = "7.4";

// =============================================================================
// Environment Variables
// =============================================================================

/// Server hostname (optionally `host\instance`).
pub const ENV_SERVER: &str = "MSSQL_SERVER";

/// Alternative name for the server hostname.
pub const ENV_HOST: &str = "MSSQL_HOST";

/// Server port.
pub const ENV_PORT: &str = "MSSQL_PORT";

/// SQL authentication user.
pub const ENV_USER: &str = "MSSQL_USER";

/// SQL authentication password.
pub const ENV_PASSWORD: &str = "MSSQL_PASSWORD";

/// Database name.
pub const ENV_DATABASE: &str = "MSSQL_DATABASE";

/// Windows (integrated) authentication flag.
pub const ENV_WINDOWS_AUTH: &str = "MSSQL_WINDOWS_AUTH";

/// TLS encryption flag.
pub const ENV_ENCRYPT: &str = "MSSQL_ENCRYPT";

/// Trust the server certificate without validation.
pub const ENV_TRUST_CERT: &str = "MSSQL_TRUST_CERT";

/// Name override for the exposed SQL tool.
pub const ENV_COMMAND: &str = "MSSQL_COMMAND";

/// Debug logging flag.
pub const ENV_DEBUG: &str = "MSSQL_DEBUG";

/// Debug logging flag shared with other MCP servers.
pub const ENV_MCP_DEBUG: &str = "MCP_DEBUG";

// =============================================================================
// Resources & Tools
// =============================================================================

/// URI scheme prefix for table resources.
pub const RESOURCE_URI_PREFIX: &str = "mssql://";

/// Path suffix of a table resource URI.
pub const RESOURCE_URI_SUFFIX: &str = "/data";

/// MIME type of table resource contents.
pub const RESOURCE_MIME_TYPE: &str = "text/plain";

/// Number of rows sampled when reading a table resource.
pub const RESOURCE_SAMPLE_ROWS: usize = 100;

/// Default name of the SQL execution tool.
pub const DEFAULT_TOOL_NAME: &str = "execute_sql";

/// Description of the SQL execution tool.
pub const TOOL_DESCRIPTION: &str = "Execute an SQL query on the SQL Server";

/// Catalog query listing base tables of the current database.
pub const LIST_TABLES_QUERY: &str =
    "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE'";

// =============================================================================
// Logging
// =============================================================================

/// Maximum number of characters of a query written to the log.
pub const MAX_LOGGED_QUERY_CHARS: usize = 200;
