//! MCP Resources for SQL Server tables.
//!
//! Every base table of the configured database is exposed as one read-only
//! resource. Reading it returns a sample of the table as comma-separated text.
//!
//! ## URI Scheme
//!
//! - `mssql://{table}/data` - First 100 rows of `{table}`
//!
//! `{table}` may be schema-qualified (`dbo.Users`).

use crate::config::{ConnectionDescriptor, EnvSource};
use crate::constants::{
    LIST_TABLES_QUERY, RESOURCE_MIME_TYPE, RESOURCE_SAMPLE_ROWS, RESOURCE_URI_PREFIX,
    RESOURCE_URI_SUFFIX,
};
use crate::database::{release, Connection, Connector, DriverError, QueryOutcome};
use crate::error::ServerError;
use crate::security::validate_table_name;
use rmcp::model::{AnnotateAble, RawResource, ReadResourceResult, Resource, ResourceContents};
use tracing::{debug, error, info};

/// A table exposed as a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub mime_type: String,
    pub description: String,
}

impl ResourceDescriptor {
    /// Describe the resource for a table.
    pub fn for_table(table: &str) -> Self {
        Self {
            uri: format!("{}{}{}", RESOURCE_URI_PREFIX, table, RESOURCE_URI_SUFFIX),
            name: format!("Table: {}", table),
            mime_type: RESOURCE_MIME_TYPE.to_string(),
            description: format!("Data in table: {}", table),
        }
    }

    /// Convert to the protocol representation.
    pub fn to_resource(&self) -> Resource {
        let mut resource = RawResource::new(&self.uri, &self.name);
        resource.description = Some(self.description.clone());
        resource.mime_type = Some(self.mime_type.clone());
        resource.no_annotation()
    }
}

/// List one resource per base table.
///
/// Configuration errors propagate. Database failures are logged and yield an
/// empty list, so clients still get a usable (if empty) catalog.
pub async fn list_resources<C: Connector>(
    env: &dyn EnvSource,
    connector: &C,
) -> Result<Vec<ResourceDescriptor>, ServerError> {
    let descriptor = ConnectionDescriptor::resolve(env)?;

    match fetch_table_names(connector, &descriptor).await {
        Ok(tables) => {
            info!("Found {} tables", tables.len());
            Ok(tables
                .iter()
                .map(|table| ResourceDescriptor::for_table(table))
                .collect())
        }
        Err(e) => {
            error!("Failed to list resources: {}", e);
            Ok(Vec::new())
        }
    }
}

async fn fetch_table_names<C: Connector>(
    connector: &C,
    descriptor: &ConnectionDescriptor,
) -> Result<Vec<String>, DriverError> {
    let mut connection = connector.connect(descriptor).await?;
    let result = connection.execute(LIST_TABLES_QUERY).await;
    release(connection).await;

    Ok(match result? {
        QueryOutcome::Rows { rows, .. } => rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter(|value| !value.is_null())
            .map(|value| value.to_display_string())
            .collect(),
        QueryOutcome::Affected { .. } => Vec::new(),
    })
}

/// Extract the table segment from a resource URI.
///
/// The segment is everything between `mssql://` and the next `/`; it is not
/// validated here.
pub fn parse_table_uri(uri: &str) -> Result<&str, ServerError> {
    let rest = uri
        .strip_prefix(RESOURCE_URI_PREFIX)
        .ok_or_else(|| ServerError::InvalidUri(uri.to_string()))?;

    Ok(rest.split('/').next().unwrap_or(rest))
}

/// Read up to 100 rows of the table named by `uri`, formatted as text.
///
/// The URI and table name are checked before any configuration or database
/// access. Database failures surface as [`ServerError::DatabaseOperation`].
pub async fn read_resource<C: Connector>(
    env: &dyn EnvSource,
    connector: &C,
    uri: &str,
) -> Result<String, ServerError> {
    info!("Reading resource: {}", uri);

    let table = parse_table_uri(uri)?;
    let identifier = validate_table_name(table)?;
    let descriptor = ConnectionDescriptor::resolve(env)?;

    let sql = format!("SELECT TOP {} * FROM {}", RESOURCE_SAMPLE_ROWS, identifier);
    debug!("Resource query: {}", sql);

    let mut connection = connector
        .connect(&descriptor)
        .await
        .map_err(|e| database_error(uri, e))?;
    let result = connection.execute(&sql).await;
    release(connection).await;

    let outcome = result.map_err(|e| database_error(uri, e))?;
    Ok(outcome.to_text())
}

fn database_error(uri: &str, e: DriverError) -> ServerError {
    error!("Database error reading resource {}: {}", uri, e);
    ServerError::DatabaseOperation(e)
}

/// Wrap resource text in a protocol read result.
pub fn to_read_result(uri: &str, text: String) -> ReadResourceResult {
    let mut contents = ResourceContents::text(text, uri);
    if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
        *mime_type = Some(RESOURCE_MIME_TYPE.to_string());
    }

    ReadResourceResult {
        contents: vec![contents],
    }
}
