//! MCP Tool for SQL execution.
//!
//! A single tool (named `execute_sql` unless overridden with `MSSQL_COMMAND`)
//! runs arbitrary SQL text against the configured database. Statements that
//! modify data are committed; statements returning rows are not.

use crate::config::{ConnectionDescriptor, EnvSource, ServerSettings};
use crate::constants::{MAX_LOGGED_QUERY_CHARS, TOOL_DESCRIPTION};
use crate::database::{release, Connection, Connector, DriverError, QueryOutcome};
use crate::error::ServerError;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Description of the exposed tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: JsonObject,
}

impl ToolDescriptor {
    /// Describe the SQL execution tool under the given name.
    pub fn execute_sql(name: impl Into<String>) -> Self {
        let schema = json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The SQL query to execute"
                }
            },
            "required": ["query"]
        });

        Self {
            name: name.into(),
            description: TOOL_DESCRIPTION.to_string(),
            input_schema: match schema {
                Value::Object(map) => map,
                _ => JsonObject::new(),
            },
        }
    }

    /// Convert to the protocol representation.
    pub fn to_tool(&self) -> Tool {
        Tool::new(
            self.name.clone(),
            self.description.clone(),
            Arc::new(self.input_schema.clone()),
        )
    }
}

/// Textual result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    /// A successful result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// An error result, still delivered as a normal tool response.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Convert to the protocol representation.
    pub fn into_call_result(self) -> CallToolResult {
        let content = vec![Content::text(self.text)];
        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

/// List the exposed tools: exactly one.
pub fn list_tools(settings: &ServerSettings) -> Vec<ToolDescriptor> {
    vec![ToolDescriptor::execute_sql(&settings.tool_name)]
}

/// Execute the SQL tool.
///
/// Unknown tool names and missing queries fail before any configuration or
/// database access. Database failures do not fail the call: the open
/// transaction is rolled back and the driver message is returned as an error
/// result.
pub async fn call_tool<C: Connector>(
    settings: &ServerSettings,
    env: &dyn EnvSource,
    connector: &C,
    name: &str,
    arguments: Option<&JsonObject>,
) -> Result<ToolOutput, ServerError> {
    debug!("Calling tool: {} with arguments: {:?}", name, arguments);

    if name != settings.tool_name {
        return Err(ServerError::UnknownTool(name.to_string()));
    }

    let query = arguments
        .and_then(|args| args.get("query"))
        .and_then(Value::as_str)
        .filter(|query| !query.is_empty())
        .ok_or_else(|| ServerError::validation("Query is required"))?;

    let descriptor = ConnectionDescriptor::resolve(env)?;
    info!("Executing SQL: {}", truncate_for_log(query, MAX_LOGGED_QUERY_CHARS));

    let mut connection = match connector.connect(&descriptor).await {
        Ok(connection) => connection,
        Err(e) => return Ok(driver_failure(query, e)),
    };

    let output = match execute(&mut connection, query).await {
        Ok(text) => ToolOutput::text(text),
        Err(e) => {
            if let Err(rollback_err) = connection.rollback().await {
                warn!("Rollback after failed query also failed: {}", rollback_err);
            }
            driver_failure(query, e)
        }
    };
    release(connection).await;

    debug!("Tool result (is_error={}): {}", output.is_error, output.text);
    Ok(output)
}

/// Run the statement, committing when it modified rows.
async fn execute<T: Connection>(connection: &mut T, query: &str) -> Result<String, DriverError> {
    let outcome = connection.execute(query).await?;

    if let QueryOutcome::Affected { .. } = outcome {
        connection.commit().await?;
    }

    Ok(outcome.to_text())
}

fn driver_failure(query: &str, e: DriverError) -> ToolOutput {
    error!(
        "Error executing SQL '{}': {}",
        truncate_for_log(query, MAX_LOGGED_QUERY_CHARS),
        e
    );
    ToolOutput::error(format!("Database error: {}", e))
}

/// Truncate a string for logging purposes, on a character boundary.
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
