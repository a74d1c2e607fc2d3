//! MCP server struct definition and initialization.

use crate::config::{EnvSource, ProcessEnv, ServerSettings};
use crate::database::{Connector, TdsConnector};
use crate::error::ServerError;
use crate::resources::{self, ResourceDescriptor};
use crate::tools::{self, ToolDescriptor, ToolOutput};
use rmcp::model::JsonObject;
use std::sync::Arc;

/// The MSSQL MCP gateway.
///
/// This struct is cloned for each request, but the inner state is shared via
/// Arc. It holds no connection: every operation resolves a fresh connection
/// descriptor from the environment and opens its own connection through the
/// connector, so configuration changes apply to the next call.
///
/// - **Resources**: one per base table, `mssql://{table}/data`
/// - **Tools**: one SQL execution tool
pub struct MssqlMcpServer<C: Connector = TdsConnector> {
    /// Opens database connections.
    pub(crate) connector: Arc<C>,

    /// Configuration source, read on every operation.
    pub(crate) env: Arc<dyn EnvSource>,

    /// Settings fixed at startup.
    pub(crate) settings: ServerSettings,
}

impl<C: Connector> Clone for MssqlMcpServer<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            env: Arc::clone(&self.env),
            settings: self.settings.clone(),
        }
    }
}

impl MssqlMcpServer<TdsConnector> {
    /// Create a server backed by SQL Server and the process environment.
    pub fn from_env() -> Self {
        let env: Arc<dyn EnvSource> = Arc::new(ProcessEnv);
        let settings = ServerSettings::from_env(env.as_ref());
        Self::new(TdsConnector::new(), env, settings)
    }
}

impl<C: Connector> MssqlMcpServer<C> {
    /// Create a server from its parts.
    pub fn new(connector: C, env: Arc<dyn EnvSource>, settings: ServerSettings) -> Self {
        Self {
            connector: Arc::new(connector),
            env,
            settings,
        }
    }

    /// Settings fixed at startup.
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Name of the exposed SQL tool.
    pub fn tool_name(&self) -> &str {
        &self.settings.tool_name
    }

    /// List one resource per base table.
    pub async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ServerError> {
        resources::list_resources(self.env.as_ref(), self.connector.as_ref()).await
    }

    /// Read a table resource as text.
    pub async fn read_resource(&self, uri: &str) -> Result<String, ServerError> {
        resources::read_resource(self.env.as_ref(), self.connector.as_ref(), uri).await
    }

    /// List the exposed tools.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        tools::list_tools(&self.settings)
    }

    /// Call a tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<&JsonObject>,
    ) -> Result<ToolOutput, ServerError> {
        tools::call_tool(
            &self.settings,
            self.env.as_ref(),
            self.connector.as_ref(),
            name,
            arguments,
        )
        .await
    }
}
