//! ServerHandler implementation for the MSSQL MCP gateway.
//!
//! This module implements the rmcp `ServerHandler` trait which defines how
//! the server responds to MCP protocol requests.

use crate::database::Connector;
use crate::resources::{to_read_result, ResourceDescriptor};
use crate::server::MssqlMcpServer;
use crate::tools::ToolDescriptor;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult, ServerCapabilities,
    ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData;
use tracing::{debug, info};

impl<C: Connector> ServerHandler for MssqlMcpServer<C> {
    /// Server identification - called during initialization handshake.
    fn get_info(&self) -> ServerInfo {
        info!("MCP client requesting server info");

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some("MSSQL MCP Gateway".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(build_instructions(self.tool_name())),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        debug!("Handling list_resources request");
        let resources = MssqlMcpServer::list_resources(self)
            .await?
            .iter()
            .map(ResourceDescriptor::to_resource)
            .collect();

        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        debug!("Handling read_resource request for {}", request.uri);
        let text = MssqlMcpServer::read_resource(self, &request.uri).await?;
        Ok(to_read_result(&request.uri, text))
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        debug!("Handling list_tools request");
        let tools = MssqlMcpServer::list_tools(self)
            .iter()
            .map(ToolDescriptor::to_tool)
            .collect();

        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let output =
            MssqlMcpServer::call_tool(self, &request.name, request.arguments.as_ref()).await?;
        Ok(output.into_call_result())
    }
}

/// Build server instructions naming the exposed tool.
fn build_instructions(tool_name: &str) -> String {
    let mut instructions = String::new();

    instructions.push_str("# MSSQL MCP Gateway\n\n");
    instructions.push_str("This server provides access to a Microsoft SQL Server database.\n\n");

    instructions.push_str("### Resources\n");
    instructions.push_str("- One resource per table: `mssql://<table>/data`\n");
    instructions.push_str("- Reading a resource returns up to 100 rows as comma-separated text\n\n");

    instructions.push_str("### Tools\n");
    instructions.push_str(&format!(
        "- `{}`: execute any SQL statement; data changes are committed\n",
        tool_name
    ));

    instructions
}
