//! MSSQL MCP gateway entry point.
//!
//! This binary serves the gateway over the stdio transport for Claude
//! Desktop, Cursor, and other MCP clients.

use anyhow::Result;
use mssql_mcp_gateway::config::{ConnectionDescriptor, ProcessEnv};
use mssql_mcp_gateway::shutdown::wait_for_stop;
use mssql_mcp_gateway::MssqlMcpServer;
use rmcp::ServiceExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let server = MssqlMcpServer::from_env();

    // Initialize logging to stderr (stdout is reserved for JSON-RPC)
    init_logging(server.settings().debug);

    let version = env!("CARGO_PKG_VERSION");
    info!("MSSQL MCP gateway v{} starting (transport: stdio)", version);

    // Fail fast on unusable configuration; operations re-resolve it per call
    let descriptor = match ConnectionDescriptor::resolve(&ProcessEnv) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            error!("{}", e);
            if let Some(hint) = e.suggestion() {
                error!("{}", hint);
            }
            std::process::exit(1);
        }
    };
    info!("Database config: {}", descriptor.summary());
    info!("Exposing tool: {}", server.tool_name());

    let service = server.serve(rmcp::transport::stdio()).await?;

    tokio::select! {
        quit_reason = service.waiting() => {
            match quit_reason {
                Ok(reason) => info!("Service stopped: {:?}", reason),
                Err(e) => error!("Service error: {}", e),
            }
        }
        signal = wait_for_stop() => {
            info!("Shutdown requested by {}", signal);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber with stderr output.
///
/// Logs MUST go to stderr because stdout is used for JSON-RPC communication.
/// `RUST_LOG` takes precedence over the debug flag.
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "warn,mssql_mcp_gateway=debug"
    } else {
        "warn,mssql_mcp_gateway=info"
    };
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
