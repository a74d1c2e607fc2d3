//! # MSSQL MCP Gateway
//!
//! A Model Context Protocol (MCP) server exposing a Microsoft SQL Server
//! database to MCP clients.
//!
//! This crate provides:
//! - **Resources**: one per base table, returning a sample of its rows
//! - **Tools**: a single tool executing arbitrary SQL
//!
//! ## Architecture
//!
//! Each protocol call resolves its connection settings from the environment,
//! opens its own connection through a [`database::Connector`] and closes it
//! before returning. Nothing is cached between calls.

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod handlers;
pub mod resources;
pub mod security;
pub mod server;
pub mod shutdown;
pub mod tools;

pub use config::{ConnectionDescriptor, ServerSettings};
pub use error::ServerError;
pub use server::MssqlMcpServer;
