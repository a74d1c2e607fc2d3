//! Database connectivity and query execution.

mod connection;
mod driver;
mod outcome;
pub mod types;

pub use connection::{create_config, RawConnection, TdsConnection, TdsConnector};
pub use driver::{release, Connection, Connector, DriverError};
pub use outcome::QueryOutcome;
pub use types::{SqlValue, TypeMapper};
