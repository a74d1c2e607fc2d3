//! SQL Server identifier validation and escaping.
//!
//! Table names arriving in resource URIs are interpolated into SQL text, so
//! they are checked against a strict whitelist and then escaped with SQL
//! Server's bracket notation `[identifier]`.

use crate::error::ServerError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// `name` or `schema.name`, each part made of ASCII letters, digits and underscores.
static TABLE_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)?$").expect("valid table name regex")
});

/// A table identifier that passed validation, held in escaped form.
///
/// The only way to obtain one is [`validate_table_name`], so holding a
/// `ValidatedIdentifier` means the text is safe to splice into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedIdentifier(String);

impl ValidatedIdentifier {
    /// The escaped identifier, e.g. `[dbo].[Users]`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


/// Validate a table name and escape it for SQL.
///
/// Accepts `table` or `schema.table` where every part is non-empty and made
/// of `[A-Za-z0-9_]`. Anything else, including quotes, comment markers,
/// statement separators and extra dots, is rejected.
///
/// # Examples
///
/// ```
/// use mssql_mcp_gateway::security::validate_table_name;
///
/// assert_eq!(validate_table_name("Users").unwrap().as_str(), "[Users]");
/// assert_eq!(validate_table_name("dbo.Users").unwrap().as_str(), "[dbo].[Users]");
/// assert!(validate_table_name("Users; DROP TABLE Users--").is_err());
/// ```
pub fn validate_table_name(name: &str) -> Result<ValidatedIdentifier, ServerError> {
    if !TABLE_NAME_PATTERN.is_match(name) {
        return Err(ServerError::invalid_identifier(name));
    }

    let escaped = match name.split_once('.') {
        Some((schema, table)) => format!("[{}].[{}]", schema, table),
        None => format!("[{}]", name),
    };

    Ok(ValidatedIdentifier(escaped))
}
