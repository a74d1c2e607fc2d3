//! Security module for table identifier validation.
//!
//! Tool queries are executed verbatim; identifiers taken from resource URIs
//! are the only caller input spliced into SQL text by the gateway itself.

mod identifiers;

pub use identifiers::{validate_table_name, ValidatedIdentifier};
