//! Statement outcomes and their text rendering.

use crate::database::types::{join_values, SqlValue};
use serde::Serialize;

/// What a statement produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A result set.
    Rows {
        /// Column names in order.
        columns: Vec<String>,
        /// Rows in order, each with one value per column.
        rows: Vec<Vec<SqlValue>>,
    },

    /// No result set; rows were (possibly) modified.
    Affected {
        /// Number of affected rows.
        count: i64,
        /// Whether the driver could report `count` for this statement.
        definite: bool,
    },
}

impl QueryOutcome {
    /// Create a row outcome.
    pub fn rows(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self::Rows { columns, rows }
    }

    /// Create an outcome with a known affected-row count.
    pub fn affected(count: i64) -> Self {
        Self::Affected {
            count,
            definite: true,
        }
    }

    /// Create an outcome for a statement without a reportable count.
    pub fn affected_unknown() -> Self {
        Self::Affected {
            count: -1,
            definite: false,
        }
    }

    /// Render the outcome as the plain-text payload returned to clients.
    ///
    /// Result sets become comma-separated lines (header first, `NULL` for
    /// nulls). Values are not quoted and the whole set is rendered.
    pub fn to_text(&self) -> String {
        match self {
            Self::Rows { columns, rows } => {
                let mut lines = Vec::with_capacity(rows.len() + 1);
                lines.push(columns.join(","));

                if rows.is_empty() {
                    lines.push("Query returned 0 rows.".to_string());
                }

                lines.extend(rows.iter().map(|row| join_values(row)));

                lines.join("\n")
            }
            Self::Affected {
                count,
                definite: true,
            } => format!("Query executed successfully. Rows affected: {}", count),
            Self::Affected {
                definite: false, ..
            } => "Query executed successfully.".to_string(),
        }
    }
}
