//! Mapping of SQL Server cell values to Rust.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use tiberius::numeric::Numeric;
use tiberius::xml::XmlData;
use tiberius::Row;
use uuid::Uuid;

/// A single cell of a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    /// SMALLINT and TINYINT (TINYINT is unsigned, so it is widened).
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Float(f64),
    Numeric(Decimal),
    Text(String),
    Binary(Vec<u8>),
    Guid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampUtc(DateTime<Utc>),
}

impl SqlValue {
    /// Check if this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Text used when rendering result sets.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

/// `NULL` for nulls, `0x`-prefixed upper hex for binary, ISO 8601 for
/// temporal values and the natural form for everything else.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::SmallInt(v) => write!(f, "{}", v),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::BigInt(v) => write!(f, "{}", v),
            SqlValue::Real(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Numeric(v) => write!(f, "{}", v),
            SqlValue::Text(v) => f.write_str(v),
            SqlValue::Binary(bytes) => {
                f.write_str("0x")?;
                bytes.iter().try_for_each(|b| write!(f, "{:02X}", b))
            }
            SqlValue::Guid(v) => write!(f, "{}", v.hyphenated()),
            SqlValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            SqlValue::Time(v) => write!(f, "{}", v),
            SqlValue::Timestamp(v) => write!(f, "{}", v),
            SqlValue::TimestampUtc(v) => f.write_str(&v.to_rfc3339()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_owned())
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

/// DECIMAL/NUMERIC past `Decimal`'s 28-digit scale or 96-bit mantissa
/// keeps its exact digits as text.
impl From<Numeric> for SqlValue {
    fn from(n: Numeric) -> Self {
        match Decimal::try_from_i128_with_scale(n.value(), u32::from(n.scale())) {
            Ok(d) => SqlValue::Numeric(d),
            Err(_) => SqlValue::Text(numeric_text(n)),
        }
    }
}

impl From<&XmlData> for SqlValue {
    fn from(v: &XmlData) -> Self {
        SqlValue::Text(v.as_ref().to_owned())
    }
}

fn numeric_text(n: Numeric) -> String {
    let scale = usize::from(n.scale());
    let digits = format!("{:0width$}", n.value().unsigned_abs(), width = scale + 1);
    let sign = if n.value() < 0 { "-" } else { "" };
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    let (int_part, frac_part) = digits.split_at(digits.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Converts tiberius rows into [`SqlValue`]s.
pub struct TypeMapper;

/// Return the first `try_get` conversion that yields a value.
///
/// `try_get` fails on a type mismatch and yields `None` for SQL NULL, so a
/// NULL cell falls through every arm.
macro_rules! first_match {
    ($row:expr, $idx:expr; $($ty:ty => $wrap:expr),+ $(,)?) => {
        $(
            if let Ok(Some(v)) = $row.try_get::<$ty, _>($idx) {
                return $wrap(v);
            }
        )+
    };
}

impl TypeMapper {
    /// All cells of a row, in column order.
    pub fn extract_row(row: &Row) -> Vec<SqlValue> {
        (0..row.columns().len())
            .map(|idx| Self::extract_column(row, idx))
            .collect()
    }

    /// One cell of a row; out-of-range indexes and unsupported types map to `Null`.
    ///
    /// Nullable columns arrive with loose wire types (`INTN`, `FLOATN`, ...),
    /// so the Rust type is found by probing.
    pub fn extract_column(row: &Row, idx: usize) -> SqlValue {
        if idx >= row.columns().len() {
            return SqlValue::Null;
        }

        first_match!(row, idx;
            &str => |v: &str| SqlValue::Text(v.to_owned()),
            &XmlData => SqlValue::from,
            i32 => SqlValue::Int,
            i64 => SqlValue::BigInt,
            i16 => SqlValue::SmallInt,
            u8 => |v: u8| SqlValue::SmallInt(i16::from(v)),
            f64 => SqlValue::Float,
            f32 => SqlValue::Real,
            Numeric => SqlValue::from,
            bool => SqlValue::Bool,
            Uuid => SqlValue::Guid,
            NaiveDateTime => SqlValue::Timestamp,
            DateTime<Utc> => SqlValue::TimestampUtc,
            NaiveDate => SqlValue::Date,
            NaiveTime => SqlValue::Time,
            &[u8] => |v: &[u8]| SqlValue::Binary(v.to_vec()),
        );

        SqlValue::Null
    }
}

/// Render a row of values as comma-joined text.
pub fn join_values(values: &[SqlValue]) -> String {
    let mut line = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        let _ = write!(line, "{}", value);
    }
    line
}
