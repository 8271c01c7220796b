//! Syntactic data types, as written in CAST, IS and column definitions

use serde::{Deserialize, Serialize};

/// A type as spelled in the query text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Missing,
    Bool,
    /// SMALLINT
    Int2,
    /// INTEGER / INT4
    Int4,
    /// BIGINT / INT8
    Int8,
    /// INT without a width
    Int,
    Real,
    Float32,
    Float64,
    DoublePrecision,
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Numeric {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Char {
        length: Option<u32>,
    },
    Varchar {
        length: Option<u32>,
    },
    String,
    Symbol,
    Blob,
    Clob,
    Date,
    Time {
        precision: Option<u32>,
    },
    TimeWithTz {
        precision: Option<u32>,
    },
    Timestamp {
        precision: Option<u32>,
    },
    TimestampWithTz {
        precision: Option<u32>,
    },
    Struct,
    Tuple,
    List,
    Array,
    Bag,
    Sexp,
    Any,
}

impl DataType {
    /// Canonical lower-case name, shared by synonyms (`TUPLE` is `struct`)
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Missing => "missing",
            DataType::Bool => "bool",
            DataType::Int2 => "int16",
            DataType::Int4 => "int32",
            DataType::Int8 => "int64",
            DataType::Int => "int",
            DataType::Real => "real",
            DataType::Float32 => "float32",
            DataType::Float64 | DataType::DoublePrecision => "float64",
            DataType::Decimal { .. } | DataType::Numeric { .. } => "decimal",
            DataType::Char { .. } => "char",
            DataType::Varchar { .. } => "varchar",
            DataType::String => "string",
            DataType::Symbol => "symbol",
            DataType::Blob => "blob",
            DataType::Clob => "clob",
            DataType::Date => "date",
            DataType::Time { .. } => "time",
            DataType::TimeWithTz { .. } => "time_with_tz",
            DataType::Timestamp { .. } => "timestamp",
            DataType::TimestampWithTz { .. } => "timestamp_with_tz",
            DataType::Struct | DataType::Tuple => "struct",
            DataType::List | DataType::Array => "list",
            DataType::Bag => "bag",
            DataType::Sexp => "sexp",
            DataType::Any => "any",
        }
    }

    /// Length, precision and scale arguments that were written, in order
    pub fn parameters(&self) -> Vec<u32> {
        match *self {
            DataType::Decimal { precision, scale } | DataType::Numeric { precision, scale } => {
                precision.into_iter().chain(scale).collect()
            }
            DataType::Char { length } | DataType::Varchar { length } => length.into_iter().collect(),
            DataType::Time { precision }
            | DataType::TimeWithTz { precision }
            | DataType::Timestamp { precision }
            | DataType::TimestampWithTz { precision } => precision.into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// True for character string types
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            DataType::Char { .. } | DataType::Varchar { .. } | DataType::String | DataType::Symbol
        )
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name().to_uppercase())?;
        let params = self.parameters();
        if !params.is_empty() {
            let rendered: Vec<String> = params.iter().map(u32::to_string).collect();
            write!(f, "({})", rendered.join(", "))?;
        }
        Ok(())
    }
}
