//! Type placeholders carried by the IR
//!
//! Lowering performs no inference: every binding and almost every expression
//! is `PlanType::Dynamic`. Only literals and cast targets carry a concrete
//! `TypeTag`.

use ql_ast::DataType;
use serde::{Deserialize, Serialize};

/// Valid bit widths for integer types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntBitWidth {
    /// 16-bit (SMALLINT)
    I16,
    /// 32-bit (INTEGER)
    I32,
    /// 64-bit (BIGINT)
    I64,
}

impl std::fmt::Display for IntBitWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntBitWidth::I16 => write!(f, "16"),
            IntBitWidth::I32 => write!(f, "32"),
            IntBitWidth::I64 => write!(f, "64"),
        }
    }
}

/// Valid bit widths for floating-point types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FloatBitWidth {
    /// 32-bit (REAL)
    F32,
    /// 64-bit (DOUBLE PRECISION)
    F64,
}

/// Concrete type, normalized from the syntactic `DataType`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Null,
    Missing,
    Boolean,
    /// Fixed-width integer
    Integer { bits: IntBitWidth },
    /// Arbitrary-precision integer
    Int,
    Float { bits: FloatBitWidth },
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Char { length: Option<u32> },
    Varchar { length: Option<u32> },
    String,
    Symbol,
    Blob,
    Clob,
    Date,
    Time {
        precision: Option<u32>,
        with_time_zone: bool,
    },
    Timestamp {
        precision: Option<u32>,
        with_time_zone: bool,
    },
    Struct,
    List,
    Bag,
    Sexp,
    Any,
}

impl TypeTag {
    /// Returns true if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeTag::Integer { .. } | TypeTag::Int | TypeTag::Float { .. } | TypeTag::Decimal { .. }
        )
    }

    /// Returns true if this is a character string type
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            TypeTag::Char { .. } | TypeTag::Varchar { .. } | TypeTag::String | TypeTag::Symbol
        )
    }

    /// Human-readable display name
    pub fn display_name(&self) -> String {
        match self {
            TypeTag::Null => "NULL".into(),
            TypeTag::Missing => "MISSING".into(),
            TypeTag::Boolean => "BOOL".into(),
            TypeTag::Integer {
                bits: IntBitWidth::I16,
            } => "SMALLINT".into(),
            TypeTag::Integer {
                bits: IntBitWidth::I32,
            } => "INTEGER".into(),
            TypeTag::Integer {
                bits: IntBitWidth::I64,
            } => "BIGINT".into(),
            TypeTag::Int => "INT".into(),
            TypeTag::Float {
                bits: FloatBitWidth::F32,
            } => "REAL".into(),
            TypeTag::Float {
                bits: FloatBitWidth::F64,
            } => "DOUBLE PRECISION".into(),
            TypeTag::Decimal {
                precision: Some(p),
                scale: Some(s),
            } => format!("DECIMAL({p},{s})"),
            TypeTag::Decimal {
                precision: Some(p), ..
            } => format!("DECIMAL({p})"),
            TypeTag::Decimal { .. } => "DECIMAL".into(),
            TypeTag::Char { length: Some(n) } => format!("CHAR({n})"),
            TypeTag::Char { length: None } => "CHAR".into(),
            TypeTag::Varchar { length: Some(n) } => format!("VARCHAR({n})"),
            TypeTag::Varchar { length: None } => "VARCHAR".into(),
            TypeTag::String => "STRING".into(),
            TypeTag::Symbol => "SYMBOL".into(),
            TypeTag::Blob => "BLOB".into(),
            TypeTag::Clob => "CLOB".into(),
            TypeTag::Date => "DATE".into(),
            TypeTag::Time {
                precision,
                with_time_zone,
            } => temporal_name("TIME", *precision, *with_time_zone),
            TypeTag::Timestamp {
                precision,
                with_time_zone,
            } => temporal_name("TIMESTAMP", *precision, *with_time_zone),
            TypeTag::Struct => "STRUCT".into(),
            TypeTag::List => "LIST".into(),
            TypeTag::Bag => "BAG".into(),
            TypeTag::Sexp => "SEXP".into(),
            TypeTag::Any => "ANY".into(),
        }
    }
}

fn temporal_name(base: &str, precision: Option<u32>, with_time_zone: bool) -> String {
    let mut name = match precision {
        Some(p) => format!("{base}({p})"),
        None => base.to_string(),
    };
    if with_time_zone {
        name.push_str(" WITH TIME ZONE");
    }
    name
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl From<&DataType> for TypeTag {
    fn from(ty: &DataType) -> Self {
        match *ty {
            DataType::Null => TypeTag::Null,
            DataType::Missing => TypeTag::Missing,
            DataType::Bool => TypeTag::Boolean,
            DataType::Int2 => TypeTag::Integer {
                bits: IntBitWidth::I16,
            },
            DataType::Int4 => TypeTag::Integer {
                bits: IntBitWidth::I32,
            },
            DataType::Int8 => TypeTag::Integer {
                bits: IntBitWidth::I64,
            },
            DataType::Int => TypeTag::Int,
            DataType::Real | DataType::Float32 => TypeTag::Float {
                bits: FloatBitWidth::F32,
            },
            DataType::Float64 | DataType::DoublePrecision => TypeTag::Float {
                bits: FloatBitWidth::F64,
            },
            DataType::Decimal { precision, scale } | DataType::Numeric { precision, scale } => {
                TypeTag::Decimal { precision, scale }
            }
            DataType::Char { length } => TypeTag::Char { length },
            DataType::Varchar { length } => TypeTag::Varchar { length },
            DataType::String => TypeTag::String,
            DataType::Symbol => TypeTag::Symbol,
            DataType::Blob => TypeTag::Blob,
            DataType::Clob => TypeTag::Clob,
            DataType::Date => TypeTag::Date,
            DataType::Time { precision } => TypeTag::Time {
                precision,
                with_time_zone: false,
            },
            DataType::TimeWithTz { precision } => TypeTag::Time {
                precision,
                with_time_zone: true,
            },
            DataType::Timestamp { precision } => TypeTag::Timestamp {
                precision,
                with_time_zone: false,
            },
            DataType::TimestampWithTz { precision } => TypeTag::Timestamp {
                precision,
                with_time_zone: true,
            },
            DataType::Struct | DataType::Tuple => TypeTag::Struct,
            DataType::List | DataType::Array => TypeTag::List,
            DataType::Bag => TypeTag::Bag,
            DataType::Sexp => TypeTag::Sexp,
            DataType::Any => TypeTag::Any,
        }
    }
}

/// Type slot of a binding or expression
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlanType {
    /// Not known until the resolution stage
    #[default]
    Dynamic,
    /// Known from the syntax alone
    Static(TypeTag),
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
