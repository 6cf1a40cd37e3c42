// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Interval, F32, F64};

/// An owned value of a single row position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataValue {
    // NOTE: Null comes first.
    // => NULL is less than any non-NULL values
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(F32),
    Float64(F64),
    String(String),
    Interval(Interval),
    List(Vec<DataValue>),
    Struct(Vec<DataValue>),
}

/// In-memory row type.
pub type Row = Vec<DataValue>;

impl DataValue {
    /// Returns `true` if value is null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Value equality as used by result comparison: NULL equals NULL, and floats
/// compare totally (NaN equals NaN).
pub fn values_are_equal(left: &DataValue, right: &DataValue) -> bool {
    left == right
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int8(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Int128(v) => write!(f, "{}", v),
            Self::UInt8(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "'{}'", v),
            Self::Interval(v) => write!(f, "{}", v),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Struct(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_equals_null() {
        assert!(values_are_equal(&DataValue::Null, &DataValue::Null));
        assert!(!values_are_equal(&DataValue::Null, &DataValue::Int32(0)));
        assert!(values_are_equal(
            &DataValue::Float64(F64::from(f64::NAN)),
            &DataValue::Float64(F64::from(f64::NAN))
        ));
    }

    #[test]
    fn test_display_nested() {
        let v = DataValue::List(vec![
            DataValue::Int32(1),
            DataValue::Null,
            DataValue::Struct(vec![DataValue::String("x".into()), DataValue::Bool(true)]),
        ]);
        assert_eq!(v.to_string(), "[1, null, {'x', true}]");
    }
}
