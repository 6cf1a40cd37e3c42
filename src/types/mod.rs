// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

//! Logical/physical type system and owned row values.

use serde::{Deserialize, Serialize};

mod interval;
mod value;

pub use self::interval::Interval;
pub use self::value::{values_are_equal, DataValue, Row};

/// A wrapper around floats providing implementations of `Eq`, `Ord`, and `Hash`.
pub type F32 = ordered_float::OrderedFloat<f32>;
pub type F64 = ordered_float::OrderedFloat<f64>;

/// The logical type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    HugeInt,
    UTinyInt,
    USmallInt,
    UInteger,
    UBigInt,
    Float,
    Double,
    Interval,
    Varchar,
    List(Box<LogicalType>),
    Struct(Vec<(String, LogicalType)>),
}

impl LogicalType {
    /// The physical storage type backing this logical type.
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            Self::Boolean => PhysicalType::Bool,
            Self::TinyInt => PhysicalType::Int8,
            Self::SmallInt => PhysicalType::Int16,
            Self::Integer => PhysicalType::Int32,
            Self::BigInt => PhysicalType::Int64,
            Self::HugeInt => PhysicalType::Int128,
            Self::UTinyInt => PhysicalType::UInt8,
            Self::USmallInt => PhysicalType::UInt16,
            Self::UInteger => PhysicalType::UInt32,
            Self::UBigInt => PhysicalType::UInt64,
            Self::Float => PhysicalType::Float32,
            Self::Double => PhysicalType::Float64,
            Self::Interval => PhysicalType::Interval,
            Self::Varchar => PhysicalType::Varchar,
            Self::List(_) => PhysicalType::List,
            Self::Struct(_) => PhysicalType::Struct,
        }
    }

    /// Shorthand for a list type with the given element type.
    pub fn list(child: LogicalType) -> LogicalType {
        LogicalType::List(Box::new(child))
    }

    /// Shorthand for a struct type with the given fields.
    pub fn struct_(
        fields: impl IntoIterator<Item = (impl Into<String>, LogicalType)>,
    ) -> LogicalType {
        LogicalType::Struct(fields.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }
}

/// The closed set of physical storage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Interval,
    Varchar,
    List,
    Struct,
}

impl PhysicalType {
    /// The width in bytes of one value slot inside a block.
    ///
    /// Varchar and list slots are 16-byte fixed-width headers; struct vectors
    /// store no data of their own, only a validity bitmap.
    pub fn type_size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
            Self::Int128 | Self::Interval | Self::Varchar | Self::List => 16,
            Self::Struct => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_mapping() {
        let ty = LogicalType::list(LogicalType::struct_([
            ("a", LogicalType::Integer),
            ("b", LogicalType::Varchar),
        ]));
        assert_eq!(ty.physical_type(), PhysicalType::List);
        let LogicalType::List(child) = &ty else {
            unreachable!()
        };
        assert_eq!(child.physical_type(), PhysicalType::Struct);
        assert_eq!(PhysicalType::Struct.type_size(), 0);
        assert_eq!(PhysicalType::Int128.type_size(), 16);
    }
}
