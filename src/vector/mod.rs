// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

//! The `Vector` value container, its normalized read view, and `DataChunk`.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::types::{DataValue, Interval, LogicalType, PhysicalType, F32, F64};

mod data_chunk;
mod validity;

pub use self::data_chunk::{DataChunk, DataChunkBuilder};
pub use self::validity::ValidityMask;

/// One entry of a list vector: a window into the child vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub offset: u64,
    pub length: u64,
}

/// How the logical rows of a vector map onto its physical slots.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorEncoding {
    /// Row `i` lives in slot `i`.
    Flat,
    /// Every row lives in slot 0.
    Constant,
    /// Row `i` lives in slot `sel[i]`.
    Dictionary(Vec<u32>),
}

/// Physical payload of a vector, keyed by physical type.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int128(Vec<i128>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<F32>),
    Float64(Vec<F64>),
    Interval(Vec<Interval>),
    Varchar(Vec<String>),
    List {
        entries: Vec<ListEntry>,
        child: Box<Vector>,
    },
    Struct(Vec<Vector>),
}

impl VectorData {
    fn empty_for(ty: &LogicalType) -> VectorData {
        match ty {
            LogicalType::Boolean => VectorData::Bool(vec![]),
            LogicalType::TinyInt => VectorData::Int8(vec![]),
            LogicalType::SmallInt => VectorData::Int16(vec![]),
            LogicalType::Integer => VectorData::Int32(vec![]),
            LogicalType::BigInt => VectorData::Int64(vec![]),
            LogicalType::HugeInt => VectorData::Int128(vec![]),
            LogicalType::UTinyInt => VectorData::UInt8(vec![]),
            LogicalType::USmallInt => VectorData::UInt16(vec![]),
            LogicalType::UInteger => VectorData::UInt32(vec![]),
            LogicalType::UBigInt => VectorData::UInt64(vec![]),
            LogicalType::Float => VectorData::Float32(vec![]),
            LogicalType::Double => VectorData::Float64(vec![]),
            LogicalType::Interval => VectorData::Interval(vec![]),
            LogicalType::Varchar => VectorData::Varchar(vec![]),
            LogicalType::List(child) => VectorData::List {
                entries: vec![],
                child: Box::new(Vector::new((**child).clone())),
            },
            LogicalType::Struct(fields) => VectorData::Struct(
                fields
                    .iter()
                    .map(|(_, fty)| Vector::new(fty.clone()))
                    .collect(),
            ),
        }
    }
}

/// Which physical slot a logical row resolves to.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    Identity,
    Constant,
    Indices(&'a [u32]),
}

impl Selection<'_> {
    #[inline]
    pub fn get(&self, idx: usize) -> usize {
        match self {
            Selection::Identity => idx,
            Selection::Constant => 0,
            Selection::Indices(sel) => sel[idx] as usize,
        }
    }
}

/// A normalized view of a vector: selection, validity, and raw data,
/// independent of whether the vector was flat, constant, or dictionary
/// encoded.
pub struct UnifiedVectorFormat<'a> {
    pub sel: Selection<'a>,
    pub validity: &'a ValidityMask,
    pub data: &'a VectorData,
}

/// A single column of values.
///
/// Rows are addressed logically; the encoding maps them to physical slots in
/// `data`. Validity is physical-indexed, one bit per slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    ty: LogicalType,
    encoding: VectorEncoding,
    validity: ValidityMask,
    data: VectorData,
}

impl Vector {
    /// An empty flat vector of the given type.
    pub fn new(ty: LogicalType) -> Self {
        let data = VectorData::empty_for(&ty);
        Vector {
            ty,
            encoding: VectorEncoding::Flat,
            validity: ValidityMask::default(),
            data,
        }
    }

    /// A constant vector holding a single value for every row.
    pub fn constant(ty: LogicalType, value: &DataValue) -> Self {
        let mut vector = Vector::new(ty);
        vector.push_value(value);
        vector.encoding = VectorEncoding::Constant;
        vector
    }

    /// A dictionary vector: `sel[i]` selects the slot of `base` for row `i`.
    pub fn dictionary(base: Vector, sel: Vec<u32>) -> Self {
        assert!(
            matches!(base.encoding, VectorEncoding::Flat),
            "dictionary base must be flat"
        );
        Vector {
            encoding: VectorEncoding::Dictionary(sel),
            ..base
        }
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.ty.physical_type()
    }

    pub fn validity(&self) -> &ValidityMask {
        &self.validity
    }

    pub(crate) fn validity_mut(&mut self) -> &mut ValidityMask {
        &mut self.validity
    }

    pub fn data(&self) -> &VectorData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut VectorData {
        &mut self.data
    }

    /// Number of physical slots (for flat vectors, the row count).
    pub fn len(&self) -> usize {
        self.validity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validity.is_empty()
    }

    #[inline]
    fn resolve_index(&self, idx: usize) -> usize {
        match &self.encoding {
            VectorEncoding::Flat => idx,
            VectorEncoding::Constant => 0,
            VectorEncoding::Dictionary(sel) => sel[idx] as usize,
        }
    }

    /// Read the value at logical row `idx`.
    pub fn get_value(&self, idx: usize) -> DataValue {
        let idx = self.resolve_index(idx);
        if !self.validity.row_is_valid(idx) {
            return DataValue::Null;
        }
        match &self.data {
            VectorData::Bool(v) => DataValue::Bool(v[idx]),
            VectorData::Int8(v) => DataValue::Int8(v[idx]),
            VectorData::Int16(v) => DataValue::Int16(v[idx]),
            VectorData::Int32(v) => DataValue::Int32(v[idx]),
            VectorData::Int64(v) => DataValue::Int64(v[idx]),
            VectorData::Int128(v) => DataValue::Int128(v[idx]),
            VectorData::UInt8(v) => DataValue::UInt8(v[idx]),
            VectorData::UInt16(v) => DataValue::UInt16(v[idx]),
            VectorData::UInt32(v) => DataValue::UInt32(v[idx]),
            VectorData::UInt64(v) => DataValue::UInt64(v[idx]),
            VectorData::Float32(v) => DataValue::Float32(v[idx]),
            VectorData::Float64(v) => DataValue::Float64(v[idx]),
            VectorData::Interval(v) => DataValue::Interval(v[idx]),
            VectorData::Varchar(v) => DataValue::String(v[idx].clone()),
            VectorData::List { entries, child } => {
                let entry = entries[idx];
                DataValue::List(
                    (entry.offset..entry.offset + entry.length)
                        .map(|i| child.get_value(i as usize))
                        .collect(),
                )
            }
            VectorData::Struct(children) => {
                DataValue::Struct(children.iter().map(|c| c.get_value(idx)).collect())
            }
        }
    }

    /// Append a value. The vector must be flat.
    pub fn push_value(&mut self, value: &DataValue) {
        assert!(
            matches!(self.encoding, VectorEncoding::Flat),
            "can only push into a flat vector"
        );
        if value.is_null() {
            self.push_null();
            return;
        }
        self.validity.push(true);
        match (&mut self.data, value) {
            (VectorData::Bool(v), DataValue::Bool(x)) => v.push(*x),
            (VectorData::Int8(v), DataValue::Int8(x)) => v.push(*x),
            (VectorData::Int16(v), DataValue::Int16(x)) => v.push(*x),
            (VectorData::Int32(v), DataValue::Int32(x)) => v.push(*x),
            (VectorData::Int64(v), DataValue::Int64(x)) => v.push(*x),
            (VectorData::Int128(v), DataValue::Int128(x)) => v.push(*x),
            (VectorData::UInt8(v), DataValue::UInt8(x)) => v.push(*x),
            (VectorData::UInt16(v), DataValue::UInt16(x)) => v.push(*x),
            (VectorData::UInt32(v), DataValue::UInt32(x)) => v.push(*x),
            (VectorData::UInt64(v), DataValue::UInt64(x)) => v.push(*x),
            (VectorData::Float32(v), DataValue::Float32(x)) => v.push(*x),
            (VectorData::Float64(v), DataValue::Float64(x)) => v.push(*x),
            (VectorData::Interval(v), DataValue::Interval(x)) => v.push(*x),
            (VectorData::Varchar(v), DataValue::String(x)) => v.push(x.clone()),
            (VectorData::List { entries, child }, DataValue::List(items)) => {
                let offset = child.len() as u64;
                for item in items {
                    child.push_value(item);
                }
                entries.push(ListEntry {
                    offset,
                    length: items.len() as u64,
                });
            }
            (VectorData::Struct(children), DataValue::Struct(fields)) => {
                for (child, field) in children.iter_mut().zip_eq(fields) {
                    child.push_value(field);
                }
            }
            _ => panic!("failed to push value: type mismatch"),
        }
    }

    fn push_null(&mut self) {
        self.validity.push(false);
        match &mut self.data {
            VectorData::Bool(v) => v.push(false),
            VectorData::Int8(v) => v.push(0),
            VectorData::Int16(v) => v.push(0),
            VectorData::Int32(v) => v.push(0),
            VectorData::Int64(v) => v.push(0),
            VectorData::Int128(v) => v.push(0),
            VectorData::UInt8(v) => v.push(0),
            VectorData::UInt16(v) => v.push(0),
            VectorData::UInt32(v) => v.push(0),
            VectorData::UInt64(v) => v.push(0),
            VectorData::Float32(v) => v.push(F32::from(0.0)),
            VectorData::Float64(v) => v.push(F64::from(0.0)),
            VectorData::Interval(v) => v.push(Interval::default()),
            VectorData::Varchar(v) => v.push(String::new()),
            VectorData::List { entries, child } => entries.push(ListEntry {
                offset: child.len() as u64,
                length: 0,
            }),
            VectorData::Struct(children) => {
                for child in children {
                    child.push_value(&DataValue::Null);
                }
            }
        }
    }

    /// Normalize the vector to flat encoding over `count` rows.
    pub fn flatten(&mut self, count: usize) {
        if matches!(self.encoding, VectorEncoding::Flat) {
            return;
        }
        let mut flat = Vector::new(self.ty.clone());
        for idx in 0..count {
            flat.push_value(&self.get_value(idx));
        }
        *self = flat;
    }

    /// Project the vector into its normalized (selection, validity, data)
    /// view.
    pub fn to_unified_format(&self) -> UnifiedVectorFormat<'_> {
        let sel = match &self.encoding {
            VectorEncoding::Flat => Selection::Identity,
            VectorEncoding::Constant => Selection::Constant,
            VectorEncoding::Dictionary(sel) => Selection::Indices(sel),
        };
        UnifiedVectorFormat {
            sel,
            validity: &self.validity,
            data: &self.data,
        }
    }
}
