// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

//! In-block layout of vector regions.
//!
//! A vector region holds `STANDARD_VECTOR_SIZE` fixed-width value slots
//! followed by a validity bit region (one bit per row, 1 = valid). Struct
//! vectors have a slot width of zero and consist of the validity region
//! alone. Varchar and list slots are 16-byte headers; varchar slots refer to
//! the segment heap when the value does not fit inline.

use bytes::{Buf, BufMut};

use super::segment::StringHeap;
use crate::types::{Interval, F32, F64};
use crate::vector::{ListEntry, VectorData};
use crate::STANDARD_VECTOR_SIZE;

pub(crate) const VALIDITY_BYTES: usize = STANDARD_VECTOR_SIZE / 8;

/// Byte offset of the validity region inside a vector region.
pub(crate) fn validity_offset(type_size: usize) -> usize {
    STANDARD_VECTOR_SIZE * type_size
}

/// Total size in bytes of a vector region.
pub(crate) fn vector_region_size(type_size: usize) -> usize {
    validity_offset(type_size) + VALIDITY_BYTES
}

pub(crate) fn validity_set_all_valid(bits: &mut [u8]) {
    bits.fill(0xff);
}

pub(crate) fn validity_set_invalid(bits: &mut [u8], idx: usize) {
    bits[idx / 8] &= !(1 << (idx % 8));
}

pub(crate) fn validity_row_is_valid(bits: &[u8], idx: usize) -> bool {
    bits[idx / 8] & (1 << (idx % 8)) != 0
}

/// Encode/decode of one fixed-width value slot.
pub(crate) trait FixedSizeCodec: Copy {
    const SIZE: usize;

    /// The typed payload of a matching vector.
    fn data_slice(data: &VectorData) -> &[Self];

    fn write_slot(self, slot: &mut [u8]);
    fn read_slot(slot: &[u8]) -> Self;
}

macro_rules! impl_primitive_codec {
    ($($t:ty, $variant:ident, $size:expr, $put:ident, $get:ident;)*) => {$(
        impl FixedSizeCodec for $t {
            const SIZE: usize = $size;

            fn data_slice(data: &VectorData) -> &[Self] {
                match data {
                    VectorData::$variant(values) => values,
                    _ => panic!("vector data does not match physical type"),
                }
            }

            fn write_slot(self, mut slot: &mut [u8]) {
                slot.$put(self);
            }

            fn read_slot(mut slot: &[u8]) -> Self {
                slot.$get()
            }
        }
    )*};
}

impl_primitive_codec! {
    i8, Int8, 1, put_i8, get_i8;
    i16, Int16, 2, put_i16_le, get_i16_le;
    i32, Int32, 4, put_i32_le, get_i32_le;
    i64, Int64, 8, put_i64_le, get_i64_le;
    i128, Int128, 16, put_i128_le, get_i128_le;
    u8, UInt8, 1, put_u8, get_u8;
    u16, UInt16, 2, put_u16_le, get_u16_le;
    u32, UInt32, 4, put_u32_le, get_u32_le;
    u64, UInt64, 8, put_u64_le, get_u64_le;
}

impl FixedSizeCodec for bool {
    const SIZE: usize = 1;

    fn data_slice(data: &VectorData) -> &[Self] {
        match data {
            VectorData::Bool(values) => values,
            _ => panic!("vector data does not match physical type"),
        }
    }

    fn write_slot(self, mut slot: &mut [u8]) {
        slot.put_u8(self as u8);
    }

    fn read_slot(mut slot: &[u8]) -> Self {
        slot.get_u8() != 0
    }
}

impl FixedSizeCodec for F32 {
    const SIZE: usize = 4;

    fn data_slice(data: &VectorData) -> &[Self] {
        match data {
            VectorData::Float32(values) => values,
            _ => panic!("vector data does not match physical type"),
        }
    }

    fn write_slot(self, mut slot: &mut [u8]) {
        slot.put_f32_le(self.into_inner());
    }

    fn read_slot(mut slot: &[u8]) -> Self {
        F32::from(slot.get_f32_le())
    }
}

impl FixedSizeCodec for F64 {
    const SIZE: usize = 8;

    fn data_slice(data: &VectorData) -> &[Self] {
        match data {
            VectorData::Float64(values) => values,
            _ => panic!("vector data does not match physical type"),
        }
    }

    fn write_slot(self, mut slot: &mut [u8]) {
        slot.put_f64_le(self.into_inner());
    }

    fn read_slot(mut slot: &[u8]) -> Self {
        F64::from(slot.get_f64_le())
    }
}

impl FixedSizeCodec for Interval {
    const SIZE: usize = 16;

    fn data_slice(data: &VectorData) -> &[Self] {
        match data {
            VectorData::Interval(values) => values,
            _ => panic!("vector data does not match physical type"),
        }
    }

    fn write_slot(self, mut slot: &mut [u8]) {
        slot.put_i32_le(self.months());
        slot.put_i32_le(self.days());
        slot.put_i64_le(self.micros());
    }

    fn read_slot(mut slot: &[u8]) -> Self {
        let months = slot.get_i32_le();
        let days = slot.get_i32_le();
        let micros = slot.get_i64_le();
        Interval::new(months, days, micros)
    }
}

impl FixedSizeCodec for ListEntry {
    const SIZE: usize = 16;

    fn data_slice(data: &VectorData) -> &[Self] {
        match data {
            VectorData::List { entries, .. } => entries,
            _ => panic!("vector data does not match physical type"),
        }
    }

    fn write_slot(self, mut slot: &mut [u8]) {
        slot.put_u64_le(self.offset);
        slot.put_u64_le(self.length);
    }

    fn read_slot(mut slot: &[u8]) -> Self {
        let offset = slot.get_u64_le();
        let length = slot.get_u64_le();
        ListEntry { offset, length }
    }
}

pub(crate) const STRING_SLOT_SIZE: usize = 16;

/// Strings of up to this many bytes are stored inline in the slot.
pub(crate) const STRING_INLINE_LENGTH: usize = 12;

/// Slot layout: `len: u32 | 12 inline bytes`, or for longer strings
/// `len: u32 | 4-byte prefix | heap offset: u64`.
pub(crate) fn write_string_slot(slot: &mut [u8], value: &str, heap: &mut StringHeap) {
    let bytes = value.as_bytes();
    let len = bytes.len();
    (&mut slot[0..4]).put_u32_le(len as u32);
    if len <= STRING_INLINE_LENGTH {
        slot[4..4 + len].copy_from_slice(bytes);
    } else {
        slot[4..8].copy_from_slice(&bytes[0..4]);
        let offset = heap.add_blob(bytes);
        (&mut slot[8..16]).put_u64_le(offset);
    }
}

pub(crate) fn read_string_slot(slot: &[u8], heap: &StringHeap) -> String {
    let len = (&slot[0..4]).get_u32_le() as usize;
    let bytes = if len <= STRING_INLINE_LENGTH {
        &slot[4..4 + len]
    } else {
        let offset = (&slot[8..16]).get_u64_le();
        heap.get(offset, len)
    };
    String::from_utf8(bytes.to_vec()).expect("string slot holds invalid utf-8")
}
