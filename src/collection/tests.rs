// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::buffer::{BufferManager, BufferPoolOptions, ClientContext};
use crate::types::{DataValue, Interval, LogicalType, Row, F64};
use crate::vector::{DataChunk, DataChunkBuilder, Vector, VectorData};

fn int32_value(v: Option<i32>) -> DataValue {
    v.map_or(DataValue::Null, DataValue::Int32)
}

fn int32_chunk(values: &[Option<i32>]) -> DataChunk {
    let mut chunk = DataChunk::new(&[LogicalType::Integer]);
    for v in values {
        chunk.push_row([int32_value(*v)]);
    }
    chunk
}

fn collect_column(collection: &ColumnDataCollection, column: usize) -> Vec<DataValue> {
    collection.rows().map(|row| row[column].clone()).collect()
}

#[test]
fn test_empty_collection() {
    let collection = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    assert_eq!(collection.count(), 0);
    assert_eq!(collection.chunk_count(), 0);
    assert_eq!(collection.chunks().count(), 0);
    assert_eq!(collection.rows().count(), 0);
    assert!(collection.collect_rows().is_empty());
    collection.verify();
}

#[test]
fn test_single_chunk_fixed_width() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    let mut input = int32_chunk(&[Some(1), Some(2), None, Some(4)]);
    collection.append_chunk(&mut input).unwrap();

    assert_eq!(collection.count(), 4);
    assert_eq!(collection.chunk_count(), 1);
    assert_eq!(
        collect_column(&collection, 0),
        vec![
            DataValue::Int32(1),
            DataValue::Int32(2),
            DataValue::Null,
            DataValue::Int32(4)
        ]
    );
    collection.verify();
}

#[test]
fn test_overflow_to_new_chunk() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::BigInt]);
    let mut input = DataChunk::new(&[LogicalType::BigInt]);
    for i in 0..1500i64 {
        input.push_row([DataValue::Int64(i)]);
    }
    collection.append_chunk(&mut input).unwrap();

    assert_eq!(collection.count(), 1500);
    assert_eq!(collection.chunk_count(), 2);

    let mut chunk = DataChunk::default();
    collection.fetch_chunk(0, &mut chunk).unwrap();
    assert_eq!(chunk.cardinality(), 1024);
    assert_eq!(chunk.get_row(0), vec![DataValue::Int64(0)]);
    assert_eq!(chunk.get_row(1023), vec![DataValue::Int64(1023)]);

    collection.fetch_chunk(1, &mut chunk).unwrap();
    assert_eq!(chunk.cardinality(), 476);
    assert_eq!(chunk.get_row(0), vec![DataValue::Int64(1024)]);
    assert_eq!(chunk.get_row(475), vec![DataValue::Int64(1499)]);

    let err = collection.fetch_chunk(2, &mut chunk).unwrap_err();
    assert!(matches!(
        err,
        ColumnDataError::ChunkIndexOutOfBounds {
            index: 2,
            chunk_count: 2
        }
    ));
}

#[test]
fn test_strings_inline_and_heap() {
    let long = "a-very-long-string-well-past-inline-threshold";
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Varchar]);
    {
        let mut input = DataChunk::new(&[LogicalType::Varchar]);
        input.push_row([DataValue::String("a".into())]);
        input.push_row([DataValue::String("bb".into())]);
        input.push_row([DataValue::String(long.into())]);
        input.push_row([DataValue::Null]);
        collection.append_chunk(&mut input).unwrap();
        // the source chunk is dropped here; the heap copy must survive it
    }
    let expected = vec![
        DataValue::String("a".into()),
        DataValue::String("bb".into()),
        DataValue::String(long.into()),
        DataValue::Null,
    ];
    assert_eq!(collect_column(&collection, 0), expected);
    // a second scan sees the same bytes
    assert_eq!(collect_column(&collection, 0), expected);
}

#[test]
fn test_list_of_int32() {
    let ty = LogicalType::list(LogicalType::Integer);
    let mut collection = ColumnDataCollection::with_types(vec![ty.clone()]);
    let rows = [
        DataValue::List(vec![
            DataValue::Int32(1),
            DataValue::Int32(2),
            DataValue::Int32(3),
        ]),
        DataValue::List(vec![]),
        DataValue::List(vec![DataValue::Int32(4), DataValue::Int32(5)]),
    ];
    let mut input = DataChunk::new(&[ty]);
    for row in &rows {
        input.push_row([row.clone()]);
    }
    collection.append_chunk(&mut input).unwrap();

    let chunks: Vec<DataChunk> = collection.chunks().collect();
    assert_eq!(chunks.len(), 1);
    let chunk = &chunks[0];
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(&chunk.get_row(i)[0], row);
    }
    let VectorData::List { entries, child } = chunk.column_at(0).data() else {
        panic!("expected a list vector");
    };
    assert!(child.len() >= 5);
    for entry in entries {
        assert!(entry.offset + entry.length <= child.len() as u64);
    }
}

#[test]
fn test_list_child_chain_overflow() {
    // 400 rows of 5 elements each: 2000 child values, forcing the child
    // descriptor chain past a single vector
    let ty = LogicalType::list(LogicalType::Integer);
    let mut collection = ColumnDataCollection::with_types(vec![ty.clone()]);
    let mut input = DataChunk::new(&[ty]);
    for i in 0..400i32 {
        input.push_row([DataValue::List(
            (0..5).map(|j| DataValue::Int32(i * 5 + j)).collect(),
        )]);
    }
    collection.append_chunk(&mut input).unwrap();

    assert_eq!(collection.count(), 400);
    let values = collect_column(&collection, 0);
    for (i, value) in values.iter().enumerate() {
        let i = i as i32;
        assert_eq!(
            value,
            &DataValue::List((0..5).map(|j| DataValue::Int32(i * 5 + j)).collect())
        );
    }
}

#[test]
fn test_nested_list_roundtrip() {
    let ty = LogicalType::list(LogicalType::list(LogicalType::Integer));
    let mut collection = ColumnDataCollection::with_types(vec![ty.clone()]);
    let rows = [
        DataValue::List(vec![
            DataValue::List(vec![DataValue::Int32(1), DataValue::Int32(2)]),
            DataValue::List(vec![]),
        ]),
        DataValue::List(vec![DataValue::List(vec![DataValue::Int32(3)])]),
        DataValue::Null,
    ];
    let mut input = DataChunk::new(&[ty]);
    for row in &rows {
        input.push_row([row.clone()]);
    }
    collection.append_chunk(&mut input).unwrap();

    assert_eq!(collect_column(&collection, 0).as_slice(), &rows);
}

#[test]
fn test_list_offsets_rebase_across_appends() {
    // two appends land in the same chunk; stored list offsets must shift
    // past the child rows of the first append
    let ty = LogicalType::list(LogicalType::Integer);
    let mut collection = ColumnDataCollection::with_types(vec![ty.clone()]);
    let first = [
        DataValue::List(vec![DataValue::Int32(1)]),
        DataValue::List(vec![DataValue::Int32(2), DataValue::Int32(3)]),
    ];
    let second = [DataValue::List(vec![DataValue::Int32(4)])];
    for rows in [&first[..], &second[..]] {
        let mut input = DataChunk::new(&[ty.clone()]);
        for row in rows {
            input.push_row([row.clone()]);
        }
        collection.append_chunk(&mut input).unwrap();
    }

    assert_eq!(collection.chunk_count(), 1);
    let expected: Vec<DataValue> = first.iter().chain(&second).cloned().collect();
    assert_eq!(collect_column(&collection, 0), expected);
}

#[test]
fn test_struct_fields_scan() {
    let ty = LogicalType::struct_([
        ("id", LogicalType::Integer),
        ("name", LogicalType::Varchar),
    ]);
    let mut collection = ColumnDataCollection::with_types(vec![ty.clone()]);
    let rows = [
        DataValue::Struct(vec![DataValue::Int32(1), DataValue::String("ada".into())]),
        DataValue::Null,
        DataValue::Struct(vec![DataValue::Null, DataValue::String("grace".into())]),
    ];
    let mut input = DataChunk::new(&[ty]);
    for row in &rows {
        input.push_row([row.clone()]);
    }
    collection.append_chunk(&mut input).unwrap();

    let values = collect_column(&collection, 0);
    assert_eq!(values.as_slice(), &rows);

    // each field column matches an independent per-field read
    let chunks: Vec<DataChunk> = collection.chunks().collect();
    let VectorData::Struct(children) = chunks[0].column_at(0).data() else {
        panic!("expected a struct vector");
    };
    assert_eq!(children[0].get_value(0), DataValue::Int32(1));
    assert_eq!(children[1].get_value(2), DataValue::String("grace".into()));
}

#[test]
fn test_mixed_scalar_types_roundtrip() {
    let types = vec![
        LogicalType::Boolean,
        LogicalType::HugeInt,
        LogicalType::Double,
        LogicalType::Interval,
    ];
    let mut collection = ColumnDataCollection::with_types(types.clone());
    let row = vec![
        DataValue::Bool(true),
        DataValue::Int128(-(1i128 << 100)),
        DataValue::Float64(F64::from(0.25)),
        DataValue::Interval(Interval::new(14, -3, 42)),
    ];
    let mut input = DataChunk::new(&types);
    input.push_row(row.clone());
    input.push_row(vec![DataValue::Null; 4]);
    collection.append_chunk(&mut input).unwrap();

    let rows: Vec<_> = collection.rows().collect();
    assert_eq!(rows[0], row);
    assert_eq!(rows[1], vec![DataValue::Null; 4]);
}

#[test]
fn test_combine_transfers_segments() {
    let mut a = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    let mut b = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    a.append_chunk(&mut int32_chunk(&[Some(10), Some(20)])).unwrap();
    b.append_chunk(&mut int32_chunk(&[Some(30), Some(40), Some(50)]))
        .unwrap();

    a.combine(&mut b).unwrap();
    assert_eq!(a.count(), 5);
    assert_eq!(b.count(), 0);
    assert_eq!(
        collect_column(&a, 0),
        [10, 20, 30, 40, 50]
            .map(DataValue::Int32)
            .to_vec()
    );
    a.verify();
}

#[test]
fn test_combine_schema_mismatch() {
    let mut a = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    let mut b = ColumnDataCollection::with_types(vec![LogicalType::Varchar]);
    b.append_chunk(&mut {
        let mut chunk = DataChunk::new(&[LogicalType::Varchar]);
        chunk.push_row([DataValue::String("x".into())]);
        chunk
    })
    .unwrap();
    assert!(matches!(
        a.combine(&mut b).unwrap_err(),
        ColumnDataError::SchemaMismatch { .. }
    ));
}

#[test]
fn test_append_schema_mismatch() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    let mut wrong = DataChunk::new(&[LogicalType::Varchar]);
    wrong.push_row([DataValue::String("x".into())]);
    assert!(matches!(
        collection.append_chunk(&mut wrong).unwrap_err(),
        ColumnDataError::SchemaMismatch { .. }
    ));
}

#[test]
fn test_projection() {
    let types = vec![
        LogicalType::Integer,
        LogicalType::Varchar,
        LogicalType::BigInt,
    ];
    let mut collection = ColumnDataCollection::with_types(types.clone());
    let mut input = DataChunk::new(&types);
    for i in 0..10i32 {
        input.push_row([
            DataValue::Int32(i),
            DataValue::String(format!("row-{}", i)),
            DataValue::Int64(i as i64 * 100),
        ]);
    }
    collection.append_chunk(&mut input).unwrap();

    let projected: Vec<DataChunk> = collection.chunks_projected(vec![2, 0]).collect();
    assert_eq!(projected.len(), 1);
    let chunk = &projected[0];
    assert_eq!(chunk.column_count(), 2);
    for i in 0..10usize {
        assert_eq!(
            chunk.get_row(i),
            vec![DataValue::Int64(i as i64 * 100), DataValue::Int32(i as i32)]
        );
    }
}

#[test]
fn test_iteration_equivalence() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    for base in 0..3 {
        let values: Vec<Option<i32>> = (0..700).map(|i| Some(base * 700 + i)).collect();
        collection.append_chunk(&mut int32_chunk(&values)).unwrap();
    }

    let lazy: Vec<Row> = collection.rows().collect();
    let eager = collection.collect_rows();
    assert_eq!(lazy.len(), eager.len());
    for (i, row) in lazy.iter().enumerate() {
        assert_eq!(row[0], eager.get_value(0, i));
        assert_eq!(eager.row(i).row_index(), i);
    }

    // chunks concatenated equal a serial scan
    let mut state = ColumnDataScanState::default();
    collection.initialize_scan(&mut state);
    let mut chunk = DataChunk::default();
    collection.initialize_scan_chunk(&mut chunk);
    let mut scanned = vec![];
    while collection.scan(&mut state, &mut chunk) {
        for i in 0..chunk.cardinality() {
            scanned.push(chunk.get_row(i));
        }
    }
    assert_eq!(scanned, lazy);
}

#[test]
fn test_scan_row_index_bookkeeping() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    let values: Vec<Option<i32>> = (0..1500).map(Some).collect();
    collection.append_chunk(&mut int32_chunk(&values)).unwrap();

    let mut state = ColumnDataScanState::default();
    collection.initialize_scan(&mut state);
    let mut chunk = DataChunk::default();
    collection.initialize_scan_chunk(&mut chunk);
    assert!(collection.scan(&mut state, &mut chunk));
    assert_eq!(state.current_row_index(), 0);
    assert!(collection.scan(&mut state, &mut chunk));
    assert_eq!(state.current_row_index(), 1024);
    assert!(!collection.scan(&mut state, &mut chunk));
}

#[test]
fn test_parallel_scan_completeness() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    for base in 0..5 {
        let values: Vec<Option<i32>> = (0..1000)
            .map(|i| {
                let v = base * 1000 + i;
                (v % 97 != 0).then_some(v)
            })
            .collect();
        collection.append_chunk(&mut int32_chunk(&values)).unwrap();
    }
    // several segments via combine
    let mut tail = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    let values: Vec<Option<i32>> = (5000..6000).map(Some).collect();
    tail.append_chunk(&mut int32_chunk(&values)).unwrap();
    collection.combine(&mut tail).unwrap();

    let serial: Vec<Row> = collection.rows().collect();

    let mut state = ColumnDataParallelScanState::default();
    collection.initialize_parallel_scan(&mut state);
    let gathered = parking_lot::Mutex::new(Vec::new());
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let mut local_state = ColumnDataLocalScanState::default();
                let mut chunk = DataChunk::default();
                collection.initialize_scan_chunk(&mut chunk);
                let mut rows = vec![];
                while collection.scan_parallel(&state, &mut local_state, &mut chunk) {
                    for i in 0..chunk.cardinality() {
                        rows.push(chunk.get_row(i));
                    }
                }
                gathered.lock().extend(rows);
            });
        }
    });

    let mut gathered = gathered.into_inner();
    assert_eq!(gathered.len(), serial.len());
    let mut expected = serial.clone();
    gathered.sort();
    expected.sort();
    assert_eq!(gathered, expected);
}

#[test]
fn test_scan_without_zero_copy() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Varchar]);
    let mut input = DataChunk::new(&[LogicalType::Varchar]);
    for i in 0..100 {
        input.push_row([DataValue::String(format!("value-{}-padded-beyond-inline", i))]);
    }
    collection.append_chunk(&mut input).unwrap();

    let mut state = ColumnDataScanState::default();
    collection.initialize_scan_with(&mut state, None, ColumnDataScanProperties::DisallowZeroCopy);
    let mut chunk = DataChunk::default();
    collection.initialize_scan_chunk(&mut chunk);
    let mut total = 0;
    while collection.scan(&mut state, &mut chunk) {
        total += chunk.cardinality();
        assert_eq!(
            chunk.get_row(0),
            vec![DataValue::String("value-0-padded-beyond-inline".into())]
        );
    }
    assert_eq!(total, 100);
}

#[test]
fn test_constant_and_dictionary_inputs() {
    let types = vec![LogicalType::Integer, LogicalType::Varchar];
    let mut collection = ColumnDataCollection::with_types(types.clone());

    let mut dict_base = Vector::new(LogicalType::Integer);
    dict_base.push_value(&DataValue::Int32(7));
    dict_base.push_value(&DataValue::Int32(9));
    let dict = Vector::dictionary(dict_base, vec![1, 0, 1]);
    let constant = Vector::constant(LogicalType::Varchar, &DataValue::String("c".into()));

    let mut input = DataChunk::new(&types);
    input.columns_mut()[0] = dict;
    input.columns_mut()[1] = constant;
    input.set_cardinality(3);
    collection.append_chunk(&mut input).unwrap();

    let rows: Vec<Row> = collection.rows().collect();
    assert_eq!(
        rows,
        vec![
            vec![DataValue::Int32(9), DataValue::String("c".into())],
            vec![DataValue::Int32(7), DataValue::String("c".into())],
            vec![DataValue::Int32(9), DataValue::String("c".into())],
        ]
    );
}

#[test]
fn test_result_equals() {
    let mut a = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    let mut b = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    a.append_chunk(&mut int32_chunk(&[Some(1), None, Some(3)]))
        .unwrap();
    b.append_chunk(&mut int32_chunk(&[Some(1), None, Some(3)]))
        .unwrap();

    let mut message = String::new();
    assert!(ColumnDataCollection::result_equals(&a, &b, &mut message));
    assert!(message.is_empty());

    // the right value must be read from the right-hand collection
    let mut c = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    c.append_chunk(&mut int32_chunk(&[Some(1), None, Some(4)]))
        .unwrap();
    assert!(!ColumnDataCollection::result_equals(&a, &c, &mut message));
    assert_eq!(message, "3 <> 4 (row: 2, col: 0)");

    let mut d = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    d.append_chunk(&mut int32_chunk(&[Some(1)])).unwrap();
    assert!(!ColumnDataCollection::result_equals(&a, &d, &mut message));
    assert_eq!(message, "Row count mismatch");
}

#[test]
fn test_schema_adopted_on_first_append() {
    let mut collection = ColumnDataCollection::new();
    collection
        .append_chunk(&mut int32_chunk(&[Some(5)]))
        .unwrap();
    assert_eq!(collection.types(), &[LogicalType::Integer]);
    assert_eq!(collection.count(), 1);
    // schema is now fixed
    let mut wrong = DataChunk::new(&[LogicalType::Varchar]);
    wrong.push_row([DataValue::String("x".into())]);
    assert!(collection.append_chunk(&mut wrong).is_err());
}

#[test]
fn test_clone_empty_shares_allocator_and_finishes_source() {
    let mut source = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    source
        .append_chunk(&mut int32_chunk(&[Some(1)]))
        .unwrap();
    let mut cloned = source.clone_empty();
    assert_eq!(cloned.count(), 0);
    assert_eq!(cloned.types(), source.types());
    cloned.append_chunk(&mut int32_chunk(&[Some(2)])).unwrap();
    assert_eq!(cloned.count(), 1);
}

#[test]
#[should_panic(expected = "finished collection")]
fn test_append_after_clone_empty_panics() {
    let mut source = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    let _cloned = source.clone_empty();
    let _ = source.append_chunk(&mut int32_chunk(&[Some(1)]));
}

#[test]
fn test_buffer_manager_memory_limit() {
    let manager = Arc::new(BufferManager::new(BufferPoolOptions {
        memory_limit: 64 * 1024,
    }));
    let mut collection =
        ColumnDataCollection::with_buffer_manager(manager, vec![LogicalType::HugeInt]);
    // each chunk needs a fresh 16 KiB-plus vector region; the pool runs dry
    let mut result = Ok(());
    for base in 0..64i128 {
        let mut input = DataChunk::new(&[LogicalType::HugeInt]);
        for i in 0..1024 {
            input.push_row([DataValue::Int128(base * 1024 + i)]);
        }
        result = collection.append_chunk(&mut input);
        if result.is_err() {
            break;
        }
    }
    assert!(matches!(
        result.unwrap_err(),
        ColumnDataError::OutOfMemory { .. }
    ));
}

#[test]
fn test_with_context_constructor() {
    let context = ClientContext::new(BufferPoolOptions::default());
    let mut collection =
        ColumnDataCollection::with_context(&context, vec![LogicalType::Integer]);
    collection
        .append_chunk(&mut int32_chunk(&[Some(1), Some(2)]))
        .unwrap();
    assert!(context.buffer_manager().memory_used() > 0);
    assert_eq!(collection.count(), 2);
}

#[test]
fn test_reset_keeps_schema() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Integer]);
    collection
        .append_chunk(&mut int32_chunk(&[Some(1), Some(2)]))
        .unwrap();
    collection.reset();
    assert_eq!(collection.count(), 0);
    assert_eq!(collection.chunk_count(), 0);
    collection
        .append_chunk(&mut int32_chunk(&[Some(3)]))
        .unwrap();
    assert_eq!(collect_column(&collection, 0), vec![DataValue::Int32(3)]);
}

#[test]
fn test_display_renders_rows() {
    let mut collection = ColumnDataCollection::with_types(vec![LogicalType::Varchar]);
    let mut input = DataChunk::new(&[LogicalType::Varchar]);
    input.push_row([DataValue::String("hello".into())]);
    collection.append_chunk(&mut input).unwrap();
    let rendered = collection.to_string();
    assert!(rendered.contains("1 rows"));
    assert!(rendered.contains("'hello'"));
}

#[test]
fn test_randomized_roundtrip() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let types = vec![LogicalType::Integer, LogicalType::Varchar];
    let mut collection = ColumnDataCollection::with_types(types.clone());
    let mut expected: Vec<Row> = vec![];

    let mut builder = DataChunkBuilder::new(types, 512);
    for _ in 0..5 {
        let rows = rng.gen_range(1..2000);
        for _ in 0..rows {
            let int_value = if rng.gen_bool(0.1) {
                DataValue::Null
            } else {
                DataValue::Int32(rng.gen_range(-1000..1000))
            };
            let string_value = if rng.gen_bool(0.1) {
                DataValue::Null
            } else {
                let len = rng.gen_range(0..40);
                DataValue::String("x".repeat(len))
            };
            let row = vec![int_value, string_value];
            expected.push(row.clone());
            if let Some(mut chunk) = builder.push_row(row) {
                collection.append_chunk(&mut chunk).unwrap();
            }
        }
    }
    if let Some(mut chunk) = builder.take() {
        collection.append_chunk(&mut chunk).unwrap();
    }

    assert_eq!(collection.count(), expected.len());
    let scanned: Vec<Row> = collection.rows().collect();
    assert_eq!(scanned, expected);
    collection.verify();
}
