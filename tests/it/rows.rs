//! Nested rows, null placement, and seeking.

use std::io::Cursor;

use parquet_engine::metadata::SchemaDescriptor;
use parquet_engine::read::{read_metadata, RowGroupReader};
use parquet_engine::schema::types::{ParquetType, PhysicalType, Repetition};
use parquet_engine::shred::RowValue;
use parquet_engine::write::WriteOptions;

use super::{read_all_rows, row, single_column_schema, write_file};

fn optional(name: &str, physical_type: PhysicalType) -> ParquetType {
    ParquetType::try_from_primitive(
        name.to_string(),
        physical_type,
        Repetition::Optional,
        None,
        None,
        None,
    )
    .unwrap()
}

#[test]
fn optional_column_preserves_null_placement() {
    // {a: int32, b: optional<int32>} with a mix of present and null
    let schema = SchemaDescriptor::try_new(
        "schema".to_string(),
        vec![
            ParquetType::from_physical("a".to_string(), PhysicalType::Int32),
            optional("b", PhysicalType::Int32),
        ],
    )
    .unwrap();

    let rows = (0i32..200)
        .map(|i| {
            let b = if i % 3 == 0 {
                RowValue::Null
            } else {
                RowValue::from(i * 2)
            };
            RowValue::group([
                ("a".to_string(), RowValue::from(i)),
                ("b".to_string(), b),
            ])
        })
        .collect::<Vec<_>>();

    let data = write_file(schema, WriteOptions::default(), &rows).unwrap();
    assert_eq!(read_all_rows(&data).unwrap(), rows);
}

#[test]
fn nested_groups_round_trip() {
    // message schema {
    //   required int64 id;
    //   optional group location { required double lat; required double lon; }
    // }
    let location = ParquetType::from_group(
        "location".to_string(),
        Repetition::Optional,
        None,
        None,
        vec![
            ParquetType::from_physical("lat".to_string(), PhysicalType::Double),
            ParquetType::from_physical("lon".to_string(), PhysicalType::Double),
        ],
        None,
    );
    let schema = SchemaDescriptor::try_new(
        "schema".to_string(),
        vec![
            ParquetType::from_physical("id".to_string(), PhysicalType::Int64),
            location,
        ],
    )
    .unwrap();

    let rows = (0i64..50)
        .map(|id| {
            let location = if id % 4 == 0 {
                RowValue::Null
            } else {
                RowValue::group([
                    ("lat".to_string(), RowValue::from(id as f64 / 10.0)),
                    ("lon".to_string(), RowValue::from(-(id as f64))),
                ])
            };
            RowValue::group([
                ("id".to_string(), RowValue::from(id)),
                ("location".to_string(), location),
            ])
        })
        .collect::<Vec<_>>();

    let data = write_file(schema, WriteOptions::default(), &rows).unwrap();
    assert_eq!(read_all_rows(&data).unwrap(), rows);
}

#[test]
fn deeply_nested_lists_round_trip() {
    // message schema { repeated group xs { repeated int32 x; } }
    let schema = SchemaDescriptor::try_new(
        "schema".to_string(),
        vec![ParquetType::from_group(
            "xs".to_string(),
            Repetition::Repeated,
            None,
            None,
            vec![ParquetType::try_from_primitive(
                "x".to_string(),
                PhysicalType::Int32,
                Repetition::Repeated,
                None,
                None,
                None,
            )
            .unwrap()],
            None,
        )],
    )
    .unwrap();

    let make_row = |lists: Vec<Vec<i32>>| {
        RowValue::group([(
            "xs".to_string(),
            RowValue::List(
                lists
                    .into_iter()
                    .map(|xs| {
                        RowValue::group([(
                            "x".to_string(),
                            RowValue::List(xs.into_iter().map(RowValue::from).collect()),
                        )])
                    })
                    .collect(),
            ),
        )])
    };
    let rows = vec![
        make_row(vec![vec![1, 2], vec![3]]),
        make_row(vec![]),
        make_row(vec![vec![], vec![4, 5, 6]]),
        make_row(vec![vec![7]]),
    ];

    let data = write_file(schema, WriteOptions::default(), &rows).unwrap();
    let read = read_all_rows(&data).unwrap();
    assert_eq!(read.len(), rows.len());
    assert_eq!(read, rows);
}

#[test]
fn seek_to_any_row() {
    let schema = single_column_schema(PhysicalType::Int64, Repetition::Required);
    let rows = (0i64..2_000)
        .map(|i| row(RowValue::from(i * 3)))
        .collect::<Vec<_>>();
    let data = write_file(
        schema,
        WriteOptions {
            // small pages so seeking crosses page boundaries
            page_buffer_size: 1024,
            ..Default::default()
        },
        &rows,
    )
    .unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let mut group_reader = RowGroupReader::try_new(&mut reader, &metadata, 0).unwrap();
    assert_eq!(group_reader.num_rows(), 2_000);

    for target in [0usize, 1, 127, 128, 1000, 1998, 1999] {
        group_reader.seek_to_row(target).unwrap();
        let read = group_reader.read_row().unwrap().unwrap();
        assert_eq!(read, rows[target], "row {}", target);
    }

    // seeking backwards works too
    group_reader.seek_to_row(5).unwrap();
    assert_eq!(group_reader.read_row().unwrap().unwrap(), rows[5]);

    // at the end there is nothing left to read
    group_reader.seek_to_row(2_000).unwrap();
    assert!(group_reader.read_row().unwrap().is_none());
}

#[test]
fn seek_within_repeated_column() {
    let schema = single_column_schema(PhysicalType::Int32, Repetition::Repeated);
    let rows = (0i32..500)
        .map(|i| {
            row(RowValue::List(
                (0..(i % 4)).map(|j| RowValue::from(i + j)).collect(),
            ))
        })
        .collect::<Vec<_>>();
    let data = write_file(
        schema,
        WriteOptions {
            page_buffer_size: 512,
            ..Default::default()
        },
        &rows,
    )
    .unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let mut group_reader = RowGroupReader::try_new(&mut reader, &metadata, 0).unwrap();

    for target in [3usize, 250, 499] {
        group_reader.seek_to_row(target).unwrap();
        assert_eq!(
            group_reader.read_row().unwrap().unwrap(),
            rows[target],
            "row {}",
            target
        );
    }
}

#[test]
fn sequential_read_equals_input_order() {
    let schema = single_column_schema(PhysicalType::ByteArray, Repetition::Optional);
    let rows = (0..1000)
        .map(|i| {
            if i % 7 == 0 {
                row(RowValue::Null)
            } else {
                row(RowValue::ByteArray(format!("{}", i).into_bytes()))
            }
        })
        .collect::<Vec<_>>();
    let data = write_file(
        schema,
        WriteOptions {
            page_buffer_size: 256,
            ..Default::default()
        },
        &rows,
    )
    .unwrap();
    assert_eq!(read_all_rows(&data).unwrap(), rows);
}
