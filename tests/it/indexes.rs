//! Column index and offset index behavior over written files.

use std::io::Cursor;

use parquet_engine::metadata::ColumnPath;
use parquet_engine::read::{read_columns_indexes, read_metadata, read_pages_locations};
use parquet_engine::schema::types::{PhysicalType, Repetition};
use parquet_engine::shred::RowValue;
use parquet_engine::write::WriteOptions;

use parquet_format_safe::BoundaryOrder;

use super::{row, single_column_schema, write_file};

fn paged_options() -> WriteOptions {
    WriteOptions {
        // force several pages per row group
        page_buffer_size: 512,
        ..Default::default()
    }
}

fn write_ints(values: impl Iterator<Item = i64>, options: WriteOptions) -> Vec<u8> {
    let schema = single_column_schema(PhysicalType::Int64, Repetition::Required);
    let rows = values.map(|v| row(RowValue::from(v))).collect::<Vec<_>>();
    write_file(schema, options, &rows).unwrap()
}

#[test]
fn ascending_boundary_order() {
    let data = write_ints(0..2000, paged_options());
    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();

    let indexes = read_columns_indexes(&mut reader, metadata.row_groups[0].columns()).unwrap();
    let index = indexes[0].as_ref().unwrap();
    assert!(index.min_values.len() > 1);
    assert_eq!(index.boundary_order, BoundaryOrder::ASCENDING);
}

#[test]
fn descending_boundary_order() {
    let data = write_ints((0..2000).rev(), paged_options());
    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();

    let indexes = read_columns_indexes(&mut reader, metadata.row_groups[0].columns()).unwrap();
    let index = indexes[0].as_ref().unwrap();
    assert_eq!(index.boundary_order, BoundaryOrder::DESCENDING);
}

#[test]
fn unordered_boundary_order() {
    let values = (0..2000).map(|i| ((i * 7919) % 2000) as i64);
    let data = write_ints(values, paged_options());
    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();

    let indexes = read_columns_indexes(&mut reader, metadata.row_groups[0].columns()).unwrap();
    let index = indexes[0].as_ref().unwrap();
    assert_eq!(index.boundary_order, BoundaryOrder::UNORDERED);
}

#[test]
fn null_pages_are_marked() {
    let schema = single_column_schema(PhysicalType::Int32, Repetition::Optional);
    let rows = (0..100)
        .map(|_| row(RowValue::Null))
        .collect::<Vec<_>>();
    let data = write_file(schema, WriteOptions::default(), &rows).unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let indexes = read_columns_indexes(&mut reader, metadata.row_groups[0].columns()).unwrap();
    let index = indexes[0].as_ref().unwrap();
    assert_eq!(index.null_pages, vec![true]);
    assert_eq!(index.null_counts, Some(vec![100]));
}

#[test]
fn min_max_truncation() {
    let schema = single_column_schema(PhysicalType::ByteArray, Repetition::Required);
    let rows = vec![
        row(RowValue::ByteArray(b"aaaaaaaaaa".to_vec())),
        row(RowValue::ByteArray(b"zzzzzzzzzz".to_vec())),
    ];
    let options = WriteOptions {
        column_index_size_limit: 4,
        ..Default::default()
    };
    let data = write_file(schema, options, &rows).unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let indexes = read_columns_indexes(&mut reader, metadata.row_groups[0].columns()).unwrap();
    let index = indexes[0].as_ref().unwrap();

    // the min keeps a prefix; the max is truncated then incremented so it
    // stays at or above the actual maximum
    assert_eq!(index.min_values[0], b"aaaa".to_vec());
    assert_eq!(index.max_values[0], b"zzz{".to_vec());
}

#[test]
fn offset_index_matches_pages() {
    let data = write_ints(0..2000, paged_options());
    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let chunk = &metadata.row_groups[0].columns()[0];

    let locations = read_pages_locations(&mut reader, metadata.row_groups[0].columns()).unwrap();
    let locations = locations[0].as_ref().unwrap();

    // page regions are contiguous and live inside the chunk byte range
    let (start, length) = chunk.byte_range();
    let mut expected_offset = start as i64;
    for location in locations {
        assert_eq!(location.offset, expected_offset);
        expected_offset += location.compressed_page_size as i64;
    }
    assert!(expected_offset <= (start + length) as i64);

    // first_row_index is cumulative within the row group
    let mut last = -1i64;
    for location in locations {
        assert!(location.first_row_index > last);
        last = location.first_row_index;
    }
}

#[test]
fn sorting_columns_are_recorded() {
    let schema = single_column_schema(PhysicalType::Int64, Repetition::Required);
    let rows = (0..10).map(|i| row(RowValue::from(i as i64))).collect::<Vec<_>>();
    let options = WriteOptions {
        sorting_columns: vec![parquet_engine::write::SortingColumn {
            path: ColumnPath::from("c"),
            descending: false,
            nulls_first: true,
        }],
        ..Default::default()
    };
    let data = write_file(schema, options, &rows).unwrap();

    // round-trips through the footer untouched
    let metadata = read_metadata(&mut Cursor::new(&data)).unwrap();
    assert_eq!(metadata.row_groups.len(), 1);
}
