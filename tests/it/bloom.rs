//! Bloom filters over written files.

use std::io::Cursor;

use parquet_engine::bloom_filter::{self, BloomFilter};
use parquet_engine::metadata::ColumnPath;
use parquet_engine::read::read_metadata;
use parquet_engine::schema::types::{PhysicalType, Repetition};
use parquet_engine::shred::RowValue;
use parquet_engine::write::{BloomFilterOptions, WriteOptions};

use super::{row, single_column_schema, write_file};

fn bloom_options(bits_per_value: usize) -> WriteOptions {
    WriteOptions {
        bloom_filters: vec![BloomFilterOptions {
            path: ColumnPath::from("c"),
            bits_per_value,
        }],
        ..Default::default()
    }
}

#[test]
fn every_written_string_probes_positive() {
    let schema = single_column_schema(PhysicalType::ByteArray, Repetition::Required);
    let values = (0..1000)
        .map(|i| format!("value-{}", i).into_bytes())
        .collect::<Vec<_>>();
    let rows = values
        .iter()
        .map(|v| row(RowValue::ByteArray(v.clone())))
        .collect::<Vec<_>>();
    let data = write_file(schema, bloom_options(16), &rows).unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let chunk = &metadata.row_groups[0].columns()[0];

    let mut bitset = vec![];
    bloom_filter::read(chunk, &mut reader, &mut bitset).unwrap();
    let filter = BloomFilter::from_bitset(bitset).unwrap();

    for value in &values {
        assert!(filter.check(bloom_filter::hash_bytes(value)));
    }
}

#[test]
fn columns_without_filters_read_back_empty() {
    let schema = single_column_schema(PhysicalType::Int32, Repetition::Required);
    let rows = vec![row(RowValue::from(1i32))];
    let data = write_file(schema, WriteOptions::default(), &rows).unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let chunk = &metadata.row_groups[0].columns()[0];
    assert!(chunk.bloom_filter_offset().is_none());

    let mut bitset = vec![0xFF; 32];
    bloom_filter::read(chunk, &mut reader, &mut bitset).unwrap();
    assert!(bitset.is_empty());
}

#[test]
fn filters_are_per_row_group() {
    let schema = single_column_schema(PhysicalType::Int64, Repetition::Required);
    let mut writer = parquet_engine::write::FileWriter::try_new(
        Cursor::new(vec![]),
        schema,
        bloom_options(16),
    )
    .unwrap();

    for i in 0..100i64 {
        writer.write_row(&row(RowValue::from(i))).unwrap();
    }
    writer.flush_row_group().unwrap();
    for i in 1000..1100i64 {
        writer.write_row(&row(RowValue::from(i))).unwrap();
    }
    let (_, cursor) = writer.end().unwrap();
    let data = cursor.into_inner();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    assert_eq!(metadata.row_groups.len(), 2);

    let mut bitset = vec![];
    bloom_filter::read(
        &metadata.row_groups[1].columns()[0],
        &mut reader,
        &mut bitset,
    )
    .unwrap();
    let filter = BloomFilter::from_bitset(bitset).unwrap();
    for i in 1000..1100i64 {
        assert!(filter.check(bloom_filter::hash_native(i)));
    }
}
