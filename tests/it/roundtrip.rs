//! Write-then-read equality across physical types, encodings, page
//! versions and codecs.

use std::io::Cursor;

use parquet_engine::compression::Compression;
use parquet_engine::encoding::Encoding;
use parquet_engine::error::Result;
use parquet_engine::metadata::ColumnPath;
use parquet_engine::page::Page;
use parquet_engine::read::{get_page_iterator, read_metadata, BasicDecompressor};
use parquet_engine::schema::types::{PhysicalType, Repetition};
use parquet_engine::shred::RowValue;
use parquet_engine::write::{Version, WriteOptions};
use parquet_engine::FallibleStreamingIterator;

use super::{read_all_rows, row, single_column_schema, write_file};

fn round_trip_with(values: Vec<RowValue>, physical_type: PhysicalType, options: WriteOptions) {
    let schema = single_column_schema(physical_type, Repetition::Required);
    let rows = values.into_iter().map(row).collect::<Vec<_>>();
    let data = write_file(schema, options, &rows).unwrap();
    assert_eq!(read_all_rows(&data).unwrap(), rows);
}

fn round_trip(values: Vec<RowValue>, physical_type: PhysicalType) {
    for version in [Version::V1, Version::V2] {
        round_trip_with(
            values.clone(),
            physical_type,
            WriteOptions {
                version,
                ..Default::default()
            },
        );
    }
}

#[test]
fn booleans() {
    let values = (0..300).map(|i| RowValue::from(i % 3 == 0)).collect();
    round_trip(values, PhysicalType::Boolean);
}

#[test]
fn int32() {
    let values = (0..1000).map(|i| RowValue::from(i * 7 - 500)).collect();
    round_trip(values, PhysicalType::Int32);
}

#[test]
fn int64() {
    let values = (0..1000)
        .map(|i| RowValue::from((i * 7 - 500) as i64 * i64::from(i32::MAX)))
        .collect();
    round_trip(values, PhysicalType::Int64);
}

#[test]
fn int96() {
    let values = (0u32..100)
        .map(|i| RowValue::Int96([i, i.wrapping_mul(31), i.wrapping_mul(17)]))
        .collect();
    round_trip(values, PhysicalType::Int96);
}

#[test]
fn floats_bitwise() {
    let values = vec![
        RowValue::from(0.0f32),
        RowValue::from(-0.0f32),
        RowValue::from(1.5f32),
        RowValue::from(f32::MIN_POSITIVE),
        RowValue::from(f32::INFINITY),
    ];
    round_trip(values, PhysicalType::Float);

    let values = vec![
        RowValue::from(0.0f64),
        RowValue::from(-1.5e300f64),
        RowValue::from(f64::NEG_INFINITY),
    ];
    round_trip(values, PhysicalType::Double);
}

#[test]
fn byte_arrays() {
    let values = (0..500)
        .map(|i| RowValue::ByteArray(format!("value-{}", i % 37).into_bytes()))
        .collect();
    round_trip(values, PhysicalType::ByteArray);
}

#[test]
fn empty_byte_arrays() {
    let values = vec![
        RowValue::ByteArray(vec![]),
        RowValue::ByteArray(b"x".to_vec()),
        RowValue::ByteArray(vec![]),
    ];
    round_trip(values, PhysicalType::ByteArray);
}

#[test]
fn fixed_len_byte_arrays() {
    let values = (0u8..100)
        .map(|i| RowValue::FixedLenByteArray(vec![i, i.wrapping_add(1), i.wrapping_add(2)]))
        .collect();
    round_trip(values, PhysicalType::FixedLenByteArray(3));
}

fn encoded_options(encoding: Encoding, version: Version) -> WriteOptions {
    WriteOptions {
        version,
        column_encoding: vec![(ColumnPath::from("c"), encoding)],
        ..Default::default()
    }
}

#[test]
fn dictionary_encoded_strings() {
    let values = (0..2000)
        .map(|i| RowValue::ByteArray(format!("tag-{}", i % 11).into_bytes()))
        .collect::<Vec<_>>();
    for version in [Version::V1, Version::V2] {
        round_trip_with(
            values.clone(),
            PhysicalType::ByteArray,
            encoded_options(Encoding::RleDictionary, version),
        );
    }
}

#[test]
fn dictionary_encoded_numbers() {
    let values = (0..2000).map(|i| RowValue::from(i % 5)).collect::<Vec<_>>();
    round_trip_with(
        values,
        PhysicalType::Int32,
        encoded_options(Encoding::RleDictionary, Version::V2),
    );
}

#[test]
fn delta_length_byte_array() {
    let values = (0..300)
        .map(|i| RowValue::ByteArray(format!("{:08}", i).into_bytes()))
        .collect();
    round_trip_with(
        values,
        PhysicalType::ByteArray,
        encoded_options(Encoding::DeltaLengthByteArray, Version::V2),
    );
}

#[test]
fn delta_byte_array() {
    let values = (0..300)
        .map(|i| RowValue::ByteArray(format!("shared-prefix-{:08}", i).into_bytes()))
        .collect();
    round_trip_with(
        values,
        PhysicalType::ByteArray,
        encoded_options(Encoding::DeltaByteArray, Version::V1),
    );
}

#[test]
fn byte_stream_split_doubles() {
    let values = (0..300)
        .map(|i| RowValue::from(i as f64 * 0.25 - 17.0))
        .collect();
    round_trip_with(
        values,
        PhysicalType::Double,
        encoded_options(Encoding::ByteStreamSplit, Version::V2),
    );
}

#[test]
fn rle_booleans() {
    let mut values = vec![RowValue::from(true); 100];
    values.extend(std::iter::repeat(RowValue::from(false)).take(100));
    round_trip_with(
        values,
        PhysicalType::Boolean,
        encoded_options(Encoding::Rle, Version::V1),
    );
}

fn compression_options(compression: Compression) -> WriteOptions {
    WriteOptions {
        compression,
        ..Default::default()
    }
}

fn compressed_round_trip(compression: Compression) {
    let values = (0..5000)
        .map(|i| RowValue::from((i % 100) as i64))
        .collect::<Vec<_>>();
    for version in [Version::V1, Version::V2] {
        round_trip_with(
            values.clone(),
            PhysicalType::Int64,
            WriteOptions {
                version,
                ..compression_options(compression)
            },
        );
    }
}

#[cfg(feature = "snappy")]
#[test]
fn snappy_compressed() {
    compressed_round_trip(Compression::Snappy);
}

#[cfg(feature = "gzip")]
#[test]
fn gzip_compressed() {
    compressed_round_trip(Compression::Gzip);
}

#[cfg(feature = "zstd")]
#[test]
fn zstd_compressed() {
    compressed_round_trip(Compression::Zstd);
}

#[cfg(feature = "brotli")]
#[test]
fn brotli_compressed() {
    compressed_round_trip(Compression::Brotli);
}

#[cfg(feature = "lz4")]
#[test]
fn lz4_raw_compressed() {
    compressed_round_trip(Compression::Lz4Raw);
}

#[cfg(feature = "snappy")]
#[test]
fn streaming_decompression_of_pages() -> Result<()> {
    let schema = single_column_schema(PhysicalType::Int64, Repetition::Required);
    let rows = (0..10_000)
        .map(|i| row(RowValue::from(i as i64)))
        .collect::<Vec<_>>();
    let data = write_file(
        schema,
        WriteOptions {
            page_buffer_size: 8 * 1024,
            ..compression_options(Compression::Snappy)
        },
        &rows,
    )?;

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader)?;
    let chunk = &metadata.row_groups[0].columns()[0];
    let pages = get_page_iterator(chunk, &mut reader)?;

    let mut decompressor = BasicDecompressor::new(pages, vec![]);
    let mut num_values = 0;
    while let Some(page) = decompressor.next()? {
        if let Page::Data(page) = page {
            num_values += page.num_values();
        }
    }
    assert_eq!(num_values, 10_000);
    Ok(())
}

#[test]
fn multiple_row_groups() {
    let schema = single_column_schema(PhysicalType::Int32, Repetition::Required);
    let mut writer = parquet_engine::write::FileWriter::try_new(
        Cursor::new(vec![]),
        schema,
        WriteOptions::default(),
    )
    .unwrap();

    let mut expected = vec![];
    for group in 0..3 {
        for i in 0..100 {
            let value = RowValue::from(group * 1000 + i);
            writer.write_row(&row(value.clone())).unwrap();
            expected.push(row(value));
        }
        writer.flush_row_group().unwrap();
    }
    let (_, cursor) = writer.end().unwrap();
    let data = cursor.into_inner();

    let metadata = read_metadata(&mut Cursor::new(&data)).unwrap();
    assert_eq!(metadata.row_groups.len(), 3);
    assert_eq!(metadata.num_rows, 300);
    assert_eq!(read_all_rows(&data).unwrap(), expected);
}
