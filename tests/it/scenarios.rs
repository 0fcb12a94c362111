//! End-to-end scenarios over complete files.

use std::io::Cursor;

use parquet_engine::bloom_filter::{self, BloomFilter};
use parquet_engine::error::Error;
use parquet_engine::metadata::{ColumnPath, SchemaDescriptor};
use parquet_engine::page::{CompressedPage, DataPageHeader};
use parquet_engine::read::{
    get_page_iterator, read_columns_indexes, read_metadata, read_pages_locations,
    ColumnChunkReader,
};
use parquet_engine::schema::types::{
    GroupLogicalType, ParquetType, PhysicalType, Repetition,
};
use parquet_engine::shred::RowValue;
use parquet_engine::write::{BloomFilterOptions, FileWriter, WriteOptions};

use parquet_format_safe::BoundaryOrder;

use super::{read_all_rows, single_column_schema, write_file};

fn named_schema(name: &str, physical_type: PhysicalType) -> SchemaDescriptor {
    SchemaDescriptor::try_new(
        "schema".to_string(),
        vec![ParquetType::from_physical(name.to_string(), physical_type)],
    )
    .unwrap()
}

#[test]
fn three_int32_rows() {
    // write three rows {u: 1}, {u: 2}, {u: 3}, 64KiB pages, no compression
    let schema = named_schema("u", PhysicalType::Int32);
    let options = WriteOptions {
        page_buffer_size: 64 * 1024,
        ..Default::default()
    };
    let rows = [1i32, 2, 3]
        .map(|u| RowValue::group([("u".to_string(), RowValue::from(u))]));
    let data = write_file(schema, options, &rows).unwrap();

    // trailing magic and a non-empty footer
    assert_eq!(&data[data.len() - 4..], b"PAR1");
    assert_eq!(&data[..4], b"PAR1");
    let footer_len =
        u32::from_le_bytes(data[data.len() - 8..data.len() - 4].try_into().unwrap());
    assert!(footer_len > 0);

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    assert_eq!(metadata.row_groups.len(), 1);
    assert_eq!(metadata.num_rows, 3);
    let chunk = &metadata.row_groups[0].columns()[0];
    assert_eq!(chunk.num_values(), 3);

    // a single v2 data page
    let pages = get_page_iterator(chunk, &mut reader)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(pages.len(), 1);
    match &pages[0] {
        CompressedPage::Data(page) => {
            assert!(matches!(page.header(), DataPageHeader::V2(_)));
            assert_eq!(page.num_values(), 3);
        }
        CompressedPage::Dict(_) => panic!("no dictionary page was configured"),
    }

    // the column index carries the bounds and their order
    let indexes = read_columns_indexes(&mut reader, metadata.row_groups[0].columns()).unwrap();
    let index = indexes[0].as_ref().unwrap();
    assert_eq!(index.min_values[0], 1i32.to_le_bytes().to_vec());
    assert_eq!(index.max_values[0], 3i32.to_le_bytes().to_vec());
    assert_eq!(index.boundary_order, BoundaryOrder::ASCENDING);

    assert_eq!(read_all_rows(&data).unwrap().to_vec(), rows.to_vec());
}

#[test]
fn optional_strings_statistics_and_levels() {
    // {s: "a"}, {s: null}, {s: "c"} with statistics on
    let schema = SchemaDescriptor::try_new(
        "schema".to_string(),
        vec![ParquetType::try_from_primitive(
            "s".to_string(),
            PhysicalType::ByteArray,
            Repetition::Optional,
            None,
            None,
            None,
        )
        .unwrap()],
    )
    .unwrap();
    let options = WriteOptions {
        data_page_statistics: true,
        ..Default::default()
    };
    let rows = vec![
        RowValue::group([("s".to_string(), RowValue::from("a"))]),
        RowValue::group([("s".to_string(), RowValue::Null)]),
        RowValue::group([("s".to_string(), RowValue::from("c"))]),
    ];
    let data = write_file(schema, options, &rows).unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let chunk = &metadata.row_groups[0].columns()[0];

    let statistics = chunk.statistics().unwrap();
    assert_eq!(statistics.null_count, Some(1));
    assert_eq!(statistics.min_value, Some(b"a".to_vec()));
    assert_eq!(statistics.max_value, Some(b"c".to_vec()));

    let mut column = ColumnChunkReader::try_new(&mut reader, chunk, None).unwrap();
    let mut defs = vec![];
    while let Some(value) = column.next_value().unwrap() {
        defs.push(value.def_level());
    }
    assert_eq!(defs, vec![1, 0, 1]);
}

#[test]
fn delta_encoded_pages_and_offset_index() {
    // 10,000 rows 0..9999 at 4KiB pages
    let schema = named_schema("k", PhysicalType::Int64);
    let options = WriteOptions {
        page_buffer_size: 4 * 1024,
        column_encoding: vec![(
            ColumnPath::from("k"),
            parquet_engine::encoding::Encoding::DeltaBinaryPacked,
        )],
        ..Default::default()
    };
    let rows = (0i64..10_000)
        .map(|k| RowValue::group([("k".to_string(), RowValue::from(k))]))
        .collect::<Vec<_>>();
    let data = write_file(schema, options, &rows).unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let chunk = &metadata.row_groups[0].columns()[0];

    let locations = read_pages_locations(&mut reader, metadata.row_groups[0].columns()).unwrap();
    let locations = locations[0].as_ref().unwrap();
    assert!(locations.len() > 1);
    assert_eq!(locations[0].first_row_index, 0);
    assert!(locations
        .windows(2)
        .all(|pair| pair[0].first_row_index < pair[1].first_row_index));

    let num_values: usize = get_page_iterator(chunk, &mut reader)
        .unwrap()
        .map(|page| match page.unwrap() {
            CompressedPage::Data(page) => page.num_values(),
            CompressedPage::Dict(_) => 0,
        })
        .sum();
    assert_eq!(num_values, 10_000);

    assert_eq!(read_all_rows(&data).unwrap(), rows);
}

#[test]
fn bloom_filter_round_trip() {
    let schema = named_schema("k", PhysicalType::Int64);
    let options = WriteOptions {
        bloom_filters: vec![BloomFilterOptions {
            path: ColumnPath::from("k"),
            bits_per_value: 16,
        }],
        ..Default::default()
    };
    let rows = [42i64, 100, 7]
        .map(|k| RowValue::group([("k".to_string(), RowValue::from(k))]));
    let data = write_file(schema, options, &rows).unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let chunk = &metadata.row_groups[0].columns()[0];
    assert!(chunk.bloom_filter_offset().is_some());

    let mut bitset = vec![];
    bloom_filter::read(chunk, &mut reader, &mut bitset).unwrap();
    let filter = BloomFilter::from_bitset(bitset).unwrap();

    for k in [42i64, 100, 7] {
        assert!(filter.check(bloom_filter::hash_native(k)));
    }
    // an absent value may or may not probe positive; it must not panic
    let _ = filter.check(bloom_filter::hash_native(99_999i64));
}

#[test]
fn repeated_strings_levels_and_reassembly() {
    // tags: list<string> with rows [["a","b"], [], ["c"]]
    let element = ParquetType::try_from_primitive(
        "element".to_string(),
        PhysicalType::ByteArray,
        Repetition::Repeated,
        None,
        None,
        None,
    )
    .unwrap();
    let tags = ParquetType::from_group(
        "tags".to_string(),
        Repetition::Optional,
        None,
        Some(GroupLogicalType::List),
        vec![element],
        None,
    );
    let schema = SchemaDescriptor::try_new("schema".to_string(), vec![tags]).unwrap();
    assert_eq!(schema.column(0).max_rep_level(), 1);
    assert_eq!(schema.column(0).max_def_level(), 2);

    let make_row = |values: &[&str]| {
        RowValue::group([(
            "tags".to_string(),
            RowValue::group([(
                "element".to_string(),
                RowValue::List(values.iter().map(|v| RowValue::from(*v)).collect()),
            )]),
        )])
    };
    let rows = vec![make_row(&["a", "b"]), make_row(&[]), make_row(&["c"])];
    let data = write_file(schema, WriteOptions::default(), &rows).unwrap();

    let mut reader = Cursor::new(&data);
    let metadata = read_metadata(&mut reader).unwrap();
    let mut column =
        ColumnChunkReader::try_new(&mut reader, &metadata.row_groups[0].columns()[0], None)
            .unwrap();
    let mut levels = vec![];
    while let Some(value) = column.next_value().unwrap() {
        levels.push((value.rep_level(), value.def_level()));
    }
    assert_eq!(levels, vec![(0, 2), (1, 2), (0, 1), (0, 2)]);

    let read = read_all_rows(&data).unwrap();
    assert_eq!(read, rows);
}

#[test]
fn corrupt_page_is_detected_and_isolated() {
    let schema = SchemaDescriptor::try_new(
        "schema".to_string(),
        vec![
            ParquetType::from_physical("a".to_string(), PhysicalType::Int32),
            ParquetType::from_physical("b".to_string(), PhysicalType::Int32),
        ],
    )
    .unwrap();
    let rows = (0i32..100)
        .map(|i| {
            RowValue::group([
                ("a".to_string(), RowValue::from(i)),
                ("b".to_string(), RowValue::from(-i)),
            ])
        })
        .collect::<Vec<_>>();
    let mut data = write_file(schema, WriteOptions::default(), &rows).unwrap();

    let metadata = read_metadata(&mut Cursor::new(&data)).unwrap();
    let (start, length) = metadata.row_groups[0].columns()[0].byte_range();
    // the last byte of the chunk belongs to a page body covered by its crc
    data[(start + length - 1) as usize] ^= 0xFF;

    let mut reader = Cursor::new(&data);
    let error = ColumnChunkReader::try_new(&mut reader, &metadata.row_groups[0].columns()[0], None)
        .unwrap_err();
    match error {
        Error::Corrupt(message) => {
            assert!(message.contains("a"), "message must name the column: {}", message);
            assert!(message.contains("crc"), "message must name the cause: {}", message);
        }
        other => panic!("expected a corrupt error, got {:?}", other),
    }

    // the sibling column remains readable
    let mut column =
        ColumnChunkReader::try_new(&mut reader, &metadata.row_groups[0].columns()[1], None)
            .unwrap();
    let mut read = vec![];
    while let Some(value) = column.next_value().unwrap() {
        read.push(value.int32().unwrap());
    }
    assert_eq!(read, (0i32..100).map(|i| -i).collect::<Vec<_>>());
}

#[test]
fn writer_is_poisoned_after_an_io_error() {
    // a sink that fails after the first bytes were committed
    struct FailingWriter {
        written: usize,
        limit: usize,
    }
    impl std::io::Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "sink full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let schema = single_column_schema(PhysicalType::Int32, Repetition::Required);
    let sink = FailingWriter {
        written: 0,
        limit: 16,
    };
    let mut writer = FileWriter::try_new(sink, schema, WriteOptions::default()).unwrap();
    for i in 0..100 {
        writer.write_row(&super::row(RowValue::from(i))).unwrap();
    }
    let first = writer.flush_row_group().unwrap_err();
    assert!(matches!(first, Error::Transport(_)));

    // subsequent calls replay the same error
    let second = writer
        .write_row(&super::row(RowValue::from(0i32)))
        .unwrap_err();
    assert_eq!(first, second);
}
