mod bloom;
mod indexes;
mod roundtrip;
mod rows;
mod scenarios;

use parquet_engine::error::Result;
use parquet_engine::metadata::SchemaDescriptor;
use parquet_engine::read::{read_metadata, RowGroupReader};
use parquet_engine::schema::types::{ParquetType, PhysicalType, Repetition};
use parquet_engine::shred::RowValue;
use parquet_engine::write::{FileWriter, WriteOptions};

use std::io::Cursor;

/// A single-leaf schema `message schema { <repetition> <physical> c; }`.
pub fn single_column_schema(
    physical_type: PhysicalType,
    repetition: Repetition,
) -> SchemaDescriptor {
    SchemaDescriptor::try_new(
        "schema".to_string(),
        vec![ParquetType::try_from_primitive(
            "c".to_string(),
            physical_type,
            repetition,
            None,
            None,
            None,
        )
        .unwrap()],
    )
    .unwrap()
}

/// Writes `rows` into an in-memory file with one row group.
pub fn write_file(
    schema: SchemaDescriptor,
    options: WriteOptions,
    rows: &[RowValue],
) -> Result<Vec<u8>> {
    let mut writer = FileWriter::try_new(Cursor::new(vec![]), schema, options)?;
    for row in rows {
        writer.write_row(row)?;
    }
    let (_, cursor) = writer.end()?;
    Ok(cursor.into_inner())
}

/// Reads every row of every row group back.
pub fn read_all_rows(data: &[u8]) -> Result<Vec<RowValue>> {
    let mut reader = Cursor::new(data);
    let metadata = read_metadata(&mut reader)?;
    let mut rows = vec![];
    for row_group in 0..metadata.row_groups.len() {
        let mut group_reader = RowGroupReader::try_new(&mut reader, &metadata, row_group)?;
        while let Some(row) = group_reader.read_row()? {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// `{ "c": value }` rows for single-column schemas.
pub fn row(value: RowValue) -> RowValue {
    RowValue::group([("c".to_string(), value)])
}
