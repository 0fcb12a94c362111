use std::io::{Read, Seek, SeekFrom};

use parquet_format_safe::thrift::protocol::TCompactInputProtocol;
use parquet_format_safe::{ColumnIndex, OffsetIndex, PageLocation};

use crate::error::Result;
use crate::metadata::ColumnChunkMetaData;

fn read_at<R: Read + Seek>(reader: &mut R, offset: i64, length: i32) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset as u64))?;
    let mut data = vec![0; length as usize];
    reader.read_exact(&mut data)?;
    Ok(data)
}

/// Reads the [`ColumnIndex`] of every column chunk; `None` for chunks
/// without one.
pub fn read_columns_indexes<R: Read + Seek>(
    reader: &mut R,
    chunks: &[ColumnChunkMetaData],
) -> Result<Vec<Option<ColumnIndex>>> {
    chunks
        .iter()
        .map(|chunk| {
            let (offset, length) = match (chunk.column_index_offset(), chunk.column_index_length())
            {
                (Some(offset), Some(length)) => (offset, length),
                _ => return Ok(None),
            };
            let data = read_at(reader, offset, length)?;
            let mut protocol = TCompactInputProtocol::new(data.as_slice(), data.len() * 2 + 1024);
            Ok(Some(ColumnIndex::read_from_in_protocol(&mut protocol)?))
        })
        .collect()
}

/// Reads the [`OffsetIndex`] page locations of every column chunk; `None`
/// for chunks without one.
pub fn read_pages_locations<R: Read + Seek>(
    reader: &mut R,
    chunks: &[ColumnChunkMetaData],
) -> Result<Vec<Option<Vec<PageLocation>>>> {
    chunks
        .iter()
        .map(|chunk| {
            let (offset, length) = match (chunk.offset_index_offset(), chunk.offset_index_length())
            {
                (Some(offset), Some(length)) => (offset, length),
                _ => return Ok(None),
            };
            let data = read_at(reader, offset, length)?;
            let mut protocol = TCompactInputProtocol::new(data.as_slice(), data.len() * 2 + 1024);
            let index = OffsetIndex::read_from_in_protocol(&mut protocol)?;
            Ok(Some(index.page_locations))
        })
        .collect()
}
