//! The read side: page readers over row groups, typed page decoding, and
//! the R/D-driven row assembler.
mod column;
mod compression;
mod decode;
mod indexes;
mod metadata;
mod page;
mod row;

use std::io::{Read, Seek, SeekFrom};

pub use column::ColumnChunkReader;
pub use compression::{decompress, BasicDecompressor};
pub use decode::{decode_data_page, decode_dict_page};
pub use indexes::{read_columns_indexes, read_pages_locations};
pub use metadata::{deserialize_metadata, read_metadata};
pub use page::PageReader;
pub use row::RowGroupReader;

use crate::error::Result;
use crate::metadata::{ColumnChunkMetaData, FileMetaData, RowGroupMetaData};
use crate::DEFAULT_MAX_PAGE_HEADER_SIZE;

/// Filters row group metadata to only those row groups for which the
/// predicate returns true.
pub fn filter_row_groups(
    metadata: &FileMetaData,
    predicate: &dyn Fn(&RowGroupMetaData, usize) -> bool,
) -> FileMetaData {
    let row_groups = metadata
        .row_groups
        .iter()
        .enumerate()
        .filter(|(index, row_group)| predicate(row_group, *index))
        .map(|(_, row_group)| row_group.clone())
        .collect();
    let mut metadata = metadata.clone();
    metadata.row_groups = row_groups;
    metadata
}

/// Returns a new [`PageReader`] by seeking `reader` to the beginning of
/// `column_chunk`.
pub fn get_page_iterator<R: Read + Seek>(
    column_chunk: &ColumnChunkMetaData,
    mut reader: R,
) -> Result<PageReader<R>> {
    let (start, _) = column_chunk.byte_range();
    reader.seek(SeekFrom::Start(start))?;
    Ok(PageReader::new(
        reader,
        column_chunk,
        DEFAULT_MAX_PAGE_HEADER_SIZE,
    ))
}
