use parquet_format_safe::{ColumnChunk, ColumnMetaData, Encoding, Statistics};

use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::schema::types::PhysicalType;

use super::column_descriptor::ColumnDescriptor;

/// Metadata for a column chunk, together with the [`ColumnDescriptor`] of
/// its leaf so that readers have access to levels and the physical type.
#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    column_chunk: ColumnChunk,
    column_descr: ColumnDescriptor,
}

impl ColumnChunkMetaData {
    /// File where the column chunk is stored, relative to the current
    /// file; `None` means the same file as the metadata.
    pub fn file_path(&self) -> &Option<String> {
        &self.column_chunk.file_path
    }

    fn column_metadata(&self) -> &ColumnMetaData {
        self.column_chunk.meta_data.as_ref().unwrap()
    }

    /// Descriptor of this column.
    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.column_descr
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.column_descr.physical_type()
    }

    /// Total number of values in this column chunk, nulls included.
    pub fn num_values(&self) -> i64 {
        self.column_metadata().num_values
    }

    pub fn compression(&self) -> Compression {
        self.column_metadata().codec.try_into().unwrap()
    }

    pub fn compressed_size(&self) -> i64 {
        self.column_metadata().total_compressed_size
    }

    pub fn uncompressed_size(&self) -> i64 {
        self.column_metadata().total_uncompressed_size
    }

    pub fn data_page_offset(&self) -> i64 {
        self.column_metadata().data_page_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.column_metadata().dictionary_page_offset
    }

    pub fn bloom_filter_offset(&self) -> Option<i64> {
        self.column_metadata().bloom_filter_offset
    }

    pub fn column_index_offset(&self) -> Option<i64> {
        self.column_chunk.column_index_offset
    }

    pub fn column_index_length(&self) -> Option<i32> {
        self.column_chunk.column_index_length
    }

    pub fn offset_index_offset(&self) -> Option<i64> {
        self.column_chunk.offset_index_offset
    }

    pub fn offset_index_length(&self) -> Option<i32> {
        self.column_chunk.offset_index_length
    }

    pub fn encodings(&self) -> &[Encoding] {
        &self.column_metadata().encodings
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.column_metadata().statistics.as_ref()
    }

    /// The offset and length in bytes of the whole chunk, dictionary page
    /// included.
    pub fn byte_range(&self) -> (u64, u64) {
        let start = match self.dictionary_page_offset() {
            Some(offset) if offset > 0 => offset,
            _ => self.data_page_offset(),
        };
        (start as u64, self.compressed_size() as u64)
    }

    pub(crate) fn try_from_thrift(
        column_descr: ColumnDescriptor,
        column_chunk: ColumnChunk,
    ) -> Result<Self> {
        match &column_chunk.meta_data {
            None => {
                return Err(Error::corrupt(format!(
                    "column chunk of {} has no metadata",
                    column_descr.path_in_schema
                )))
            }
            Some(metadata) => {
                // surface an unknown codec here rather than at page read
                let _: Compression = metadata.codec.try_into()?;
            }
        }
        Ok(Self {
            column_chunk,
            column_descr,
        })
    }

    pub(crate) fn column_chunk(&self) -> &ColumnChunk {
        &self.column_chunk
    }
}
