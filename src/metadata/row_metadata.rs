use parquet_format_safe::RowGroup;

use crate::error::{Error, Result};

use super::column_chunk_metadata::ColumnChunkMetaData;
use super::schema_descriptor::SchemaDescriptor;

/// Metadata for a row group.
#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    columns: Vec<ColumnChunkMetaData>,
    num_rows: usize,
    total_byte_size: usize,
}

impl RowGroupMetaData {
    /// The column chunks of this row group, one per leaf column.
    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    /// Number of rows in this row group.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Total size of all the uncompressed column data.
    pub fn total_byte_size(&self) -> usize {
        self.total_byte_size
    }

    /// Total size of the compressed column data.
    pub fn compressed_size(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.compressed_size() as usize)
            .sum()
    }

    pub(crate) fn try_from_thrift(
        schema_descr: &SchemaDescriptor,
        rg: RowGroup,
    ) -> Result<Self> {
        if schema_descr.num_columns() != rg.columns.len() {
            return Err(Error::corrupt(format!(
                "a row group has {} column chunks but the schema has {} leaves",
                rg.columns.len(),
                schema_descr.num_columns()
            )));
        }
        let total_byte_size = rg.total_byte_size.try_into()?;
        let num_rows = rg.num_rows.try_into()?;
        let columns = rg
            .columns
            .into_iter()
            .zip(schema_descr.columns().iter())
            .map(|(column_chunk, descriptor)| {
                ColumnChunkMetaData::try_from_thrift(descriptor.clone(), column_chunk)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns,
            num_rows,
            total_byte_size,
        })
    }
}
