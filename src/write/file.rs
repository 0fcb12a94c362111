use std::io::{BufWriter, Write};

use parquet_format_safe::thrift::protocol::TCompactOutputProtocol;
use parquet_format_safe::{
    ColumnIndex, ColumnOrder, FileMetaData as TFileMetaData, KeyValue, OffsetIndex, RowGroup,
    SortingColumn as TSortingColumn, TypeDefinedOrder,
};

use crate::bloom_filter;
use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::metadata::SchemaDescriptor;
use crate::schema::types::PhysicalType;
use crate::shred::{RowValue, Shredder};
use crate::value::Value;
use crate::{FOOTER_SIZE, PARQUET_MAGIC};

use super::buffer_pool::PageBufferPool;
use super::column::ColumnWriter;
use super::indexes::{write_column_index, write_offset_index};
use super::WriteOptions;

/// The sink in front of the underlying writer; a non-zero
/// `write_buffer_size` inserts a [`BufWriter`].
enum Sink<W: Write> {
    Direct(W),
    Buffered(BufWriter<W>),
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Direct(writer) => writer.write(buf),
            Sink::Buffered(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Direct(writer) => writer.flush(),
            Sink::Buffered(writer) => writer.flush(),
        }
    }
}

impl<W: Write> Sink<W> {
    fn into_inner(self) -> Result<W> {
        match self {
            Sink::Direct(writer) => Ok(writer),
            Sink::Buffered(writer) => writer
                .into_inner()
                .map_err(|e| Error::Transport(e.to_string())),
        }
    }
}

pub(super) fn start_file<W: Write>(writer: &mut W) -> Result<u64> {
    writer.write_all(&PARQUET_MAGIC)?;
    Ok(PARQUET_MAGIC.len() as u64)
}

pub(super) fn end_file<W: Write>(mut writer: &mut W, metadata: TFileMetaData) -> Result<u64> {
    let mut protocol = TCompactOutputProtocol::new(&mut writer);
    let metadata_len = metadata.write_to_out_protocol(&mut protocol)? as i32;

    writer.write_all(&metadata_len.to_le_bytes())?;
    writer.write_all(&PARQUET_MAGIC)?;
    Ok(metadata_len as u64 + FOOTER_SIZE)
}

fn check_encoding(encoding: Encoding, physical_type: PhysicalType) -> Result<()> {
    use PhysicalType::*;
    let supported = match encoding {
        Encoding::Plain | Encoding::RleDictionary => true,
        Encoding::Rle => physical_type == Boolean,
        Encoding::DeltaBinaryPacked => matches!(physical_type, Int32 | Int64),
        Encoding::DeltaLengthByteArray | Encoding::DeltaByteArray => physical_type == ByteArray,
        Encoding::ByteStreamSplit => matches!(physical_type, Float | Double),
        Encoding::PlainDictionary | Encoding::BitPacked => false,
    };
    if supported {
        Ok(())
    } else {
        Err(Error::EncodingNotSupported(format!(
            "{:?} cannot encode a {:?} column",
            encoding, physical_type
        )))
    }
}

/// Writes a parquet file: rows (or raw column values) in, row groups out.
///
/// Rows are buffered per column; [`FileWriter::flush_row_group`] closes
/// the current row group, [`FileWriter::end`] writes the page indexes and
/// the footer. An IO error leaves the writer poisoned: every subsequent
/// call returns the same error.
pub struct FileWriter<W: Write> {
    sink: Sink<W>,
    schema: SchemaDescriptor,
    options: WriteOptions,
    columns: Vec<ColumnWriter>,
    sorting_columns: Vec<TSortingColumn>,
    row_groups: Vec<RowGroup>,
    indexes: Vec<Vec<(ColumnIndex, OffsetIndex)>>,
    offset: u64,
    started: bool,
    poisoned: Option<Error>,
    pool: PageBufferPool,
}

impl<W: Write> FileWriter<W> {
    pub fn try_new(writer: W, schema: SchemaDescriptor, options: WriteOptions) -> Result<Self> {
        // resolve every configured path against the schema up front
        let resolve = |path: &crate::metadata::ColumnPath| -> Result<usize> {
            schema
                .leaf_by_path(path)
                .map(|leaf| leaf.leaf_index)
                .ok_or_else(|| {
                    Error::invalid(format!("column {} does not exist in the schema", path))
                })
        };
        for (path, _) in &options.column_compression {
            resolve(path)?;
        }
        for (path, encoding) in &options.column_encoding {
            let leaf = resolve(path)?;
            check_encoding(*encoding, schema.column(leaf).physical_type())?;
        }
        for bloom in &options.bloom_filters {
            resolve(&bloom.path)?;
        }
        let sorting_columns = options
            .sorting_columns
            .iter()
            .map(|sorting| {
                Ok(TSortingColumn {
                    column_idx: resolve(&sorting.path)? as i32,
                    descending: sorting.descending,
                    nulls_first: sorting.nulls_first,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let columns = schema
            .columns()
            .iter()
            .map(|descriptor| {
                let nulls_first = options
                    .sorting_columns
                    .iter()
                    .find(|sorting| &sorting.path == descriptor.path_in_schema())
                    .map(|sorting| sorting.nulls_first)
                    .unwrap_or(false);
                ColumnWriter::new(descriptor.clone(), &options, nulls_first)
            })
            .collect();

        let sink = if options.write_buffer_size == 0 {
            Sink::Direct(writer)
        } else {
            Sink::Buffered(BufWriter::with_capacity(options.write_buffer_size, writer))
        };

        Ok(Self {
            sink,
            schema,
            options,
            columns,
            sorting_columns,
            row_groups: vec![],
            indexes: vec![],
            offset: 0,
            started: false,
            poisoned: None,
            pool: PageBufferPool::new(),
        })
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    fn guard(&self) -> Result<()> {
        match &self.poisoned {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        if !self.started {
            self.offset = start_file(&mut self.sink)?;
            self.started = true;
        }
        Ok(())
    }

    /// Shreds one record and appends its values to every column buffer.
    pub fn write_row(&mut self, row: &RowValue) -> Result<()> {
        self.guard()?;
        let mut shredded: Vec<Vec<Value>> = vec![vec![]; self.columns.len()];
        Shredder::new(&self.schema).shred(row, &mut shredded)?;
        for (column, values) in self.columns.iter_mut().zip(shredded.iter()) {
            column.write_values(values, &mut self.pool)?;
        }
        Ok(())
    }

    /// Appends raw values (with levels) to the leaf `column`.
    pub fn write_values(&mut self, column: usize, values: &[Value]) -> Result<()> {
        self.guard()?;
        let writer = self.columns.get_mut(column).ok_or_else(|| {
            Error::oob(format!(
                "column {} of a schema with {} leaves",
                column,
                self.schema.num_columns()
            ))
        })?;
        writer.write_values(values, &mut self.pool)
    }

    /// Closes the current row group: flushes every column, builds bloom
    /// filters, then streams filters, dictionary pages and data pages.
    pub fn flush_row_group(&mut self) -> Result<()> {
        self.guard()?;
        if !self.columns.iter().any(|column| column.has_data()) {
            return Ok(());
        }

        let rows = self
            .columns
            .iter()
            .map(|column| column.total_rows())
            .collect::<Vec<_>>();
        if rows.windows(2).any(|pair| pair[0] != pair[1]) {
            return Err(Error::SchemaMismatch(format!(
                "columns disagree on the number of rows: {:?}",
                rows
            )));
        }
        let num_rows = rows.first().copied().unwrap_or(0);

        let result = self.flush_row_group_inner(num_rows);
        if let Err(error) = &result {
            // bytes may have been committed; the writer is unusable now
            self.poisoned = Some(error.clone());
        }
        result
    }

    fn flush_row_group_inner(&mut self, num_rows: usize) -> Result<()> {
        self.ensure_started()?;

        for column in self.columns.iter_mut() {
            column.flush(&mut self.pool)?;
        }

        // all bloom filters precede the pages of the row group
        for column in self.columns.iter_mut() {
            if let Some(bitset) = column.take_bloom_bitset() {
                column.set_bloom_filter_offset(self.offset);
                self.offset += bloom_filter::write(&mut self.sink, &bitset)?;
            }
        }

        let mut chunks = Vec::with_capacity(self.columns.len());
        let mut row_group_indexes = Vec::with_capacity(self.columns.len());
        let mut file_offset = None;
        for column in self.columns.iter_mut() {
            let (chunk, written, column_index, offset_index) =
                column.emit(&mut self.sink, self.offset, &mut self.pool)?;
            if file_offset.is_none() {
                let metadata = chunk.meta_data.as_ref().unwrap();
                file_offset = Some(
                    metadata
                        .dictionary_page_offset
                        .unwrap_or(metadata.data_page_offset),
                );
            }
            self.offset += written;
            chunks.push(chunk);
            row_group_indexes.push((column_index, offset_index));
        }

        let total_byte_size = chunks
            .iter()
            .map(|c| c.meta_data.as_ref().unwrap().total_uncompressed_size)
            .sum();
        let total_compressed_size = chunks
            .iter()
            .map(|c| c.meta_data.as_ref().unwrap().total_compressed_size)
            .sum();

        self.row_groups.push(RowGroup {
            columns: chunks,
            total_byte_size,
            num_rows: num_rows as i64,
            sorting_columns: if self.sorting_columns.is_empty() {
                None
            } else {
                Some(self.sorting_columns.clone())
            },
            file_offset,
            total_compressed_size: Some(total_compressed_size),
            ordinal: Some(self.indexes.len() as i16),
        });
        self.indexes.push(row_group_indexes);
        Ok(())
    }

    /// Flushes any pending row group, writes the column and offset
    /// indexes, then the footer. Returns the file size and the writer.
    pub fn end(mut self) -> Result<(u64, W)> {
        self.guard()?;
        self.flush_row_group()?;
        self.ensure_started()?;
        for column in self.columns.iter_mut() {
            column.close();
        }

        // first all column indexes, then all offset indexes
        for (row_group, indexes) in self.row_groups.iter_mut().zip(self.indexes.iter()) {
            for (chunk, (column_index, _)) in row_group.columns.iter_mut().zip(indexes.iter()) {
                let written = write_column_index(&mut self.sink, column_index)?;
                chunk.column_index_offset = Some(self.offset as i64);
                chunk.column_index_length = Some(written as i32);
                self.offset += written;
            }
        }
        for (row_group, indexes) in self.row_groups.iter_mut().zip(self.indexes.iter()) {
            for (chunk, (_, offset_index)) in row_group.columns.iter_mut().zip(indexes.iter()) {
                let written = write_offset_index(&mut self.sink, offset_index)?;
                chunk.offset_index_offset = Some(self.offset as i64);
                chunk.offset_index_length = Some(written as i32);
                self.offset += written;
            }
        }

        let num_rows = self.row_groups.iter().map(|group| group.num_rows).sum();

        let mut key_value_metadata = self
            .options
            .key_value_metadata
            .iter()
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: Some(value.clone()),
            })
            .collect::<Vec<_>>();
        key_value_metadata.sort_by(|a, b| a.key.cmp(&b.key));

        let column_orders = self
            .schema
            .columns()
            .iter()
            .map(|_| ColumnOrder::TYPEORDER(TypeDefinedOrder {}))
            .collect::<Vec<_>>();

        let metadata = TFileMetaData {
            version: self.options.version.into(),
            schema: self.schema.to_thrift(),
            num_rows,
            row_groups: std::mem::take(&mut self.row_groups),
            key_value_metadata: if key_value_metadata.is_empty() {
                None
            } else {
                Some(key_value_metadata)
            },
            created_by: self.options.created_by.clone(),
            column_orders: Some(column_orders),
            encryption_algorithm: None,
            footer_signing_key_metadata: None,
        };

        self.offset += end_file(&mut self.sink, metadata)?;
        self.sink.flush()?;
        Ok((self.offset, self.sink.into_inner()?))
    }
}
