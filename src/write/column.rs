use std::collections::HashMap;
use std::io::Write;

use parquet_format_safe::thrift::protocol::TCompactOutputProtocol;
use parquet_format_safe::{
    ColumnChunk, ColumnIndex, ColumnMetaData, OffsetIndex, PageEncodingStats, PageLocation,
};

use crate::bloom_filter::{self, BloomFilter};
use crate::column::{ColumnBuffer, ColumnIndexer, Dictionary, TypedValues};
use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::metadata::ColumnDescriptor;
use crate::page::{BufferedPage, PageType};
use crate::schema::io_thrift::physical_type_to_type;
use crate::value::Value;

use super::buffer_pool::PageBufferPool;
use super::compression::compress_body;
use super::page::{
    assemble_data_page_header, assemble_dict_page_header, page_location, serialize_page_header,
    DataPageDescription, PageWriteSpec,
};
use super::serialize::{encode_dict_indices, encode_levels};
use super::statistics::ChunkStatistics;
use super::{Version, WriteOptions};

/// Accumulates hashes of every value written to a column of one row
/// group; the bitset is sized and built at row-group close, when the
/// exact value count is known.
#[derive(Debug, Clone)]
struct BloomBuilder {
    bits_per_value: usize,
    hashes: Vec<u64>,
}

impl BloomBuilder {
    fn insert_values(&mut self, values: &TypedValues) {
        self.hashes.reserve(values.len());
        for i in 0..values.len() {
            self.hashes.push(bloom_filter::hash_scalar(&values.scalar_at(i)));
        }
    }

    fn build(&self) -> Vec<u8> {
        let mut filter = BloomFilter::new(self.hashes.len(), self.bits_per_value);
        for hash in &self.hashes {
            filter.insert(*hash);
        }
        filter.bitset().to_vec()
    }
}

/// The lifecycle of a column writer within a row group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnState {
    Empty,
    Buffering,
    Flushing,
    Closed,
}

/// The per-column write state machine: values are buffered, flushed into
/// encoded and compressed pages on size thresholds, and emitted to the
/// sink at row-group close.
pub struct ColumnWriter {
    descriptor: ColumnDescriptor,
    compression: Compression,
    encoding: Encoding,
    version: Version,
    page_buffer_size: usize,
    data_page_statistics: bool,

    buffer: ColumnBuffer,
    dictionary: Option<Dictionary>,
    indexer: ColumnIndexer,
    bloom: Option<BloomBuilder>,
    statistics: ChunkStatistics,

    pages: Vec<PageWriteSpec>,
    locations: Vec<PageLocation>,
    encoding_stats: HashMap<(PageType, Encoding), i32>,
    /// Rows flushed to pages so far; the next page's `first_row_index`.
    num_rows: usize,
    num_values: i64,
    /// Offset of the next page relative to the first data page.
    data_offset: u64,
    bloom_filter_offset: Option<i64>,
    state: ColumnState,
}

impl ColumnWriter {
    pub(crate) fn new(
        descriptor: ColumnDescriptor,
        options: &WriteOptions,
        nulls_first: bool,
    ) -> Self {
        let path = &descriptor.path_in_schema;
        let compression = options
            .column_compression
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, c)| *c)
            .unwrap_or(options.compression);
        let encoding = options
            .column_encoding
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, e)| *e)
            .unwrap_or(Encoding::Plain);
        let bloom = options
            .bloom_filters
            .iter()
            .find(|b| &b.path == path)
            .map(|b| BloomBuilder {
                bits_per_value: b.bits_per_value,
                hashes: vec![],
            });
        let unsigned = descriptor.descriptor.primitive_type.is_unsigned();
        let dictionary = (encoding == Encoding::RleDictionary)
            .then(|| Dictionary::new(descriptor.physical_type()));

        Self {
            buffer: ColumnBuffer::new(descriptor.clone(), nulls_first),
            indexer: ColumnIndexer::new(
                descriptor.physical_type(),
                unsigned,
                options.column_index_size_limit,
            ),
            dictionary,
            bloom,
            statistics: ChunkStatistics::default(),
            compression,
            encoding,
            version: options.version,
            page_buffer_size: options.page_buffer_size,
            data_page_statistics: options.data_page_statistics,
            pages: vec![],
            locations: vec![],
            encoding_stats: HashMap::new(),
            num_rows: 0,
            num_values: 0,
            data_offset: 0,
            bloom_filter_offset: None,
            descriptor,
            state: ColumnState::Empty,
        }
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    /// Rows of the current row group: flushed plus still buffered.
    pub fn total_rows(&self) -> usize {
        self.num_rows + self.buffer.num_rows()
    }

    pub(crate) fn has_data(&self) -> bool {
        !self.pages.is_empty() || !self.buffer.is_empty()
    }

    /// Appends values; flushes to pages when the buffer crosses the page
    /// size target.
    pub fn write_values(&mut self, values: &[Value], pool: &mut PageBufferPool) -> Result<()> {
        if self.state == ColumnState::Closed {
            return Err(Error::invalid(format!(
                "column {} is closed",
                self.descriptor.path_in_schema
            )));
        }
        self.buffer.write_values(values)?;
        self.state = ColumnState::Buffering;
        if self.buffer.byte_len() >= self.page_buffer_size {
            self.flush(pool)?;
        }
        Ok(())
    }

    /// Drains the buffer into one or more pages.
    pub fn flush(&mut self, pool: &mut PageBufferPool) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.state = ColumnState::Flushing;
        let page = self.buffer.freeze()?;
        for slice in page.split_by_size(self.page_buffer_size)? {
            self.flush_page(slice, pool)?;
        }
        self.state = ColumnState::Buffering;
        Ok(())
    }

    fn flush_page(&mut self, page: BufferedPage, pool: &mut PageBufferPool) -> Result<()> {
        let num_values = page.num_values();
        let num_nulls = page.num_nulls();
        let page_rows = page.num_rows();
        let unsigned = self.descriptor.descriptor.primitive_type.is_unsigned();

        if let Some(bloom) = self.bloom.as_mut() {
            bloom.insert_values(page.typed_values());
        }

        {
            let bounds = page.bounds();
            let bounds = bounds.as_ref().map(|(min, max)| (min, max));
            self.indexer.index_page(num_values, num_nulls, bounds);
            self.statistics.update(bounds, num_nulls, unsigned)?;
        }

        // body: repetition levels, then definition levels, then values
        let mut body = pool.get();
        body.clear();
        if self.descriptor.max_rep_level() > 0 {
            encode_levels(
                page.repetition_levels(),
                self.descriptor.max_rep_level(),
                self.version == Version::V1,
                &mut body,
            )?;
        }
        let rep_levels_byte_length = body.len();
        if self.descriptor.max_def_level() > 0 {
            encode_levels(
                page.definition_levels(),
                self.descriptor.max_def_level(),
                self.version == Version::V1,
                &mut body,
            )?;
        }
        let levels_byte_length = body.len();

        let encoding = if let Some(dictionary) = self.dictionary.as_mut() {
            let mut indices = vec![];
            dictionary.insert(page.typed_values(), &mut indices)?;
            encode_dict_indices(&indices, dictionary.len(), &mut body)?;
            Encoding::RleDictionary
        } else {
            page.write_to(self.encoding, &mut body)?;
            self.encoding
        };

        let uncompressed_page_size = body.len();
        let mut compressed = pool.get();
        compressed.clear();
        let levels_prefix = match self.version {
            Version::V1 => 0,
            Version::V2 => levels_byte_length,
        };
        compress_body(self.compression, &body, levels_prefix, &mut compressed)?;
        pool.put(body);

        let crc = crc32fast::hash(&compressed);
        let statistics = self.data_page_statistics.then(|| {
            let bounds = page.bounds();
            super::statistics::serialize_statistics(
                bounds.as_ref().map(|(min, _)| min),
                bounds.as_ref().map(|(_, max)| max),
                num_nulls as i64,
            )
        });

        let description = DataPageDescription {
            version: self.version,
            encoding,
            num_values,
            num_nulls,
            num_rows: page_rows,
            rep_levels_byte_length,
            def_levels_byte_length: levels_byte_length - rep_levels_byte_length,
            is_compressed: self.compression != Compression::Uncompressed,
            statistics,
        };
        let header = assemble_data_page_header(
            &description,
            uncompressed_page_size,
            compressed.len(),
            crc,
        )?;

        let mut buffer = pool.get();
        buffer.clear();
        let header_size = serialize_page_header(&header, &mut buffer)?;
        buffer.extend_from_slice(&compressed);
        let compressed_page_size = compressed.len();
        pool.put(compressed);

        let page_type = match self.version {
            Version::V1 => PageType::DataPage,
            Version::V2 => PageType::DataPageV2,
        };
        self.locations.push(page_location(
            self.data_offset,
            buffer.len(),
            self.num_rows,
        )?);
        self.data_offset += buffer.len() as u64;
        self.num_rows += page_rows;
        self.num_values += num_values as i64;
        *self.encoding_stats.entry((page_type, encoding)).or_insert(0) += 1;

        self.pages.push(PageWriteSpec {
            buffer,
            header_size,
            uncompressed_page_size,
            compressed_page_size,
        });
        Ok(())
    }

    /// Builds the dictionary page at row-group close, before the data
    /// pages are emitted.
    fn build_dict_page(&mut self, pool: &mut PageBufferPool) -> Result<Option<PageWriteSpec>> {
        let dictionary = match self.dictionary.as_ref() {
            Some(dictionary) if !dictionary.is_empty() || !self.pages.is_empty() => dictionary,
            _ => return Ok(None),
        };
        let mut body = pool.get();
        body.clear();
        super::serialize::encode_values(dictionary.values(), Encoding::Plain, &mut body)?;

        let uncompressed_page_size = body.len();
        let mut compressed = pool.get();
        compressed.clear();
        compress_body(self.compression, &body, 0, &mut compressed)?;
        pool.put(body);

        let crc = crc32fast::hash(&compressed);
        let header = assemble_dict_page_header(
            dictionary.len(),
            uncompressed_page_size,
            compressed.len(),
            crc,
        )?;

        let mut buffer = pool.get();
        buffer.clear();
        let header_size = serialize_page_header(&header, &mut buffer)?;
        buffer.extend_from_slice(&compressed);
        let compressed_page_size = compressed.len();
        pool.put(compressed);

        *self
            .encoding_stats
            .entry((PageType::DictionaryPage, Encoding::Plain))
            .or_insert(0) += 1;

        Ok(Some(PageWriteSpec {
            buffer,
            header_size,
            uncompressed_page_size,
            compressed_page_size,
        }))
    }

    /// The bloom filter bitset of this row group, if one is configured.
    pub(crate) fn take_bloom_bitset(&mut self) -> Option<Vec<u8>> {
        self.bloom.as_ref().map(|bloom| bloom.build())
    }

    pub(crate) fn set_bloom_filter_offset(&mut self, offset: u64) {
        self.bloom_filter_offset = Some(offset as i64);
    }

    /// Streams the dictionary page and the data pages, fixes up page
    /// locations, and assembles the [`ColumnChunk`]. Returns the chunk,
    /// the bytes written and both indexes, and resets for the next row
    /// group.
    pub(crate) fn emit<W: Write>(
        &mut self,
        writer: &mut W,
        start_offset: u64,
        pool: &mut PageBufferPool,
    ) -> Result<(ColumnChunk, u64, ColumnIndex, OffsetIndex)> {
        let dict_page = self.build_dict_page(pool)?;

        let mut offset = start_offset;
        let dictionary_page_offset = if let Some(page) = &dict_page {
            writer.write_all(&page.buffer)?;
            offset += page.buffer.len() as u64;
            Some(start_offset as i64)
        } else {
            None
        };

        let data_page_offset = offset;
        for location in self.locations.iter_mut() {
            location.offset += data_page_offset as i64;
        }
        for page in &self.pages {
            writer.write_all(&page.buffer)?;
            offset += page.buffer.len() as u64;
        }

        let all_pages = dict_page.iter().chain(self.pages.iter());
        let total_uncompressed_size: i64 = all_pages
            .clone()
            .map(|p| p.header_size as i64 + p.uncompressed_page_size as i64)
            .sum();
        let total_compressed_size: i64 = all_pages
            .map(|p| p.header_size as i64 + p.compressed_page_size as i64)
            .sum();

        let mut encodings: Vec<parquet_format_safe::Encoding> = vec![];
        let mut push_unique = |encoding: parquet_format_safe::Encoding| {
            if !encodings.contains(&encoding) {
                encodings.push(encoding);
            }
        };
        push_unique(self.encoding_value().into());
        if self.descriptor.max_def_level() > 0 || self.descriptor.max_rep_level() > 0 {
            push_unique(Encoding::Rle.into());
        }
        if dictionary_page_offset.is_some() {
            push_unique(Encoding::Plain.into());
        }

        let mut encoding_stats = self
            .encoding_stats
            .iter()
            .map(|((page_type, encoding), count)| PageEncodingStats {
                page_type: (*page_type).into(),
                encoding: (*encoding).into(),
                count: *count,
            })
            .collect::<Vec<_>>();
        encoding_stats.sort_by_key(|stats| (stats.page_type.0, stats.encoding.0));

        let (type_, _) = physical_type_to_type(&self.descriptor.physical_type());
        let metadata = ColumnMetaData {
            type_,
            encodings,
            path_in_schema: self.descriptor.path_in_schema.parts().to_vec(),
            codec: self.compression.into(),
            num_values: self.num_values,
            total_uncompressed_size,
            total_compressed_size,
            key_value_metadata: None,
            data_page_offset: data_page_offset as i64,
            index_page_offset: None,
            dictionary_page_offset,
            statistics: Some(self.statistics.serialize()),
            encoding_stats: Some(encoding_stats),
            bloom_filter_offset: self.bloom_filter_offset,
        };

        // the column metadata is also written inline, after the pages
        let mut protocol = TCompactOutputProtocol::new(&mut *writer);
        let metadata_len = metadata.write_to_out_protocol(&mut protocol)? as u64;

        let column_chunk = ColumnChunk {
            file_path: None,
            file_offset: data_page_offset as i64 + total_compressed_size,
            meta_data: Some(metadata),
            offset_index_offset: None,
            offset_index_length: None,
            column_index_offset: None,
            column_index_length: None,
            crypto_metadata: None,
            encrypted_column_metadata: None,
        };

        let column_index = self.indexer.column_index()?;
        let offset_index = OffsetIndex {
            page_locations: std::mem::take(&mut self.locations),
        };

        let bytes_written = offset - start_offset + metadata_len;
        self.reset_for_next_row_group(pool);
        Ok((column_chunk, bytes_written, column_index, offset_index))
    }

    fn encoding_value(&self) -> Encoding {
        if self.dictionary.is_some() {
            Encoding::RleDictionary
        } else {
            self.encoding
        }
    }

    fn reset_for_next_row_group(&mut self, pool: &mut PageBufferPool) {
        self.buffer.reset();
        if let Some(dictionary) = self.dictionary.as_mut() {
            dictionary.reset();
        }
        if let Some(bloom) = self.bloom.as_mut() {
            bloom.hashes.clear();
        }
        self.indexer.reset();
        self.statistics.reset();
        for page in self.pages.drain(..) {
            pool.put(page.buffer);
        }
        self.locations.clear();
        self.encoding_stats.clear();
        self.num_rows = 0;
        self.num_values = 0;
        self.data_offset = 0;
        self.bloom_filter_offset = None;
        self.state = ColumnState::Empty;
    }

    pub(crate) fn close(&mut self) {
        self.state = ColumnState::Closed;
    }
}
