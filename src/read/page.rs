use std::io::Read;

use parquet_format_safe::thrift::protocol::TCompactInputProtocol;

use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::metadata::{ColumnChunkMetaData, ColumnDescriptor};
use crate::page::{
    CompressedDataPage, CompressedDictPage, CompressedPage, DataPageHeader, PageType,
    ParquetPageHeader,
};

/// A fallible iterator of [`CompressedPage`] reading the pages of one
/// column chunk back to back.
///
/// The reader verifies each page's CRC (when present) over the compressed
/// body; a mismatch is [`Error::Corrupt`] naming the column and page
/// ordinal, and ends the iteration.
pub struct PageReader<R: Read> {
    reader: R,
    compression: Compression,
    descriptor: ColumnDescriptor,
    seen_num_values: i64,
    total_num_values: i64,
    /// Ordinal of the next data page, for error context.
    ordinal: usize,
    max_page_header_size: usize,
    finished: bool,
}

impl<R: Read> PageReader<R> {
    /// A reader over `column`'s pages. Assumes `reader` is positioned at
    /// the start of the chunk (the dictionary page, when present).
    pub fn new(reader: R, column: &ColumnChunkMetaData, max_page_header_size: usize) -> Self {
        Self {
            reader,
            compression: column.compression(),
            descriptor: column.descriptor().clone(),
            seen_num_values: 0,
            total_num_values: column.num_values(),
            ordinal: 0,
            max_page_header_size,
            finished: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn next_page(&mut self) -> Result<Option<CompressedPage>> {
        if self.seen_num_values >= self.total_num_values {
            return Ok(None);
        }

        let header = read_page_header(&mut self.reader, self.max_page_header_size)?;
        let read_size: usize = header.compressed_page_size.try_into()?;
        let mut buffer = vec![0; read_size];
        self.reader.read_exact(&mut buffer)?;

        if let Some(declared) = header.crc {
            let computed = crc32fast::hash(&buffer) as i32;
            if computed != declared {
                return Err(Error::corrupt(format!(
                    "column {} page {}: crc mismatch (declared {}, computed {})",
                    self.descriptor.path_in_schema, self.ordinal, declared, computed
                )));
            }
        }

        finish_page(
            header,
            buffer,
            self.compression,
            &self.descriptor,
            &mut self.seen_num_values,
            &mut self.ordinal,
        )
        .map(Some)
    }
}

impl<R: Read> Iterator for PageReader<R> {
    type Item = Result<CompressedPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                // a corrupt page is fatal to this chunk
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}

/// Reads a page header from thrift.
pub(super) fn read_page_header<R: Read>(
    reader: &mut R,
    max_size: usize,
) -> Result<ParquetPageHeader> {
    let mut protocol = TCompactInputProtocol::new(reader, max_size);
    let header = ParquetPageHeader::read_from_in_protocol(&mut protocol)?;
    Ok(header)
}

fn finish_page(
    header: ParquetPageHeader,
    buffer: Vec<u8>,
    compression: Compression,
    descriptor: &ColumnDescriptor,
    seen_num_values: &mut i64,
    ordinal: &mut usize,
) -> Result<CompressedPage> {
    let type_: PageType = header.type_.try_into()?;
    let uncompressed_page_size: usize = header.uncompressed_page_size.try_into()?;
    match type_ {
        PageType::DictionaryPage => {
            let dict_header = header.dictionary_page_header.as_ref().ok_or_else(|| {
                Error::corrupt(format!(
                    "column {}: a dictionary page without its header",
                    descriptor.path_in_schema
                ))
            })?;
            Ok(CompressedPage::Dict(CompressedDictPage::new(
                buffer,
                compression,
                uncompressed_page_size,
                dict_header.num_values.try_into()?,
            )))
        }
        PageType::DataPage => {
            let data_header = header.data_page_header.ok_or_else(|| {
                Error::corrupt(format!(
                    "column {}: a v1 data page without its header",
                    descriptor.path_in_schema
                ))
            })?;
            *seen_num_values += data_header.num_values as i64;
            *ordinal += 1;
            Ok(CompressedPage::Data(CompressedDataPage::new(
                DataPageHeader::V1(data_header),
                buffer,
                compression,
                uncompressed_page_size,
                descriptor.clone(),
            )))
        }
        PageType::DataPageV2 => {
            let data_header = header.data_page_header_v2.ok_or_else(|| {
                Error::corrupt(format!(
                    "column {}: a v2 data page without its header",
                    descriptor.path_in_schema
                ))
            })?;
            *seen_num_values += data_header.num_values as i64;
            *ordinal += 1;
            Ok(CompressedPage::Data(CompressedDataPage::new(
                DataPageHeader::V2(data_header),
                buffer,
                compression,
                uncompressed_page_size,
                descriptor.clone(),
            )))
        }
        PageType::IndexPage => Err(Error::corrupt(format!(
            "column {}: index pages are not data",
            descriptor.path_in_schema
        ))),
    }
}
