use parquet_format_safe::thrift::protocol::TCompactOutputProtocol;
use parquet_format_safe::{DictionaryPageHeader, Encoding as TEncoding, PageLocation, Statistics};

use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::page::{DataPageHeaderV1, DataPageHeaderV2, PageType, ParquetPageHeader};

/// A fully-assembled on-wire page: the serialized header followed by the
/// compressed body, plus what the column chunk assembly needs later.
#[derive(Debug)]
pub(crate) struct PageWriteSpec {
    /// `header_bytes || body_bytes`, owned by a pooled buffer.
    pub buffer: Vec<u8>,
    pub header_size: u64,
    pub uncompressed_page_size: usize,
    pub compressed_page_size: usize,
}

fn i32_size(size: usize, what: &str) -> Result<i32> {
    size.try_into().map_err(|_| {
        Error::invalid(format!(
            "a page can only contain i32::MAX {} bytes, this one has {}",
            what, size
        ))
    })
}

pub(crate) struct DataPageDescription {
    pub version: crate::write::Version,
    pub encoding: Encoding,
    pub num_values: usize,
    pub num_nulls: usize,
    pub num_rows: usize,
    pub rep_levels_byte_length: usize,
    pub def_levels_byte_length: usize,
    pub is_compressed: bool,
    pub statistics: Option<Statistics>,
}

/// Assembles the thrift header of a data page. The CRC covers the
/// compressed body bytes.
pub(crate) fn assemble_data_page_header(
    description: &DataPageDescription,
    uncompressed_page_size: usize,
    compressed_page_size: usize,
    crc: u32,
) -> Result<ParquetPageHeader> {
    let encoding: TEncoding = description.encoding.into();
    let mut header = ParquetPageHeader {
        type_: match description.version {
            crate::write::Version::V1 => PageType::DataPage.into(),
            crate::write::Version::V2 => PageType::DataPageV2.into(),
        },
        uncompressed_page_size: i32_size(uncompressed_page_size, "uncompressed")?,
        compressed_page_size: i32_size(compressed_page_size, "compressed")?,
        crc: Some(crc as i32),
        data_page_header: None,
        index_page_header: None,
        dictionary_page_header: None,
        data_page_header_v2: None,
    };
    match description.version {
        crate::write::Version::V1 => {
            header.data_page_header = Some(DataPageHeaderV1 {
                num_values: description.num_values.try_into()?,
                encoding,
                definition_level_encoding: Encoding::Rle.into(),
                repetition_level_encoding: Encoding::Rle.into(),
                statistics: description.statistics.clone(),
            });
        }
        crate::write::Version::V2 => {
            header.data_page_header_v2 = Some(DataPageHeaderV2 {
                num_values: description.num_values.try_into()?,
                num_nulls: description.num_nulls.try_into()?,
                num_rows: description.num_rows.try_into()?,
                encoding,
                definition_levels_byte_length: description.def_levels_byte_length.try_into()?,
                repetition_levels_byte_length: description.rep_levels_byte_length.try_into()?,
                is_compressed: Some(description.is_compressed),
                statistics: description.statistics.clone(),
            });
        }
    }
    Ok(header)
}

pub(crate) fn assemble_dict_page_header(
    num_values: usize,
    uncompressed_page_size: usize,
    compressed_page_size: usize,
    crc: u32,
) -> Result<ParquetPageHeader> {
    Ok(ParquetPageHeader {
        type_: PageType::DictionaryPage.into(),
        uncompressed_page_size: i32_size(uncompressed_page_size, "uncompressed")?,
        compressed_page_size: i32_size(compressed_page_size, "compressed")?,
        crc: Some(crc as i32),
        data_page_header: None,
        index_page_header: None,
        dictionary_page_header: Some(DictionaryPageHeader {
            num_values: num_values.try_into().map_err(|_| {
                Error::invalid("a dictionary page can only contain i32::MAX values")
            })?,
            encoding: Encoding::Plain.into(),
            is_sorted: Some(false),
        }),
        data_page_header_v2: None,
    })
}

/// Serializes a page header, appending its thrift bytes to `buffer`.
pub(crate) fn serialize_page_header(
    header: &ParquetPageHeader,
    buffer: &mut Vec<u8>,
) -> Result<u64> {
    let mut protocol = TCompactOutputProtocol::new(buffer);
    Ok(header.write_to_out_protocol(&mut protocol)? as u64)
}

/// A location entry of the offset index. `offset` is relative to the first
/// data page until the row-group emission fixes it up.
pub(crate) fn page_location(
    offset: u64,
    compressed_page_size: usize,
    first_row_index: usize,
) -> Result<PageLocation> {
    Ok(PageLocation {
        offset: offset.try_into()?,
        compressed_page_size: compressed_page_size.try_into()?,
        first_row_index: first_row_index.try_into()?,
    })
}
