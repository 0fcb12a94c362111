use std::io::{Read, Seek, SeekFrom};

use parquet_format_safe::{
    thrift::protocol::TCompactInputProtocol, BloomFilterAlgorithm, BloomFilterCompression,
    BloomFilterHeader, SplitBlockAlgorithm, Uncompressed,
};

use crate::error::{Error, Result};
use crate::metadata::ColumnChunkMetaData;
use crate::DEFAULT_MAX_PAGE_HEADER_SIZE;

/// Reads the bloom filter associated to `column_metadata` into `bitset`.
///
/// The filter is framed as the little-endian 32-bit length of its thrift
/// header, the header, then the bitset. Results in an empty `bitset` if
/// the column has no bloom filter or its algorithm is not the split-block
/// one.
pub fn read<R: Read + Seek>(
    column_metadata: &ColumnChunkMetaData,
    reader: &mut R,
    bitset: &mut Vec<u8>,
) -> Result<()> {
    let offset = if let Some(offset) = column_metadata.bloom_filter_offset() {
        offset as u64
    } else {
        bitset.clear();
        return Ok(());
    };
    reader.seek(SeekFrom::Start(offset))?;

    let mut length = [0u8; 4];
    reader.read_exact(&mut length)?;
    let header_length = u32::from_le_bytes(length) as usize;
    if header_length > DEFAULT_MAX_PAGE_HEADER_SIZE {
        return Err(Error::corrupt(format!(
            "column {}: bloom filter header of {} bytes is not plausible",
            column_metadata.descriptor().path_in_schema,
            header_length
        )));
    }
    let mut header_bytes = vec![0; header_length];
    reader.read_exact(&mut header_bytes)?;

    let mut protocol =
        TCompactInputProtocol::new(header_bytes.as_slice(), DEFAULT_MAX_PAGE_HEADER_SIZE);
    let header = BloomFilterHeader::read_from_in_protocol(&mut protocol)?;

    if header.algorithm != BloomFilterAlgorithm::BLOCK(SplitBlockAlgorithm {}) {
        bitset.clear();
        return Ok(());
    }
    if header.compression != BloomFilterCompression::UNCOMPRESSED(Uncompressed {}) {
        bitset.clear();
        return Ok(());
    }

    bitset.clear();
    bitset.resize(header.num_bytes as usize, 0);
    reader.read_exact(bitset)?;
    Ok(())
}
