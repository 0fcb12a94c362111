use std::io::Write;

use parquet_format_safe::{
    thrift::protocol::TCompactOutputProtocol, BloomFilterAlgorithm, BloomFilterCompression,
    BloomFilterHash, BloomFilterHeader, SplitBlockAlgorithm, Uncompressed, XxHash,
};

use crate::error::Result;

/// Writes a bloom filter bitset, framed as the little-endian 32-bit length
/// of the thrift header, the header, then the bitset bytes. Returns the
/// number of bytes written.
pub(crate) fn write<W: Write>(writer: &mut W, bitset: &[u8]) -> Result<u64> {
    let header = BloomFilterHeader {
        num_bytes: bitset.len() as i32,
        algorithm: BloomFilterAlgorithm::BLOCK(SplitBlockAlgorithm {}),
        hash: BloomFilterHash::XXHASH(XxHash {}),
        compression: BloomFilterCompression::UNCOMPRESSED(Uncompressed {}),
    };

    let mut header_bytes = vec![];
    let mut protocol = TCompactOutputProtocol::new(&mut header_bytes);
    header.write_to_out_protocol(&mut protocol)?;

    writer.write_all(&(header_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&header_bytes)?;
    writer.write_all(bitset)?;
    Ok(4 + header_bytes.len() as u64 + bitset.len() as u64)
}
