use crate::compression::{self, Compression};
use crate::error::Result;

/// Compresses a page body into `buffer`.
///
/// `levels_byte_length` is the uncompressed prefix holding v2 repetition
/// and definition levels; v1 pages pass 0 and compress the whole body.
pub(crate) fn compress_body(
    compression: Compression,
    body: &[u8],
    levels_byte_length: usize,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    if compression == Compression::Uncompressed {
        buffer.extend_from_slice(body);
        return Ok(());
    }
    buffer.extend_from_slice(&body[..levels_byte_length]);
    compression::compress(compression, &body[levels_byte_length..], buffer)
}
