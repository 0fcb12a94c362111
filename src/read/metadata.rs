use std::cmp::min;
use std::io::{Read, Seek, SeekFrom};

use parquet_format_safe::thrift::protocol::TCompactInputProtocol;
use parquet_format_safe::FileMetaData as TFileMetaData;

use crate::error::{Error, Result};
use crate::metadata::FileMetaData;
use crate::{DEFAULT_FOOTER_READ_SIZE, FOOTER_SIZE, PARQUET_MAGIC};

pub(super) fn metadata_len(buffer: &[u8], len: usize) -> i32 {
    i32::from_le_bytes(buffer[len - 8..len - 4].try_into().unwrap())
}

// see (unstable) Seek::stream_len
fn stream_len(seek: &mut impl Seek) -> std::result::Result<u64, std::io::Error> {
    let old_pos = seek.stream_position()?;
    let len = seek.seek(SeekFrom::End(0))?;

    if old_pos != len {
        seek.seek(SeekFrom::Start(old_pos))?;
    }

    Ok(len)
}

/// Parses a thrift-encoded [`FileMetaData`] from `reader`, allowing at
/// most `max_size` bytes of thrift allocations.
pub fn deserialize_metadata<R: Read>(reader: R, max_size: usize) -> Result<FileMetaData> {
    let mut protocol = TCompactInputProtocol::new(reader, max_size);
    let metadata = TFileMetaData::read_from_in_protocol(&mut protocol)?;
    FileMetaData::try_from_thrift(metadata)
}

/// Reads a file's metadata from the footer.
// Layout of a parquet file:
// +---------------------------+-----+---+
// |      rest of file         |  B  | A |
// +---------------------------+-----+---+
// where A is the 8-byte footer and B the thrift metadata it points to.
pub fn read_metadata<R: Read + Seek>(reader: &mut R) -> Result<FileMetaData> {
    let file_size = stream_len(reader)?;
    if file_size < FOOTER_SIZE + PARQUET_MAGIC.len() as u64 {
        return Err(Error::corrupt(
            "a parquet file must contain a header, a footer and the magic bytes",
        ));
    }

    // read and cache up to DEFAULT_FOOTER_READ_SIZE bytes from the end
    let default_end_len = min(DEFAULT_FOOTER_READ_SIZE, file_size) as usize;
    reader.seek(SeekFrom::End(-(default_end_len as i64)))?;
    let mut buffer = vec![0; default_end_len];
    reader.read_exact(&mut buffer)?;

    if buffer[default_end_len - 4..] != PARQUET_MAGIC {
        return Err(Error::corrupt("the file must end with the parquet magic"));
    }

    let metadata_len = metadata_len(&buffer, default_end_len);
    let metadata_len: u64 = metadata_len
        .try_into()
        .map_err(|_| Error::corrupt("the metadata length must not be negative"))?;

    let footer_len = FOOTER_SIZE + metadata_len;
    if footer_len > file_size {
        return Err(Error::corrupt(
            "the declared metadata length does not fit the file",
        ));
    }

    let max_size = file_size as usize * 2 + 1024;
    if (footer_len as usize) < buffer.len() {
        // the whole metadata is in the bytes already read
        let start = buffer.len() - footer_len as usize;
        deserialize_metadata(&buffer[start..], max_size)
    } else {
        reader.seek(SeekFrom::End(-(footer_len as i64)))?;
        deserialize_metadata(reader, max_size)
    }
}
