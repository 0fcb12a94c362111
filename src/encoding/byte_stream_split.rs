// See https://github.com/apache/parquet-format/blob/master/Encodings.md#byte-stream-split-byte_stream_split--9
use crate::error::{Error, Result};
use crate::types::NativeType;

/// Scatters the k-th byte of every value into the k-th stream and
/// concatenates the streams.
pub fn encode<T: NativeType>(values: &[T], buffer: &mut Vec<u8>) {
    let element_size = std::mem::size_of::<T>();
    let num_elements = values.len();
    let initial = buffer.len();
    buffer.resize(initial + element_size * num_elements, 0);

    let streams = &mut buffer[initial..];
    for (index, value) in values.iter().enumerate() {
        let bytes = value.to_le_bytes();
        for (stream, byte) in bytes.as_ref().iter().enumerate() {
            streams[num_elements * stream + index] = *byte;
        }
    }
}

/// Gathers values back from their byte streams.
pub fn decode<T: NativeType>(data: &[u8], values: &mut Vec<T>) -> Result<()> {
    let element_size = std::mem::size_of::<T>();
    if data.len() % element_size != 0 {
        return Err(Error::corrupt(
            "byte stream split data is not a multiple of the element size",
        ));
    }
    let num_elements = data.len() / element_size;

    let mut gathered = vec![0u8; element_size];
    for index in 0..num_elements {
        for (stream, byte) in gathered.iter_mut().enumerate() {
            *byte = data[num_elements * stream + index];
        }
        values.push(T::from_le_bytes(gathered.as_slice().try_into().unwrap()));
    }
    Ok(())
}
