//! Dispatch from typed values to the on-wire encodings.

use crate::column::TypedValues;
use crate::encoding::{
    bit_width, byte_stream_split, delta_bitpacked, delta_byte_array, delta_length_byte_array,
    hybrid_rle, plain, Encoding,
};
use crate::error::{Error, Result};
use crate::types::NativeType;

/// Encodes present values with `encoding`, appending to `buffer`.
pub(crate) fn encode_values(
    values: &TypedValues,
    encoding: Encoding,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    match encoding {
        Encoding::Plain => {
            encode_plain(values, buffer);
            Ok(())
        }
        Encoding::Rle => match values {
            TypedValues::Boolean(values) => {
                hybrid_rle::encode_bool(buffer, values.iter().copied())?;
                Ok(())
            }
            _ => Err(Error::EncodingNotSupported(format!(
                "RLE cannot encode {:?} values",
                values.kind()
            ))),
        },
        Encoding::DeltaBinaryPacked => match values {
            TypedValues::Int32(values) => {
                let widened = values.iter().map(|x| *x as i64).collect::<Vec<_>>();
                delta_bitpacked::encode(&widened, buffer)
            }
            TypedValues::Int64(values) => delta_bitpacked::encode(values, buffer),
            _ => Err(Error::EncodingNotSupported(format!(
                "DELTA_BINARY_PACKED cannot encode {:?} values",
                values.kind()
            ))),
        },
        Encoding::DeltaLengthByteArray => match values {
            TypedValues::ByteArray(values) => {
                delta_length_byte_array::encode(values.iter().map(|x| x.as_slice()), buffer)
            }
            _ => Err(Error::EncodingNotSupported(format!(
                "DELTA_LENGTH_BYTE_ARRAY cannot encode {:?} values",
                values.kind()
            ))),
        },
        Encoding::DeltaByteArray => match values {
            TypedValues::ByteArray(values) => delta_byte_array::encode(values, buffer),
            _ => Err(Error::EncodingNotSupported(format!(
                "DELTA_BYTE_ARRAY cannot encode {:?} values",
                values.kind()
            ))),
        },
        Encoding::ByteStreamSplit => match values {
            TypedValues::Float(values) => {
                byte_stream_split::encode(values, buffer);
                Ok(())
            }
            TypedValues::Double(values) => {
                byte_stream_split::encode(values, buffer);
                Ok(())
            }
            _ => Err(Error::EncodingNotSupported(format!(
                "BYTE_STREAM_SPLIT cannot encode {:?} values",
                values.kind()
            ))),
        },
        other => Err(Error::EncodingNotSupported(format!(
            "{:?} is not a value encoding of this writer",
            other
        ))),
    }
}

fn encode_native<T: NativeType>(values: &[T], buffer: &mut Vec<u8>) {
    for value in values {
        buffer.extend_from_slice(value.to_le_bytes().as_ref());
    }
}

fn encode_plain(values: &TypedValues, buffer: &mut Vec<u8>) {
    match values {
        TypedValues::Boolean(values) => {
            // infallible: the writer is a vec
            let _ = hybrid_rle::bitpacked_encode(buffer, values.iter().copied());
        }
        TypedValues::Int32(values) => encode_native(values, buffer),
        TypedValues::Int64(values) => encode_native(values, buffer),
        TypedValues::Int96(values) => encode_native(values, buffer),
        TypedValues::Float(values) => encode_native(values, buffer),
        TypedValues::Double(values) => encode_native(values, buffer),
        TypedValues::ByteArray(values) => {
            for value in values {
                plain::encode_binary(value, buffer);
            }
        }
        TypedValues::FixedLenByteArray { data, .. } => buffer.extend_from_slice(data),
    }
}

/// Encodes levels with the RLE/bit-pack hybrid; v1 pages prefix the
/// stream with its little-endian 32-bit length.
pub(crate) fn encode_levels(
    levels: &[u16],
    max_level: u16,
    length_prefixed: bool,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    let num_bits = bit_width(max_level as u64) as u8;
    let widened = levels.iter().map(|x| *x as u32).collect::<Vec<_>>();
    if length_prefixed {
        let mut encoded = vec![];
        hybrid_rle::encode_u32(&mut encoded, &widened, num_bits)?;
        buffer.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        buffer.extend_from_slice(&encoded);
    } else {
        hybrid_rle::encode_u32(buffer, &widened, num_bits)?;
    }
    Ok(())
}

/// Encodes dictionary indices: one bit-width byte, then hybrid runs.
pub(crate) fn encode_dict_indices(
    indices: &[u32],
    dictionary_len: usize,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    let num_bits = std::cmp::max(
        1,
        bit_width(dictionary_len.saturating_sub(1) as u64) as u8,
    );
    buffer.push(num_bits);
    hybrid_rle::encode_u32(buffer, indices, num_bits)?;
    Ok(())
}
