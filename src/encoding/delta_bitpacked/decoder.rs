use super::super::{bitpacked, ceil8, uleb128, zigzag_leb128};
use crate::error::{Error, Result};

/// The result of decoding a `DELTA_BINARY_PACKED` stream: the values and
/// the number of bytes consumed.
///
/// The consumed length matters because the delta byte array encodings
/// embed this stream and continue right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub values: Vec<i64>,
    pub consumed: usize,
}

/// Decodes a `DELTA_BINARY_PACKED` stream from the start of `data`.
pub fn decode(data: &[u8]) -> Result<Decoded> {
    let mut reader = data;
    let mut consumed = 0usize;

    let mut take = |n: usize, reader: &mut &[u8]| -> Result<()> {
        if n > reader.len() {
            return Err(Error::eof("delta header ends before its declared size"));
        }
        *reader = &reader[n..];
        consumed += n;
        Ok(())
    };

    let (block_size, used) = uleb128::decode(reader)?;
    take(used, &mut reader)?;
    let (num_mini_blocks, used) = uleb128::decode(reader)?;
    take(used, &mut reader)?;
    let (total_count, used) = uleb128::decode(reader)?;
    take(used, &mut reader)?;
    let (first_value, used) = zigzag_leb128::decode(reader)?;
    take(used, &mut reader)?;

    if block_size == 0 || block_size % 128 != 0 {
        return Err(Error::corrupt(format!(
            "delta block size must be a non-zero multiple of 128, got {}",
            block_size
        )));
    }
    if num_mini_blocks == 0 || block_size % num_mini_blocks != 0 {
        return Err(Error::corrupt(format!(
            "delta mini-block count {} does not divide the block size {}",
            num_mini_blocks, block_size
        )));
    }
    let values_per_mini_block = (block_size / num_mini_blocks) as usize;
    if values_per_mini_block % 8 != 0 {
        return Err(Error::corrupt(
            "delta mini-block length must be a multiple of 8",
        ));
    }
    let num_mini_blocks = num_mini_blocks as usize;

    let mut values = Vec::with_capacity(total_count as usize);
    let mut remaining = total_count as usize;
    let mut value = first_value;
    if remaining > 0 {
        values.push(value);
        remaining -= 1;
    }

    while remaining > 0 {
        // <min delta> <bit widths of mini blocks> <mini blocks>
        let (min_delta, used) = zigzag_leb128::decode(reader)?;
        take(used, &mut reader)?;

        if reader.len() < num_mini_blocks {
            return Err(Error::eof("delta block ends within its bit widths"));
        }
        let bit_widths = reader[..num_mini_blocks].to_vec();
        take(num_mini_blocks, &mut reader)?;

        for &num_bits in &bit_widths {
            if remaining == 0 {
                break;
            }
            if num_bits > 64 {
                return Err(Error::invalid(format!(
                    "delta mini-block bit width {} is out of range",
                    num_bits
                )));
            }
            let length = std::cmp::min(remaining, values_per_mini_block);
            if num_bits == 0 {
                for _ in 0..length {
                    value = value.wrapping_add(min_delta);
                    values.push(value);
                }
            } else {
                let mini_block_bytes = ceil8(values_per_mini_block * num_bits as usize);
                if reader.len() < mini_block_bytes {
                    return Err(Error::eof("delta mini-block ends before its declared size"));
                }
                let mini_block = &reader[..mini_block_bytes];
                for packed in bitpacked::DecoderU64::new(mini_block, num_bits, length) {
                    value = value.wrapping_add(min_delta).wrapping_add(packed as i64);
                    values.push(value);
                }
                take(mini_block_bytes, &mut reader)?;
            }
            remaining -= length;
        }
    }

    Ok(Decoded { values, consumed })
}
