use super::super::{bitpacked, bit_width, ceil8, uleb128, zigzag_leb128};
use super::{BLOCK_SIZE, MINI_BLOCKS};
use crate::error::{Error, Result};

/// Encodes `values` according to parquet's `DELTA_BINARY_PACKED`.
///
/// Blocks are [`BLOCK_SIZE`] values with a single mini-block; the last
/// mini-block is zero-padded to its full byte length.
pub fn encode(values: &[i64], buffer: &mut Vec<u8>) -> Result<()> {
    let mut container = [0u8; 10];

    let used = uleb128::encode(BLOCK_SIZE as u64, &mut container);
    buffer.extend_from_slice(&container[..used]);

    let used = uleb128::encode(MINI_BLOCKS as u64, &mut container);
    buffer.extend_from_slice(&container[..used]);

    let used = uleb128::encode(values.len() as u64, &mut container);
    buffer.extend_from_slice(&container[..used]);

    let first_value = values.first().copied().unwrap_or(0);
    let (container, used) = zigzag_leb128::encode(first_value);
    buffer.extend_from_slice(&container[..used]);

    let mut deltas = [0i64; BLOCK_SIZE];
    let mut packed = [0u64; BLOCK_SIZE];

    let mut previous = first_value;
    let mut index = 1;
    while index < values.len() {
        let length = std::cmp::min(BLOCK_SIZE, values.len() - index);
        for (delta, value) in deltas.iter_mut().zip(&values[index..index + length]) {
            *delta = value.checked_sub(previous).ok_or_else(|| {
                Error::invalid("the difference between consecutive values overflows an i64")
            })?;
            previous = *value;
        }
        let deltas = &deltas[..length];

        let min_delta = *deltas.iter().min().unwrap();
        let max_delta = *deltas.iter().max().unwrap();

        let (container, used) = zigzag_leb128::encode(min_delta);
        buffer.extend_from_slice(&container[..used]);

        let num_bits = max_delta
            .checked_sub(min_delta)
            .map(|x| bit_width(x as u64) as u8)
            .ok_or_else(|| {
                Error::invalid("the range of deltas of a block overflows an i64")
            })?;
        buffer.push(num_bits);

        if num_bits > 0 {
            packed.fill(0);
            for (packed, delta) in packed.iter_mut().zip(deltas) {
                *packed = (delta - min_delta) as u64;
            }
            // mini-blocks are written whole; the unused tail packs zeros
            let start = buffer.len();
            bitpacked::encode_u64(&packed, num_bits as usize, buffer);
            debug_assert_eq!(
                buffer.len() - start,
                ceil8(BLOCK_SIZE * num_bits as usize)
            );
        }

        index += length;
    }
    Ok(())
}
