use std::io::Write;

use super::super::{bitpacked, ceil8, uleb128};

/// RLE-hybrid encoding of `u32` values at `num_bits`. Runs of 8 or more
/// equal values become run-length runs; everything else is bit-packed in
/// groups of 8.
pub fn encode_u32<W: Write>(writer: &mut W, values: &[u32], num_bits: u8) -> std::io::Result<()> {
    let mut index = 0;
    while index < values.len() {
        if is_run(&values[index..]) {
            let value = values[index];
            let mut end = index + 8;
            while end < values.len() && values[end] == value {
                end += 1;
            }
            write_rle(writer, value, end - index, num_bits)?;
            index = end;
        } else {
            let start = index;
            index += std::cmp::min(8, values.len() - index);
            while values.len() - index >= 8 && !is_run(&values[index..]) {
                index += 8;
            }
            if values.len() - index < 8 {
                index = values.len();
            }
            write_bitpacked(writer, &values[start..index], num_bits)?;
        }
    }
    Ok(())
}

/// The boolean specialization: `num_bits = 1`, prefixed by the
/// little-endian 32-bit length of the encoded stream.
pub fn encode_bool<W: Write, I: Iterator<Item = bool>>(
    writer: &mut W,
    iterator: I,
) -> std::io::Result<()> {
    let values = iterator.map(u32::from).collect::<Vec<_>>();
    let mut buffer = vec![];
    encode_u32(&mut buffer, &values, 1)?;
    writer.write_all(&(buffer.len() as u32).to_le_bytes())?;
    writer.write_all(&buffer)
}

#[inline]
fn is_run(values: &[u32]) -> bool {
    values.len() >= 8 && values[1..8].iter().all(|v| *v == values[0])
}

fn write_rle<W: Write>(
    writer: &mut W,
    value: u32,
    run_length: usize,
    num_bits: u8,
) -> std::io::Result<()> {
    let mut container = [0u8; 10];
    let used = uleb128::encode((run_length as u64) << 1, &mut container);
    writer.write_all(&container[..used])?;
    writer.write_all(&value.to_le_bytes()[..ceil8(num_bits as usize)])
}

fn write_bitpacked<W: Write>(writer: &mut W, values: &[u32], num_bits: u8) -> std::io::Result<()> {
    let groups = ceil8(values.len());

    let mut container = [0u8; 10];
    let used = uleb128::encode(((groups as u64) << 1) | 1, &mut container);
    writer.write_all(&container[..used])?;

    let mut packed = vec![];
    if values.len() == groups * 8 {
        bitpacked::encode(values, num_bits as usize, &mut packed);
    } else {
        let mut padded = values.to_vec();
        padded.resize(groups * 8, 0);
        bitpacked::encode(&padded, num_bits as usize, &mut packed);
    }
    writer.write_all(&packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_all_set() -> std::io::Result<()> {
        let mut vec = vec![];
        encode_bool(&mut vec, std::iter::repeat(true).take(8))?;
        // length prefix, then a single rle run
        assert_eq!(vec, vec![2, 0, 0, 0, 8 << 1, 1]);
        Ok(())
    }

    #[test]
    fn mixed_values_bitpack() -> std::io::Result<()> {
        let mut vec = vec![];
        encode_u32(&mut vec, &[0, 1, 2, 1, 2, 1, 1, 0, 3], 2)?;
        assert_eq!(
            vec,
            vec![(2 << 1 | 1), 0b01_10_01_00, 0b00_01_01_10, 0b00_00_00_11]
        );
        Ok(())
    }

    #[test]
    fn repeated_values_rle() -> std::io::Result<()> {
        let mut vec = vec![];
        encode_u32(&mut vec, &[7; 17], 3)?;
        assert_eq!(vec, vec![17 << 1, 7]);
        Ok(())
    }

    #[test]
    fn run_after_literals() -> std::io::Result<()> {
        let mut values = vec![0u32, 1, 2, 3, 0, 1, 2, 3];
        values.extend([1; 8]);
        let mut vec = vec![];
        encode_u32(&mut vec, &values, 2)?;
        assert_eq!(
            vec,
            vec![(1 << 1 | 1), 0b11100100, 0b11100100, 8 << 1, 1]
        );
        Ok(())
    }
}
