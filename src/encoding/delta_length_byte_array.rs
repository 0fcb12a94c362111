// See https://github.com/apache/parquet-format/blob/master/Encodings.md#delta-length-byte-array-delta_length_byte_array--6
use super::delta_bitpacked;
use crate::error::{Error, Result};

/// Encodes `values` according to `DELTA_LENGTH_BYTE_ARRAY`: all lengths
/// delta-encoded up front, followed by the concatenated bytes.
pub fn encode<'a, I: ExactSizeIterator<Item = &'a [u8]> + Clone>(
    values: I,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    let lengths = values
        .clone()
        .map(|x| x.len() as i64)
        .collect::<Vec<_>>();
    delta_bitpacked::encode(&lengths, buffer)?;
    for value in values {
        buffer.extend_from_slice(value);
    }
    Ok(())
}

/// Decodes a `DELTA_LENGTH_BYTE_ARRAY` stream into its lengths and the
/// slice holding the concatenated values.
pub fn decode(data: &[u8]) -> Result<(Vec<i64>, &[u8])> {
    let lengths = delta_bitpacked::decode(data)?;
    let values = &data[lengths.consumed..];

    let mut total = 0usize;
    for length in &lengths.values {
        if *length < 0 {
            return Err(Error::corrupt("negative byte array length"));
        }
        total += *length as usize;
        if total > values.len() {
            return Err(Error::eof(
                "byte array data ends before the sum of its lengths",
            ));
        }
    }
    Ok((lengths.values, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world() {
        // validated from spark==3.1.1
        let data = &[
            128, 1, 4, 2, 10, 0, 0, 0, 0, 0, 72, 101, 108, 108, 111, 87, 111, 114, 108, 100,
        ];
        let (lengths, values) = decode(data).unwrap();
        assert_eq!(lengths, vec![5, 5]);
        assert_eq!(values, b"HelloWorld");
    }

    #[test]
    fn round_trip() {
        let input: Vec<&[u8]> = vec![b"parquet", b"", b"columnar", b"x"];
        let mut buffer = vec![];
        encode(input.iter().copied(), &mut buffer).unwrap();

        let (lengths, mut values) = decode(&buffer).unwrap();
        assert_eq!(lengths, vec![7, 0, 8, 1]);
        let mut decoded = vec![];
        for length in lengths {
            let (value, rest) = values.split_at(length as usize);
            decoded.push(value.to_vec());
            values = rest;
        }
        let expected = input.iter().map(|x| x.to_vec()).collect::<Vec<_>>();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn truncated_values_error() {
        let input: Vec<&[u8]> = vec![b"abcde"];
        let mut buffer = vec![];
        encode(input.iter().copied(), &mut buffer).unwrap();
        buffer.truncate(buffer.len() - 2);
        assert!(decode(&buffer).is_err());
    }
}
