// See https://github.com/apache/parquet-format/blob/master/Encodings.md#delta-strings-delta_byte_array--7
use super::{delta_bitpacked, delta_length_byte_array};
use crate::error::{Error, Result};

/// Encodes `values` according to `DELTA_BYTE_ARRAY`: prefix lengths shared
/// with the previous value are delta-encoded, followed by the suffixes as
/// a `DELTA_LENGTH_BYTE_ARRAY` stream.
pub fn encode(values: &[Vec<u8>], buffer: &mut Vec<u8>) -> Result<()> {
    let mut prefix_lengths = Vec::with_capacity(values.len());
    let mut previous: &[u8] = &[];
    for value in values {
        let prefix = previous
            .iter()
            .zip(value.iter())
            .take_while(|(a, b)| a == b)
            .count();
        prefix_lengths.push(prefix as i64);
        previous = value;
    }
    delta_bitpacked::encode(&prefix_lengths, buffer)?;

    let suffixes = values
        .iter()
        .zip(prefix_lengths.iter())
        .map(|(value, prefix)| &value[*prefix as usize..])
        .collect::<Vec<_>>();
    delta_length_byte_array::encode(suffixes.iter().copied(), buffer)
}

/// Decodes a `DELTA_BYTE_ARRAY` stream.
pub fn decode(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let prefixes = delta_bitpacked::decode(data)?;
    let (suffix_lengths, mut suffixes) =
        delta_length_byte_array::decode(&data[prefixes.consumed..])?;

    if prefixes.values.len() != suffix_lengths.len() {
        return Err(Error::corrupt(format!(
            "{} prefix lengths but {} suffixes",
            prefixes.values.len(),
            suffix_lengths.len()
        )));
    }

    let mut values = Vec::with_capacity(prefixes.values.len());
    let mut previous: Vec<u8> = vec![];
    for (prefix, suffix_length) in prefixes.values.iter().zip(suffix_lengths.iter()) {
        if *prefix < 0 || *prefix as usize > previous.len() {
            return Err(Error::corrupt(format!(
                "prefix length {} exceeds the previous value length {}",
                prefix,
                previous.len()
            )));
        }
        let (suffix, rest) = suffixes.split_at(*suffix_length as usize);
        suffixes = rest;

        let mut value = Vec::with_capacity(*prefix as usize + suffix.len());
        value.extend_from_slice(&previous[..*prefix as usize]);
        value.extend_from_slice(suffix);
        previous = value.clone();
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world() {
        // validated from spark==3.1.1; trailing bytes beyond the declared
        // lengths are ignored
        let data = &[
            128, 1, 4, 2, 0, 0, 0, 0, 0, 0, 128, 1, 4, 2, 10, 0, 0, 0, 0, 0, 72, 101, 108, 108,
            111, 87, 111, 114, 108, 100, 1, 2, 3,
        ];
        let values = decode(data).unwrap();
        assert_eq!(values, vec![b"Hello".to_vec(), b"World".to_vec()]);
    }

    #[test]
    fn round_trip_shared_prefixes() {
        let input = vec![
            b"aaa".to_vec(),
            b"aaab".to_vec(),
            b"aab".to_vec(),
            b"".to_vec(),
            b"zzz".to_vec(),
            b"zzz".to_vec(),
        ];
        let mut buffer = vec![];
        encode(&input, &mut buffer).unwrap();
        assert_eq!(decode(&buffer).unwrap(), input);
    }
}
