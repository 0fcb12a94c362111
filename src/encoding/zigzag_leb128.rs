use super::uleb128;
use crate::error::Result;

/// Decodes a zigzag ULEB128-encoded signed integer.
pub fn decode(values: &[u8]) -> Result<(i64, usize)> {
    let (unsigned, consumed) = uleb128::decode(values)?;
    Ok(((unsigned >> 1) as i64 ^ -((unsigned & 1) as i64), consumed))
}

/// Encodes `value`, returning the container and the number of bytes used.
pub fn encode(value: i64) -> ([u8; 10], usize) {
    let zigzag = ((value << 1) ^ (value >> 63)) as u64;
    let mut container = [0u8; 10];
    let used = uleb128::encode(zigzag, &mut container);
    (container, used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values() {
        // see e.g. https://stackoverflow.com/a/2211086/931303
        let cases = [
            (0u8, 0i64),
            (1, -1),
            (2, 1),
            (3, -2),
            (4, 2),
            (5, -3),
            (6, 3),
            (7, -4),
            (8, 4),
            (9, -5),
        ];
        for (data, expected) in cases {
            let (result, _) = decode(&[data]).unwrap();
            assert_eq!(result, expected);
        }
    }

    #[test]
    fn round_trip() {
        for value in [0i64, -1, 1, i64::MIN, i64::MAX, -624_485, 624_485] {
            let (container, used) = encode(value);
            let (decoded, consumed) = decode(&container[..used]).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, used);
        }
    }
}
