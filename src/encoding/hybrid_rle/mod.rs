// See https://github.com/apache/parquet-format/blob/master/Encodings.md#run-length-encoding--bit-packing-hybrid-rle--3
mod bitmap;
mod decoder;
mod encoder;

pub use bitmap::{encode as bitpacked_encode, BitmapIter};
pub use decoder::Decoder;
pub use encoder::{encode_bool, encode_u32};

use crate::error::Result;

/// Declared value counts above this cap make a run [`crate::error::Error::Corrupt`],
/// guarding decoders against malicious or corrupt input.
pub const MAX_RUN_LENGTH: usize = 1 << 20;

/// A single run of the hybrid encoding.
#[derive(Debug, PartialEq, Eq)]
pub enum HybridEncoded<'a> {
    /// A bit-packed slice holding `8 × groups` values.
    Bitpacked(&'a [u8]),
    /// `usize` repetitions of the value packed into the slice's
    /// `ceil8(bit_width)` little-endian bytes.
    Rle(&'a [u8], usize),
}

impl<'a> HybridEncoded<'a> {
    /// The number of encoded values the run declares at `num_bits`.
    pub fn len(&self, num_bits: usize) -> usize {
        match self {
            HybridEncoded::Bitpacked(packed) => {
                if num_bits == 0 {
                    0
                } else {
                    packed.len() * 8 / num_bits
                }
            }
            HybridEncoded::Rle(_, run_length) => *run_length,
        }
    }
}

/// Decodes all values of a hybrid-encoded slice into `out`, stopping after
/// `length` values.
pub fn decode(values: &[u8], num_bits: u32, length: usize, out: &mut Vec<u32>) -> Result<()> {
    if num_bits == 0 {
        out.extend(std::iter::repeat(0).take(length));
        return Ok(());
    }
    for run in Decoder::new(values, num_bits) {
        let run = run?;
        if out.len() >= length {
            break;
        }
        let remaining = length - out.len();
        match run {
            HybridEncoded::Bitpacked(packed) => {
                let available = packed.len() * 8 / num_bits as usize;
                let additional = remaining.min(available);
                out.extend(super::bitpacked::Decoder::new(
                    packed,
                    num_bits as u8,
                    additional,
                ));
            }
            HybridEncoded::Rle(pack, run_length) => {
                let mut bytes = [0u8; 4];
                pack.iter().zip(bytes.iter_mut()).for_each(|(src, dst)| {
                    *dst = *src;
                });
                let value = u32::from_le_bytes(bytes);
                out.extend(std::iter::repeat(value).take(remaining.min(run_length)));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_runs() {
        let mut buffer = vec![];
        let values = [1u32, 1, 1, 1, 1, 0, 1, 1, 0, 1];
        encode_u32(&mut buffer, &values, 1).unwrap();

        let mut decoded = vec![];
        decode(&buffer, 1, values.len(), &mut decoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn long_run_round_trip() {
        let mut values = vec![3u32; 1000];
        values.extend((0..100).map(|x| x % 4));
        let mut buffer = vec![];
        encode_u32(&mut buffer, &values, 2).unwrap();

        let mut decoded = vec![];
        decode(&buffer, 2, values.len(), &mut decoded).unwrap();
        assert_eq!(decoded, values);
    }
}
