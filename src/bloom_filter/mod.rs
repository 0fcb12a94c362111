//! Split-block bloom filters over xxhash64 of the canonical value bytes.
// see https://github.com/apache/parquet-format/blob/master/BloomFilter.md
mod read;
mod write;

pub use read::read;
pub(crate) use write::write;

use xxhash_rust::xxh64::xxh64;

use crate::types::NativeType;
use crate::value::Scalar;

/// Each block is 256 bits: eight 32-bit words, one bit set per word.
const BLOCK_BYTES: usize = 32;

/// The eight odd multipliers deriving one bit position per word from the
/// low half of a hash.
const SALT: [u32; 8] = [
    0x47b6137b, 0x44974d91, 0x8824ad5b, 0xa2b7289d, 0x705495c7, 0x2df1424b, 0x9efc4947, 0x5c6bfb31,
];

/// A split-block bloom filter: a bitset of 256-bit blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter {
    bitset: Vec<u8>,
}

impl BloomFilter {
    /// A filter sized for `num_values` values at `bits_per_value` bits,
    /// rounded up to whole blocks.
    pub fn new(num_values: usize, bits_per_value: usize) -> Self {
        let num_blocks = (num_values * bits_per_value + 255) / 256;
        let num_blocks = std::cmp::max(1, num_blocks);
        Self {
            bitset: vec![0; num_blocks * BLOCK_BYTES],
        }
    }

    /// A filter over an existing bitset, e.g. one read back from a file.
    /// Returns `None` iff the bitset is not a whole number of blocks.
    pub fn from_bitset(bitset: Vec<u8>) -> Option<Self> {
        if bitset.is_empty() || bitset.len() % BLOCK_BYTES != 0 {
            return None;
        }
        Some(Self { bitset })
    }

    pub fn bitset(&self) -> &[u8] {
        &self.bitset
    }

    fn num_blocks(&self) -> usize {
        self.bitset.len() / BLOCK_BYTES
    }

    /// The block of a hash: `(high_32_bits × num_blocks) / 2^32`.
    fn block_index(&self, hash: u64) -> usize {
        let high = hash >> 32;
        ((high * self.num_blocks() as u64) >> 32) as usize
    }

    /// The eight (word, bit) masks of a hash within its block.
    fn masks(hash: u64) -> [u32; 8] {
        let low = hash as u32;
        let mut masks = [0u32; 8];
        for (mask, salt) in masks.iter_mut().zip(SALT.iter()) {
            *mask = 1 << (salt.wrapping_mul(low) >> 27);
        }
        masks
    }

    /// Sets the hash's bit pattern: one bit in each of the block's eight
    /// words.
    pub fn insert(&mut self, hash: u64) {
        let block = self.block_index(hash) * BLOCK_BYTES;
        for (word, mask) in Self::masks(hash).iter().enumerate() {
            let offset = block + word * 4;
            let bytes: [u8; 4] = self.bitset[offset..offset + 4].try_into().unwrap();
            let merged = u32::from_le_bytes(bytes) | mask;
            self.bitset[offset..offset + 4].copy_from_slice(&merged.to_le_bytes());
        }
    }

    /// Whether the hash's whole bit pattern is set. False positives are
    /// possible, false negatives are not.
    pub fn check(&self, hash: u64) -> bool {
        let block = self.block_index(hash) * BLOCK_BYTES;
        Self::masks(hash).iter().enumerate().all(|(word, mask)| {
            let offset = block + word * 4;
            let bytes: [u8; 4] = self.bitset[offset..offset + 4].try_into().unwrap();
            u32::from_le_bytes(bytes) & mask == *mask
        })
    }
}

/// Hashes the canonical little-endian form of a native value.
pub fn hash_native<T: NativeType>(value: T) -> u64 {
    xxh64(value.to_le_bytes().as_ref(), 0)
}

/// Hashes raw bytes (the canonical form of the byte array types).
pub fn hash_bytes<A: AsRef<[u8]>>(value: A) -> u64 {
    xxh64(value.as_ref(), 0)
}

/// Bulk form of [`hash_native`]: writes one digest per value into `out`.
pub fn hash_native_slice<T: NativeType>(values: &[T], out: &mut Vec<u64>) {
    out.reserve(values.len());
    out.extend(values.iter().map(|value| hash_native(*value)));
}

/// Hashes any scalar through its canonical byte form.
pub fn hash_scalar(scalar: &Scalar) -> u64 {
    match scalar {
        Scalar::Boolean(value) => xxh64(&[u8::from(*value)], 0),
        Scalar::Int32(value) => hash_native(*value),
        Scalar::Int64(value) => hash_native(*value),
        Scalar::Int96(value) => hash_native(*value),
        Scalar::Float(value) => hash_native(*value),
        Scalar::Double(value) => hash_native(*value),
        Scalar::ByteArray(value) | Scalar::FixedLenByteArray(value) => hash_bytes(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_hashes_are_found() {
        let mut filter = BloomFilter::new(3, 16);
        let hashes = [42i64, 100, 7].map(hash_native);
        for hash in hashes {
            filter.insert(hash);
        }
        for hash in hashes {
            assert!(filter.check(hash));
        }
    }

    #[test]
    fn at_least_one_block() {
        let filter = BloomFilter::new(0, 16);
        assert_eq!(filter.bitset().len(), BLOCK_BYTES);
    }

    #[test]
    fn sizing() {
        // 1024 values at 16 bits = 16384 bits = 64 blocks
        let filter = BloomFilter::new(1024, 16);
        assert_eq!(filter.bitset().len(), 64 * BLOCK_BYTES);
    }

    #[test]
    fn bitset_round_trip() {
        let mut filter = BloomFilter::new(10, 8);
        filter.insert(hash_bytes(b"abc"));
        let recovered = BloomFilter::from_bitset(filter.bitset().to_vec()).unwrap();
        assert!(recovered.check(hash_bytes(b"abc")));
        assert!(BloomFilter::from_bitset(vec![0; 31]).is_none());
    }

    #[test]
    fn bulk_hashing_matches_single() {
        let values = [1i64, 2, 3];
        let mut out = vec![];
        hash_native_slice(&values, &mut out);
        assert_eq!(out, values.map(hash_native).to_vec());
    }

    #[test]
    fn false_positive_rate_is_within_tolerance() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x1337);
        let num_values = 4096usize;
        let bits_per_value = 16usize;
        let mut filter = BloomFilter::new(num_values, bits_per_value);
        for _ in 0..num_values {
            filter.insert(rng.gen());
        }

        let probes = 1_000_000usize;
        let mut positives = 0usize;
        for _ in 0..probes {
            if filter.check(rng.gen()) {
                positives += 1;
            }
        }
        let rate = positives as f64 / probes as f64;
        // split-block filters at 16 bits/value sit well under 1%
        assert!(rate < 0.011, "false positive rate {} too high", rate);
    }
}
