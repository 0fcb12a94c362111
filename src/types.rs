use std::cmp::Ordering;

use crate::schema::types::PhysicalType;

/// A physical native representation of a Parquet fixed-sized type.
pub trait NativeType:
    std::fmt::Debug + Copy + PartialEq + Default + Send + Sync + 'static
{
    type Bytes: AsRef<[u8]>
        + for<'a> TryFrom<&'a [u8], Error = std::array::TryFromSliceError>
        + std::fmt::Debug;

    const TYPE: PhysicalType;

    fn to_le_bytes(&self) -> Self::Bytes;

    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// The order used by statistics, dictionaries and page bounds.
    fn ord(&self, other: &Self) -> Ordering;
}

macro_rules! native {
    ($type:ty, $physical_type:expr) => {
        impl NativeType for $type {
            type Bytes = [u8; std::mem::size_of::<Self>()];

            const TYPE: PhysicalType = $physical_type;

            #[inline]
            fn to_le_bytes(&self) -> Self::Bytes {
                Self::to_le_bytes(*self)
            }

            #[inline]
            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                Self::from_le_bytes(bytes)
            }

            #[inline]
            fn ord(&self, other: &Self) -> Ordering {
                self.partial_cmp(other).unwrap_or(Ordering::Equal)
            }
        }
    };
}

native!(i32, PhysicalType::Int32);
native!(i64, PhysicalType::Int64);
native!(f32, PhysicalType::Float);
native!(f64, PhysicalType::Double);

/// `[u32; 3]` is the in-memory representation of the deprecated `INT96`
/// timestamp: three little-endian words, least significant first.
impl NativeType for [u32; 3] {
    type Bytes = [u8; 12];

    const TYPE: PhysicalType = PhysicalType::Int96;

    #[inline]
    fn to_le_bytes(&self) -> Self::Bytes {
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&self[0].to_le_bytes());
        bytes[4..8].copy_from_slice(&self[1].to_le_bytes());
        bytes[8..12].copy_from_slice(&self[2].to_le_bytes());
        bytes
    }

    #[inline]
    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        let mut words = [0u32; 3];
        words[0] = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        words[1] = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        words[2] = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        words
    }

    /// `INT96` compares as an unsigned 96-bit integer, most significant
    /// word first.
    #[inline]
    fn ord(&self, other: &Self) -> Ordering {
        (self[2], self[1], self[0]).cmp(&(other[2], other[1], other[0]))
    }
}

/// Decodes a value from its canonical little-endian form.
/// # Panics
/// Panics iff `bytes.len()` differs from the size of `T`.
pub fn decode<T: NativeType>(bytes: &[u8]) -> T {
    T::from_le_bytes(bytes.try_into().unwrap())
}
