// See https://github.com/apache/parquet-format/blob/master/Encodings.md#delta-encoding-delta_binary_packed--5
mod decoder;
mod encoder;

pub use decoder::{decode, Decoded};
pub use encoder::encode;

pub(crate) const BLOCK_SIZE: usize = 128;
pub(crate) const MINI_BLOCKS: usize = 1;
