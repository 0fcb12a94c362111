//! The write side: per-column state machines buffering values into pages,
//! a row group assembler, and the file framing around them.
mod buffer_pool;
mod column;
mod compression;
mod file;
mod indexes;
mod page;
pub(crate) mod serialize;
mod statistics;

pub use buffer_pool::PageBufferPool;
pub use column::ColumnWriter;
pub use file::FileWriter;

use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::metadata::ColumnPath;

pub(crate) const DEFAULT_CREATED_BY: &str =
    concat!("parquet-engine version ", env!("CARGO_PKG_VERSION"));

/// The data page format to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Length-prefixed levels, whole-body compression.
    V1,
    /// Raw levels, values-only compression.
    V2,
}

impl From<Version> for i32 {
    fn from(version: Version) -> Self {
        match version {
            Version::V1 => 1,
            Version::V2 => 2,
        }
    }
}

/// A declared sort of the rows of every row group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortingColumn {
    pub path: ColumnPath,
    pub descending: bool,
    pub nulls_first: bool,
}

/// A bloom filter declaration for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilterOptions {
    pub path: ColumnPath,
    /// Bits per distinct value; sizing rounds up to whole 256-bit blocks.
    pub bits_per_value: usize,
}

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Target uncompressed bytes per data page; buffers above this are
    /// split into sub-pages on flush.
    pub page_buffer_size: usize,
    /// Size of the buffered writer in front of the sink; 0 disables
    /// buffering.
    pub write_buffer_size: usize,
    /// The data page format.
    pub version: Version,
    /// Maximum bytes per min/max entry in column indexes; 0 disables
    /// truncation.
    pub column_index_size_limit: usize,
    /// Whether to embed per-page statistics in data page headers.
    pub data_page_statistics: bool,
    /// Default codec for all columns.
    pub compression: Compression,
    /// Per-column codec overrides.
    pub column_compression: Vec<(ColumnPath, Compression)>,
    /// Per-column value encodings; `RleDictionary` enables the dictionary
    /// path. Columns default to `Plain`.
    pub column_encoding: Vec<(ColumnPath, Encoding)>,
    /// The declared sort order, recorded in every row group.
    pub sorting_columns: Vec<SortingColumn>,
    /// Bloom filter declarations.
    pub bloom_filters: Vec<BloomFilterOptions>,
    /// Free-form pairs stored in the footer, sorted by key on write.
    pub key_value_metadata: Vec<(String, String)>,
    /// Producer identifier stored in the footer.
    pub created_by: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            page_buffer_size: 1024 * 1024,
            write_buffer_size: 0,
            version: Version::V2,
            column_index_size_limit: 64,
            data_page_statistics: false,
            compression: Compression::Uncompressed,
            column_compression: vec![],
            column_encoding: vec![],
            sorting_columns: vec![],
            bloom_filters: vec![],
            key_value_metadata: vec![],
            created_by: Some(DEFAULT_CREATED_BY.to_string()),
        }
    }
}
