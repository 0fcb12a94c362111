//! The in-memory typed column model: append-only buffers of values with
//! their levels, the per-row-group dictionary, and the per-page min/max
//! accumulator that becomes a column index.
mod buffer;
mod dictionary;
mod indexer;

pub use buffer::{ColumnBuffer, TypedValues};
pub use dictionary::Dictionary;
pub use indexer::ColumnIndexer;
