use parquet_format_safe::ColumnIndex;

use crate::error::Result;
use crate::parquet_bridge::BoundaryOrder;
use crate::schema::types::PhysicalType;
use crate::value::{compare, Scalar};

/// Accumulates per-page null counts and min/max values of one column
/// chunk and emits its [`ColumnIndex`].
#[derive(Debug, Clone)]
pub struct ColumnIndexer {
    physical_type: PhysicalType,
    unsigned: bool,
    /// Maximum bytes per emitted min/max entry; 0 disables truncation.
    size_limit: usize,
    null_pages: Vec<bool>,
    null_counts: Vec<i64>,
    // canonical bytes, untruncated; truncation happens at emission
    min_values: Vec<Vec<u8>>,
    max_values: Vec<Vec<u8>>,
}

impl ColumnIndexer {
    pub fn new(physical_type: PhysicalType, unsigned: bool, size_limit: usize) -> Self {
        Self {
            physical_type,
            unsigned,
            size_limit,
            null_pages: vec![],
            null_counts: vec![],
            min_values: vec![],
            max_values: vec![],
        }
    }

    /// Records one page. `bounds` is `None` for an all-null (or empty)
    /// page.
    pub fn index_page(
        &mut self,
        num_values: usize,
        num_nulls: usize,
        bounds: Option<(&Scalar, &Scalar)>,
    ) {
        self.null_pages.push(num_values == num_nulls);
        self.null_counts.push(num_nulls as i64);
        match bounds {
            Some((min, max)) => {
                self.min_values.push(min.to_bytes());
                self.max_values.push(max.to_bytes());
            }
            None => {
                // a null page still occupies a slot in the arrays
                self.min_values.push(vec![0]);
                self.max_values.push(vec![0]);
            }
        }
    }

    pub fn num_pages(&self) -> usize {
        self.null_pages.len()
    }

    /// Whether both non-null `min_values` and `max_values` are sorted in
    /// `order` (`Less` for ascending, `Greater` for descending).
    fn is_sorted(&self, order: std::cmp::Ordering) -> Result<bool> {
        for values in [&self.min_values, &self.max_values] {
            let mut previous: Option<Scalar> = None;
            for (value, is_null) in values.iter().zip(self.null_pages.iter()) {
                if *is_null {
                    continue;
                }
                let value = Scalar::from_canonical(self.physical_type, value)?;
                if let Some(previous) = &previous {
                    let ordering = compare(previous, &value, self.unsigned)?;
                    if ordering != order && ordering != std::cmp::Ordering::Equal {
                        return Ok(false);
                    }
                }
                previous = Some(value);
            }
        }
        Ok(true)
    }

    fn boundary_order(&self) -> Result<BoundaryOrder> {
        Ok(if self.is_sorted(std::cmp::Ordering::Less)? {
            BoundaryOrder::Ascending
        } else if self.is_sorted(std::cmp::Ordering::Greater)? {
            BoundaryOrder::Descending
        } else {
            BoundaryOrder::Unordered
        })
    }

    /// Emits the accumulated [`ColumnIndex`], truncating min/max entries
    /// to the configured size limit.
    pub fn column_index(&self) -> Result<ColumnIndex> {
        let min_values = self
            .min_values
            .iter()
            .map(|value| truncate_min(value, self.size_limit))
            .collect();
        let max_values = self
            .max_values
            .iter()
            .map(|value| truncate_max(value, self.size_limit))
            .collect();

        Ok(ColumnIndex {
            null_pages: self.null_pages.clone(),
            min_values,
            max_values,
            boundary_order: self.boundary_order()?.into(),
            null_counts: Some(self.null_counts.clone()),
        })
    }

    /// Resets the accumulator for the next row group.
    pub fn reset(&mut self) {
        self.null_pages.clear();
        self.null_counts.clear();
        self.min_values.clear();
        self.max_values.clear();
    }
}

/// Keeps a prefix of at most `limit` bytes; a prefix of a min is `≤` the
/// min.
fn truncate_min(value: &[u8], limit: usize) -> Vec<u8> {
    if limit == 0 || value.len() <= limit {
        value.to_vec()
    } else {
        value[..limit].to_vec()
    }
}

/// Truncates and then increments the last non-0xFF byte so the result
/// stays `≥` the max. An all-0xFF prefix cannot be incremented; the
/// original value is kept in that case.
fn truncate_max(value: &[u8], limit: usize) -> Vec<u8> {
    if limit == 0 || value.len() <= limit {
        return value.to_vec();
    }
    let mut truncated = value[..limit].to_vec();
    for i in (0..truncated.len()).rev() {
        if truncated[i] != 0xFF {
            truncated[i] += 1;
            truncated.truncate(i + 1);
            return truncated;
        }
    }
    value.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet_format_safe::BoundaryOrder as TBoundaryOrder;

    fn indexer_with(pages: &[(i32, i32)]) -> ColumnIndexer {
        let mut indexer = ColumnIndexer::new(PhysicalType::Int32, false, 0);
        for (min, max) in pages {
            let min = Scalar::from(*min);
            let max = Scalar::from(*max);
            indexer.index_page(10, 0, Some((&min, &max)));
        }
        indexer
    }

    #[test]
    fn ascending_iff_both_sorted() {
        let index = indexer_with(&[(1, 5), (2, 6), (2, 9)]).column_index().unwrap();
        assert_eq!(index.boundary_order, TBoundaryOrder::ASCENDING);

        // maxes descend while mins ascend
        let index = indexer_with(&[(1, 9), (2, 6)]).column_index().unwrap();
        assert_eq!(index.boundary_order, TBoundaryOrder::UNORDERED);

        let index = indexer_with(&[(5, 9), (2, 6), (0, 1)]).column_index().unwrap();
        assert_eq!(index.boundary_order, TBoundaryOrder::DESCENDING);
    }

    #[test]
    fn null_pages_are_skipped_for_order() {
        let mut indexer = ColumnIndexer::new(PhysicalType::Int32, false, 0);
        let one = Scalar::from(1i32);
        let two = Scalar::from(2i32);
        indexer.index_page(4, 0, Some((&one, &one)));
        indexer.index_page(4, 4, None);
        indexer.index_page(4, 0, Some((&two, &two)));

        let index = indexer.column_index().unwrap();
        assert_eq!(index.boundary_order, TBoundaryOrder::ASCENDING);
        assert_eq!(index.null_pages, vec![false, true, false]);
        assert_eq!(index.null_counts, Some(vec![0, 4, 0]));
    }

    #[test]
    fn truncation_preserves_contracts() {
        assert_eq!(truncate_min(b"abcdef", 3), b"abc".to_vec());
        assert_eq!(truncate_min(b"ab", 3), b"ab".to_vec());

        // max is incremented to stay above the actual value
        assert_eq!(truncate_max(b"abcdef", 3), b"abd".to_vec());
        // trailing 0xFF bytes are dropped before incrementing
        assert_eq!(truncate_max(&[0x61, 0xFF, 0xFF, 0x00], 3), vec![0x62]);
        // an all-0xFF prefix keeps the original
        assert_eq!(
            truncate_max(&[0xFF, 0xFF, 0xFF, 0x00], 3),
            vec![0xFF, 0xFF, 0xFF, 0x00]
        );
    }

    #[test]
    fn byte_array_index_uses_lexicographic_order() {
        let mut indexer = ColumnIndexer::new(PhysicalType::ByteArray, false, 4);
        let min = Scalar::from(b"aaaaaa".as_ref());
        let max = Scalar::from(b"zzzzzz".as_ref());
        indexer.index_page(2, 0, Some((&min, &max)));

        let index = indexer.column_index().unwrap();
        assert_eq!(index.min_values[0], b"aaaa".to_vec());
        assert_eq!(index.max_values[0], b"zzz{".to_vec());
    }
}
