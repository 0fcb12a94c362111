use parquet_format_safe::Statistics;

use crate::error::Result;
use crate::value::{compare, Scalar};

/// Serializes statistics into their thrift form; min/max use the
/// canonical byte form.
pub(crate) fn serialize_statistics(
    min: Option<&Scalar>,
    max: Option<&Scalar>,
    null_count: i64,
) -> Statistics {
    Statistics {
        max: None,
        min: None,
        null_count: Some(null_count),
        distinct_count: None,
        max_value: max.map(|x| x.to_bytes()),
        min_value: min.map(|x| x.to_bytes()),
    }
}

/// Chunk-level reduction of per-page bounds and null counts.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChunkStatistics {
    pub min: Option<Scalar<'static>>,
    pub max: Option<Scalar<'static>>,
    pub null_count: i64,
}

impl ChunkStatistics {
    pub fn update(
        &mut self,
        bounds: Option<(&Scalar, &Scalar)>,
        num_nulls: usize,
        unsigned: bool,
    ) -> Result<()> {
        self.null_count += num_nulls as i64;
        if let Some((min, max)) = bounds {
            self.min = Some(match self.min.take() {
                None => min.clone().into_owned(),
                Some(current) => {
                    if compare(min, &current, unsigned)?.is_lt() {
                        min.clone().into_owned()
                    } else {
                        current
                    }
                }
            });
            self.max = Some(match self.max.take() {
                None => max.clone().into_owned(),
                Some(current) => {
                    if compare(max, &current, unsigned)?.is_gt() {
                        max.clone().into_owned()
                    } else {
                        current
                    }
                }
            });
        }
        Ok(())
    }

    pub fn serialize(&self) -> Statistics {
        serialize_statistics(self.min.as_ref(), self.max.as_ref(), self.null_count)
    }

    pub fn reset(&mut self) {
        self.min = None;
        self.max = None;
        self.null_count = 0;
    }
}
