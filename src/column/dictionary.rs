use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::schema::types::PhysicalType;
use crate::value::{compare, Scalar};

use super::buffer::TypedValues;

/// A per-row-group map from values to dense indices.
///
/// Values are stored in insertion order; indices are stable for the life
/// of the row group. The reverse map is keyed by the canonical byte form
/// and built lazily on the first insert.
#[derive(Debug, Clone)]
pub struct Dictionary {
    values: TypedValues,
    map: Option<HashMap<Vec<u8>, u32>>,
}

impl Dictionary {
    pub fn new(physical_type: PhysicalType) -> Self {
        Self {
            values: TypedValues::new(physical_type),
            map: None,
        }
    }

    /// A read-side dictionary over already-decoded unique values.
    pub fn from_values(values: TypedValues) -> Self {
        Self { values, map: None }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The unique values, in index order.
    pub fn values(&self) -> &TypedValues {
        &self.values
    }

    fn ensure_map(&mut self) {
        if self.map.is_none() {
            let mut map = HashMap::with_capacity(self.values.len());
            let mut key = vec![];
            for index in 0..self.values.len() {
                key.clear();
                self.values.bytes_at(index, &mut key);
                map.insert(key.clone(), index as u32);
            }
            self.map = Some(map);
        }
    }

    /// Maps each input value to its index, appending unknown values.
    /// Amortized O(1) per value.
    pub fn insert(&mut self, values: &TypedValues, indexes: &mut Vec<u32>) -> Result<()> {
        if values.kind() != self.values.kind() {
            return Err(Error::invalid(format!(
                "a {:?} dictionary cannot index {:?} values",
                self.values.kind(),
                values.kind()
            )));
        }
        self.ensure_map();
        let map = self.map.as_mut().unwrap();

        indexes.reserve(values.len());
        let mut key = vec![];
        for i in 0..values.len() {
            key.clear();
            values.bytes_at(i, &mut key);
            if let Some(index) = map.get(&key) {
                indexes.push(*index);
            } else {
                let index = self.values.len() as u32;
                self.values.push(&values.scalar_at(i))?;
                map.insert(key.clone(), index);
                indexes.push(index);
            }
        }
        Ok(())
    }

    /// Maps indices back to their values, appending to `out` in input
    /// order.
    pub fn lookup(&self, indexes: &[u32], out: &mut TypedValues) -> Result<()> {
        for index in indexes {
            let index = *index as usize;
            if index >= self.values.len() {
                return Err(Error::corrupt(format!(
                    "dictionary index {} out of a dictionary of {} values",
                    index,
                    self.values.len()
                )));
            }
            out.push(&self.values.scalar_at(index))?;
        }
        Ok(())
    }

    /// The minimum and maximum of the values referenced by `indexes`, in
    /// a single pass over the type's natural order.
    pub fn bounds(&self, indexes: &[u32], unsigned: bool) -> Result<Option<(Scalar, Scalar)>> {
        let mut result: Option<(u32, u32)> = None;
        for index in indexes {
            if *index as usize >= self.values.len() {
                return Err(Error::corrupt(format!(
                    "dictionary index {} out of a dictionary of {} values",
                    index,
                    self.values.len()
                )));
            }
            result = Some(match result {
                None => (*index, *index),
                Some((min, max)) => {
                    let value = self.values.scalar_at(*index as usize);
                    let new_min = if compare(&value, &self.values.scalar_at(min as usize), unsigned)?
                        .is_lt()
                    {
                        *index
                    } else {
                        min
                    };
                    let new_max = if compare(&value, &self.values.scalar_at(max as usize), unsigned)?
                        .is_gt()
                    {
                        *index
                    } else {
                        max
                    };
                    (new_min, new_max)
                }
            });
        }
        Ok(result.map(|(min, max)| {
            (
                self.values.scalar_at(min as usize),
                self.values.scalar_at(max as usize),
            )
        }))
    }

    /// Empties values and map; capacity is retained.
    pub fn reset(&mut self) {
        self.values.clear();
        if let Some(map) = self.map.as_mut() {
            map.clear();
        }
    }
}
