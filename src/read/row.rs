use std::collections::VecDeque;
use std::io::{Read, Seek};

use crate::error::{Error, Result};
use crate::metadata::FileMetaData;
use crate::schema::types::{ParquetType, Repetition};
use crate::shred::RowValue;
use crate::value::{Scalar, Value};

use super::column::ColumnChunkReader;
use super::indexes::read_pages_locations;

/// Assembles rows of one row group from its parallel column readers,
/// driven by repetition levels for record boundaries and definition
/// levels for nulls.
pub struct RowGroupReader {
    fields: Vec<ParquetType>,
    columns: Vec<ColumnChunkReader>,
    num_rows: usize,
    current_row: usize,
}

impl RowGroupReader {
    /// Opens every column chunk of `row_group`, together with its offset
    /// index when the file carries one.
    pub fn try_new<R: Read + Seek>(
        reader: &mut R,
        metadata: &FileMetaData,
        row_group: usize,
    ) -> Result<Self> {
        let group = metadata.row_groups.get(row_group).ok_or_else(|| {
            Error::oob(format!(
                "row group {} of a file with {}",
                row_group,
                metadata.row_groups.len()
            ))
        })?;

        let locations = read_pages_locations(reader, group.columns())?;
        let columns = group
            .columns()
            .iter()
            .zip(locations.into_iter())
            .map(|(chunk, locations)| ColumnChunkReader::try_new(reader, chunk, locations))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fields: metadata.schema().fields().to_vec(),
            columns,
            num_rows: group.num_rows(),
            current_row: 0,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn current_row(&self) -> usize {
        self.current_row
    }

    /// Direct access to the column readers, one per leaf.
    pub fn columns(&mut self) -> &mut [ColumnChunkReader] {
        &mut self.columns
    }

    /// Positions every column reader at `row`.
    pub fn seek_to_row(&mut self, row: usize) -> Result<()> {
        if row > self.num_rows {
            return Err(Error::oob(format!(
                "row {} of a row group with {} rows",
                row, self.num_rows
            )));
        }
        for column in self.columns.iter_mut() {
            column.seek_to_row(row)?;
        }
        self.current_row = row;
        Ok(())
    }

    /// Reads and assembles the next row, or `None` after the last one.
    pub fn read_row(&mut self) -> Result<Option<RowValue>> {
        if self.current_row >= self.num_rows {
            return Ok(None);
        }

        // gather this record's values: per leaf, the first value plus all
        // follow-ups whose repetition level is above zero
        let mut queues: Vec<VecDeque<Value<'static>>> = Vec::with_capacity(self.columns.len());
        for column in self.columns.iter_mut() {
            let mut queue = VecDeque::new();
            let first = column.next_value()?.ok_or_else(|| {
                Error::corrupt("a column chunk ended before the row group's last row")
            })?;
            queue.push_back(first);
            if column.descriptor().max_rep_level() > 0 {
                while let Some((rep, _)) = column.peek_levels()? {
                    if rep == 0 {
                        break;
                    }
                    // the value exists, peek just said so
                    queue.push_back(column.next_value()?.unwrap());
                }
            }
            queues.push(queue);
        }

        let mut entries = Vec::with_capacity(self.fields.len());
        let mut base_leaf = 0;
        for field in &self.fields {
            let value = assemble_field(field, &mut queues, base_leaf, 0, 0)?;
            entries.push((field.name().to_string(), value));
            base_leaf += field.num_leaves();
        }

        for (leaf, queue) in queues.iter().enumerate() {
            if !queue.is_empty() {
                return Err(Error::corrupt(format!(
                    "column {} has {} values left after its record ended",
                    leaf,
                    queue.len()
                )));
            }
        }

        self.current_row += 1;
        Ok(Some(RowValue::Group(entries)))
    }
}

/// Assembles a field instance, handling its repetition.
///
/// `parent_def` is the definition level confirmed by the ancestors,
/// `rep_depth` the number of repeated ancestors.
fn assemble_field(
    node: &ParquetType,
    queues: &mut [VecDeque<Value<'static>>],
    base_leaf: usize,
    parent_def: u16,
    rep_depth: u16,
) -> Result<RowValue> {
    match node.repetition() {
        Repetition::Required => {
            assemble_present(node, queues, base_leaf, parent_def, rep_depth)
        }
        Repetition::Optional => {
            let this_def = parent_def + 1;
            let head_def = head_def_level(queues, base_leaf)?;
            if head_def >= this_def {
                assemble_present(node, queues, base_leaf, this_def, rep_depth)
            } else {
                consume_nulls(node, queues, base_leaf)?;
                Ok(RowValue::Null)
            }
        }
        Repetition::Repeated => {
            let this_def = parent_def + 1;
            let this_rep = rep_depth + 1;
            let head_def = head_def_level(queues, base_leaf)?;
            if head_def < this_def {
                consume_nulls(node, queues, base_leaf)?;
                return Ok(RowValue::List(vec![]));
            }
            let mut items = vec![];
            loop {
                items.push(assemble_present(
                    node, queues, base_leaf, this_def, this_rep,
                )?);
                match queues[base_leaf].front() {
                    Some(next) if next.rep_level() >= this_rep => continue,
                    _ => break,
                }
            }
            Ok(RowValue::List(items))
        }
    }
}

/// Assembles a present (non-null) instance of `node`.
fn assemble_present(
    node: &ParquetType,
    queues: &mut [VecDeque<Value<'static>>],
    base_leaf: usize,
    def: u16,
    rep_depth: u16,
) -> Result<RowValue> {
    match node {
        ParquetType::PrimitiveType(_) => {
            let value = queues[base_leaf]
                .pop_front()
                .ok_or_else(|| Error::corrupt("a leaf ran out of values mid-record"))?;
            match value.scalar() {
                Some(scalar) => Ok(scalar_to_row(scalar)),
                None => Err(Error::corrupt(
                    "a value marked present by its definition level is null",
                )),
            }
        }
        ParquetType::GroupType { fields, .. } => {
            let mut entries = Vec::with_capacity(fields.len());
            let mut offset = base_leaf;
            for field in fields {
                let value = assemble_field(field, queues, offset, def, rep_depth)?;
                entries.push((field.name().to_string(), value));
                offset += field.num_leaves();
            }
            Ok(RowValue::Group(entries))
        }
    }
}

/// The definition level at the head of the first leaf under a node.
fn head_def_level(queues: &[VecDeque<Value<'static>>], base_leaf: usize) -> Result<u16> {
    queues[base_leaf]
        .front()
        .map(|value| value.def_level())
        .ok_or_else(|| Error::corrupt("a leaf ran out of values mid-record"))
}

/// Consumes the one pending value of every leaf under an absent subtree.
fn consume_nulls(
    node: &ParquetType,
    queues: &mut [VecDeque<Value<'static>>],
    base_leaf: usize,
) -> Result<()> {
    let mut leaf = base_leaf;
    consume_nulls_helper(node, queues, &mut leaf)
}

fn consume_nulls_helper(
    node: &ParquetType,
    queues: &mut [VecDeque<Value<'static>>],
    leaf: &mut usize,
) -> Result<()> {
    match node {
        ParquetType::PrimitiveType(_) => {
            queues[*leaf]
                .pop_front()
                .ok_or_else(|| Error::corrupt("a leaf ran out of values mid-record"))?;
            *leaf += 1;
            Ok(())
        }
        ParquetType::GroupType { fields, .. } => {
            for field in fields {
                consume_nulls_helper(field, queues, leaf)?;
            }
            Ok(())
        }
    }
}

fn scalar_to_row(scalar: &Scalar) -> RowValue {
    match scalar {
        Scalar::Boolean(value) => RowValue::Boolean(*value),
        Scalar::Int32(value) => RowValue::Int32(*value),
        Scalar::Int64(value) => RowValue::Int64(*value),
        Scalar::Int96(value) => RowValue::Int96(*value),
        Scalar::Float(value) => RowValue::Float(*value),
        Scalar::Double(value) => RowValue::Double(*value),
        Scalar::ByteArray(value) => RowValue::ByteArray(value.to_vec()),
        Scalar::FixedLenByteArray(value) => RowValue::FixedLenByteArray(value.to_vec()),
    }
}
