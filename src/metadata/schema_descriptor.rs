use parquet_format_safe::SchemaElement;

use crate::error::{Error, Result};
use crate::schema::io_thrift;
use crate::schema::types::{ParquetType, Repetition};
use crate::{MAX_COLUMN_DEPTH, MAX_COLUMN_INDEX, MAX_LEVEL};

use super::column_descriptor::{ColumnDescriptor, Descriptor};
use super::column_path::ColumnPath;

/// A schema descriptor: the tree of fields of a file together with the
/// descriptors of all leaf columns, in depth-first order. Leaf indices are
/// dense, `0..num_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    name: String,
    fields: Vec<ParquetType>,
    leaves: Vec<ColumnDescriptor>,
}

impl SchemaDescriptor {
    pub fn try_new(name: String, fields: Vec<ParquetType>) -> Result<Self> {
        let mut leaves = vec![];
        for field in &fields {
            let mut path = vec![];
            build_tree(field, 0, 0, 0, &mut leaves, &mut path)?;
        }
        if leaves.len() > MAX_COLUMN_INDEX {
            return Err(Error::invalid(format!(
                "the schema has {} leaf columns; the maximum is {}",
                leaves.len(),
                MAX_COLUMN_INDEX
            )));
        }
        Ok(Self {
            name,
            fields,
            leaves,
        })
    }

    /// The [`ColumnDescriptor`] (leaf) of position `i`.
    pub fn column(&self, i: usize) -> &ColumnDescriptor {
        &self.leaves[i]
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.leaves
    }

    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    /// The fields of the root of the schema.
    pub fn fields(&self) -> &[ParquetType] {
        &self.fields
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The leaf whose path equals `path`, if any.
    pub fn leaf_by_path(&self, path: &ColumnPath) -> Option<&ColumnDescriptor> {
        self.leaves.iter().find(|leaf| &leaf.path_in_schema == path)
    }

    pub(crate) fn to_thrift(&self) -> Vec<SchemaElement> {
        io_thrift::to_thrift(&self.name, &self.fields)
    }

    pub(crate) fn try_from_thrift(elements: &[SchemaElement]) -> Result<Self> {
        let (name, fields) = io_thrift::from_thrift(elements)?;
        Self::try_new(name, fields)
    }
}

fn build_tree<'a>(
    tp: &'a ParquetType,
    mut max_rep_level: u16,
    mut max_def_level: u16,
    depth: usize,
    leaves: &mut Vec<ColumnDescriptor>,
    path_so_far: &mut Vec<&'a str>,
) -> Result<()> {
    if depth >= MAX_COLUMN_DEPTH {
        return Err(Error::invalid(format!(
            "the schema exceeds the maximum nesting depth of {}",
            MAX_COLUMN_DEPTH
        )));
    }
    path_so_far.push(tp.name());
    match tp.repetition() {
        Repetition::Optional => {
            max_def_level += 1;
        }
        Repetition::Repeated => {
            max_def_level += 1;
            max_rep_level += 1;
        }
        Repetition::Required => {}
    }
    if max_def_level > MAX_LEVEL || max_rep_level > MAX_LEVEL {
        return Err(Error::invalid(format!(
            "the schema exceeds the maximum level of {}",
            MAX_LEVEL
        )));
    }

    match tp {
        ParquetType::PrimitiveType(primitive) => {
            let path_in_schema =
                ColumnPath::new(path_so_far.iter().copied().map(String::from).collect());
            leaves.push(ColumnDescriptor::new(
                Descriptor {
                    primitive_type: primitive.clone(),
                    max_def_level,
                    max_rep_level,
                },
                path_in_schema,
                leaves.len(),
            ));
        }
        ParquetType::GroupType { fields, .. } => {
            for field in fields {
                build_tree(
                    field,
                    max_rep_level,
                    max_def_level,
                    depth + 1,
                    leaves,
                    path_so_far,
                )?;
                path_so_far.pop();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::PhysicalType;

    fn nested_schema() -> SchemaDescriptor {
        // message schema {
        //   required int32 a;
        //   optional group b {
        //     repeated group item { optional binary s; }
        //   }
        // }
        let item = ParquetType::from_group(
            "item".to_string(),
            Repetition::Repeated,
            None,
            None,
            vec![ParquetType::try_from_primitive(
                "s".to_string(),
                PhysicalType::ByteArray,
                Repetition::Optional,
                None,
                None,
                None,
            )
            .unwrap()],
            None,
        );
        let b = ParquetType::from_group(
            "b".to_string(),
            Repetition::Optional,
            None,
            None,
            vec![item],
            None,
        );
        SchemaDescriptor::try_new(
            "schema".to_string(),
            vec![
                ParquetType::from_physical("a".to_string(), PhysicalType::Int32),
                b,
            ],
        )
        .unwrap()
    }

    #[test]
    fn levels_and_indices() {
        let schema = nested_schema();
        assert_eq!(schema.num_columns(), 2);

        let a = schema.column(0);
        assert_eq!(a.max_def_level(), 0);
        assert_eq!(a.max_rep_level(), 0);
        assert_eq!(a.leaf_index, 0);
        assert_eq!(a.path_in_schema(), &ColumnPath::from("a"));

        let s = schema.column(1);
        assert_eq!(s.max_def_level(), 3);
        assert_eq!(s.max_rep_level(), 1);
        assert_eq!(s.leaf_index, 1);
        assert_eq!(s.path_in_schema(), &ColumnPath::from("b.item.s"));
    }

    #[test]
    fn thrift_round_trip() {
        let schema = nested_schema();
        let elements = schema.to_thrift();
        let recovered = SchemaDescriptor::try_from_thrift(&elements).unwrap();
        assert_eq!(recovered, schema);
    }
}
