use crate::schema::types::{PhysicalType, PrimitiveType};
use crate::value::Kind;

use super::column_path::ColumnPath;

/// A descriptor of a leaf: its primitive type and the maximum levels
/// needed to shred and re-assemble it.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// The leaf's type.
    pub primitive_type: PrimitiveType,

    /// The maximum definition level: how many of its ancestors (itself
    /// included) are optional or repeated.
    pub max_def_level: u16,

    /// The maximum repetition level: how many of its ancestors (itself
    /// included) are repeated.
    pub max_rep_level: u16,
}

/// A descriptor of a leaf column inside a schema: the [`Descriptor`] plus
/// the column's path and dense leaf index.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub descriptor: Descriptor,

    /// The path of this column, e.g. "a.b.c".
    pub path_in_schema: ColumnPath,

    /// The pre-order index of this leaf among the schema's leaves.
    pub leaf_index: usize,
}

impl ColumnDescriptor {
    pub fn new(descriptor: Descriptor, path_in_schema: ColumnPath, leaf_index: usize) -> Self {
        Self {
            descriptor,
            path_in_schema,
            leaf_index,
        }
    }

    pub fn max_def_level(&self) -> u16 {
        self.descriptor.max_def_level
    }

    pub fn max_rep_level(&self) -> u16 {
        self.descriptor.max_rep_level
    }

    pub fn path_in_schema(&self) -> &ColumnPath {
        &self.path_in_schema
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.descriptor.primitive_type.physical_type
    }

    pub fn kind(&self) -> Kind {
        self.physical_type().into()
    }

    /// The column name (the last segment of its path).
    pub fn name(&self) -> &str {
        &self.descriptor.primitive_type.field_info.name
    }
}
