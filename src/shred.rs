//! Record shredding: converting nested rows into per-column value streams
//! with repetition and definition levels.
//!
//! Rows are a runtime tagged tree ([`RowValue`]) interpreted against the
//! schema; the [`Shredder`] walks both trees and emits one [`Value`] per
//! leaf per (record × repetition), ready for
//! [`crate::column::ColumnBuffer::write_values`].

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::metadata::SchemaDescriptor;
use crate::schema::types::{ParquetType, PhysicalType, Repetition};
use crate::value::{Scalar, Value};

/// A dynamically-typed row value: a scalar, a null, a group of named
/// fields, or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96([u32; 3]),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    FixedLenByteArray(Vec<u8>),
    Group(Vec<(String, RowValue)>),
    List(Vec<RowValue>),
}

impl RowValue {
    /// A group from `(name, value)` pairs.
    pub fn group<I: IntoIterator<Item = (String, RowValue)>>(fields: I) -> Self {
        RowValue::Group(fields.into_iter().collect())
    }

    /// A UTF-8 string as a byte array.
    pub fn utf8<S: AsRef<str>>(value: S) -> Self {
        RowValue::ByteArray(value.as_ref().as_bytes().to_vec())
    }

    fn field(&self, name: &str) -> Option<&RowValue> {
        match self {
            RowValue::Group(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, RowValue::Null)
    }
}

impl From<bool> for RowValue {
    fn from(value: bool) -> Self {
        RowValue::Boolean(value)
    }
}

impl From<i32> for RowValue {
    fn from(value: i32) -> Self {
        RowValue::Int32(value)
    }
}

impl From<i64> for RowValue {
    fn from(value: i64) -> Self {
        RowValue::Int64(value)
    }
}

impl From<f32> for RowValue {
    fn from(value: f32) -> Self {
        RowValue::Float(value)
    }
}

impl From<f64> for RowValue {
    fn from(value: f64) -> Self {
        RowValue::Double(value)
    }
}

impl From<&str> for RowValue {
    fn from(value: &str) -> Self {
        RowValue::utf8(value)
    }
}

/// Walks rows against a schema, producing per-column values with levels.
#[derive(Debug, Clone)]
pub struct Shredder<'a> {
    schema: &'a SchemaDescriptor,
}

impl<'a> Shredder<'a> {
    pub fn new(schema: &'a SchemaDescriptor) -> Self {
        Self { schema }
    }

    /// Shreds one record into `columns`, appending exactly one entry per
    /// leaf per (record × repetition). `columns` must have one slot per
    /// leaf.
    pub fn shred<'v>(&self, row: &'v RowValue, columns: &mut [Vec<Value<'v>>]) -> Result<()> {
        if columns.len() != self.schema.num_columns() {
            return Err(Error::invalid(format!(
                "{} output columns for a schema of {} leaves",
                columns.len(),
                self.schema.num_columns()
            )));
        }
        if !matches!(row, RowValue::Group(_)) {
            return Err(Error::SchemaMismatch(
                "a record must be a group of named fields".to_string(),
            ));
        }
        let mut leaf = 0;
        for field in self.schema.fields() {
            shred_field(field, row.field(field.name()), 0, 0, 0, &mut leaf, columns)?;
        }
        debug_assert_eq!(leaf, columns.len());
        Ok(())
    }
}

/// Handles the repetition of `node`, then descends.
///
/// `rep` is the repetition level to attach to the first atom emitted by
/// this subtree; `def` the definition level confirmed so far; `rep_depth`
/// the number of repeated ancestors.
fn shred_field<'v>(
    node: &ParquetType,
    value: Option<&'v RowValue>,
    rep: u16,
    def: u16,
    rep_depth: u16,
    leaf: &mut usize,
    columns: &mut [Vec<Value<'v>>],
) -> Result<()> {
    match node.repetition() {
        Repetition::Required => match value {
            Some(value) if !value.is_null() => {
                shred_present(node, value, rep, def, rep_depth, leaf, columns)
            }
            _ => Err(Error::SchemaMismatch(format!(
                "required field {} is missing",
                node.name()
            ))),
        },
        Repetition::Optional => match value {
            Some(value) if !value.is_null() => {
                shred_present(node, value, rep, def + 1, rep_depth, leaf, columns)
            }
            _ => {
                shred_nulls(node, rep, def, leaf, columns);
                Ok(())
            }
        },
        Repetition::Repeated => match value {
            None => {
                shred_nulls(node, rep, def, leaf, columns);
                Ok(())
            }
            Some(RowValue::Null) => {
                shred_nulls(node, rep, def, leaf, columns);
                Ok(())
            }
            Some(RowValue::List(items)) => {
                if items.is_empty() {
                    shred_nulls(node, rep, def, leaf, columns);
                    return Ok(());
                }
                let start = *leaf;
                for (index, item) in items.iter().enumerate() {
                    *leaf = start;
                    let rep = if index == 0 { rep } else { rep_depth + 1 };
                    shred_present(node, item, rep, def + 1, rep_depth + 1, leaf, columns)?;
                }
                Ok(())
            }
            Some(other) => Err(Error::SchemaMismatch(format!(
                "repeated field {} must be a list, found {:?}",
                node.name(),
                other
            ))),
        },
    }
}

/// Descends into a present (non-null) subtree instance.
fn shred_present<'v>(
    node: &ParquetType,
    value: &'v RowValue,
    rep: u16,
    def: u16,
    rep_depth: u16,
    leaf: &mut usize,
    columns: &mut [Vec<Value<'v>>],
) -> Result<()> {
    match node {
        ParquetType::PrimitiveType(primitive) => {
            let scalar = coerce(value, primitive.physical_type, node.name())?;
            columns[*leaf].push(Value::new(scalar).level(rep, def, *leaf));
            *leaf += 1;
            Ok(())
        }
        ParquetType::GroupType { fields, .. } => {
            if !matches!(value, RowValue::Group(_)) {
                return Err(Error::SchemaMismatch(format!(
                    "group field {} must hold a group, found {:?}",
                    node.name(),
                    value
                )));
            }
            for field in fields {
                shred_field(
                    field,
                    value.field(field.name()),
                    rep,
                    def,
                    rep_depth,
                    leaf,
                    columns,
                )?;
            }
            Ok(())
        }
    }
}

/// Emits one null per leaf under `node`, carrying the levels at which the
/// subtree turned out absent.
fn shred_nulls<'v>(
    node: &ParquetType,
    rep: u16,
    def: u16,
    leaf: &mut usize,
    columns: &mut [Vec<Value<'v>>],
) {
    match node {
        ParquetType::PrimitiveType(_) => {
            columns[*leaf].push(Value::null().level(rep, def, *leaf));
            *leaf += 1;
        }
        ParquetType::GroupType { fields, .. } => {
            for field in fields {
                shred_nulls(field, rep, def, leaf, columns);
            }
        }
    }
}

fn coerce<'v>(
    value: &'v RowValue,
    physical_type: PhysicalType,
    name: &str,
) -> Result<Scalar<'v>> {
    Ok(match (value, physical_type) {
        (RowValue::Boolean(v), PhysicalType::Boolean) => Scalar::Boolean(*v),
        (RowValue::Int32(v), PhysicalType::Int32) => Scalar::Int32(*v),
        (RowValue::Int64(v), PhysicalType::Int64) => Scalar::Int64(*v),
        (RowValue::Int96(v), PhysicalType::Int96) => Scalar::Int96(*v),
        (RowValue::Float(v), PhysicalType::Float) => Scalar::Float(*v),
        (RowValue::Double(v), PhysicalType::Double) => Scalar::Double(*v),
        (RowValue::ByteArray(v), PhysicalType::ByteArray) => {
            Scalar::ByteArray(Cow::Borrowed(v.as_slice()))
        }
        (RowValue::FixedLenByteArray(v), PhysicalType::FixedLenByteArray(size)) => {
            if v.len() != size {
                return Err(Error::SchemaMismatch(format!(
                    "field {} expects {} bytes, found {}",
                    name,
                    size,
                    v.len()
                )));
            }
            Scalar::FixedLenByteArray(Cow::Borrowed(v.as_slice()))
        }
        (value, physical_type) => {
            return Err(Error::SchemaMismatch(format!(
                "field {} of physical type {:?} cannot hold {:?}",
                name, physical_type, value
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags_schema() -> SchemaDescriptor {
        // message schema { repeated binary tags; }
        SchemaDescriptor::try_new(
            "schema".to_string(),
            vec![ParquetType::try_from_primitive(
                "tags".to_string(),
                PhysicalType::ByteArray,
                Repetition::Repeated,
                None,
                None,
                None,
            )
            .unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn repeated_levels() {
        let schema = tags_schema();
        let shredder = Shredder::new(&schema);
        let rows = [
            RowValue::group([(
                "tags".to_string(),
                RowValue::List(vec![RowValue::from("a"), RowValue::from("b")]),
            )]),
            RowValue::group([("tags".to_string(), RowValue::List(vec![]))]),
            RowValue::group([(
                "tags".to_string(),
                RowValue::List(vec![RowValue::from("c")]),
            )]),
        ];

        let mut columns = vec![vec![]];
        for row in &rows {
            shredder.shred(row, &mut columns).unwrap();
        }

        let reps = columns[0].iter().map(|v| v.rep_level()).collect::<Vec<_>>();
        let defs = columns[0].iter().map(|v| v.def_level()).collect::<Vec<_>>();
        assert_eq!(reps, vec![0, 1, 0, 0]);
        assert_eq!(defs, vec![1, 1, 0, 1]);
        assert!(columns[0][2].is_null());
    }

    #[test]
    fn optional_levels() {
        // message schema { required int32 a; optional int32 b; }
        let schema = SchemaDescriptor::try_new(
            "schema".to_string(),
            vec![
                ParquetType::from_physical("a".to_string(), PhysicalType::Int32),
                ParquetType::try_from_primitive(
                    "b".to_string(),
                    PhysicalType::Int32,
                    Repetition::Optional,
                    None,
                    None,
                    None,
                )
                .unwrap(),
            ],
        )
        .unwrap();
        let shredder = Shredder::new(&schema);

        let mut columns = vec![vec![], vec![]];
        let row = RowValue::group([
            ("a".to_string(), RowValue::from(1i32)),
            ("b".to_string(), RowValue::Null),
        ]);
        shredder.shred(&row, &mut columns).unwrap();
        let row = RowValue::group([("a".to_string(), RowValue::from(2i32))]);
        shredder.shred(&row, &mut columns).unwrap();

        assert_eq!(columns[0].len(), 2);
        assert!(columns[1].iter().all(|v| v.is_null()));
        assert!(columns[1].iter().all(|v| v.def_level() == 0));
    }

    #[test]
    fn missing_required_field_is_a_mismatch() {
        let schema = SchemaDescriptor::try_new(
            "schema".to_string(),
            vec![ParquetType::from_physical("a".to_string(), PhysicalType::Int32)],
        )
        .unwrap();
        let shredder = Shredder::new(&schema);
        let mut columns = vec![vec![]];
        let row = RowValue::group([]);
        assert!(matches!(
            shredder.shred(&row, &mut columns),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn nested_lists() {
        // message schema { repeated group xs { repeated int32 x; } }
        let schema = SchemaDescriptor::try_new(
            "schema".to_string(),
            vec![ParquetType::from_group(
                "xs".to_string(),
                Repetition::Repeated,
                None,
                None,
                vec![ParquetType::try_from_primitive(
                    "x".to_string(),
                    PhysicalType::Int32,
                    Repetition::Repeated,
                    None,
                    None,
                    None,
                )
                .unwrap()],
                None,
            )],
        )
        .unwrap();
        let shredder = Shredder::new(&schema);

        // [[1, 2], [3]]
        let row = RowValue::group([(
            "xs".to_string(),
            RowValue::List(vec![
                RowValue::group([(
                    "x".to_string(),
                    RowValue::List(vec![RowValue::from(1i32), RowValue::from(2i32)]),
                )]),
                RowValue::group([(
                    "x".to_string(),
                    RowValue::List(vec![RowValue::from(3i32)]),
                )]),
            ]),
        )]);
        let mut columns = vec![vec![]];
        shredder.shred(&row, &mut columns).unwrap();

        let reps = columns[0].iter().map(|v| v.rep_level()).collect::<Vec<_>>();
        let defs = columns[0].iter().map(|v| v.def_level()).collect::<Vec<_>>();
        assert_eq!(reps, vec![0, 2, 1]);
        assert_eq!(defs, vec![2, 2, 2]);
    }
}
