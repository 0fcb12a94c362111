// see https://github.com/apache/parquet-format/blob/master/LogicalTypes.md
use crate::error::{Error, Result};

pub use crate::parquet_bridge::{
    GroupLogicalType, IntegerType, PrimitiveLogicalType, Repetition, TimeUnit,
};

/// The set of physical types of a parquet file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    /// The payload is the number of bytes of each value.
    FixedLenByteArray(usize),
}

impl PhysicalType {
    /// The size in bytes of each value, or `None` for `BYTE_ARRAY`.
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            PhysicalType::Boolean => Some(1),
            PhysicalType::Int32 | PhysicalType::Float => Some(4),
            PhysicalType::Int64 | PhysicalType::Double => Some(8),
            PhysicalType::Int96 => Some(12),
            PhysicalType::ByteArray => None,
            PhysicalType::FixedLenByteArray(size) => Some(*size),
        }
    }
}

/// The deprecated converted types, carried for compatibility with readers
/// that do not understand logical types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveConvertedType {
    Utf8,
    Enum,
    /// (precision, scale)
    Decimal(usize, usize),
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Json,
    Bson,
    Interval,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupConvertedType {
    List,
    Map,
    MapKeyValue,
}

/// Name, repetition and optional field id, common to groups and
/// primitives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub name: String,
    pub repetition: Repetition,
    pub id: Option<i32>,
}

/// A leaf node: a physical type plus its logical annotations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveType {
    pub field_info: FieldInfo,
    pub logical_type: Option<PrimitiveLogicalType>,
    pub converted_type: Option<PrimitiveConvertedType>,
    pub physical_type: PhysicalType,
}

impl PrimitiveType {
    /// A plain, required leaf without annotations.
    pub fn from_physical(name: String, physical_type: PhysicalType) -> Self {
        Self {
            field_info: FieldInfo {
                name,
                repetition: Repetition::Required,
                id: None,
            },
            logical_type: None,
            converted_type: None,
            physical_type,
        }
    }

    /// Whether [`crate::column::ColumnBuffer::less`] compares integers as
    /// unsigned for this leaf.
    pub fn is_unsigned(&self) -> bool {
        match (&self.logical_type, &self.converted_type) {
            (Some(PrimitiveLogicalType::Integer(t)), _) => !t.is_signed(),
            (
                _,
                Some(
                    PrimitiveConvertedType::Uint8
                    | PrimitiveConvertedType::Uint16
                    | PrimitiveConvertedType::Uint32
                    | PrimitiveConvertedType::Uint64,
                ),
            ) => true,
            _ => false,
        }
    }
}

/// Representation of a parquet type: a leaf or a group of named fields.
/// The root of a schema is not represented here; a
/// [`crate::metadata::SchemaDescriptor`] holds the root name and fields.
#[derive(Clone, Debug, PartialEq)]
pub enum ParquetType {
    PrimitiveType(PrimitiveType),
    GroupType {
        field_info: FieldInfo,
        logical_type: Option<GroupLogicalType>,
        converted_type: Option<GroupConvertedType>,
        fields: Vec<ParquetType>,
    },
}

impl ParquetType {
    pub fn field_info(&self) -> &FieldInfo {
        match self {
            Self::PrimitiveType(primitive) => &primitive.field_info,
            Self::GroupType { field_info, .. } => field_info,
        }
    }

    pub fn name(&self) -> &str {
        &self.field_info().name
    }

    pub fn repetition(&self) -> Repetition {
        self.field_info().repetition
    }

    /// The number of leaves under this node, in pre-order.
    pub fn num_leaves(&self) -> usize {
        match self {
            Self::PrimitiveType(_) => 1,
            Self::GroupType { fields, .. } => fields.iter().map(|f| f.num_leaves()).sum(),
        }
    }

    pub fn from_physical(name: String, physical_type: PhysicalType) -> Self {
        Self::PrimitiveType(PrimitiveType::from_physical(name, physical_type))
    }

    pub fn from_group(
        name: String,
        repetition: Repetition,
        converted_type: Option<GroupConvertedType>,
        logical_type: Option<GroupLogicalType>,
        fields: Vec<ParquetType>,
        id: Option<i32>,
    ) -> Self {
        Self::GroupType {
            field_info: FieldInfo {
                name,
                repetition,
                id,
            },
            logical_type,
            converted_type,
            fields,
        }
    }

    pub fn try_from_primitive(
        name: String,
        physical_type: PhysicalType,
        repetition: Repetition,
        converted_type: Option<PrimitiveConvertedType>,
        logical_type: Option<PrimitiveLogicalType>,
        id: Option<i32>,
    ) -> Result<Self> {
        check_converted_invariants(&physical_type, &converted_type)?;
        check_logical_invariants(&physical_type, &logical_type)?;

        Ok(Self::PrimitiveType(PrimitiveType {
            field_info: FieldInfo {
                name,
                repetition,
                id,
            },
            logical_type,
            converted_type,
            physical_type,
        }))
    }
}

fn check_decimal_backing(physical_type: &PhysicalType) -> Result<()> {
    match physical_type {
        PhysicalType::Int32 | PhysicalType::Int64 | PhysicalType::FixedLenByteArray(_) => Ok(()),
        // rejected at configuration time rather than leaving an
        // unreachable write path
        other => Err(Error::invalid(format!(
            "DECIMAL is only supported over INT32, INT64 and FIXED_LEN_BYTE_ARRAY, not {:?}",
            other
        ))),
    }
}

fn check_decimal_bounds(
    physical_type: &PhysicalType,
    precision: usize,
    scale: usize,
) -> Result<()> {
    if precision < 1 {
        return Err(Error::invalid(format!(
            "DECIMAL precision must be larger than 0, got {}",
            precision
        )));
    }
    if scale > precision {
        return Err(Error::invalid(format!(
            "DECIMAL scale {} must not exceed the precision {}",
            scale, precision
        )));
    }
    let max_precision = match physical_type {
        PhysicalType::Int32 => Some(9),
        PhysicalType::Int64 => Some(18),
        PhysicalType::FixedLenByteArray(size) => {
            // 2^(8 * size - 1) - 1 has floor(log10) + 1 digits
            Some((2.0f64.powi(8 * *size as i32 - 1) - 1.0).log10().floor() as usize + 1)
        }
        _ => None,
    };
    if let Some(max_precision) = max_precision {
        if precision > max_precision {
            return Err(Error::invalid(format!(
                "precision {} does not fit {:?} (maximum {})",
                precision, physical_type, max_precision
            )));
        }
    }
    Ok(())
}

fn check_converted_invariants(
    physical_type: &PhysicalType,
    converted_type: &Option<PrimitiveConvertedType>,
) -> Result<()> {
    let converted_type = match converted_type {
        Some(converted_type) => converted_type,
        None => return Ok(()),
    };
    use PrimitiveConvertedType::*;
    match converted_type {
        Utf8 | Enum | Json | Bson => {
            if physical_type != &PhysicalType::ByteArray {
                return Err(Error::invalid(format!(
                    "{:?} can only annotate BYTE_ARRAY fields",
                    converted_type
                )));
            }
        }
        Decimal(precision, scale) => {
            check_decimal_backing(physical_type)?;
            check_decimal_bounds(physical_type, *precision, *scale)?;
        }
        Date | TimeMillis | Uint8 | Uint16 | Uint32 | Int8 | Int16 | Int32 => {
            if physical_type != &PhysicalType::Int32 {
                return Err(Error::invalid(format!(
                    "{:?} can only annotate INT32",
                    converted_type
                )));
            }
        }
        TimeMicros | TimestampMillis | TimestampMicros | Uint64 | Int64 => {
            if physical_type != &PhysicalType::Int64 {
                return Err(Error::invalid(format!(
                    "{:?} can only annotate INT64",
                    converted_type
                )));
            }
        }
        Interval => {
            if physical_type != &PhysicalType::FixedLenByteArray(12) {
                return Err(Error::invalid(
                    "INTERVAL can only annotate FIXED_LEN_BYTE_ARRAY(12)",
                ));
            }
        }
    };
    Ok(())
}

fn check_logical_invariants(
    physical_type: &PhysicalType,
    logical_type: &Option<PrimitiveLogicalType>,
) -> Result<()> {
    let logical_type = match logical_type {
        Some(logical_type) => *logical_type,
        None => return Ok(()),
    };
    use PrimitiveLogicalType::*;
    match logical_type {
        Enum | String | Json | Bson => {
            if physical_type != &PhysicalType::ByteArray {
                return Err(Error::invalid(format!(
                    "{:?} can only annotate BYTE_ARRAY fields",
                    logical_type
                )));
            }
        }
        Decimal(precision, scale) => {
            check_decimal_backing(physical_type)?;
            check_decimal_bounds(physical_type, precision, scale)?;
        }
        Date => {
            if physical_type != &PhysicalType::Int32 {
                return Err(Error::invalid("DATE can only annotate INT32"));
            }
        }
        Time { unit, .. } => match (unit, physical_type) {
            (TimeUnit::Milliseconds, PhysicalType::Int32)
            | (TimeUnit::Microseconds, PhysicalType::Int64)
            | (TimeUnit::Nanoseconds, PhysicalType::Int64) => {}
            _ => {
                return Err(Error::invalid(format!(
                    "TIME with unit {:?} cannot annotate {:?}",
                    unit, physical_type
                )))
            }
        },
        Timestamp { .. } | Integer(IntegerType::Int64) | Integer(IntegerType::UInt64) => {
            if physical_type != &PhysicalType::Int64 {
                return Err(Error::invalid(format!(
                    "{:?} can only annotate INT64",
                    logical_type
                )));
            }
        }
        Integer(_) => {
            if physical_type != &PhysicalType::Int32 {
                return Err(Error::invalid(format!(
                    "{:?} can only annotate INT32",
                    logical_type
                )));
            }
        }
        Uuid => {
            if physical_type != &PhysicalType::FixedLenByteArray(16) {
                return Err(Error::invalid(
                    "UUID can only annotate FIXED_LEN_BYTE_ARRAY(16)",
                ));
            }
        }
        Unknown => {}
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_over_byte_array_is_rejected() {
        let result = ParquetType::try_from_primitive(
            "d".to_string(),
            PhysicalType::ByteArray,
            Repetition::Required,
            None,
            Some(PrimitiveLogicalType::Decimal(10, 2)),
            None,
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn decimal_precision_must_fit_backing() {
        let result = ParquetType::try_from_primitive(
            "d".to_string(),
            PhysicalType::Int32,
            Repetition::Required,
            Some(PrimitiveConvertedType::Decimal(10, 2)),
            None,
            None,
        );
        assert!(result.is_err());

        let result = ParquetType::try_from_primitive(
            "d".to_string(),
            PhysicalType::Int32,
            Repetition::Required,
            Some(PrimitiveConvertedType::Decimal(9, 2)),
            None,
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn utf8_requires_byte_array() {
        let result = ParquetType::try_from_primitive(
            "s".to_string(),
            PhysicalType::Int32,
            Repetition::Required,
            Some(PrimitiveConvertedType::Utf8),
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn leaf_counting() {
        let tree = ParquetType::from_group(
            "g".to_string(),
            Repetition::Optional,
            None,
            None,
            vec![
                ParquetType::from_physical("a".to_string(), PhysicalType::Int32),
                ParquetType::from_group(
                    "h".to_string(),
                    Repetition::Repeated,
                    None,
                    None,
                    vec![ParquetType::from_physical(
                        "b".to_string(),
                        PhysicalType::Double,
                    )],
                    None,
                ),
            ],
            None,
        );
        assert_eq!(tree.num_leaves(), 2);
    }
}
