use parquet_format_safe::{ConvertedType, SchemaElement, Type};

use crate::error::{Error, Result};

use super::types::{
    GroupConvertedType, ParquetType, PhysicalType, PrimitiveConvertedType, Repetition,
};

fn type_to_physical_type(type_: &Type, length: Option<i32>) -> Result<PhysicalType> {
    Ok(match *type_ {
        Type::BOOLEAN => PhysicalType::Boolean,
        Type::INT32 => PhysicalType::Int32,
        Type::INT64 => PhysicalType::Int64,
        Type::INT96 => PhysicalType::Int96,
        Type::FLOAT => PhysicalType::Float,
        Type::DOUBLE => PhysicalType::Double,
        Type::BYTE_ARRAY => PhysicalType::ByteArray,
        Type::FIXED_LEN_BYTE_ARRAY => {
            let length = length.ok_or_else(|| {
                Error::corrupt("a length must be defined for FIXED_LEN_BYTE_ARRAY")
            })?;
            PhysicalType::FixedLenByteArray(length.try_into()?)
        }
        _ => return Err(Error::corrupt(format!("Type {:?} is out of range", type_))),
    })
}

pub(crate) fn physical_type_to_type(physical_type: &PhysicalType) -> (Type, Option<i32>) {
    match physical_type {
        PhysicalType::Boolean => (Type::BOOLEAN, None),
        PhysicalType::Int32 => (Type::INT32, None),
        PhysicalType::Int64 => (Type::INT64, None),
        PhysicalType::Int96 => (Type::INT96, None),
        PhysicalType::Float => (Type::FLOAT, None),
        PhysicalType::Double => (Type::DOUBLE, None),
        PhysicalType::ByteArray => (Type::BYTE_ARRAY, None),
        PhysicalType::FixedLenByteArray(length) => {
            (Type::FIXED_LEN_BYTE_ARRAY, Some(*length as i32))
        }
    }
}

fn converted_to_primitive_converted(
    converted: &ConvertedType,
    maybe_decimal: Option<(i32, i32)>,
) -> Result<PrimitiveConvertedType> {
    use PrimitiveConvertedType::*;
    Ok(match *converted {
        ConvertedType::UTF8 => Utf8,
        ConvertedType::ENUM => Enum,
        ConvertedType::DECIMAL => {
            if let Some((precision, scale)) = maybe_decimal {
                Decimal(precision.try_into()?, scale.try_into()?)
            } else {
                return Err(Error::corrupt("DECIMAL requires a precision and scale"));
            }
        }
        ConvertedType::DATE => Date,
        ConvertedType::TIME_MILLIS => TimeMillis,
        ConvertedType::TIME_MICROS => TimeMicros,
        ConvertedType::TIMESTAMP_MILLIS => TimestampMillis,
        ConvertedType::TIMESTAMP_MICROS => TimestampMicros,
        ConvertedType::UINT_8 => Uint8,
        ConvertedType::UINT_16 => Uint16,
        ConvertedType::UINT_32 => Uint32,
        ConvertedType::UINT_64 => Uint64,
        ConvertedType::INT_8 => Int8,
        ConvertedType::INT_16 => Int16,
        ConvertedType::INT_32 => Int32,
        ConvertedType::INT_64 => Int64,
        ConvertedType::JSON => Json,
        ConvertedType::BSON => Bson,
        ConvertedType::INTERVAL => Interval,
        _ => {
            return Err(Error::corrupt(format!(
                "ConvertedType {:?} cannot annotate a primitive field",
                converted
            )))
        }
    })
}

fn primitive_converted_to_converted(
    converted: &PrimitiveConvertedType,
) -> (ConvertedType, Option<(i32, i32)>) {
    use PrimitiveConvertedType::*;
    match converted {
        Utf8 => (ConvertedType::UTF8, None),
        Enum => (ConvertedType::ENUM, None),
        Decimal(precision, scale) => (
            ConvertedType::DECIMAL,
            Some((*precision as i32, *scale as i32)),
        ),
        Date => (ConvertedType::DATE, None),
        TimeMillis => (ConvertedType::TIME_MILLIS, None),
        TimeMicros => (ConvertedType::TIME_MICROS, None),
        TimestampMillis => (ConvertedType::TIMESTAMP_MILLIS, None),
        TimestampMicros => (ConvertedType::TIMESTAMP_MICROS, None),
        Uint8 => (ConvertedType::UINT_8, None),
        Uint16 => (ConvertedType::UINT_16, None),
        Uint32 => (ConvertedType::UINT_32, None),
        Uint64 => (ConvertedType::UINT_64, None),
        Int8 => (ConvertedType::INT_8, None),
        Int16 => (ConvertedType::INT_16, None),
        Int32 => (ConvertedType::INT_32, None),
        Int64 => (ConvertedType::INT_64, None),
        Json => (ConvertedType::JSON, None),
        Bson => (ConvertedType::BSON, None),
        Interval => (ConvertedType::INTERVAL, None),
    }
}

fn converted_to_group_converted(converted: &ConvertedType) -> Result<GroupConvertedType> {
    Ok(match *converted {
        ConvertedType::LIST => GroupConvertedType::List,
        ConvertedType::MAP => GroupConvertedType::Map,
        ConvertedType::MAP_KEY_VALUE => GroupConvertedType::MapKeyValue,
        _ => {
            return Err(Error::corrupt(format!(
                "ConvertedType {:?} cannot annotate a group",
                converted
            )))
        }
    })
}

fn group_converted_to_converted(converted: &GroupConvertedType) -> ConvertedType {
    match converted {
        GroupConvertedType::List => ConvertedType::LIST,
        GroupConvertedType::Map => ConvertedType::MAP,
        GroupConvertedType::MapKeyValue => ConvertedType::MAP_KEY_VALUE,
    }
}

/// Constructs the flat thrift representation of a schema by depth-first
/// traversal: a root element carrying the field count, then every node.
pub(crate) fn to_thrift(name: &str, fields: &[ParquetType]) -> Vec<SchemaElement> {
    let mut elements = Vec::with_capacity(1 + fields.len());
    elements.push(SchemaElement {
        type_: None,
        type_length: None,
        repetition_type: None,
        name: name.to_string(),
        num_children: Some(fields.len() as i32),
        converted_type: None,
        scale: None,
        precision: None,
        field_id: None,
        logical_type: None,
    });
    for field in fields {
        to_thrift_helper(field, &mut elements);
    }
    elements
}

fn to_thrift_helper(schema: &ParquetType, elements: &mut Vec<SchemaElement>) {
    match schema {
        ParquetType::PrimitiveType(primitive) => {
            let (type_, type_length) = physical_type_to_type(&primitive.physical_type);
            let (converted_type, maybe_decimal) = match &primitive.converted_type {
                Some(converted) => {
                    let (converted, maybe_decimal) = primitive_converted_to_converted(converted);
                    (Some(converted), maybe_decimal)
                }
                None => (None, None),
            };

            elements.push(SchemaElement {
                type_: Some(type_),
                type_length,
                repetition_type: Some(primitive.field_info.repetition.into()),
                name: primitive.field_info.name.clone(),
                num_children: None,
                converted_type,
                scale: maybe_decimal.map(|x| x.1),
                precision: maybe_decimal.map(|x| x.0),
                field_id: primitive.field_info.id,
                logical_type: primitive.logical_type.map(|x| x.into()),
            });
        }
        ParquetType::GroupType {
            field_info,
            logical_type,
            converted_type,
            fields,
        } => {
            elements.push(SchemaElement {
                type_: None,
                type_length: None,
                repetition_type: Some(field_info.repetition.into()),
                name: field_info.name.clone(),
                num_children: Some(fields.len() as i32),
                converted_type: converted_type.as_ref().map(group_converted_to_converted),
                scale: None,
                precision: None,
                field_id: field_info.id,
                logical_type: logical_type.map(|x| x.into()),
            });

            for field in fields {
                to_thrift_helper(field, elements);
            }
        }
    }
}

/// Parses the flat thrift schema back into the root name and field trees.
pub(crate) fn from_thrift(elements: &[SchemaElement]) -> Result<(String, Vec<ParquetType>)> {
    let root = elements
        .first()
        .ok_or_else(|| Error::corrupt("a schema must have at least a root element"))?;
    let num_children = root.num_children.unwrap_or(0);
    if num_children < 0 {
        return Err(Error::corrupt("the root element declares negative children"));
    }

    let mut fields = Vec::with_capacity(num_children as usize);
    let mut index = 1;
    for _ in 0..num_children {
        let (next_index, field) = from_thrift_helper(elements, index)?;
        index = next_index;
        fields.push(field);
    }
    if index != elements.len() {
        return Err(Error::corrupt(format!(
            "the schema has {} elements but its tree only covers {}",
            elements.len(),
            index
        )));
    }

    Ok((root.name.clone(), fields))
}

/// Constructs a node from `elements` starting at `index`, returning the
/// index of the next sibling.
fn from_thrift_helper(
    elements: &[SchemaElement],
    index: usize,
) -> Result<(usize, ParquetType)> {
    let element = elements
        .get(index)
        .ok_or_else(|| Error::corrupt("the schema tree refers past its last element"))?;
    let name = element.name.clone();
    let repetition: Repetition = element
        .repetition_type
        .ok_or_else(|| Error::corrupt("a non-root element must declare its repetition"))?
        .try_into()?;

    match element.num_children {
        // parquet-cpp sometimes sets num_children to 0 for primitives
        None | Some(0) => {
            let type_ = element
                .type_
                .ok_or_else(|| Error::corrupt("a leaf element must declare a physical type"))?;
            let physical_type = type_to_physical_type(&type_, element.type_length)?;

            let converted_type = element
                .converted_type
                .as_ref()
                .map(|converted| {
                    let maybe_decimal = match (element.precision, element.scale) {
                        (Some(precision), Some(scale)) => Some((precision, scale)),
                        (None, None) => None,
                        _ => {
                            return Err(Error::corrupt(
                                "precision and scale must both be set or both be absent",
                            ))
                        }
                    };
                    converted_to_primitive_converted(converted, maybe_decimal)
                })
                .transpose()?;

            let logical_type = element
                .logical_type
                .clone()
                .map(|x| x.try_into())
                .transpose()?;

            let tp = ParquetType::try_from_primitive(
                name,
                physical_type,
                repetition,
                converted_type,
                logical_type,
                element.field_id,
            )?;
            Ok((index + 1, tp))
        }
        Some(children) => {
            if children < 0 {
                return Err(Error::corrupt("an element declares negative children"));
            }
            let mut fields = Vec::with_capacity(children as usize);
            let mut next_index = index + 1;
            for _ in 0..children {
                let (index, field) = from_thrift_helper(elements, next_index)?;
                next_index = index;
                fields.push(field);
            }

            let converted_type = element
                .converted_type
                .as_ref()
                .map(converted_to_group_converted)
                .transpose()?;
            let logical_type = element
                .logical_type
                .clone()
                .map(|x| x.try_into())
                .transpose()?;

            Ok((
                next_index,
                ParquetType::from_group(
                    name,
                    repetition,
                    converted_type,
                    logical_type,
                    fields,
                    element.field_id,
                ),
            ))
        }
    }
}
