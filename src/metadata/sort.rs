use parquet_format_safe::ColumnOrder as TColumnOrder;

use crate::parquet_bridge::PrimitiveLogicalType;
use crate::schema::types::{PhysicalType, PrimitiveConvertedType};

use super::schema_descriptor::SchemaDescriptor;

/// Sort order for page and column statistics.
///
/// Types are associated with sort orders; a sort order must be considered
/// when comparing values against statistics min/max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Signed (either value or legacy byte-wise) comparison.
    Signed,
    /// Unsigned (depending on physical type either value or byte-wise)
    /// comparison.
    Unsigned,
    /// Comparison is undefined.
    Undefined,
}

/// Column order declared by the footer. Only the type-defined order is
/// specified by the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrder {
    TypeDefinedOrder(SortOrder),
    Undefined,
}

/// Returns the sort order of a physical/logical type.
pub fn get_sort_order(
    logical_type: &Option<PrimitiveLogicalType>,
    converted_type: &Option<PrimitiveConvertedType>,
    physical_type: &PhysicalType,
) -> SortOrder {
    if let Some(logical_type) = logical_type {
        return get_logical_sort_order(logical_type);
    };
    if let Some(converted_type) = converted_type {
        return get_converted_sort_order(converted_type);
    };
    get_physical_sort_order(physical_type)
}

fn get_logical_sort_order(logical_type: &PrimitiveLogicalType) -> SortOrder {
    use PrimitiveLogicalType::*;
    match logical_type {
        String | Enum | Json | Bson => SortOrder::Unsigned,
        Integer(t) => {
            if t.is_signed() {
                SortOrder::Signed
            } else {
                SortOrder::Unsigned
            }
        }
        Decimal(_, _) | Date | Time { .. } | Timestamp { .. } => SortOrder::Signed,
        Uuid => SortOrder::Unsigned,
        Unknown => SortOrder::Undefined,
    }
}

fn get_converted_sort_order(converted_type: &PrimitiveConvertedType) -> SortOrder {
    use PrimitiveConvertedType::*;
    match converted_type {
        // unsigned byte-wise comparison
        Utf8 | Json | Bson | Enum => SortOrder::Unsigned,
        Int8 | Int16 | Int32 | Int64 => SortOrder::Signed,
        Uint8 | Uint16 | Uint32 | Uint64 => SortOrder::Unsigned,
        // signed comparison of the represented value
        Decimal(_, _) => SortOrder::Signed,
        Date => SortOrder::Signed,
        TimeMillis | TimeMicros | TimestampMillis | TimestampMicros => SortOrder::Signed,
        Interval => SortOrder::Undefined,
    }
}

fn get_physical_sort_order(physical_type: &PhysicalType) -> SortOrder {
    use PhysicalType::*;
    match physical_type {
        // order: false, true
        Boolean => SortOrder::Unsigned,
        Int32 | Int64 => SortOrder::Signed,
        Int96 => SortOrder::Undefined,
        Float | Double => SortOrder::Signed,
        // unsigned byte-wise comparison
        ByteArray | FixedLenByteArray(_) => SortOrder::Unsigned,
    }
}

/// Parses column orders from the thrift definition. The footer either
/// declares one order per leaf or none at all.
pub(crate) fn parse_column_orders(
    orders: &[TColumnOrder],
    schema_descr: &SchemaDescriptor,
) -> Vec<ColumnOrder> {
    if orders.len() != schema_descr.num_columns() {
        return vec![ColumnOrder::Undefined; schema_descr.num_columns()];
    }
    schema_descr
        .columns()
        .iter()
        .zip(orders.iter())
        .map(|(column, order)| match order {
            TColumnOrder::TYPEORDER(_) => {
                let primitive = &column.descriptor.primitive_type;
                ColumnOrder::TypeDefinedOrder(get_sort_order(
                    &primitive.logical_type,
                    &primitive.converted_type,
                    &primitive.physical_type,
                ))
            }
        })
        .collect()
}
