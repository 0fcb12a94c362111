use crate::error::Result;

use super::row_metadata::RowGroupMetaData;
use super::schema_descriptor::SchemaDescriptor;
use super::sort::ColumnOrder;

pub use parquet_format_safe::KeyValue;

/// Metadata of a parquet file, decoded from its footer.
#[derive(Debug, Clone)]
pub struct FileMetaData {
    /// The version of this file.
    pub version: i32,

    /// The number of rows across all row groups.
    pub num_rows: usize,

    /// String message for the application that created this file.
    pub created_by: Option<String>,

    /// The row groups of this file.
    pub row_groups: Vec<RowGroupMetaData>,

    /// Arbitrary key-value pairs set when the file was written.
    pub key_value_metadata: Option<Vec<KeyValue>>,

    /// The schema of the file.
    pub schema_descr: SchemaDescriptor,

    /// The sort order of each leaf column, when declared.
    pub column_orders: Option<Vec<ColumnOrder>>,
}

impl FileMetaData {
    /// The schema of the file.
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }

    pub fn key_value_metadata(&self) -> &Option<Vec<KeyValue>> {
        &self.key_value_metadata
    }

    /// The [`ColumnOrder`] of the leaf `i`, defaulting to the type-defined
    /// order when the footer does not declare orders.
    pub fn column_order(&self, i: usize) -> Result<ColumnOrder> {
        Ok(self
            .column_orders
            .as_ref()
            .and_then(|orders| orders.get(i).copied())
            .unwrap_or_else(|| {
                let primitive = &self.schema_descr.column(i).descriptor.primitive_type;
                ColumnOrder::TypeDefinedOrder(super::sort::get_sort_order(
                    &primitive.logical_type,
                    &primitive.converted_type,
                    &primitive.physical_type,
                ))
            }))
    }

    pub(crate) fn try_from_thrift(metadata: parquet_format_safe::FileMetaData) -> Result<Self> {
        let schema_descr = SchemaDescriptor::try_from_thrift(&metadata.schema)?;

        let row_groups = metadata
            .row_groups
            .into_iter()
            .map(|rg| RowGroupMetaData::try_from_thrift(&schema_descr, rg))
            .collect::<Result<Vec<_>>>()?;

        let column_orders = metadata
            .column_orders
            .map(|orders| super::sort::parse_column_orders(&orders, &schema_descr));

        Ok(FileMetaData {
            version: metadata.version,
            num_rows: metadata.num_rows.try_into()?,
            created_by: metadata.created_by,
            row_groups,
            key_value_metadata: metadata.key_value_metadata,
            schema_descr,
            column_orders,
        })
    }
}
