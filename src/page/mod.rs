//! Pages: the unit of encoding, compression and indexing.
//!
//! [`BufferedPage`] is the in-memory typed form produced by freezing a
//! [`crate::column::ColumnBuffer`] and consumed by encoders;
//! [`CompressedPage`] is the on-wire form read and written back-to-back
//! inside a column chunk.

use crate::column::TypedValues;
use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::metadata::ColumnDescriptor;
use crate::value::{Scalar, Value};

pub use crate::parquet_bridge::{DataPageHeaderExt, PageType};
pub use parquet_format_safe::{
    DataPageHeader as DataPageHeaderV1, DataPageHeaderV2, PageHeader as ParquetPageHeader,
};

/// An immutable slice of typed values with their levels: one page worth of
/// one leaf column.
///
/// Values store only the present entries; `def_levels` (when the leaf has
/// optional or repeated ancestors) mark nulls, `rep_levels` (when it has
/// repeated ancestors) mark record boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedPage {
    descriptor: ColumnDescriptor,
    values: TypedValues,
    def_levels: Vec<u16>,
    rep_levels: Vec<u16>,
}

impl BufferedPage {
    pub fn try_new(
        descriptor: ColumnDescriptor,
        values: TypedValues,
        def_levels: Vec<u16>,
        rep_levels: Vec<u16>,
    ) -> Result<Self> {
        let max_def = descriptor.max_def_level();
        let max_rep = descriptor.max_rep_level();
        if max_def == 0 && !def_levels.is_empty() {
            return Err(Error::invalid(
                "a page of a required column cannot carry definition levels",
            ));
        }
        if max_def > 0 {
            let present = def_levels.iter().filter(|d| **d == max_def).count();
            if present != values.len() {
                return Err(Error::invalid(format!(
                    "{} definition levels mark {} present values but the page stores {}",
                    def_levels.len(),
                    present,
                    values.len()
                )));
            }
        }
        if max_rep == 0 && !rep_levels.is_empty() {
            return Err(Error::invalid(
                "a page of a non-repeated column cannot carry repetition levels",
            ));
        }
        if max_rep > 0 && rep_levels.len() != def_levels.len() {
            return Err(Error::invalid(format!(
                "{} repetition levels but {} definition levels",
                rep_levels.len(),
                def_levels.len()
            )));
        }
        Ok(Self {
            descriptor,
            values,
            def_levels,
            rep_levels,
        })
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    pub fn typed_values(&self) -> &TypedValues {
        &self.values
    }

    pub fn definition_levels(&self) -> &[u16] {
        &self.def_levels
    }

    pub fn repetition_levels(&self) -> &[u16] {
        &self.rep_levels
    }

    /// The number of value slots, nulls included.
    pub fn num_values(&self) -> usize {
        if self.descriptor.max_def_level() > 0 {
            self.def_levels.len()
        } else {
            self.values.len()
        }
    }

    pub fn num_nulls(&self) -> usize {
        let max_def = self.descriptor.max_def_level();
        self.def_levels.iter().filter(|d| **d < max_def).count()
    }

    /// The number of rows: slots that start a record.
    pub fn num_rows(&self) -> usize {
        if self.descriptor.max_rep_level() > 0 {
            self.rep_levels.iter().filter(|r| **r == 0).count()
        } else {
            self.num_values()
        }
    }

    /// An estimate of the encoded size, levels included.
    pub fn byte_len(&self) -> usize {
        self.values.byte_len() + self.def_levels.len() / 4 + self.rep_levels.len() / 4
    }

    /// The minimum and maximum of the present values, or `None` for an
    /// empty or all-null page.
    pub fn bounds(&self) -> Option<(Scalar<'_>, Scalar<'_>)> {
        let unsigned = self.descriptor.descriptor.primitive_type.is_unsigned();
        self.values.min_max(unsigned)
    }

    /// A reader over the page's values, nulls included.
    pub fn values(&self) -> PageValues<'_> {
        PageValues {
            page: self,
            slot: 0,
            value_index: 0,
        }
    }

    /// Encodes the present values with the physical-type-appropriate
    /// encoder.
    pub fn write_to(&self, encoding: Encoding, buffer: &mut Vec<u8>) -> Result<()> {
        crate::write::serialize::encode_values(&self.values, encoding, buffer)
    }

    /// The slot range covering logical rows `start_row..end_row`.
    fn slot_range(&self, start_row: usize, end_row: usize) -> Result<(usize, usize)> {
        let num_rows = self.num_rows();
        if start_row > end_row || end_row > num_rows {
            return Err(Error::oob(format!(
                "row range {}..{} of a page of {} rows",
                start_row, end_row, num_rows
            )));
        }
        if self.descriptor.max_rep_level() == 0 {
            return Ok((start_row, end_row));
        }
        // map row indices to slot indices by scanning for record starts
        let mut starts = self
            .rep_levels
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == 0)
            .map(|(slot, _)| slot);
        let slot_start = if start_row == num_rows {
            self.rep_levels.len()
        } else {
            starts.by_ref().nth(start_row).unwrap()
        };
        let slot_end = if end_row == num_rows {
            self.rep_levels.len()
        } else if end_row == start_row {
            slot_start
        } else {
            starts.nth(end_row - start_row - 1).unwrap()
        };
        Ok((slot_start, slot_end))
    }

    /// The position in the value store of slot `slot`: the count of
    /// present slots before it.
    fn value_index(&self, slot: usize) -> usize {
        if self.descriptor.max_def_level() == 0 {
            slot
        } else {
            let max_def = self.descriptor.max_def_level();
            self.def_levels[..slot].iter().filter(|d| **d == max_def).count()
        }
    }

    /// An independent page holding logical rows `start_row..end_row`.
    pub fn slice(&self, start_row: usize, end_row: usize) -> Result<BufferedPage> {
        let (slot_start, slot_end) = self.slot_range(start_row, end_row)?;
        let value_start = self.value_index(slot_start);
        let value_end = self.value_index(slot_end);

        let mut values = TypedValues::new(self.descriptor.physical_type());
        values.extend_from_range(&self.values, value_start, value_end);

        let def_levels = if self.descriptor.max_def_level() > 0 {
            self.def_levels[slot_start..slot_end].to_vec()
        } else {
            vec![]
        };
        let rep_levels = if self.descriptor.max_rep_level() > 0 {
            self.rep_levels[slot_start..slot_end].to_vec()
        } else {
            vec![]
        };
        BufferedPage::try_new(self.descriptor.clone(), values, def_levels, rep_levels)
    }

    /// Splits into pages of roughly `target_bytes` each, never breaking a
    /// record.
    pub fn split_by_size(self, target_bytes: usize) -> Result<Vec<BufferedPage>> {
        let num_rows = self.num_rows();
        let total = self.byte_len();
        if num_rows <= 1 || total <= target_bytes || target_bytes == 0 {
            return Ok(vec![self]);
        }
        let num_pages = (total + target_bytes - 1) / target_bytes;
        let rows_per_page = std::cmp::max(1, (num_rows + num_pages - 1) / num_pages);

        let mut pages = vec![];
        let mut row = 0;
        while row < num_rows {
            let end = std::cmp::min(row + rows_per_page, num_rows);
            pages.push(self.slice(row, end)?);
            row = end;
        }
        Ok(pages)
    }
}

/// An iterator of [`Value`] over a [`BufferedPage`].
///
/// Slots whose definition level is below the maximum yield synthetic null
/// values carrying the stored levels; the others pull the next present
/// value.
#[derive(Debug, Clone)]
pub struct PageValues<'a> {
    page: &'a BufferedPage,
    slot: usize,
    value_index: usize,
}

impl<'a> Iterator for PageValues<'a> {
    type Item = Value<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.page;
        if self.slot >= page.num_values() {
            return None;
        }
        let max_def = page.descriptor.max_def_level();
        let rep = page.rep_levels.get(self.slot).copied().unwrap_or(0);
        let def = page.def_levels.get(self.slot).copied().unwrap_or(0);
        self.slot += 1;

        let column = page.descriptor.leaf_index;
        if max_def > 0 && def < max_def {
            Some(Value::null().level(rep, def, column))
        } else {
            let scalar = page.values.scalar_at(self.value_index);
            self.value_index += 1;
            Some(Value::new(scalar).level(rep, def, column))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.page.num_values() - self.slot;
        (remaining, Some(remaining))
    }
}

/// The header of an on-wire data page.
#[derive(Debug, Clone)]
pub enum DataPageHeader {
    V1(DataPageHeaderV1),
    V2(DataPageHeaderV2),
}

impl DataPageHeader {
    pub fn num_values(&self) -> usize {
        match self {
            DataPageHeader::V1(header) => header.num_values as usize,
            DataPageHeader::V2(header) => header.num_values as usize,
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            DataPageHeader::V1(header) => header.encoding(),
            DataPageHeader::V2(header) => header.encoding(),
        }
    }
}

/// An uncompressed, encoded data page.
#[derive(Debug, Clone)]
pub struct DataPage {
    pub(crate) header: DataPageHeader,
    pub(crate) buffer: Vec<u8>,
    pub(crate) descriptor: ColumnDescriptor,
}

impl DataPage {
    pub fn new(header: DataPageHeader, buffer: Vec<u8>, descriptor: ColumnDescriptor) -> Self {
        Self {
            header,
            buffer,
            descriptor,
        }
    }

    pub fn header(&self) -> &DataPageHeader {
        &self.header
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn num_values(&self) -> usize {
        self.header.num_values()
    }

    pub fn encoding(&self) -> Encoding {
        self.header.encoding()
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }
}

/// An uncompressed dictionary page: `PLAIN`-encoded unique values.
#[derive(Debug, Clone)]
pub struct EncodedDictPage {
    pub(crate) buffer: Vec<u8>,
    pub(crate) num_values: usize,
}

impl EncodedDictPage {
    pub fn new(buffer: Vec<u8>, num_values: usize) -> Self {
        Self { buffer, num_values }
    }
}

/// An uncompressed, encoded page.
#[derive(Debug, Clone)]
pub enum Page {
    Data(DataPage),
    Dict(EncodedDictPage),
}

impl Page {
    pub(crate) fn buffer_mut(&mut self) -> &mut Vec<u8> {
        match self {
            Page::Data(page) => &mut page.buffer,
            Page::Dict(page) => &mut page.buffer,
        }
    }
}

/// A compressed, encoded data page together with what is needed to
/// decompress it.
#[derive(Debug, Clone)]
pub struct CompressedDataPage {
    pub(crate) header: DataPageHeader,
    pub(crate) buffer: Vec<u8>,
    pub(crate) compression: Compression,
    pub(crate) uncompressed_page_size: usize,
    pub(crate) descriptor: ColumnDescriptor,
}

impl CompressedDataPage {
    pub fn new(
        header: DataPageHeader,
        buffer: Vec<u8>,
        compression: Compression,
        uncompressed_page_size: usize,
        descriptor: ColumnDescriptor,
    ) -> Self {
        Self {
            header,
            buffer,
            compression,
            uncompressed_page_size,
            descriptor,
        }
    }

    pub fn header(&self) -> &DataPageHeader {
        &self.header
    }

    pub fn uncompressed_size(&self) -> usize {
        self.uncompressed_page_size
    }

    pub fn compressed_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn num_values(&self) -> usize {
        self.header.num_values()
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }
}

/// A compressed dictionary page.
#[derive(Debug, Clone)]
pub struct CompressedDictPage {
    pub(crate) buffer: Vec<u8>,
    pub(crate) compression: Compression,
    pub(crate) uncompressed_page_size: usize,
    pub(crate) num_values: usize,
}

impl CompressedDictPage {
    pub fn new(
        buffer: Vec<u8>,
        compression: Compression,
        uncompressed_page_size: usize,
        num_values: usize,
    ) -> Self {
        Self {
            buffer,
            compression,
            uncompressed_page_size,
            num_values,
        }
    }
}

/// A compressed, encoded page.
#[derive(Debug, Clone)]
pub enum CompressedPage {
    Data(CompressedDataPage),
    Dict(CompressedDictPage),
}

impl CompressedPage {
    pub fn compression(&self) -> Compression {
        match self {
            CompressedPage::Data(page) => page.compression,
            CompressedPage::Dict(page) => page.compression,
        }
    }

    pub fn uncompressed_size(&self) -> usize {
        match self {
            CompressedPage::Data(page) => page.uncompressed_page_size,
            CompressedPage::Dict(page) => page.uncompressed_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnPath, Descriptor};
    use crate::schema::types::{PhysicalType, PrimitiveType, Repetition};

    fn descriptor(physical_type: PhysicalType, max_def: u16, max_rep: u16) -> ColumnDescriptor {
        let mut primitive = PrimitiveType::from_physical("c".to_string(), physical_type);
        primitive.field_info.repetition = if max_rep > 0 {
            Repetition::Repeated
        } else if max_def > 0 {
            Repetition::Optional
        } else {
            Repetition::Required
        };
        ColumnDescriptor::new(
            Descriptor {
                primitive_type: primitive,
                max_def_level: max_def,
                max_rep_level: max_rep,
            },
            ColumnPath::from("c"),
            0,
        )
    }

    fn repeated_page() -> BufferedPage {
        // rows: [[a, b], [], [c]] with max_r = 1, max_d = 2
        BufferedPage::try_new(
            descriptor(PhysicalType::ByteArray, 2, 1),
            TypedValues::ByteArray(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]),
            vec![2, 2, 1, 2],
            vec![0, 1, 0, 0],
        )
        .unwrap()
    }

    #[test]
    fn counts() {
        let page = repeated_page();
        assert_eq!(page.num_values(), 4);
        assert_eq!(page.num_rows(), 3);
        assert_eq!(page.num_nulls(), 1);
    }

    #[test]
    fn bounds_of_empty_page() {
        let page = BufferedPage::try_new(
            descriptor(PhysicalType::Int32, 0, 0),
            TypedValues::Int32(vec![]),
            vec![],
            vec![],
        )
        .unwrap();
        assert!(page.bounds().is_none());
    }

    #[test]
    fn bounds() {
        let page = BufferedPage::try_new(
            descriptor(PhysicalType::Int32, 0, 0),
            TypedValues::Int32(vec![3, 1, 2]),
            vec![],
            vec![],
        )
        .unwrap();
        let (min, max) = page.bounds().unwrap();
        assert_eq!(min, Scalar::from(1i32));
        assert_eq!(max, Scalar::from(3i32));
    }

    #[test]
    fn values_reader_emits_synthetic_nulls() {
        let page = repeated_page();
        let values = page.values().collect::<Vec<_>>();
        assert_eq!(values.len(), 4);
        assert_eq!(values[0].byte_array().unwrap(), b"a");
        assert_eq!(values[1].rep_level(), 1);
        assert!(values[2].is_null());
        assert_eq!(values[2].def_level(), 1);
        assert_eq!(values[3].byte_array().unwrap(), b"c");
    }

    #[test]
    fn slice_repeated_by_rows() {
        let page = repeated_page();

        let head = page.slice(0, 1).unwrap();
        assert_eq!(head.num_rows(), 1);
        assert_eq!(head.num_values(), 2);
        assert_eq!(head.typed_values().len(), 2);

        let tail = page.slice(1, 3).unwrap();
        assert_eq!(tail.num_rows(), 2);
        assert_eq!(tail.num_values(), 2);
        assert_eq!(tail.typed_values().len(), 1);

        // a slice of the whole page equals the page
        assert_eq!(page.slice(0, 3).unwrap(), page);

        assert!(page.slice(2, 1).is_err());
        assert!(page.slice(0, 4).is_err());
    }

    #[test]
    fn concat_of_slices_covers_the_page() {
        let page = repeated_page();
        for split in 0..=page.num_rows() {
            let head = page.slice(0, split).unwrap();
            let tail = page.slice(split, page.num_rows()).unwrap();
            assert_eq!(head.num_rows() + tail.num_rows(), page.num_rows());
            assert_eq!(head.num_values() + tail.num_values(), page.num_values());

            let mut values = head.values().map(|v| v.into_owned()).collect::<Vec<_>>();
            values.extend(tail.values().map(|v| v.into_owned()));
            let expected = page.values().map(|v| v.into_owned()).collect::<Vec<_>>();
            assert_eq!(values, expected);
        }
    }

    #[test]
    fn clone_is_independent_and_equal() {
        let page = repeated_page();
        let cloned = page.clone();
        assert_eq!(cloned.bounds(), page.bounds());
        assert_eq!(cloned, page);
    }

    #[test]
    fn split_by_size_covers_all_rows() {
        let page = BufferedPage::try_new(
            descriptor(PhysicalType::Int64, 0, 0),
            TypedValues::Int64((0..1000).collect()),
            vec![],
            vec![],
        )
        .unwrap();
        let pages = page.clone().split_by_size(1024).unwrap();
        assert!(pages.len() > 1);
        let total: usize = pages.iter().map(|p| p.num_rows()).sum();
        assert_eq!(total, 1000);
    }
}
