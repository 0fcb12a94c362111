use std::io::{Read, Seek};

use parquet_format_safe::PageLocation;

use crate::column::Dictionary;
use crate::error::{Error, Result};
use crate::metadata::{ColumnChunkMetaData, ColumnDescriptor};
use crate::page::{BufferedPage, CompressedPage, Page};
use crate::value::Value;

use super::decode::{decode_data_page, decode_dict_page};
use super::get_page_iterator;

/// A reader of one column chunk yielding typed [`Value`]s in page order.
///
/// Compressed pages are read eagerly (the chunk is one contiguous byte
/// range) and decoded lazily, one page at a time; the optional offset
/// index allows seeking to a row without decoding the pages before it.
#[derive(Debug)]
pub struct ColumnChunkReader {
    descriptor: ColumnDescriptor,
    pages: Vec<CompressedPage>,
    dictionary: Option<Dictionary>,
    locations: Option<Vec<PageLocation>>,
    current: Option<BufferedPage>,
    /// Index of the next page to decode.
    page_index: usize,
    slot: usize,
    value_index: usize,
    scratch: Vec<u8>,
}

impl ColumnChunkReader {
    /// Reads all compressed pages of `column` and decodes its dictionary
    /// page, if any.
    pub fn try_new<R: Read + Seek>(
        reader: &mut R,
        column: &ColumnChunkMetaData,
        locations: Option<Vec<PageLocation>>,
    ) -> Result<Self> {
        let mut this = Self {
            descriptor: column.descriptor().clone(),
            pages: vec![],
            dictionary: None,
            locations,
            current: None,
            page_index: 0,
            slot: 0,
            value_index: 0,
            scratch: vec![],
        };
        for page in get_page_iterator(column, reader)? {
            match page? {
                page @ CompressedPage::Dict(_) => {
                    match super::decompress(page, &mut this.scratch)? {
                        Page::Dict(dict_page) => {
                            this.dictionary =
                                Some(decode_dict_page(&dict_page, &this.descriptor)?);
                        }
                        Page::Data(_) => unreachable!(),
                    }
                }
                page => this.pages.push(page),
            }
        }
        Ok(this)
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    pub fn dictionary(&self) -> Option<&Dictionary> {
        self.dictionary.as_ref()
    }

    /// Decodes the next page, returning false at the end of the chunk.
    fn advance_page(&mut self) -> Result<bool> {
        if self.page_index >= self.pages.len() {
            return Ok(false);
        }
        let compressed = self.pages[self.page_index].clone();
        let page = super::decompress(compressed, &mut self.scratch)?;
        let page = match &page {
            Page::Data(page) => decode_data_page(page, self.dictionary.as_ref())?,
            Page::Dict(_) => {
                return Err(Error::corrupt(format!(
                    "column {}: a dictionary page between data pages",
                    self.descriptor.path_in_schema
                )))
            }
        };
        self.current = Some(page);
        self.page_index += 1;
        self.slot = 0;
        self.value_index = 0;
        Ok(true)
    }

    /// Positions the cursor on the next value, crossing pages as needed.
    fn ensure_value(&mut self) -> Result<bool> {
        loop {
            match &self.current {
                Some(page) if self.slot < page.num_values() => return Ok(true),
                _ => {
                    if !self.advance_page()? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// The (repetition, definition) levels of the next value, without
    /// consuming it.
    pub fn peek_levels(&mut self) -> Result<Option<(u16, u16)>> {
        if !self.ensure_value()? {
            return Ok(None);
        }
        let page = self.current.as_ref().unwrap();
        let rep = page.repetition_levels().get(self.slot).copied().unwrap_or(0);
        let def = page.definition_levels().get(self.slot).copied().unwrap_or(0);
        Ok(Some((rep, def)))
    }

    /// The next value of the chunk, or `None` at its end. Byte payloads
    /// are detached from the page.
    pub fn next_value(&mut self) -> Result<Option<Value<'static>>> {
        if !self.ensure_value()? {
            return Ok(None);
        }
        let page = self.current.as_ref().unwrap();
        let max_def = self.descriptor.max_def_level();
        let rep = page.repetition_levels().get(self.slot).copied().unwrap_or(0);
        let def = page.definition_levels().get(self.slot).copied().unwrap_or(0);
        self.slot += 1;

        let column = self.descriptor.leaf_index;
        if max_def > 0 && def < max_def {
            return Ok(Some(Value::null().level(rep, def, column)));
        }
        let scalar = page
            .typed_values()
            .scalar_at(self.value_index)
            .into_owned();
        self.value_index += 1;
        Ok(Some(Value::new(scalar).level(rep, def, column)))
    }

    /// Skips `n` records, respecting repetition levels.
    pub fn skip_records(&mut self, mut n: usize) -> Result<()> {
        while n > 0 {
            if self.next_value()?.is_none() {
                return Err(Error::oob("skipped past the end of the column chunk"));
            }
            if self.descriptor.max_rep_level() > 0 {
                while let Some((rep, _)) = self.peek_levels()? {
                    if rep == 0 {
                        break;
                    }
                    self.next_value()?;
                }
            }
            n -= 1;
        }
        Ok(())
    }

    /// Seeks to the record `row` within the chunk.
    ///
    /// With an offset index the page holding the row is opened directly;
    /// without one the chunk is decoded from its start.
    pub fn seek_to_row(&mut self, row: usize) -> Result<()> {
        let skip = match &self.locations {
            Some(locations) if !locations.is_empty() => {
                // the page with the largest first_row_index <= row
                let page_index = locations
                    .partition_point(|location| location.first_row_index <= row as i64)
                    .saturating_sub(1);
                let first_row = locations[page_index].first_row_index as usize;
                if row < first_row {
                    return Err(Error::oob(format!(
                        "row {} precedes the first page of the chunk",
                        row
                    )));
                }
                self.page_index = page_index;
                self.current = None;
                if !self.advance_page()? {
                    return Err(Error::oob(format!(
                        "row {} is past the end of the column chunk",
                        row
                    )));
                }
                row - first_row
            }
            _ => {
                self.page_index = 0;
                self.current = None;
                row
            }
        };
        self.skip_records(skip)
    }
}
