use crate::compression::{self, Compression};
use crate::error::{Error, Result};
use crate::page::{CompressedPage, DataPage, DataPageHeader, EncodedDictPage, Page};

use crate::FallibleStreamingIterator;

/// Decompresses a [`CompressedPage`] into a [`Page`] using `buffer` as
/// scratch space.
///
/// V2 pages keep their level sections uncompressed: only the values
/// section is passed to the codec.
pub fn decompress(compressed: CompressedPage, buffer: &mut Vec<u8>) -> Result<Page> {
    match compressed {
        CompressedPage::Data(page) => {
            let uncompressed_page_size = page.uncompressed_page_size;
            let codec = page.compression;

            let can_decompress = match &page.header {
                DataPageHeader::V2(header) => header.is_compressed.unwrap_or(true),
                DataPageHeader::V1(_) => true,
            };

            if codec == Compression::Uncompressed || !can_decompress {
                return Ok(Page::Data(DataPage::new(
                    page.header,
                    page.buffer,
                    page.descriptor,
                )));
            }

            let levels_byte_length = match &page.header {
                DataPageHeader::V1(_) => 0,
                DataPageHeader::V2(header) => {
                    (header.repetition_levels_byte_length
                        + header.definition_levels_byte_length) as usize
                }
            };
            if levels_byte_length > page.buffer.len()
                || levels_byte_length > uncompressed_page_size
            {
                return Err(Error::corrupt(format!(
                    "column {}: level sections larger than the page",
                    page.descriptor.path_in_schema
                )));
            }

            buffer.clear();
            buffer.resize(uncompressed_page_size, 0);
            buffer[..levels_byte_length].copy_from_slice(&page.buffer[..levels_byte_length]);
            compression::decompress(
                codec,
                &page.buffer[levels_byte_length..],
                &mut buffer[levels_byte_length..],
            )?;

            Ok(Page::Data(DataPage::new(
                page.header,
                std::mem::take(buffer),
                page.descriptor,
            )))
        }
        CompressedPage::Dict(page) => {
            if page.compression == Compression::Uncompressed {
                return Ok(Page::Dict(EncodedDictPage::new(
                    page.buffer,
                    page.num_values,
                )));
            }
            buffer.clear();
            buffer.resize(page.uncompressed_page_size, 0);
            compression::decompress(page.compression, &page.buffer, buffer)?;
            Ok(Page::Dict(EncodedDictPage::new(
                std::mem::take(buffer),
                page.num_values,
            )))
        }
    }
}

impl streaming_decompression::Compressed for CompressedPage {
    fn is_compressed(&self) -> bool {
        self.compression() != Compression::Uncompressed
    }
}

impl streaming_decompression::Decompressed for Page {
    fn buffer_mut(&mut self) -> &mut Vec<u8> {
        self.buffer_mut()
    }
}

type _Decompressor<I> = streaming_decompression::Decompressor<
    CompressedPage,
    Page,
    fn(CompressedPage, &mut Vec<u8>) -> Result<Page>,
    Error,
    I,
>;

/// A [`FallibleStreamingIterator`] that decompresses [`CompressedPage`]
/// into [`Page`], re-using an internal buffer so that a single allocation
/// serves all compressed pages.
pub struct BasicDecompressor<I: Iterator<Item = Result<CompressedPage>>> {
    iter: _Decompressor<I>,
}

impl<I: Iterator<Item = Result<CompressedPage>>> BasicDecompressor<I> {
    pub fn new(iter: I, buffer: Vec<u8>) -> Self {
        Self {
            iter: _Decompressor::new(iter, buffer, decompress),
        }
    }

    /// Returns the internal buffer, to be re-used elsewhere.
    pub fn into_inner(self) -> Vec<u8> {
        self.iter.into_inner()
    }
}

impl<I: Iterator<Item = Result<CompressedPage>>> FallibleStreamingIterator
    for BasicDecompressor<I>
{
    type Item = Page;
    type Error = Error;

    fn advance(&mut self) -> Result<()> {
        self.iter.advance()
    }

    fn get(&self) -> Option<&Page> {
        self.iter.get()
    }
}
