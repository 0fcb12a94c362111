use crate::error::{Error, Result};

/// An iterator over `PLAIN`-encoded byte arrays: each value is prefixed by
/// its little-endian 32-bit length.
#[derive(Debug, Clone)]
pub struct BinaryIter<'a> {
    values: &'a [u8],
    length: Option<usize>,
}

impl<'a> BinaryIter<'a> {
    pub fn new(values: &'a [u8], length: Option<usize>) -> Self {
        Self { values, length }
    }
}

impl<'a> Iterator for BinaryIter<'a> {
    type Item = Result<&'a [u8]>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.values.is_empty() {
            return None;
        }
        if let Some(remaining) = self.length.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        if self.values.len() < 4 {
            self.values = &[];
            return Some(Err(Error::eof("byte array length prefix is truncated")));
        }
        let length = u32::from_le_bytes(self.values[0..4].try_into().unwrap()) as usize;
        self.values = &self.values[4..];
        if length > self.values.len() {
            self.values = &[];
            return Some(Err(Error::eof(
                "byte array body ends before its declared length",
            )));
        }
        let result = &self.values[..length];
        self.values = &self.values[length..];
        Some(Ok(result))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.length.unwrap_or_default(), self.length)
    }
}

/// Appends a `PLAIN`-encoded byte array.
#[inline]
pub fn encode_binary(value: &[u8], buffer: &mut Vec<u8>) {
    buffer.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buffer.extend_from_slice(value);
}
