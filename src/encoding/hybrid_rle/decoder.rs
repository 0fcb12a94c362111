use super::super::{ceil8, uleb128};
use super::{HybridEncoded, MAX_RUN_LENGTH};
use crate::error::{Error, Result};

/// An iterator that, given a slice of bytes, returns [`HybridEncoded`]
/// runs.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    values: &'a [u8],
    num_bits: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(values: &'a [u8], num_bits: u32) -> Self {
        Self {
            values,
            num_bits: num_bits as usize,
        }
    }

    /// Returns the number of bits being used by this decoder.
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    fn advance(&mut self) -> Result<HybridEncoded<'a>> {
        let (indicator, consumed) = uleb128::decode(self.values)?;
        self.values = &self.values[consumed..];
        if indicator & 1 == 1 {
            // is bitpacked
            let groups = (indicator as usize) >> 1;
            if groups * 8 > MAX_RUN_LENGTH {
                return Err(Error::corrupt(format!(
                    "bit-packed run of {} values exceeds the safety cap of {}",
                    groups * 8,
                    MAX_RUN_LENGTH
                )));
            }
            let bytes = groups * self.num_bits;
            if bytes > self.values.len() {
                return Err(Error::eof(format!(
                    "bit-packed run of {} bytes but only {} remain",
                    bytes,
                    self.values.len()
                )));
            }
            let result = HybridEncoded::Bitpacked(&self.values[..bytes]);
            self.values = &self.values[bytes..];
            Ok(result)
        } else {
            // is rle; the repeated value uses a fixed width of
            // round-up-to-next-byte(bit_width)
            let run_length = (indicator as usize) >> 1;
            if run_length > MAX_RUN_LENGTH {
                return Err(Error::corrupt(format!(
                    "rle run of {} values exceeds the safety cap of {}",
                    run_length, MAX_RUN_LENGTH
                )));
            }
            let rle_bytes = ceil8(self.num_bits);
            if rle_bytes > self.values.len() {
                return Err(Error::eof(format!(
                    "rle run of {} bytes but only {} remain",
                    rle_bytes,
                    self.values.len()
                )));
            }
            let result = HybridEncoded::Rle(&self.values[..rle_bytes], run_length);
            self.values = &self.values[rle_bytes..];
            Ok(result)
        }
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<HybridEncoded<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.values.is_empty() {
            return None;
        }
        let result = self.advance();
        if result.is_err() {
            // poison the iterator so a malformed tail is reported once
            self.values = &[];
        }
        Some(result)
    }
}
