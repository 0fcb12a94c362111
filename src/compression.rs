//! Block compression of page bodies, consumed through an
//! `encode(dst, src)` / `decode(dst, src)` style pair of free functions.
//! Each codec is feature-gated; a codec whose feature is not active
//! results in [`Error::CompressionNotSupported`].

pub use super::parquet_bridge::Compression;

use crate::error::{Error, Result};

/// Compresses `input` with `compression`, appending to `output`.
pub fn compress(compression: Compression, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    match compression {
        #[cfg(feature = "snappy")]
        Compression::Snappy => {
            let initial = output.len();
            let required = snap::raw::max_compress_len(input.len());
            output.resize(initial + required, 0);
            let written = snap::raw::Encoder::new().compress(input, &mut output[initial..])?;
            output.truncate(initial + written);
            Ok(())
        }
        #[cfg(feature = "gzip")]
        Compression::Gzip => {
            use std::io::Write;
            let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
            encoder.write_all(input)?;
            encoder.try_finish()?;
            Ok(())
        }
        #[cfg(feature = "brotli")]
        Compression::Brotli => {
            use std::io::Write;
            const BROTLI_DEFAULT_BUFFER_SIZE: usize = 4096;
            const BROTLI_DEFAULT_COMPRESSION_QUALITY: u32 = 1;
            const BROTLI_DEFAULT_LG_WINDOW_SIZE: u32 = 22;
            let mut encoder = brotli::CompressorWriter::new(
                output,
                BROTLI_DEFAULT_BUFFER_SIZE,
                BROTLI_DEFAULT_COMPRESSION_QUALITY,
                BROTLI_DEFAULT_LG_WINDOW_SIZE,
            );
            encoder.write_all(input)?;
            encoder.flush()?;
            Ok(())
        }
        #[cfg(feature = "zstd")]
        Compression::Zstd => {
            use std::io::Write;
            // level 1 trades ratio for speed
            let mut encoder = zstd::Encoder::new(output, 1)?;
            encoder.write_all(input)?;
            encoder.finish()?;
            Ok(())
        }
        #[cfg(feature = "lz4")]
        Compression::Lz4Raw => {
            let initial = output.len();
            let required = lz4_flex::block::get_maximum_output_size(input.len());
            output.resize(initial + required, 0);
            let written = lz4_flex::block::compress_into(input, &mut output[initial..])
                .map_err(|e| Error::corrupt(format!("lz4 compression: {}", e)))?;
            output.truncate(initial + written);
            Ok(())
        }
        Compression::Uncompressed => {
            output.extend_from_slice(input);
            Ok(())
        }
        _ => Err(Error::CompressionNotSupported(format!(
            "compressing with {:?}",
            compression
        ))),
    }
}

/// Decompresses `input` into `output`, which must have exactly the
/// uncompressed length declared by the page header.
pub fn decompress(compression: Compression, input: &[u8], output: &mut [u8]) -> Result<()> {
    match compression {
        #[cfg(feature = "snappy")]
        Compression::Snappy => {
            let expected = snap::raw::decompress_len(input)?;
            if expected != output.len() {
                return Err(Error::corrupt(format!(
                    "decompressed size {} does not match the page header ({})",
                    expected,
                    output.len()
                )));
            }
            snap::raw::Decoder::new().decompress(input, output)?;
            Ok(())
        }
        #[cfg(feature = "gzip")]
        Compression::Gzip => {
            use std::io::Read;
            let mut decoder = flate2::read::GzDecoder::new(input);
            decoder.read_exact(output)?;
            Ok(())
        }
        #[cfg(feature = "brotli")]
        Compression::Brotli => {
            use std::io::Read;
            const BROTLI_DEFAULT_BUFFER_SIZE: usize = 4096;
            brotli::Decompressor::new(input, BROTLI_DEFAULT_BUFFER_SIZE).read_exact(output)?;
            Ok(())
        }
        #[cfg(feature = "zstd")]
        Compression::Zstd => {
            use std::io::Read;
            let mut decoder = zstd::Decoder::new(input)?;
            decoder.read_exact(output)?;
            Ok(())
        }
        #[cfg(feature = "lz4")]
        Compression::Lz4Raw => {
            let written = lz4_flex::block::decompress_into(input, output)
                .map_err(|e| Error::corrupt(format!("lz4 decompression: {}", e)))?;
            if written != output.len() {
                return Err(Error::corrupt(format!(
                    "decompressed size {} does not match the page header ({})",
                    written,
                    output.len()
                )));
            }
            Ok(())
        }
        Compression::Uncompressed => {
            if input.len() != output.len() {
                return Err(Error::corrupt(
                    "uncompressed page size does not match the page header",
                ));
            }
            output.copy_from_slice(input);
            Ok(())
        }
        _ => Err(Error::CompressionNotSupported(format!(
            "decompressing with {:?}",
            compression
        ))),
    }
}
