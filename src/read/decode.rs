//! Decoding of encoded page bytes back into typed values.

use crate::column::{Dictionary, TypedValues};
use crate::encoding::{
    bit_width, byte_stream_split, delta_bitpacked, delta_byte_array, delta_length_byte_array,
    get_length, hybrid_rle, plain, Encoding,
};
use crate::error::{Error, Result};
use crate::metadata::ColumnDescriptor;
use crate::page::{BufferedPage, DataPage, DataPageHeader, EncodedDictPage};
use crate::parquet_bridge::DataPageHeaderExt;
use crate::schema::types::PhysicalType;
use crate::types::NativeType;

/// Splits a page body into its repetition levels, definition levels and
/// values sections.
fn split_buffer<'a>(
    page: &'a DataPage,
    descriptor: &ColumnDescriptor,
) -> Result<(&'a [u8], &'a [u8], &'a [u8])> {
    let buffer = page.buffer();
    match page.header() {
        DataPageHeader::V1(header) => {
            if header.definition_level_encoding() != Encoding::Rle
                || header.repetition_level_encoding() != Encoding::Rle
            {
                return Err(Error::EncodingNotSupported(format!(
                    "column {}: levels must use the RLE/bit-pack hybrid",
                    descriptor.path_in_schema
                )));
            }
            // v1 level sections carry a 4-byte little-endian length prefix
            let mut remaining = buffer;
            let mut rep: &[u8] = &[];
            let mut def: &[u8] = &[];
            if descriptor.max_rep_level() > 0 {
                let length = get_length(remaining).ok_or_else(|| {
                    Error::eof("the repetition level section ends before its length prefix")
                })?;
                if 4 + length > remaining.len() {
                    return Err(Error::eof(
                        "the repetition level section ends before its declared length",
                    ));
                }
                rep = &remaining[4..4 + length];
                remaining = &remaining[4 + length..];
            }
            if descriptor.max_def_level() > 0 {
                let length = get_length(remaining).ok_or_else(|| {
                    Error::eof("the definition level section ends before its length prefix")
                })?;
                if 4 + length > remaining.len() {
                    return Err(Error::eof(
                        "the definition level section ends before its declared length",
                    ));
                }
                def = &remaining[4..4 + length];
                remaining = &remaining[4 + length..];
            }
            Ok((rep, def, remaining))
        }
        DataPageHeader::V2(header) => {
            let rep_length = header.repetition_levels_byte_length as usize;
            let def_length = header.definition_levels_byte_length as usize;
            if rep_length + def_length > buffer.len() {
                return Err(Error::eof("level sections larger than the page"));
            }
            Ok((
                &buffer[..rep_length],
                &buffer[rep_length..rep_length + def_length],
                &buffer[rep_length + def_length..],
            ))
        }
    }
}

/// Decodes `count` levels bounded by `max_level`.
pub(crate) fn decode_levels(data: &[u8], max_level: u16, count: usize) -> Result<Vec<u16>> {
    if max_level == 0 {
        return Ok(vec![]);
    }
    let num_bits = bit_width(max_level as u64);
    let mut decoded = Vec::with_capacity(count);
    hybrid_rle::decode(data, num_bits, count, &mut decoded)?;
    if decoded.len() < count {
        return Err(Error::eof(format!(
            "the level section holds {} levels but the page declares {}",
            decoded.len(),
            count
        )));
    }
    decoded
        .into_iter()
        .map(|level| {
            if level > max_level as u32 {
                Err(Error::corrupt(format!(
                    "level {} exceeds the maximum of {}",
                    level, max_level
                )))
            } else {
                Ok(level as u16)
            }
        })
        .collect()
}

fn decode_plain_native<T: NativeType>(data: &[u8], count: usize) -> Result<Vec<T>> {
    let size = std::mem::size_of::<T>();
    if data.len() < count * size {
        return Err(Error::eof(format!(
            "{} plain bytes cannot hold {} values of {} bytes",
            data.len(),
            count,
            size
        )));
    }
    Ok(data[..count * size]
        .chunks_exact(size)
        .map(|chunk| T::from_le_bytes(chunk.try_into().unwrap()))
        .collect())
}

fn decode_plain(data: &[u8], count: usize, physical_type: PhysicalType) -> Result<TypedValues> {
    Ok(match physical_type {
        PhysicalType::Boolean => {
            if data.len() * 8 < count {
                return Err(Error::eof("the boolean bitmap is shorter than the page"));
            }
            TypedValues::Boolean(hybrid_rle::BitmapIter::new(data, 0, count).collect())
        }
        PhysicalType::Int32 => TypedValues::Int32(decode_plain_native(data, count)?),
        PhysicalType::Int64 => TypedValues::Int64(decode_plain_native(data, count)?),
        PhysicalType::Int96 => TypedValues::Int96(decode_plain_native(data, count)?),
        PhysicalType::Float => TypedValues::Float(decode_plain_native(data, count)?),
        PhysicalType::Double => TypedValues::Double(decode_plain_native(data, count)?),
        PhysicalType::ByteArray => {
            let values = plain::BinaryIter::new(data, Some(count))
                .map(|value| value.map(|x| x.to_vec()))
                .collect::<Result<Vec<_>>>()?;
            if values.len() < count {
                return Err(Error::eof("fewer byte arrays than the page declares"));
            }
            TypedValues::ByteArray(values)
        }
        PhysicalType::FixedLenByteArray(size) => {
            if data.len() < count * size {
                return Err(Error::eof("fewer fixed-size values than the page declares"));
            }
            TypedValues::FixedLenByteArray {
                size,
                data: data[..count * size].to_vec(),
            }
        }
    })
}

fn expect_count(found: usize, expected: usize) -> Result<()> {
    if found < expected {
        Err(Error::eof(format!(
            "the page declares {} values but only {} decoded",
            expected, found
        )))
    } else {
        Ok(())
    }
}

fn decode_values(
    data: &[u8],
    count: usize,
    encoding: Encoding,
    physical_type: PhysicalType,
    dictionary: Option<&Dictionary>,
    descriptor: &ColumnDescriptor,
) -> Result<TypedValues> {
    match encoding {
        Encoding::Plain => decode_plain(data, count, physical_type),
        Encoding::Rle => match physical_type {
            PhysicalType::Boolean => {
                let length = get_length(data)
                    .ok_or_else(|| Error::eof("the boolean run section has no length prefix"))?;
                if 4 + length > data.len() {
                    return Err(Error::eof(
                        "the boolean run section ends before its declared length",
                    ));
                }
                let mut decoded = vec![];
                hybrid_rle::decode(&data[4..4 + length], 1, count, &mut decoded)?;
                expect_count(decoded.len(), count)?;
                Ok(TypedValues::Boolean(
                    decoded.into_iter().map(|x| x != 0).collect(),
                ))
            }
            other => Err(Error::EncodingNotSupported(format!(
                "RLE cannot decode {:?} values",
                other
            ))),
        },
        Encoding::RleDictionary | Encoding::PlainDictionary => {
            let dictionary = dictionary.ok_or_else(|| {
                Error::corrupt(format!(
                    "column {}: dictionary-encoded page without a dictionary page",
                    descriptor.path_in_schema
                ))
            })?;
            let (num_bits, data) = data
                .split_first()
                .ok_or_else(|| Error::eof("a dictionary-encoded page without a bit width"))?;
            if *num_bits > 32 {
                return Err(Error::invalid(format!(
                    "dictionary index bit width {} is out of range",
                    num_bits
                )));
            }
            let mut indices = vec![];
            hybrid_rle::decode(data, *num_bits as u32, count, &mut indices)?;
            expect_count(indices.len(), count)?;
            let mut values = TypedValues::new(physical_type);
            dictionary.lookup(&indices, &mut values)?;
            Ok(values)
        }
        Encoding::DeltaBinaryPacked => {
            let decoded = delta_bitpacked::decode(data)?;
            expect_count(decoded.values.len(), count)?;
            match physical_type {
                PhysicalType::Int32 => Ok(TypedValues::Int32(
                    decoded.values.into_iter().take(count).map(|x| x as i32).collect(),
                )),
                PhysicalType::Int64 => Ok(TypedValues::Int64(
                    decoded.values.into_iter().take(count).collect(),
                )),
                other => Err(Error::EncodingNotSupported(format!(
                    "DELTA_BINARY_PACKED cannot decode {:?} values",
                    other
                ))),
            }
        }
        Encoding::DeltaLengthByteArray => {
            if physical_type != PhysicalType::ByteArray {
                return Err(Error::EncodingNotSupported(
                    "DELTA_LENGTH_BYTE_ARRAY only decodes BYTE_ARRAY values".to_string(),
                ));
            }
            let (lengths, mut bytes) = delta_length_byte_array::decode(data)?;
            expect_count(lengths.len(), count)?;
            let mut values = Vec::with_capacity(count);
            for length in lengths.into_iter().take(count) {
                let (value, rest) = bytes.split_at(length as usize);
                values.push(value.to_vec());
                bytes = rest;
            }
            Ok(TypedValues::ByteArray(values))
        }
        Encoding::DeltaByteArray => {
            if physical_type != PhysicalType::ByteArray {
                return Err(Error::EncodingNotSupported(
                    "DELTA_BYTE_ARRAY only decodes BYTE_ARRAY values".to_string(),
                ));
            }
            let mut values = delta_byte_array::decode(data)?;
            expect_count(values.len(), count)?;
            values.truncate(count);
            Ok(TypedValues::ByteArray(values))
        }
        Encoding::ByteStreamSplit => match physical_type {
            PhysicalType::Float => {
                let mut values = vec![];
                byte_stream_split::decode::<f32>(data, &mut values)?;
                expect_count(values.len(), count)?;
                values.truncate(count);
                Ok(TypedValues::Float(values))
            }
            PhysicalType::Double => {
                let mut values = vec![];
                byte_stream_split::decode::<f64>(data, &mut values)?;
                expect_count(values.len(), count)?;
                values.truncate(count);
                Ok(TypedValues::Double(values))
            }
            other => Err(Error::EncodingNotSupported(format!(
                "BYTE_STREAM_SPLIT cannot decode {:?} values",
                other
            ))),
        },
        other => Err(Error::EncodingNotSupported(format!(
            "{:?} is not a value encoding of this reader",
            other
        ))),
    }
}

/// Decodes an uncompressed data page into its typed form.
///
/// When the page header embeds statistics that disagree with the decoded
/// values, the decoded values win: bounds are always recomputed from the
/// page.
pub fn decode_data_page(page: &DataPage, dictionary: Option<&Dictionary>) -> Result<BufferedPage> {
    let descriptor = page.descriptor().clone();
    let num_values = page.num_values();

    let (rep_section, def_section, values_section) = split_buffer(page, &descriptor)?;
    let rep_levels = decode_levels(rep_section, descriptor.max_rep_level(), num_values)?;
    let def_levels = decode_levels(def_section, descriptor.max_def_level(), num_values)?;

    let num_present = if descriptor.max_def_level() > 0 {
        let max_def = descriptor.max_def_level();
        def_levels.iter().filter(|d| **d == max_def).count()
    } else {
        num_values
    };

    let values = decode_values(
        values_section,
        num_present,
        page.encoding(),
        descriptor.physical_type(),
        dictionary,
        &descriptor,
    )?;

    BufferedPage::try_new(descriptor, values, def_levels, rep_levels)
}

/// Decodes a dictionary page into a [`Dictionary`].
pub fn decode_dict_page(
    page: &EncodedDictPage,
    descriptor: &ColumnDescriptor,
) -> Result<Dictionary> {
    let values = decode_plain(&page.buffer, page.num_values, descriptor.physical_type())?;
    Ok(Dictionary::from_values(values))
}
