//! The tagged value model: every datum flowing through the column engine
//! is a [`Value`] carrying its kind, payload, repetition/definition levels
//! and leaf column index, with null as a first-class state.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::schema::types::PhysicalType;
use crate::types::NativeType;

/// The tag of the eight physical types. A null [`Value`] has no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

impl From<PhysicalType> for Kind {
    fn from(physical_type: PhysicalType) -> Self {
        match physical_type {
            PhysicalType::Boolean => Kind::Boolean,
            PhysicalType::Int32 => Kind::Int32,
            PhysicalType::Int64 => Kind::Int64,
            PhysicalType::Int96 => Kind::Int96,
            PhysicalType::Float => Kind::Float,
            PhysicalType::Double => Kind::Double,
            PhysicalType::ByteArray => Kind::ByteArray,
            PhysicalType::FixedLenByteArray(_) => Kind::FixedLenByteArray,
        }
    }
}

/// A non-null payload. Byte payloads borrow from their producer (a page
/// buffer on the read side, application data on the write side) until
/// [`Scalar::into_owned`] detaches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar<'a> {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96([u32; 3]),
    Float(f32),
    Double(f64),
    ByteArray(Cow<'a, [u8]>),
    FixedLenByteArray(Cow<'a, [u8]>),
}

impl<'a> Scalar<'a> {
    pub fn kind(&self) -> Kind {
        match self {
            Scalar::Boolean(_) => Kind::Boolean,
            Scalar::Int32(_) => Kind::Int32,
            Scalar::Int64(_) => Kind::Int64,
            Scalar::Int96(_) => Kind::Int96,
            Scalar::Float(_) => Kind::Float,
            Scalar::Double(_) => Kind::Double,
            Scalar::ByteArray(_) => Kind::ByteArray,
            Scalar::FixedLenByteArray(_) => Kind::FixedLenByteArray,
        }
    }

    /// Appends the canonical byte form: little-endian for the fixed-width
    /// types, three little-endian words for `INT96`, raw bytes otherwise.
    pub fn bytes_append(&self, dst: &mut Vec<u8>) {
        match self {
            Scalar::Boolean(value) => dst.push(u8::from(*value)),
            Scalar::Int32(value) => dst.extend_from_slice(&value.to_le_bytes()),
            Scalar::Int64(value) => dst.extend_from_slice(&value.to_le_bytes()),
            Scalar::Int96(value) => dst.extend_from_slice(value.to_le_bytes().as_ref()),
            Scalar::Float(value) => dst.extend_from_slice(&value.to_le_bytes()),
            Scalar::Double(value) => dst.extend_from_slice(&value.to_le_bytes()),
            Scalar::ByteArray(value) | Scalar::FixedLenByteArray(value) => {
                dst.extend_from_slice(value)
            }
        }
    }

    /// The canonical byte form as an owned vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![];
        self.bytes_append(&mut bytes);
        bytes
    }

    pub fn into_owned(self) -> Scalar<'static> {
        match self {
            Scalar::Boolean(value) => Scalar::Boolean(value),
            Scalar::Int32(value) => Scalar::Int32(value),
            Scalar::Int64(value) => Scalar::Int64(value),
            Scalar::Int96(value) => Scalar::Int96(value),
            Scalar::Float(value) => Scalar::Float(value),
            Scalar::Double(value) => Scalar::Double(value),
            Scalar::ByteArray(value) => Scalar::ByteArray(Cow::Owned(value.into_owned())),
            Scalar::FixedLenByteArray(value) => {
                Scalar::FixedLenByteArray(Cow::Owned(value.into_owned()))
            }
        }
    }
}

impl<'a> Scalar<'a> {
    /// Reads a scalar back from its canonical byte form.
    pub fn from_canonical(physical_type: PhysicalType, bytes: &'a [u8]) -> Result<Self> {
        let check = |size: usize| {
            if bytes.len() == size {
                Ok(())
            } else {
                Err(Error::corrupt(format!(
                    "a canonical {:?} has {} bytes, found {}",
                    physical_type,
                    size,
                    bytes.len()
                )))
            }
        };
        Ok(match physical_type {
            PhysicalType::Boolean => {
                check(1)?;
                Scalar::Boolean(bytes[0] != 0)
            }
            PhysicalType::Int32 => {
                check(4)?;
                Scalar::Int32(i32::from_le_bytes(bytes.try_into().unwrap()))
            }
            PhysicalType::Int64 => {
                check(8)?;
                Scalar::Int64(i64::from_le_bytes(bytes.try_into().unwrap()))
            }
            PhysicalType::Int96 => {
                check(12)?;
                Scalar::Int96(<[u32; 3]>::from_le_bytes(bytes.try_into().unwrap()))
            }
            PhysicalType::Float => {
                check(4)?;
                Scalar::Float(f32::from_le_bytes(bytes.try_into().unwrap()))
            }
            PhysicalType::Double => {
                check(8)?;
                Scalar::Double(f64::from_le_bytes(bytes.try_into().unwrap()))
            }
            PhysicalType::ByteArray => Scalar::ByteArray(Cow::Borrowed(bytes)),
            PhysicalType::FixedLenByteArray(size) => {
                check(size)?;
                Scalar::FixedLenByteArray(Cow::Borrowed(bytes))
            }
        })
    }
}

impl From<bool> for Scalar<'static> {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<i32> for Scalar<'static> {
    fn from(value: i32) -> Self {
        Scalar::Int32(value)
    }
}

impl From<i64> for Scalar<'static> {
    fn from(value: i64) -> Self {
        Scalar::Int64(value)
    }
}

impl From<f32> for Scalar<'static> {
    fn from(value: f32) -> Self {
        Scalar::Float(value)
    }
}

impl From<f64> for Scalar<'static> {
    fn from(value: f64) -> Self {
        Scalar::Double(value)
    }
}

impl<'a> From<&'a [u8]> for Scalar<'a> {
    fn from(value: &'a [u8]) -> Self {
        Scalar::ByteArray(Cow::Borrowed(value))
    }
}

impl From<Vec<u8>> for Scalar<'static> {
    fn from(value: Vec<u8>) -> Self {
        Scalar::ByteArray(Cow::Owned(value))
    }
}

/// The natural order of two scalars of the same kind: booleans sort
/// `false < true`, `INT96` compares as an unsigned 96-bit integer, byte
/// arrays compare bytewise.
///
/// `unsigned` switches `Int32`/`Int64` to unsigned comparison, for columns
/// whose logical type is an unsigned integer.
pub fn compare(a: &Scalar, b: &Scalar, unsigned: bool) -> Result<Ordering> {
    Ok(match (a, b) {
        (Scalar::Boolean(a), Scalar::Boolean(b)) => a.cmp(b),
        (Scalar::Int32(a), Scalar::Int32(b)) => {
            if unsigned {
                (*a as u32).cmp(&(*b as u32))
            } else {
                a.cmp(b)
            }
        }
        (Scalar::Int64(a), Scalar::Int64(b)) => {
            if unsigned {
                (*a as u64).cmp(&(*b as u64))
            } else {
                a.cmp(b)
            }
        }
        (Scalar::Int96(a), Scalar::Int96(b)) => a.ord(b),
        (Scalar::Float(a), Scalar::Float(b)) => a.ord(b),
        (Scalar::Double(a), Scalar::Double(b)) => a.ord(b),
        (Scalar::ByteArray(a), Scalar::ByteArray(b)) => a.as_ref().cmp(b.as_ref()),
        (Scalar::FixedLenByteArray(a), Scalar::FixedLenByteArray(b)) => {
            // the 128-bit case compares as a big-endian unsigned integer,
            // which coincides with the bytewise order
            if a.len() == 16 && b.len() == 16 {
                let a = u128::from_be_bytes(a.as_ref().try_into().unwrap());
                let b = u128::from_be_bytes(b.as_ref().try_into().unwrap());
                a.cmp(&b)
            } else {
                a.as_ref().cmp(b.as_ref())
            }
        }
        _ => {
            return Err(Error::invalid(format!(
                "cannot compare a {:?} with a {:?}",
                a.kind(),
                b.kind()
            )))
        }
    })
}

/// A value of a leaf column: an optional payload together with its
/// repetition level, definition level and leaf column index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Value<'a> {
    scalar: Option<Scalar<'a>>,
    rep_level: u16,
    def_level: u16,
    column: usize,
}

impl<'a> Value<'a> {
    /// A value with zeroed levels and column index; chain with
    /// [`Value::level`].
    pub fn new(scalar: Scalar<'a>) -> Self {
        Self {
            scalar: Some(scalar),
            rep_level: 0,
            def_level: 0,
            column: 0,
        }
    }

    /// The null value. Its definition level says at which ancestor the
    /// null occurred.
    pub fn null() -> Value<'static> {
        Value {
            scalar: None,
            rep_level: 0,
            def_level: 0,
            column: 0,
        }
    }

    /// Attaches repetition level, definition level and column index.
    pub fn level(mut self, rep_level: u16, def_level: u16, column: usize) -> Self {
        self.rep_level = rep_level;
        self.def_level = def_level;
        self.column = column;
        self
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.scalar.is_none()
    }

    #[inline]
    pub fn kind(&self) -> Option<Kind> {
        self.scalar.as_ref().map(|x| x.kind())
    }

    #[inline]
    pub fn scalar(&self) -> Option<&Scalar<'a>> {
        self.scalar.as_ref()
    }

    #[inline]
    pub fn rep_level(&self) -> u16 {
        self.rep_level
    }

    #[inline]
    pub fn def_level(&self) -> u16 {
        self.def_level
    }

    #[inline]
    pub fn column_index(&self) -> usize {
        self.column
    }

    pub fn boolean(&self) -> Result<bool> {
        match &self.scalar {
            Some(Scalar::Boolean(value)) => Ok(*value),
            other => Err(kind_mismatch("BOOLEAN", other)),
        }
    }

    pub fn int32(&self) -> Result<i32> {
        match &self.scalar {
            Some(Scalar::Int32(value)) => Ok(*value),
            other => Err(kind_mismatch("INT32", other)),
        }
    }

    pub fn int64(&self) -> Result<i64> {
        match &self.scalar {
            Some(Scalar::Int64(value)) => Ok(*value),
            other => Err(kind_mismatch("INT64", other)),
        }
    }

    pub fn int96(&self) -> Result<[u32; 3]> {
        match &self.scalar {
            Some(Scalar::Int96(value)) => Ok(*value),
            other => Err(kind_mismatch("INT96", other)),
        }
    }

    pub fn float(&self) -> Result<f32> {
        match &self.scalar {
            Some(Scalar::Float(value)) => Ok(*value),
            other => Err(kind_mismatch("FLOAT", other)),
        }
    }

    pub fn double(&self) -> Result<f64> {
        match &self.scalar {
            Some(Scalar::Double(value)) => Ok(*value),
            other => Err(kind_mismatch("DOUBLE", other)),
        }
    }

    pub fn byte_array(&self) -> Result<&[u8]> {
        match &self.scalar {
            Some(Scalar::ByteArray(value)) | Some(Scalar::FixedLenByteArray(value)) => Ok(value),
            other => Err(kind_mismatch("BYTE_ARRAY", other)),
        }
    }

    /// Appends the canonical byte form of the payload; a no-op for nulls.
    pub fn bytes_append(&self, dst: &mut Vec<u8>) {
        if let Some(scalar) = &self.scalar {
            scalar.bytes_append(dst)
        }
    }

    /// Deep-copies byte payloads, detaching the value from the buffer it
    /// was read from.
    pub fn into_owned(self) -> Value<'static> {
        Value {
            scalar: self.scalar.map(|x| x.into_owned()),
            rep_level: self.rep_level,
            def_level: self.def_level,
            column: self.column,
        }
    }
}

fn kind_mismatch(expected: &str, found: &Option<Scalar>) -> Error {
    match found {
        None => Error::invalid(format!("expected a {} value, found null", expected)),
        Some(scalar) => Error::invalid(format!(
            "expected a {} value, found {:?}",
            expected,
            scalar.kind()
        )),
    }
}

/// Value equality: nulls are equal to each other and levels are ignored.
pub fn equal(a: &Value, b: &Value) -> bool {
    a.scalar() == b.scalar()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_has_no_kind() {
        let value = Value::null().level(0, 1, 3);
        assert!(value.is_null());
        assert_eq!(value.kind(), None);
        assert_eq!(value.def_level(), 1);
        assert_eq!(value.column_index(), 3);
        assert!(value.int32().is_err());
    }

    #[test]
    fn canonical_bytes() {
        let mut bytes = vec![];
        Scalar::from(true).bytes_append(&mut bytes);
        Scalar::from(1i32).bytes_append(&mut bytes);
        assert_eq!(bytes, vec![1, 1, 0, 0, 0]);

        let mut bytes = vec![];
        Scalar::Int96([1, 0, 2]).bytes_append(&mut bytes);
        assert_eq!(bytes, vec![1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn orders() {
        let less = compare(&Scalar::from(false), &Scalar::from(true), false).unwrap();
        assert_eq!(less, Ordering::Less);

        // -1 as unsigned is the maximum
        let order = compare(&Scalar::from(-1i32), &Scalar::from(1i32), true).unwrap();
        assert_eq!(order, Ordering::Greater);
        let order = compare(&Scalar::from(-1i32), &Scalar::from(1i32), false).unwrap();
        assert_eq!(order, Ordering::Less);

        let a = Scalar::from(b"abc".as_ref());
        let b = Scalar::from(b"abd".as_ref());
        assert_eq!(compare(&a, &b, false).unwrap(), Ordering::Less);

        assert!(compare(&Scalar::from(1i32), &Scalar::from(1i64), false).is_err());
    }

    #[test]
    fn accessors_coerce_kinds() {
        let value = Value::new(Scalar::from(3i64));
        assert_eq!(value.int64().unwrap(), 3);
        assert!(value.int32().is_err());
        assert!(!value.is_null());
    }

    #[test]
    fn clone_detaches_byte_payloads() {
        let data = b"payload".to_vec();
        let value = Value::new(Scalar::from(data.as_slice())).into_owned();
        drop(data);
        assert_eq!(value.byte_array().unwrap(), b"payload");
    }
}
