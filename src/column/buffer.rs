use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::metadata::ColumnDescriptor;
use crate::page::BufferedPage;
use crate::schema::types::PhysicalType;
use crate::value::{Kind, Scalar, Value};

/// Dense typed storage shared by column buffers, pages and dictionaries.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValues {
    Boolean(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int96(Vec<[u32; 3]>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ByteArray(Vec<Vec<u8>>),
    FixedLenByteArray { size: usize, data: Vec<u8> },
}

impl TypedValues {
    pub fn new(physical_type: PhysicalType) -> Self {
        match physical_type {
            PhysicalType::Boolean => Self::Boolean(vec![]),
            PhysicalType::Int32 => Self::Int32(vec![]),
            PhysicalType::Int64 => Self::Int64(vec![]),
            PhysicalType::Int96 => Self::Int96(vec![]),
            PhysicalType::Float => Self::Float(vec![]),
            PhysicalType::Double => Self::Double(vec![]),
            PhysicalType::ByteArray => Self::ByteArray(vec![]),
            PhysicalType::FixedLenByteArray(size) => Self::FixedLenByteArray {
                size,
                data: vec![],
            },
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Boolean(_) => Kind::Boolean,
            Self::Int32(_) => Kind::Int32,
            Self::Int64(_) => Kind::Int64,
            Self::Int96(_) => Kind::Int96,
            Self::Float(_) => Kind::Float,
            Self::Double(_) => Kind::Double,
            Self::ByteArray(_) => Kind::ByteArray,
            Self::FixedLenByteArray { .. } => Kind::FixedLenByteArray,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(values) => values.len(),
            Self::Int32(values) => values.len(),
            Self::Int64(values) => values.len(),
            Self::Int96(values) => values.len(),
            Self::Float(values) => values.len(),
            Self::Double(values) => values.len(),
            Self::ByteArray(values) => values.len(),
            Self::FixedLenByteArray { size, data } => {
                if *size == 0 {
                    0
                } else {
                    data.len() / size
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            Self::Boolean(values) => values.clear(),
            Self::Int32(values) => values.clear(),
            Self::Int64(values) => values.clear(),
            Self::Int96(values) => values.clear(),
            Self::Float(values) => values.clear(),
            Self::Double(values) => values.clear(),
            Self::ByteArray(values) => values.clear(),
            Self::FixedLenByteArray { data, .. } => data.clear(),
        }
    }

    /// Appends a scalar. [`Error::InvalidInput`] on a kind (or fixed
    /// length) mismatch; the store is unchanged on error.
    pub fn push(&mut self, scalar: &Scalar) -> Result<()> {
        match (self, scalar) {
            (Self::Boolean(values), Scalar::Boolean(v)) => values.push(*v),
            (Self::Int32(values), Scalar::Int32(v)) => values.push(*v),
            (Self::Int64(values), Scalar::Int64(v)) => values.push(*v),
            (Self::Int96(values), Scalar::Int96(v)) => values.push(*v),
            (Self::Float(values), Scalar::Float(v)) => values.push(*v),
            (Self::Double(values), Scalar::Double(v)) => values.push(*v),
            (Self::ByteArray(values), Scalar::ByteArray(v)) => values.push(v.to_vec()),
            (Self::FixedLenByteArray { size, data }, Scalar::FixedLenByteArray(v)) => {
                if v.len() != *size {
                    return Err(Error::invalid(format!(
                        "a FIXED_LEN_BYTE_ARRAY({}) cannot store {} bytes",
                        size,
                        v.len()
                    )));
                }
                data.extend_from_slice(v);
            }
            (this, scalar) => {
                return Err(Error::invalid(format!(
                    "a {:?} column cannot store a {:?} value",
                    this.kind(),
                    scalar.kind()
                )))
            }
        }
        Ok(())
    }

    /// The scalar at position `i`, borrowing this store.
    /// # Panics
    /// Panics iff `i >= len`.
    pub fn scalar_at(&self, i: usize) -> Scalar<'_> {
        match self {
            Self::Boolean(values) => Scalar::Boolean(values[i]),
            Self::Int32(values) => Scalar::Int32(values[i]),
            Self::Int64(values) => Scalar::Int64(values[i]),
            Self::Int96(values) => Scalar::Int96(values[i]),
            Self::Float(values) => Scalar::Float(values[i]),
            Self::Double(values) => Scalar::Double(values[i]),
            Self::ByteArray(values) => Scalar::ByteArray(values[i].as_slice().into()),
            Self::FixedLenByteArray { size, data } => {
                Scalar::FixedLenByteArray(data[i * size..(i + 1) * size].into())
            }
        }
    }

    /// Appends the canonical bytes of the value at `i` to `dst`.
    pub fn bytes_at(&self, i: usize, dst: &mut Vec<u8>) {
        self.scalar_at(i).bytes_append(dst)
    }

    /// Compares the values at `i` and `j` in the type's natural order.
    pub fn ord(&self, i: usize, j: usize, unsigned: bool) -> Ordering {
        use crate::types::NativeType;
        match self {
            Self::Boolean(values) => values[i].cmp(&values[j]),
            Self::Int32(values) => {
                if unsigned {
                    (values[i] as u32).cmp(&(values[j] as u32))
                } else {
                    values[i].cmp(&values[j])
                }
            }
            Self::Int64(values) => {
                if unsigned {
                    (values[i] as u64).cmp(&(values[j] as u64))
                } else {
                    values[i].cmp(&values[j])
                }
            }
            Self::Int96(values) => values[i].ord(&values[j]),
            Self::Float(values) => values[i].ord(&values[j]),
            Self::Double(values) => values[i].ord(&values[j]),
            Self::ByteArray(values) => values[i].cmp(&values[j]),
            Self::FixedLenByteArray { size, data } => {
                let a = &data[i * size..(i + 1) * size];
                let b = &data[j * size..(j + 1) * size];
                if *size == 16 {
                    let a = u128::from_be_bytes(a.try_into().unwrap());
                    let b = u128::from_be_bytes(b.try_into().unwrap());
                    a.cmp(&b)
                } else {
                    a.cmp(b)
                }
            }
        }
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        match self {
            Self::Boolean(values) => values.swap(i, j),
            Self::Int32(values) => values.swap(i, j),
            Self::Int64(values) => values.swap(i, j),
            Self::Int96(values) => values.swap(i, j),
            Self::Float(values) => values.swap(i, j),
            Self::Double(values) => values.swap(i, j),
            Self::ByteArray(values) => values.swap(i, j),
            Self::FixedLenByteArray { size, data } => {
                for k in 0..*size {
                    data.swap(i * *size + k, j * *size + k);
                }
            }
        }
    }

    /// Removes and returns the value at `i`, shifting the tail left.
    pub(crate) fn remove(&mut self, i: usize) -> Scalar<'static> {
        match self {
            Self::Boolean(values) => Scalar::Boolean(values.remove(i)),
            Self::Int32(values) => Scalar::Int32(values.remove(i)),
            Self::Int64(values) => Scalar::Int64(values.remove(i)),
            Self::Int96(values) => Scalar::Int96(values.remove(i)),
            Self::Float(values) => Scalar::Float(values.remove(i)),
            Self::Double(values) => Scalar::Double(values.remove(i)),
            Self::ByteArray(values) => Scalar::ByteArray(values.remove(i).into()),
            Self::FixedLenByteArray { size, data } => {
                let removed: Vec<u8> = data.drain(i * *size..(i + 1) * *size).collect();
                Scalar::FixedLenByteArray(removed.into())
            }
        }
    }

    /// Inserts a value at `i`, shifting the tail right.
    pub(crate) fn insert(&mut self, i: usize, scalar: &Scalar) -> Result<()> {
        match (self, scalar) {
            (Self::Boolean(values), Scalar::Boolean(v)) => values.insert(i, *v),
            (Self::Int32(values), Scalar::Int32(v)) => values.insert(i, *v),
            (Self::Int64(values), Scalar::Int64(v)) => values.insert(i, *v),
            (Self::Int96(values), Scalar::Int96(v)) => values.insert(i, *v),
            (Self::Float(values), Scalar::Float(v)) => values.insert(i, *v),
            (Self::Double(values), Scalar::Double(v)) => values.insert(i, *v),
            (Self::ByteArray(values), Scalar::ByteArray(v)) => values.insert(i, v.to_vec()),
            (Self::FixedLenByteArray { size, data }, Scalar::FixedLenByteArray(v)) => {
                if v.len() != *size {
                    return Err(Error::invalid(format!(
                        "a FIXED_LEN_BYTE_ARRAY({}) cannot store {} bytes",
                        size,
                        v.len()
                    )));
                }
                let at = i * *size;
                data.splice(at..at, v.iter().copied());
            }
            (this, scalar) => {
                return Err(Error::invalid(format!(
                    "a {:?} column cannot store a {:?} value",
                    this.kind(),
                    scalar.kind()
                )))
            }
        }
        Ok(())
    }

    /// Appends the values `range` of `other`.
    pub(crate) fn extend_from_range(&mut self, other: &Self, start: usize, end: usize) {
        match (self, other) {
            (Self::Boolean(dst), Self::Boolean(src)) => dst.extend_from_slice(&src[start..end]),
            (Self::Int32(dst), Self::Int32(src)) => dst.extend_from_slice(&src[start..end]),
            (Self::Int64(dst), Self::Int64(src)) => dst.extend_from_slice(&src[start..end]),
            (Self::Int96(dst), Self::Int96(src)) => dst.extend_from_slice(&src[start..end]),
            (Self::Float(dst), Self::Float(src)) => dst.extend_from_slice(&src[start..end]),
            (Self::Double(dst), Self::Double(src)) => dst.extend_from_slice(&src[start..end]),
            (Self::ByteArray(dst), Self::ByteArray(src)) => {
                dst.extend(src[start..end].iter().cloned())
            }
            (
                Self::FixedLenByteArray { size, data },
                Self::FixedLenByteArray { data: src, .. },
            ) => data.extend_from_slice(&src[start * *size..end * *size]),
            _ => unreachable!("ranges are only taken between stores of the same column"),
        }
    }

    /// The minimum and maximum, or `None` when empty. NaNs are skipped.
    pub fn min_max(&self, unsigned: bool) -> Option<(Scalar<'_>, Scalar<'_>)> {
        if self.is_empty() {
            return None;
        }
        let mut min = 0usize;
        let mut max = 0usize;
        for i in 1..self.len() {
            if self.ord(i, min, unsigned) == Ordering::Less {
                min = i;
            }
            if self.ord(i, max, unsigned) == Ordering::Greater {
                max = i;
            }
        }
        Some((self.scalar_at(min), self.scalar_at(max)))
    }

    /// The number of values the store can hold without reallocating.
    pub fn capacity(&self) -> usize {
        match self {
            Self::Boolean(values) => values.capacity(),
            Self::Int32(values) => values.capacity(),
            Self::Int64(values) => values.capacity(),
            Self::Int96(values) => values.capacity(),
            Self::Float(values) => values.capacity(),
            Self::Double(values) => values.capacity(),
            Self::ByteArray(values) => values.capacity(),
            Self::FixedLenByteArray { size, data } => {
                if *size == 0 {
                    0
                } else {
                    data.capacity() / size
                }
            }
        }
    }

    /// An estimate of the encoded size, used to split pages.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Boolean(values) => crate::encoding::ceil8(values.len()),
            Self::Int32(values) => values.len() * 4,
            Self::Int64(values) => values.len() * 8,
            Self::Int96(values) => values.len() * 12,
            Self::Float(values) => values.len() * 4,
            Self::Double(values) => values.len() * 8,
            Self::ByteArray(values) => values.iter().map(|v| 4 + v.len()).sum(),
            Self::FixedLenByteArray { data, .. } => data.len(),
        }
    }
}

/// A typed append-only accumulator for one leaf column, with parallel
/// level arrays for optional and repeated leaves.
///
/// The buffer is created per column per row group, mutated by the
/// shredder, frozen into a [`BufferedPage`] on flush, and reset for reuse.
#[derive(Debug, Clone)]
pub struct ColumnBuffer {
    descriptor: ColumnDescriptor,
    values: TypedValues,
    def_levels: Vec<u16>,
    rep_levels: Vec<u16>,
    unsigned: bool,
    nulls_first: bool,
}

impl ColumnBuffer {
    pub fn new(descriptor: ColumnDescriptor, nulls_first: bool) -> Self {
        let values = TypedValues::new(descriptor.physical_type());
        let unsigned = descriptor.descriptor.primitive_type.is_unsigned();
        Self {
            descriptor,
            values,
            def_levels: vec![],
            rep_levels: vec![],
            unsigned,
            nulls_first,
        }
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    fn max_def(&self) -> u16 {
        self.descriptor.max_def_level()
    }

    fn max_rep(&self) -> u16 {
        self.descriptor.max_rep_level()
    }

    /// The number of value slots, nulls included.
    pub fn len(&self) -> usize {
        if self.max_def() > 0 {
            self.def_levels.len()
        } else {
            self.values.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of values the buffer can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// The number of rows buffered: slots with repetition level 0.
    pub fn num_rows(&self) -> usize {
        if self.max_rep() > 0 {
            self.rep_levels.iter().filter(|r| **r == 0).count()
        } else {
            self.len()
        }
    }

    /// An estimate of the encoded size, levels included.
    pub fn byte_len(&self) -> usize {
        self.values.byte_len() + self.def_levels.len() / 4 + self.rep_levels.len() / 4
    }

    /// Appends present values in order, with zeroed repetition levels.
    pub fn append(&mut self, scalars: &[Scalar]) -> Result<()> {
        for scalar in scalars {
            self.values.push(scalar)?;
            if self.max_def() > 0 {
                self.def_levels.push(self.max_def());
            }
            if self.max_rep() > 0 {
                self.rep_levels.push(0);
            }
        }
        Ok(())
    }

    /// Appends raw canonical bytes. The length must be a multiple of the
    /// element size; variable-length columns reject this call.
    pub fn append_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let size = self
            .descriptor
            .physical_type()
            .byte_size()
            .ok_or_else(|| {
                Error::invalid("append_raw requires a fixed-size physical type")
            })?;
        if size == 0 || bytes.len() % size != 0 {
            return Err(Error::invalid(format!(
                "{} raw bytes are not a multiple of the element size {}",
                bytes.len(),
                size
            )));
        }
        for chunk in bytes.chunks_exact(size) {
            let scalar = Scalar::from_canonical(self.descriptor.physical_type(), chunk)
                .map_err(|_| Error::invalid("malformed canonical bytes"))?;
            self.values.push(&scalar)?;
            if self.max_def() > 0 {
                self.def_levels.push(self.max_def());
            }
            if self.max_rep() > 0 {
                self.rep_levels.push(0);
            }
        }
        Ok(())
    }

    /// Appends values with their levels, coercing each [`Value`] through
    /// its typed accessor. The buffer length is unchanged on error.
    pub fn write_values(&mut self, values: &[Value]) -> Result<()> {
        let path = &self.descriptor.path_in_schema;
        for value in values {
            if value.rep_level() > self.max_rep() || value.def_level() > self.max_def() {
                return Err(Error::invalid(format!(
                    "column {}: level ({}, {}) exceeds the maximum ({}, {})",
                    path,
                    value.rep_level(),
                    value.def_level(),
                    self.max_rep(),
                    self.max_def(),
                )));
            }
            match value.scalar() {
                Some(scalar) => {
                    if self.max_def() > 0 && value.def_level() != self.max_def() {
                        return Err(Error::invalid(format!(
                            "column {}: a present value must have the maximum definition level",
                            path
                        )));
                    }
                    self.values.push(scalar)?;
                }
                None => {
                    if self.max_def() == 0 {
                        return Err(Error::invalid(format!(
                            "column {} is required and cannot store nulls",
                            path
                        )));
                    }
                    if value.def_level() == self.max_def() {
                        return Err(Error::invalid(format!(
                            "column {}: a null cannot have the maximum definition level",
                            path
                        )));
                    }
                }
            }
            if self.max_def() > 0 {
                self.def_levels.push(value.def_level());
            }
            if self.max_rep() > 0 {
                self.rep_levels.push(value.rep_level());
            }
        }
        Ok(())
    }

    fn is_null_slot(&self, slot: usize) -> bool {
        self.max_def() > 0 && self.def_levels[slot] < self.max_def()
    }

    /// The position in the value store of the (non-null) slot `slot`.
    fn value_index(&self, slot: usize) -> usize {
        if self.max_def() == 0 {
            slot
        } else {
            self.def_levels[..slot]
                .iter()
                .filter(|d| **d == self.max_def())
                .count()
        }
    }

    /// Reads up to `limit` values starting at slot `offset` into `out`,
    /// returning how many were read. [`Error::EndOfSequence`] when
    /// `offset` is at or past the end.
    pub fn read_values_at<'a>(
        &'a self,
        offset: usize,
        limit: usize,
        out: &mut Vec<Value<'a>>,
    ) -> Result<usize> {
        if offset >= self.len() {
            return Err(Error::EndOfSequence);
        }
        let end = std::cmp::min(offset + limit, self.len());
        let mut value_index = self.value_index(offset);
        for slot in offset..end {
            let rep = if self.max_rep() > 0 {
                self.rep_levels[slot]
            } else {
                0
            };
            let def = if self.max_def() > 0 {
                self.def_levels[slot]
            } else {
                0
            };
            if self.is_null_slot(slot) {
                out.push(Value::null().level(rep, def, self.descriptor.leaf_index));
            } else {
                let scalar = self.values.scalar_at(value_index);
                value_index += 1;
                out.push(Value::new(scalar).level(rep, def, self.descriptor.leaf_index));
            }
        }
        Ok(end - offset)
    }

    /// Whether slot `i` sorts before slot `j`, nulls placed according to
    /// the configured null policy.
    pub fn less(&self, i: usize, j: usize) -> bool {
        match (self.is_null_slot(i), self.is_null_slot(j)) {
            (true, true) => false,
            (true, false) => self.nulls_first,
            (false, true) => !self.nulls_first,
            (false, false) => {
                self.values
                    .ord(self.value_index(i), self.value_index(j), self.unsigned)
                    == Ordering::Less
            }
        }
    }

    /// Swaps two slots, moving values across the null boundary as needed.
    pub fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        match (self.is_null_slot(i), self.is_null_slot(j)) {
            (true, true) => {}
            (false, false) => {
                let vi = self.value_index(i);
                let vj = self.value_index(j);
                self.values.swap(vi, vj);
            }
            (false, true) => {
                let (lo, hi) = (i.min(j), i.max(j));
                let (from, to) = if self.is_null_slot(hi) {
                    // value is at the low slot and moves towards the end
                    (self.value_index(lo), self.value_index(hi) - 1)
                } else {
                    (self.value_index(hi), self.value_index(lo))
                };
                let moved = self.values.remove(from);
                // same kind re-inserted, this cannot fail
                let _ = self.values.insert(to, &moved);
            }
            (true, false) => {
                self.swap(j, i);
                return;
            }
        }
        if self.max_def() > 0 {
            self.def_levels.swap(i, j);
        }
        if self.max_rep() > 0 {
            self.rep_levels.swap(i, j);
        }
    }

    /// Resets the buffer for the next row group, retaining capacity of the
    /// value store.
    pub fn reset(&mut self) {
        self.values.clear();
        self.def_levels.clear();
        self.rep_levels.clear();
    }

    /// Freezes the buffered values into an immutable [`BufferedPage`] and
    /// leaves this buffer empty.
    pub fn freeze(&mut self) -> Result<BufferedPage> {
        let values = std::mem::replace(
            &mut self.values,
            TypedValues::new(self.descriptor.physical_type()),
        );
        let def_levels = std::mem::take(&mut self.def_levels);
        let rep_levels = std::mem::take(&mut self.rep_levels);
        BufferedPage::try_new(self.descriptor.clone(), values, def_levels, rep_levels)
    }

    /// Drains the buffer into one or more pages of roughly `target_bytes`
    /// each and hands each slice to `op`.
    pub fn for_each_page_slice<F>(&mut self, target_bytes: usize, mut op: F) -> Result<()>
    where
        F: FnMut(BufferedPage) -> Result<()>,
    {
        let page = self.freeze()?;
        for slice in page.split_by_size(target_bytes)? {
            op(slice)?;
        }
        Ok(())
    }
}
