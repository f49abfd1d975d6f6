// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Binary block layouts shared by the encoder and the decoder.
//!
//! A [Schema] is the ordered list of fields of one C structure read by the
//! node runtime, with padding spelled out as explicit fields. Blocks are
//! little-endian. [BlockWriter] refuses to write fields out of schema order,
//! and [decode] rejects blocks of the wrong size or with non-zero padding.

use pdp_model::types::PdpResult;
use pdp_model::{data_error, encoding_error};

/// Layout revision of every block in this module. Revision 2 carries the
/// first/last output flags in the threshold block.
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    U8,
    U32,
    I16,
    I32,
    /// Alignment bytes, always written as zero.
    Pad(usize),
}

impl FieldType {
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            FieldType::U8 => 1,
            FieldType::I16 => 2,
            FieldType::U32 | FieldType::I32 => 4,
            FieldType::Pad(n) => n,
        }
    }

    #[must_use]
    pub const fn align(self) -> usize {
        match self {
            FieldType::Pad(_) => 1,
            _ => self.width(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    /// Array length, 1 for scalars.
    pub count: usize,
}

impl Field {
    #[must_use]
    pub const fn scalar(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, count: 1 }
    }

    #[must_use]
    pub const fn array(name: &'static str, ty: FieldType, count: usize) -> Self {
        Self { name, ty, count }
    }

    #[must_use]
    pub const fn pad(bytes: usize) -> Self {
        Self {
            name: "pad",
            ty: FieldType::Pad(bytes),
            count: 1,
        }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.ty.width() * self.count
    }
}

#[derive(Debug)]
pub struct Schema {
    /// Name of the structure on the node side.
    pub name: &'static str,
    pub version: u32,
    pub fields: &'static [Field],
}

impl Schema {
    #[must_use]
    pub const fn size(&self) -> usize {
        let mut size = 0;
        let mut i = 0;
        while i < self.fields.len() {
            size += self.fields[i].size();
            i += 1;
        }
        size
    }

    /// Byte offset of a named field.
    #[must_use]
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for field in self.fields {
            if field.name == name {
                return Some(offset);
            }
            offset += field.size();
        }
        None
    }

    /// Every field must sit on its natural alignment and the block must end
    /// on a word boundary.
    pub fn check_alignment(&self) -> PdpResult {
        let mut offset = 0;
        for field in self.fields {
            if offset % field.ty.align() != 0 {
                return encoding_error!(format!(
                    "Field {}.{} at offset {offset} is not {}-byte aligned",
                    self.name,
                    field.name,
                    field.ty.align()
                ));
            }
            offset += field.size();
        }
        if offset % 4 != 0 {
            return encoding_error!(format!(
                "Block {} is {offset} bytes, not a multiple of 4",
                self.name
            ));
        }
        Ok(())
    }
}

/// Writes the fields of one block in schema order.
pub struct BlockWriter {
    schema: &'static Schema,
    next: usize,
    bytes: Vec<u8>,
}

impl BlockWriter {
    #[must_use]
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            next: 0,
            bytes: Vec::with_capacity(schema.size()),
        }
    }

    fn skip_padding(&mut self) {
        while let Some(field) = self.schema.fields.get(self.next) {
            let FieldType::Pad(n) = field.ty else {
                break;
            };
            self.bytes.extend(std::iter::repeat_n(0u8, n));
            self.next += 1;
        }
    }

    fn expect(&mut self, name: &str, ty: FieldType, count: usize) -> PdpResult {
        self.skip_padding();
        let Some(field) = self.schema.fields.get(self.next) else {
            return encoding_error!(format!(
                "Field {name} written past the end of {}",
                self.schema.name
            ));
        };
        if field.name != name || field.ty != ty || field.count != count {
            return encoding_error!(format!(
                "Field {name} written where {}.{} is expected",
                self.schema.name, field.name
            ));
        }
        self.next += 1;
        Ok(())
    }

    pub fn u8(&mut self, name: &str, value: u8) -> PdpResult {
        self.expect(name, FieldType::U8, 1)?;
        self.bytes.push(value);
        Ok(())
    }

    pub fn flag(&mut self, name: &str, value: bool) -> PdpResult {
        self.u8(name, u8::from(value))
    }

    pub fn u32(&mut self, name: &str, value: u32) -> PdpResult {
        self.expect(name, FieldType::U32, 1)?;
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn i32(&mut self, name: &str, value: i32) -> PdpResult {
        self.expect(name, FieldType::I32, 1)?;
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Write a 16-bit field from an already range-checked encoding.
    pub fn i16(&mut self, name: &str, value: i32) -> PdpResult {
        let Ok(value) = i16::try_from(value) else {
            return encoding_error!(format!(
                "Value {value} of {}.{name} does not fit in 16 bits",
                self.schema.name
            ));
        };
        self.expect(name, FieldType::I16, 1)?;
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn u32_array(&mut self, name: &str, values: &[u32]) -> PdpResult {
        let Some(field) = self.schema.fields.iter().find(|f| f.name == name) else {
            return encoding_error!(format!("No field {}.{name}", self.schema.name));
        };
        if values.len() != field.count {
            return encoding_error!(format!(
                "{} values given for {}.{name} which holds {}",
                values.len(),
                self.schema.name,
                field.count
            ));
        }
        self.expect(name, FieldType::U32, values.len())?;
        for value in values {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    /// Complete the block, adding any trailing padding.
    pub fn finish(mut self) -> PdpResult<Vec<u8>> {
        self.skip_padding();
        if self.next != self.schema.fields.len() {
            return encoding_error!(format!(
                "Field {}.{} not written",
                self.schema.name, self.schema.fields[self.next].name
            ));
        }
        Ok(self.bytes)
    }
}

/// Fields of a decoded block, in schema order. Padding is not included.
#[derive(Debug, PartialEq)]
pub struct DecodedBlock {
    pub fields: Vec<(&'static str, Vec<i64>)>,
}

impl DecodedBlock {
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[i64]> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_slice())
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<i64> {
        self.values(name).and_then(|v| v.first().copied())
    }
}

pub fn decode(schema: &'static Schema, bytes: &[u8]) -> PdpResult<DecodedBlock> {
    if bytes.len() != schema.size() {
        return data_error!(format!(
            "{} bytes given for {} which is {} bytes",
            bytes.len(),
            schema.name,
            schema.size()
        ));
    }

    let mut fields = Vec::new();
    let mut offset = 0;
    for field in schema.fields {
        let width = field.ty.width();
        if let FieldType::Pad(n) = field.ty {
            if bytes[offset..offset + n].iter().any(|b| *b != 0) {
                return data_error!(format!(
                    "Non-zero padding at offset {offset} of {}",
                    schema.name
                ));
            }
            offset += n;
            continue;
        }

        let mut values = Vec::with_capacity(field.count);
        for _ in 0..field.count {
            let raw = &bytes[offset..offset + width];
            let value = match field.ty {
                FieldType::U8 => i64::from(raw[0]),
                FieldType::I16 => i64::from(i16::from_le_bytes([raw[0], raw[1]])),
                FieldType::U32 => i64::from(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
                FieldType::I32 => i64::from(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
                FieldType::Pad(_) => 0,
            };
            values.push(value);
            offset += width;
        }
        fields.push((field.name, values));
    }
    Ok(DecodedBlock { fields })
}
