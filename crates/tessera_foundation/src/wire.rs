//! The binary wire codec: little-endian primitives, length-prefixed strings,
//! and per-kind attribute value encoding.

use glam::{DVec2, IVec2, Quat, Vec3};

use crate::error::{Error, Result};
use crate::math::{Color, Transform};
use crate::value::{AssetReference, AttributeTypeId, AttributeValue, Variant};

/// Appends wire-format primitives to an owned byte buffer.
///
/// All multi-byte integers and floats are little-endian. Strings are UTF-8
/// bytes prefixed with a `u16` byte length.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the writer and returns the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `f32`.
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `f64`.
    pub fn write_f64(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a `u16`-length-prefixed UTF-8 string.
    ///
    /// Text longer than `u16::MAX` bytes is truncated at the prefix limit
    /// on a character boundary.
    pub fn write_string(&mut self, text: &str) {
        let mut bytes = text.as_bytes();
        if bytes.len() > usize::from(u16::MAX) {
            let mut cut = usize::from(u16::MAX);
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            tracing::warn!(length = bytes.len(), kept = cut, "wire string truncated at u16 prefix limit");
            bytes = &bytes[..cut];
        }
        #[allow(clippy::cast_possible_truncation)]
        self.write_u16(bytes.len() as u16);
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes raw bytes with no prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }
}

/// Reads wire-format primitives from a byte slice, tracking position.
#[derive(Debug)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over the given bytes.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Number of bytes not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Returns true when every byte has been consumed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::WireUnderflow {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireUnderflow`] if the input is exhausted.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a little-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireUnderflow`] if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireUnderflow`] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireUnderflow`] if fewer than 4 bytes remain.
    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian `f32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireUnderflow`] if fewer than 4 bytes remain.
    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireUnderflow`] if fewer than 8 bytes remain.
    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.take(8)?;
        let mut array = [0_u8; 8];
        array.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(array))
    }

    /// Reads a `u16`-length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireUnderflow`] on short input or
    /// [`Error::InvalidUtf8`] when the bytes are not valid UTF-8.
    pub fn read_string(&mut self) -> Result<String> {
        let length = usize::from(self.read_u16()?);
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8)
    }

    /// Reads raw bytes with no prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireUnderflow`] if fewer than `count` bytes remain.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }
}

impl AttributeValue {
    /// Encodes this value in wire form.
    ///
    /// Quaternions encode in x, y, z, w order; note the text codec writes
    /// w first.
    pub fn encode(&self, writer: &mut WireWriter) {
        match self {
            Self::String(s) => writer.write_string(s),
            Self::Int(n) => writer.write_i32(*n),
            Self::Real(n) => writer.write_f32(*n),
            Self::Color(c) => {
                writer.write_f32(c.r);
                writer.write_f32(c.g);
                writer.write_f32(c.b);
                writer.write_f32(c.a);
            }
            Self::Vector3(v) => {
                writer.write_f32(v.x);
                writer.write_f32(v.y);
                writer.write_f32(v.z);
            }
            Self::Bool(b) => writer.write_u8(u8::from(*b)),
            Self::UInt(n) => writer.write_u32(*n),
            Self::Quaternion(q) => {
                writer.write_f32(q.x);
                writer.write_f32(q.y);
                writer.write_f32(q.z);
                writer.write_f32(q.w);
            }
            Self::AssetReference(r) => writer.write_string(&r.0),
            Self::AssetReferenceList(list) => {
                #[allow(clippy::cast_possible_truncation)]
                writer.write_u8(list.len().min(usize::from(u8::MAX)) as u8);
                for item in list.iter().take(usize::from(u8::MAX)) {
                    writer.write_string(&item.0);
                }
            }
            Self::Variant(v) => writer.write_string(&v.0),
            Self::VariantList(list) => {
                #[allow(clippy::cast_possible_truncation)]
                writer.write_u8(list.len().min(usize::from(u8::MAX)) as u8);
                for item in list.iter().take(usize::from(u8::MAX)) {
                    writer.write_string(&item.0);
                }
            }
            Self::Transform(t) => {
                for field in [
                    t.position.x,
                    t.position.y,
                    t.position.z,
                    t.rotation.x,
                    t.rotation.y,
                    t.rotation.z,
                    t.scale.x,
                    t.scale.y,
                    t.scale.z,
                ] {
                    writer.write_f32(field);
                }
            }
            Self::Point(p) | Self::Size(p) => {
                writer.write_i32(p.x);
                writer.write_i32(p.y);
            }
            Self::PointF(p) | Self::SizeF(p) => {
                writer.write_f64(p.x);
                writer.write_f64(p.y);
            }
        }
    }

    /// Decodes a value of the given kind from wire form.
    ///
    /// # Errors
    ///
    /// Returns a wire error when the input is short or a string is not
    /// valid UTF-8.
    pub fn decode(kind: AttributeTypeId, reader: &mut WireReader<'_>) -> Result<Self> {
        let value = match kind {
            AttributeTypeId::String => Self::String(reader.read_string()?),
            AttributeTypeId::Int => Self::Int(reader.read_i32()?),
            AttributeTypeId::Real => Self::Real(reader.read_f32()?),
            AttributeTypeId::Color => Self::Color(Color::new(
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
            )),
            AttributeTypeId::Vector3 => Self::Vector3(Vec3::new(
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
            )),
            AttributeTypeId::Bool => Self::Bool(reader.read_u8()? != 0),
            AttributeTypeId::UInt => Self::UInt(reader.read_u32()?),
            AttributeTypeId::Quaternion => Self::Quaternion(Quat::from_xyzw(
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
            )),
            AttributeTypeId::AssetReference => {
                Self::AssetReference(AssetReference::new(reader.read_string()?))
            }
            AttributeTypeId::AssetReferenceList => {
                let count = usize::from(reader.read_u8()?);
                let mut list = Vec::with_capacity(count);
                for _ in 0..count {
                    list.push(AssetReference::new(reader.read_string()?));
                }
                Self::AssetReferenceList(list)
            }
            AttributeTypeId::Variant => Self::Variant(Variant::new(reader.read_string()?)),
            AttributeTypeId::VariantList => {
                let count = usize::from(reader.read_u8()?);
                let mut list = Vec::with_capacity(count);
                for _ in 0..count {
                    list.push(Variant::new(reader.read_string()?));
                }
                Self::VariantList(list)
            }
            AttributeTypeId::Transform => {
                let mut fields = [0.0_f32; 9];
                for slot in &mut fields {
                    *slot = reader.read_f32()?;
                }
                Self::Transform(Transform::new(
                    Vec3::new(fields[0], fields[1], fields[2]),
                    Vec3::new(fields[3], fields[4], fields[5]),
                    Vec3::new(fields[6], fields[7], fields[8]),
                ))
            }
            AttributeTypeId::Point => Self::Point(IVec2::new(reader.read_i32()?, reader.read_i32()?)),
            AttributeTypeId::Size => Self::Size(IVec2::new(reader.read_i32()?, reader.read_i32()?)),
            AttributeTypeId::PointF => {
                Self::PointF(DVec2::new(reader.read_f64()?, reader.read_f64()?))
            }
            AttributeTypeId::SizeF => {
                Self::SizeF(DVec2::new(reader.read_f64()?, reader.read_f64()?))
            }
        };
        Ok(value)
    }
}
