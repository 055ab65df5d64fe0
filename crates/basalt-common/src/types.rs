//! Field types and values for BasaltDB tuples.
//!
//! Every field occupies a fixed number of bytes on disk, so a tuple's
//! serialized width is fully determined by its schema. Integers are
//! stored big-endian; text is stored at its declared capacity, padded
//! with NUL bytes.

use crate::error::{BasaltError, Result};
use serde::{Deserialize, Serialize};

/// Capacity in bytes for text columns declared without an explicit width.
pub const DEFAULT_TEXT_CAPACITY: usize = 128;

/// Pad byte used to fill unused text capacity.
const PAD: u8 = 0;

/// Type of a single tuple field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 32-bit signed integer, big-endian on disk.
    Int,
    /// Fixed-capacity UTF-8 text occupying exactly `capacity` bytes on
    /// disk, NUL-padded. Two text types with different capacities are
    /// distinct types.
    Text(usize),
}

impl FieldType {
    /// Exact number of bytes a value of this type occupies on disk.
    pub fn len(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Text(capacity) => *capacity,
        }
    }

    /// True for zero-width types (a `string(0)` column).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Int => write!(f, "int"),
            FieldType::Text(capacity) => write!(f, "string({})", capacity),
        }
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Text(String),
}

impl Field {
    /// Returns true if this value can be stored in a column of `ty`.
    pub fn matches(&self, ty: FieldType) -> bool {
        matches!(
            (self, ty),
            (Field::Int(_), FieldType::Int) | (Field::Text(_), FieldType::Text(_))
        )
    }

    /// Short name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Field::Int(_) => "int",
            Field::Text(_) => "string",
        }
    }

    /// Appends exactly `ty.len()` bytes encoding this value to `buf`.
    ///
    /// Text longer than the declared capacity is truncated on a UTF-8
    /// character boundary; shorter text is NUL-padded to capacity.
    pub fn encode_into(&self, ty: FieldType, buf: &mut Vec<u8>) -> Result<()> {
        if !self.matches(ty) {
            return Err(BasaltError::SchemaMismatch {
                expected: ty.to_string(),
                actual: self.kind_name().to_string(),
            });
        }
        match self {
            Field::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Field::Text(s) => {
                let capacity = ty.len();
                let bytes = s.as_bytes();
                let mut end = bytes.len().min(capacity);
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                buf.extend_from_slice(&bytes[..end]);
                buf.resize(buf.len() + (capacity - end), PAD);
            }
        }
        Ok(())
    }

    /// Decodes a value of type `ty` from the first `ty.len()` bytes of
    /// `buf`. Fails if the buffer is shorter than the type's width or
    /// (for text) the stored bytes are not valid UTF-8 after stripping
    /// trailing padding.
    pub fn decode(ty: FieldType, buf: &[u8]) -> Result<Field> {
        let width = ty.len();
        if buf.len() < width {
            return Err(BasaltError::FieldParse(format!(
                "need {} bytes for {}, have {}",
                width,
                ty,
                buf.len()
            )));
        }
        match ty {
            FieldType::Int => {
                let v = i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
                Ok(Field::Int(v))
            }
            FieldType::Text(capacity) => {
                let raw = &buf[..capacity];
                let end = raw.iter().rposition(|&b| b != PAD).map_or(0, |i| i + 1);
                let s = std::str::from_utf8(&raw[..end]).map_err(|e| {
                    BasaltError::FieldParse(format!("invalid UTF-8 in text field: {}", e))
                })?;
                Ok(Field::Text(s.to_string()))
            }
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "{}", s),
        }
    }
}
