//! Tuple schemas.
//!
//! A [`TupleDesc`] describes the fixed-width layout of every tuple in a
//! table: an ordered list of field types, each with an optional name.
//! Two schemas are equal when their types line up; names are decoration
//! for query output and never affect layout or compatibility.

use basalt_common::error::{BasaltError, Result};
use basalt_common::types::FieldType;

use std::fmt;

/// One column of a schema: a field type plus an optional name.
#[derive(Debug, Clone)]
pub struct FieldDef {
    field_type: FieldType,
    name: Option<String>,
}

impl FieldDef {
    /// Creates a named field definition.
    pub fn named(field_type: FieldType, name: impl Into<String>) -> FieldDef {
        FieldDef {
            field_type,
            name: Some(name.into()),
        }
    }

    /// Creates an anonymous field definition.
    pub fn unnamed(field_type: FieldType) -> FieldDef {
        FieldDef {
            field_type,
            name: None,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", self.field_type, name),
            None => write!(f, "{}", self.field_type),
        }
    }
}

/// Ordered description of the fields in a tuple.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    fields: Vec<FieldDef>,
}

impl TupleDesc {
    /// Builds a schema from field definitions.
    ///
    /// # Panics
    ///
    /// Panics if `fields` is empty. A tuple with no fields has no
    /// on-page representation.
    pub fn new(fields: Vec<FieldDef>) -> TupleDesc {
        assert!(!fields.is_empty(), "schema must have at least one field");
        TupleDesc { fields }
    }

    /// Builds an all-anonymous schema from a list of types.
    pub fn from_types(types: impl IntoIterator<Item = FieldType>) -> TupleDesc {
        TupleDesc::new(types.into_iter().map(FieldDef::unnamed).collect())
    }

    /// Number of fields in the schema.
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Type of field `index`.
    pub fn field_type(&self, index: usize) -> Result<FieldType> {
        self.fields
            .get(index)
            .map(FieldDef::field_type)
            .ok_or(BasaltError::FieldNotFound { index })
    }

    /// Name of field `index`, if it has one.
    pub fn field_name(&self, index: usize) -> Result<Option<&str>> {
        self.fields
            .get(index)
            .map(FieldDef::name)
            .ok_or(BasaltError::FieldNotFound { index })
    }

    /// Index of the first field named `name`. Anonymous fields never
    /// match, so looking up the empty string cannot alias them.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|def| def.name() == Some(name))
            .ok_or_else(|| BasaltError::ColumnNotFound(name.to_string()))
    }

    /// Total encoded width of one tuple in bytes.
    pub fn byte_size(&self) -> usize {
        self.fields.iter().map(|def| def.field_type.len()).sum()
    }

    /// Iterates the field definitions in order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    /// Concatenates two schemas: all of `left`'s fields followed by all
    /// of `right`'s, names preserved.
    pub fn merge(left: &TupleDesc, right: &TupleDesc) -> TupleDesc {
        let mut fields = Vec::with_capacity(left.num_fields() + right.num_fields());
        fields.extend(left.fields.iter().cloned());
        fields.extend(right.fields.iter().cloned());
        TupleDesc { fields }
    }
}

// Schema compatibility is structural: same arity, same types in order.
// Field names are ignored.
impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, def) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", def)?;
        }
        Ok(())
    }
}
