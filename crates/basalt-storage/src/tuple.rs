//! Tuples and record identifiers.

use basalt_common::error::{BasaltError, Result};
use basalt_common::page::PageId;
use basalt_common::types::Field;

use std::fmt;
use std::sync::Arc;

use crate::schema::TupleDesc;

/// Physical address of a stored tuple: the page holding it plus the
/// slot index within that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: u16) -> RecordId {
        RecordId { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_id, self.slot)
    }
}

/// An in-memory tuple: a schema, one value slot per field, and the
/// record id stamped on it once it lives on a page.
///
/// Fields start unset and are filled with [`Tuple::set_field`]. A tuple
/// must be complete before a page accepts it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    schema: Arc<TupleDesc>,
    fields: Vec<Option<Field>>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple with every field unset and no record id.
    pub fn new(schema: Arc<TupleDesc>) -> Tuple {
        let fields = vec![None; schema.num_fields()];
        Tuple {
            schema,
            fields,
            record_id: None,
        }
    }

    pub fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }

    /// Sets field `index` to `field`. The value's kind must match the
    /// schema's type for that position.
    pub fn set_field(&mut self, index: usize, field: Field) -> Result<()> {
        let field_type = self.schema.field_type(index)?;
        if !field.matches(field_type) {
            return Err(BasaltError::SchemaMismatch {
                expected: field_type.to_string(),
                actual: field.kind_name().to_string(),
            });
        }
        self.fields[index] = Some(field);
        Ok(())
    }

    /// Value of field `index`, or `None` when the field is unset or the
    /// index is out of range.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index).and_then(Option::as_ref)
    }

    /// Iterates all field slots in schema order.
    pub fn fields(&self) -> impl Iterator<Item = Option<&Field>> {
        self.fields.iter().map(Option::as_ref)
    }

    /// Index of the first unset field, if any.
    pub fn first_unset(&self) -> Option<usize> {
        self.fields.iter().position(Option::is_none)
    }

    /// True when every field has a value.
    pub fn is_complete(&self) -> bool {
        self.first_unset().is_none()
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Swaps in a new schema and clears every field value. The record
    /// id is left alone.
    pub fn reset_schema(&mut self, schema: Arc<TupleDesc>) {
        self.fields = vec![None; schema.num_fields()];
        self.schema = schema;
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            match field {
                Some(field) => write!(f, "{}", field)?,
                None => write!(f, "null")?,
            }
        }
        Ok(())
    }
}
