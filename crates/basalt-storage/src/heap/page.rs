//! Slotted heap page format.
//!
//! On disk a page is `bitmap | slots | padding`:
//!
//! ```text
//! +-----------------------+------------------------------+---------+
//! | occupancy bitmap      | slot 0 | slot 1 | ... | slot | zeros   |
//! | ceil(num_slots/8) B   |    num_slots * tuple_size B  |         |
//! +-----------------------+------------------------------+---------+
//! ```
//!
//! Slot `i`'s occupancy bit is bit `i % 8` of bitmap byte `i / 8`, with
//! 1 meaning occupied. Every slot is `tuple_size` bytes wide, where
//! `tuple_size` comes from the table schema, so slot offsets are pure
//! arithmetic. Unoccupied slots, unused bitmap bits, and the tail of
//! the page are all zero.

use basalt_common::error::{BasaltError, Result};
use basalt_common::page::PageId;
use basalt_common::tx::TransactionId;
use basalt_common::types::Field;

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use crate::schema::TupleDesc;
use crate::tuple::{RecordId, Tuple};

/// A decoded heap page: the occupancy bitmap plus one materialized
/// tuple per occupied slot.
pub struct HeapPage {
    page_id: PageId,
    schema: Arc<TupleDesc>,
    page_size: usize,
    slot_count: usize,
    bitmap: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    dirtied_by: Option<TransactionId>,
    before_image: Bytes,
}

impl HeapPage {
    /// Number of slots a page of `page_size` bytes holds for tuples of
    /// `tuple_size` bytes. Each slot costs its payload plus one bitmap
    /// bit, so the count is `floor(page_size * 8 / (tuple_size * 8 + 1))`.
    pub fn slot_capacity(page_size: usize, tuple_size: usize) -> usize {
        (page_size * 8) / (tuple_size * 8 + 1)
    }

    /// Bitmap bytes needed to track `slot_count` occupancy bits.
    pub fn bitmap_len(slot_count: usize) -> usize {
        slot_count.div_ceil(8)
    }

    /// An all-zero page image, which is exactly what an empty page
    /// serializes to.
    pub fn empty_page_data(page_size: usize) -> Bytes {
        Bytes::from(vec![0u8; page_size])
    }

    /// Creates an empty page in memory.
    pub fn empty(page_id: PageId, schema: Arc<TupleDesc>, page_size: usize) -> HeapPage {
        let slot_count = Self::slot_capacity(page_size, schema.byte_size());
        HeapPage {
            page_id,
            schema,
            page_size,
            slot_count,
            bitmap: vec![0u8; Self::bitmap_len(slot_count)],
            tuples: vec![None; slot_count],
            dirtied_by: None,
            before_image: Self::empty_page_data(page_size),
        }
    }

    /// Decodes a page image. `data` must be exactly `page_size` bytes.
    ///
    /// Occupied slots are decoded into tuples stamped with their record
    /// id; a slot whose payload does not decode fails the whole page
    /// with [`BasaltError::PageCorrupted`]. Bitmap bits past
    /// `slot_count` are ignored and will serialize back as zero.
    pub fn parse(
        page_id: PageId,
        schema: Arc<TupleDesc>,
        data: &[u8],
        page_size: usize,
    ) -> Result<HeapPage> {
        if data.len() != page_size {
            return Err(BasaltError::PageSizeMismatch {
                expected: page_size,
                actual: data.len(),
            });
        }

        let tuple_size = schema.byte_size();
        let slot_count = Self::slot_capacity(page_size, tuple_size);
        let bitmap_len = Self::bitmap_len(slot_count);
        debug_assert!(bitmap_len + slot_count * tuple_size <= page_size);

        let mut bitmap = data[..bitmap_len].to_vec();
        if slot_count % 8 != 0 {
            if let Some(last) = bitmap.last_mut() {
                *last &= (1u8 << (slot_count % 8)) - 1;
            }
        }

        let mut tuples = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            if bitmap[slot / 8] >> (slot % 8) & 1 == 0 {
                tuples.push(None);
                continue;
            }
            let mut tuple = Tuple::new(Arc::clone(&schema));
            let mut offset = bitmap_len + slot * tuple_size;
            for (index, def) in schema.fields().enumerate() {
                let width = def.field_type().len();
                let field =
                    Field::decode(def.field_type(), &data[offset..offset + width]).map_err(
                        |err| BasaltError::PageCorrupted {
                            page_id,
                            reason: format!("slot {}: {}", slot, err),
                        },
                    )?;
                tuple.set_field(index, field)?;
                offset += width;
            }
            tuple.set_record_id(Some(RecordId::new(page_id, slot as u16)));
            tuples.push(Some(tuple));
        }

        Ok(HeapPage {
            page_id,
            schema,
            page_size,
            slot_count,
            bitmap,
            tuples,
            dirtied_by: None,
            before_image: Bytes::copy_from_slice(data),
        })
    }

    /// Encodes the page back into its on-disk image.
    pub fn serialize(&self) -> Bytes {
        let tuple_size = self.schema.byte_size();
        let mut buf = Vec::with_capacity(self.page_size);
        buf.extend_from_slice(&self.bitmap);
        for tuple in &self.tuples {
            match tuple {
                Some(tuple) => {
                    for (index, def) in self.schema.fields().enumerate() {
                        let field = tuple.field(index).expect("stored tuple is complete");
                        field
                            .encode_into(def.field_type(), &mut buf)
                            .expect("stored tuple matches the page schema");
                    }
                }
                None => buf.resize(buf.len() + tuple_size, 0),
            }
        }
        buf.resize(self.page_size, 0);
        Bytes::from(buf)
    }

    pub fn id(&self) -> PageId {
        self.page_id
    }

    pub fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of slots this page was laid out with.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// True when `slot` is occupied. Out-of-range slots are never
    /// occupied.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.slot_count && self.bitmap[slot / 8] >> (slot % 8) & 1 == 1
    }

    /// Number of unoccupied slots.
    pub fn empty_slot_count(&self) -> usize {
        (0..self.slot_count).filter(|&s| !self.is_slot_used(s)).count()
    }

    fn set_slot(&mut self, slot: usize, used: bool) {
        let mask = 1u8 << (slot % 8);
        if used {
            self.bitmap[slot / 8] |= mask;
        } else {
            self.bitmap[slot / 8] &= !mask;
        }
    }

    /// Places a complete, schema-matching tuple in the lowest empty
    /// slot and stamps its record id.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<RecordId> {
        if tuple.schema().as_ref() != self.schema.as_ref() {
            return Err(BasaltError::SchemaMismatch {
                expected: self.schema.to_string(),
                actual: tuple.schema().to_string(),
            });
        }
        if let Some(index) = tuple.first_unset() {
            return Err(BasaltError::IncompleteTuple { index });
        }
        let slot = (0..self.slot_count)
            .find(|&s| !self.is_slot_used(s))
            .ok_or(BasaltError::PageFull {
                page_id: self.page_id,
            })?;

        let record_id = RecordId::new(self.page_id, slot as u16);
        tuple.set_record_id(Some(record_id));
        self.set_slot(slot, true);
        self.tuples[slot] = Some(tuple);
        Ok(record_id)
    }

    /// Removes the tuple at `tuple`'s record id and clears that id.
    ///
    /// Fails with [`BasaltError::TupleNotFound`] when the tuple has no
    /// record id, the id names another page, or the slot is already
    /// empty. The page is untouched on failure.
    pub fn delete_tuple(&mut self, tuple: &mut Tuple) -> Result<()> {
        let record_id = tuple.record_id().ok_or_else(|| {
            BasaltError::TupleNotFound("tuple has no record id".to_string())
        })?;
        if record_id.page_id != self.page_id {
            return Err(BasaltError::TupleNotFound(format!(
                "record {} does not belong to page {}",
                record_id, self.page_id
            )));
        }
        let slot = record_id.slot as usize;
        if slot >= self.slot_count || !self.is_slot_used(slot) {
            return Err(BasaltError::TupleNotFound(format!(
                "slot {} of page {} is empty",
                slot, self.page_id
            )));
        }

        self.set_slot(slot, false);
        self.tuples[slot] = None;
        tuple.set_record_id(None);
        Ok(())
    }

    /// Iterates occupied slots in ascending slot order.
    pub fn iter(&self) -> HeapPageIter<'_> {
        HeapPageIter {
            page: self,
            slot: 0,
        }
    }

    /// Marks the page dirty on behalf of `txn_id`, or clean when
    /// `dirty` is false.
    pub fn mark_dirty(&mut self, dirty: bool, txn_id: TransactionId) {
        self.dirtied_by = if dirty { Some(txn_id) } else { None };
    }

    /// The transaction that last dirtied this page, if it is dirty.
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    /// Snapshots the current contents as the new before-image.
    pub fn set_before_image(&mut self) {
        self.before_image = self.serialize();
    }

    /// Decodes the page as of the last snapshot.
    pub fn before_image(&self) -> Result<HeapPage> {
        HeapPage::parse(
            self.page_id,
            Arc::clone(&self.schema),
            &self.before_image,
            self.page_size,
        )
    }
}

// Content equality: identity, layout, and live tuples. Dirty state and
// before-images are bookkeeping, not content.
impl PartialEq for HeapPage {
    fn eq(&self, other: &Self) -> bool {
        self.page_id == other.page_id
            && self.page_size == other.page_size
            && self.schema == other.schema
            && self.bitmap == other.bitmap
            && self.tuples == other.tuples
    }
}

impl fmt::Debug for HeapPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapPage")
            .field("page_id", &self.page_id)
            .field("slot_count", &self.slot_count)
            .field("occupied", &(self.slot_count - self.empty_slot_count()))
            .field("dirtied_by", &self.dirtied_by)
            .finish()
    }
}

/// Iterator over a page's occupied slots.
pub struct HeapPageIter<'a> {
    page: &'a HeapPage,
    slot: usize,
}

impl<'a> Iterator for HeapPageIter<'a> {
    type Item = &'a Tuple;

    fn next(&mut self) -> Option<&'a Tuple> {
        while self.slot < self.page.slot_count {
            let slot = self.slot;
            self.slot += 1;
            if let Some(tuple) = &self.page.tuples[slot] {
                return Some(tuple);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use basalt_common::page::DEFAULT_PAGE_SIZE;
    use basalt_common::types::FieldType;
    use rand::Rng;

    fn create_test_schema() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new(vec![
            FieldDef::named(FieldType::Int, "id"),
            FieldDef::named(FieldType::Text(16), "name"),
        ]))
    }

    fn create_test_page() -> HeapPage {
        HeapPage::empty(PageId::new(1, 0), create_test_schema(), DEFAULT_PAGE_SIZE)
    }

    fn create_test_tuple(schema: &Arc<TupleDesc>, id: i32, name: &str) -> Tuple {
        let mut tuple = Tuple::new(Arc::clone(schema));
        tuple.set_field(0, Field::Int(id)).unwrap();
        tuple.set_field(1, Field::Text(name.to_string())).unwrap();
        tuple
    }

    #[test]
    fn test_slot_capacity_math() {
        // 20-byte tuples: 4096 * 8 / 161 = 203 slots.
        assert_eq!(HeapPage::slot_capacity(4096, 20), 203);
        // Same tuples on a 512-byte page: 25 slots, 4 bitmap bytes.
        assert_eq!(HeapPage::slot_capacity(512, 20), 25);
        assert_eq!(HeapPage::bitmap_len(25), 4);
        // 1-byte tuples are dominated by bitmap overhead.
        assert_eq!(HeapPage::slot_capacity(4096, 1), 3640);
        // Tuples wider than the page fit zero slots.
        assert_eq!(HeapPage::slot_capacity(4096, 5000), 0);

        assert_eq!(HeapPage::bitmap_len(203), 26);
        assert_eq!(HeapPage::bitmap_len(8), 1);
        assert_eq!(HeapPage::bitmap_len(9), 2);
        assert_eq!(HeapPage::bitmap_len(0), 0);
    }

    #[test]
    fn test_layout_fits_in_page() {
        for tuple_size in [1, 4, 20, 128, 1000, 4095] {
            let slots = HeapPage::slot_capacity(4096, tuple_size);
            let bitmap = HeapPage::bitmap_len(slots);
            assert!(
                bitmap + slots * tuple_size <= 4096,
                "layout overflows for tuple_size {}",
                tuple_size
            );
            // One more slot must not fit, otherwise capacity is wrong.
            assert!(HeapPage::bitmap_len(slots + 1) + (slots + 1) * tuple_size > 4096);
        }
    }

    #[test]
    fn test_empty_page() {
        let page = create_test_page();
        assert_eq!(page.slot_count(), 203);
        assert_eq!(page.empty_slot_count(), 203);
        assert_eq!(page.iter().count(), 0);
        assert_eq!(page.serialize(), HeapPage::empty_page_data(DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_parse_zeroed_data_is_empty_page() {
        let data = HeapPage::empty_page_data(DEFAULT_PAGE_SIZE);
        let page = HeapPage::parse(
            PageId::new(1, 0),
            create_test_schema(),
            &data,
            DEFAULT_PAGE_SIZE,
        )
        .unwrap();
        assert_eq!(page, create_test_page());
    }

    #[test]
    fn test_parse_rejects_wrong_size() {
        let schema = create_test_schema();
        let short = vec![0u8; DEFAULT_PAGE_SIZE - 1];
        let long = vec![0u8; DEFAULT_PAGE_SIZE + 1];
        assert!(matches!(
            HeapPage::parse(PageId::new(1, 0), Arc::clone(&schema), &short, DEFAULT_PAGE_SIZE),
            Err(BasaltError::PageSizeMismatch { expected: 4096, actual: 4095 })
        ));
        assert!(matches!(
            HeapPage::parse(PageId::new(1, 0), schema, &long, DEFAULT_PAGE_SIZE),
            Err(BasaltError::PageSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_corrupt_slot() {
        let schema = create_test_schema();
        let mut data = vec![0u8; DEFAULT_PAGE_SIZE];
        // Mark slot 0 occupied and fill its text field with bytes that
        // are not UTF-8.
        data[0] = 0b0000_0001;
        let bitmap_len = HeapPage::bitmap_len(203);
        for b in &mut data[bitmap_len + 4..bitmap_len + 20] {
            *b = 0xFF;
        }
        let err = HeapPage::parse(PageId::new(1, 0), schema, &data, DEFAULT_PAGE_SIZE);
        assert!(matches!(err, Err(BasaltError::PageCorrupted { .. })));
    }

    #[test]
    fn test_insert_fills_lowest_empty_slot() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());

        let rid0 = page.insert_tuple(create_test_tuple(&schema, 0, "a")).unwrap();
        let rid1 = page.insert_tuple(create_test_tuple(&schema, 1, "b")).unwrap();
        assert_eq!(rid0.slot, 0);
        assert_eq!(rid1.slot, 1);
        assert_eq!(rid0.page_id, page.id());

        // Free slot 0, the next insert reuses it.
        let mut victim = page.iter().next().unwrap().clone();
        page.delete_tuple(&mut victim).unwrap();
        let rid2 = page.insert_tuple(create_test_tuple(&schema, 2, "c")).unwrap();
        assert_eq!(rid2.slot, 0);
    }

    #[test]
    fn test_insert_stamps_record_id_on_stored_tuple() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        let rid = page.insert_tuple(create_test_tuple(&schema, 7, "x")).unwrap();

        let stored = page.iter().next().unwrap();
        assert_eq!(stored.record_id(), Some(rid));
        assert_eq!(stored.field(0), Some(&Field::Int(7)));
    }

    #[test]
    fn test_insert_rejects_schema_mismatch() {
        let mut page = create_test_page();
        let other = Arc::new(TupleDesc::from_types([FieldType::Int]));
        let mut tuple = Tuple::new(other);
        tuple.set_field(0, Field::Int(1)).unwrap();

        assert!(matches!(
            page.insert_tuple(tuple),
            Err(BasaltError::SchemaMismatch { .. })
        ));
        assert_eq!(page.empty_slot_count(), page.slot_count());
    }

    #[test]
    fn test_insert_rejects_incomplete_tuple() {
        let mut page = create_test_page();
        let mut tuple = Tuple::new(Arc::clone(page.schema()));
        tuple.set_field(0, Field::Int(1)).unwrap();

        assert!(matches!(
            page.insert_tuple(tuple),
            Err(BasaltError::IncompleteTuple { index: 1 })
        ));
        assert_eq!(page.empty_slot_count(), page.slot_count());
    }

    #[test]
    fn test_insert_into_full_page_fails() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        for i in 0..page.slot_count() {
            page.insert_tuple(create_test_tuple(&schema, i as i32, "t")).unwrap();
        }
        assert_eq!(page.empty_slot_count(), 0);

        let err = page.insert_tuple(create_test_tuple(&schema, -1, "overflow"));
        assert!(matches!(err, Err(BasaltError::PageFull { .. })));
    }

    #[test]
    fn test_empty_plus_occupied_is_slot_count() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        let mut rng = rand::rng();

        for i in 0..100 {
            page.insert_tuple(create_test_tuple(&schema, i, "t")).unwrap();
        }
        for _ in 0..40 {
            let slot = rng.random_range(0..100);
            if page.is_slot_used(slot) {
                let mut tuple = Tuple::new(Arc::clone(&schema));
                tuple.set_record_id(Some(RecordId::new(page.id(), slot as u16)));
                page.delete_tuple(&mut tuple).unwrap();
            }
        }

        let occupied = page.iter().count();
        assert_eq!(occupied + page.empty_slot_count(), page.slot_count());
    }

    #[test]
    fn test_is_slot_used_out_of_range_is_false() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        page.insert_tuple(create_test_tuple(&schema, 1, "a")).unwrap();

        assert!(page.is_slot_used(0));
        assert!(!page.is_slot_used(page.slot_count()));
        assert!(!page.is_slot_used(page.slot_count() + 5));
        assert!(!page.is_slot_used(10_000));
    }

    #[test]
    fn test_serialize_parse_roundtrip() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        for i in 0..10 {
            page.insert_tuple(create_test_tuple(&schema, i, &format!("name{}", i))).unwrap();
        }
        // Punch a hole so the bitmap is not a solid prefix.
        let mut third = page.iter().nth(3).unwrap().clone();
        page.delete_tuple(&mut third).unwrap();

        let data = page.serialize();
        assert_eq!(data.len(), DEFAULT_PAGE_SIZE);
        let reparsed =
            HeapPage::parse(page.id(), schema, &data, DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(reparsed, page);
        assert_eq!(reparsed.empty_slot_count(), page.slot_count() - 9);
    }

    #[test]
    fn test_serialize_roundtrip_randomized() {
        let mut rng = rand::rng();
        let schema = create_test_schema();
        let mut page = HeapPage::empty(PageId::new(9, 3), Arc::clone(&schema), DEFAULT_PAGE_SIZE);

        let inserts = rng.random_range(1..=page.slot_count());
        for _ in 0..inserts {
            let id = rng.random_range(i32::MIN..i32::MAX);
            page.insert_tuple(create_test_tuple(&schema, id, "r")).unwrap();
        }
        for slot in 0..inserts {
            if rng.random_bool(0.3) {
                let mut tuple = Tuple::new(Arc::clone(&schema));
                tuple.set_record_id(Some(RecordId::new(page.id(), slot as u16)));
                page.delete_tuple(&mut tuple).unwrap();
            }
        }

        let reparsed =
            HeapPage::parse(page.id(), schema, &page.serialize(), DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(reparsed, page);
    }

    #[test]
    fn test_padding_and_empty_slots_serialize_as_zero() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        page.insert_tuple(create_test_tuple(&schema, 5, "z")).unwrap();

        let data = page.serialize();
        let bitmap_len = HeapPage::bitmap_len(page.slot_count());
        let tuple_size = schema.byte_size();
        // Slot 1 onward and the page tail are zero.
        assert!(data[bitmap_len + tuple_size..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_parse_ignores_bits_past_slot_count() {
        let schema = create_test_schema();
        let mut data = vec![0u8; DEFAULT_PAGE_SIZE];
        // 203 slots use 3 bits of the final bitmap byte. Set the other
        // five as garbage.
        let last = HeapPage::bitmap_len(203) - 1;
        data[last] = 0b1111_1000;

        let page =
            HeapPage::parse(PageId::new(1, 0), schema, &data, DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(page.empty_slot_count(), 203);
        assert_eq!(page.serialize(), HeapPage::empty_page_data(DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_delete_clears_slot_and_record_id() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        page.insert_tuple(create_test_tuple(&schema, 1, "gone")).unwrap();

        let mut tuple = page.iter().next().unwrap().clone();
        page.delete_tuple(&mut tuple).unwrap();

        assert_eq!(tuple.record_id(), None);
        assert!(!page.is_slot_used(0));
        assert_eq!(page.iter().count(), 0);
    }

    #[test]
    fn test_delete_without_record_id_fails() {
        let mut page = create_test_page();
        let mut tuple = create_test_tuple(page.schema(), 1, "a");
        assert!(matches!(
            page.delete_tuple(&mut tuple),
            Err(BasaltError::TupleNotFound(_))
        ));
    }

    #[test]
    fn test_delete_foreign_or_empty_slot_fails_without_mutation() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        page.insert_tuple(create_test_tuple(&schema, 1, "keep")).unwrap();
        let image = page.serialize();

        // Record id from a different page.
        let mut foreign = create_test_tuple(&schema, 2, "f");
        foreign.set_record_id(Some(RecordId::new(PageId::new(1, 9), 0)));
        assert!(page.delete_tuple(&mut foreign).is_err());
        assert_eq!(foreign.record_id(), Some(RecordId::new(PageId::new(1, 9), 0)));

        // Record id pointing at an empty slot.
        let mut stale = create_test_tuple(&schema, 3, "s");
        stale.set_record_id(Some(RecordId::new(page.id(), 5)));
        assert!(page.delete_tuple(&mut stale).is_err());

        // Record id past the slot range.
        let mut wild = create_test_tuple(&schema, 4, "w");
        wild.set_record_id(Some(RecordId::new(page.id(), 999)));
        assert!(page.delete_tuple(&mut wild).is_err());

        assert_eq!(page.serialize(), image);
    }

    #[test]
    fn test_double_delete_fails() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        page.insert_tuple(create_test_tuple(&schema, 1, "once")).unwrap();

        let mut tuple = page.iter().next().unwrap().clone();
        let rid = tuple.record_id();
        page.delete_tuple(&mut tuple).unwrap();

        tuple.set_record_id(rid);
        assert!(matches!(
            page.delete_tuple(&mut tuple),
            Err(BasaltError::TupleNotFound(_))
        ));
    }

    #[test]
    fn test_iterator_skips_holes_in_slot_order() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        for i in 0..5 {
            page.insert_tuple(create_test_tuple(&schema, i, "t")).unwrap();
        }
        for slot in [1u16, 3] {
            let mut tuple = Tuple::new(Arc::clone(&schema));
            tuple.set_record_id(Some(RecordId::new(page.id(), slot)));
            page.delete_tuple(&mut tuple).unwrap();
        }

        let ids: Vec<i32> = page
            .iter()
            .map(|t| match t.field(0) {
                Some(Field::Int(v)) => *v,
                _ => panic!("expected int field"),
            })
            .collect();
        assert_eq!(ids, vec![0, 2, 4]);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut page = create_test_page();
        assert_eq!(page.dirtied_by(), None);

        let txn = TransactionId::new();
        page.mark_dirty(true, txn);
        assert_eq!(page.dirtied_by(), Some(txn));

        page.mark_dirty(false, txn);
        assert_eq!(page.dirtied_by(), None);
    }

    #[test]
    fn test_before_image_tracks_snapshots() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());

        // Fresh empty page: the before image is the empty image.
        assert_eq!(page.before_image().unwrap().iter().count(), 0);

        page.insert_tuple(create_test_tuple(&schema, 1, "snap")).unwrap();
        page.set_before_image();
        page.insert_tuple(create_test_tuple(&schema, 2, "later")).unwrap();

        let before = page.before_image().unwrap();
        assert_eq!(before.iter().count(), 1);
        assert_eq!(page.iter().count(), 2);
    }

    #[test]
    fn test_debug_output() {
        let mut page = create_test_page();
        let schema = Arc::clone(page.schema());
        page.insert_tuple(create_test_tuple(&schema, 1, "d")).unwrap();

        let output = format!("{:?}", page);
        assert!(output.contains("HeapPage"));
        assert!(output.contains("occupied: 1"));
    }
}
