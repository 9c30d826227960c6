//! Rows, row tags and per-tag shared data.
//!
//! A [`RowSet`] stores the rows of one table. Each row is a column-name →
//! value map plus a stable synthetic id, distinct from the row's position in
//! the sequence: positions shift, ids never do. A tag sequence runs parallel
//! to the rows (always the same length) and groups related rows; at most one
//! [`SharedDataItem`] can be attached per distinct tag name.
//!
//! The row set does not own the column definitions; operations that need
//! name resolution take the owning table's [`ColumnSet`] by reference.

use std::collections::BTreeMap;

use crate::error::{CollectionError, CollectionResult};
use crate::table::column::ColumnSet;
use crate::value::Value;

/// Record batches at or above this size are split in half and transformed by
/// two workers; smaller batches load sequentially.
const PARALLEL_INSERT_MIN: usize = 1_000_000;

/// Progress-log cadence for verbose sequential loads.
const PROGRESS_EVERY: usize = 100_000;

/// A label attached to one row. Tag names are not unique; rows sharing a
/// name form a group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    /// Group name; empty on freshly created rows.
    pub name: String,
    /// Optional user data carried by the tag.
    pub data: Value,
}

impl Tag {
    /// Create a tag with a name and payload.
    pub fn new(name: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Data attached once per tag group, linked to rows by tag name.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedDataItem {
    /// The tag group this item belongs to.
    pub tag_name: String,
    /// The shared payload.
    pub data: Value,
}

impl SharedDataItem {
    /// Create a shared-data item for a tag group.
    pub fn new(tag_name: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            tag_name: tag_name.into(),
            data: data.into(),
        }
    }
}

/// One table row: a column-name → value map plus a stable synthetic id.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: usize,
    values: BTreeMap<String, Value>,
}

impl Row {
    pub(crate) fn with_id(id: usize) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
        }
    }

    /// The row's synthetic id. Unique within its [`RowSet`] and stable for
    /// the row's whole lifetime, unlike its position.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The value stored under `column`, if the slot exists.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Set the value under `column`.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// All values, keyed by column name.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Render this row as a plain JSON object of its values.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// The rows of one table, each addressable by a stable synthetic id.
///
/// Structural mutation is single-writer; see the crate-level concurrency
/// contract.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    rows: Vec<Row>,
    tags: Vec<Tag>,
    shared: Vec<SharedDataItem>,
}

impl RowSet {
    /// Create an empty row set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows (always equal to the number of tags).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop all rows, their tags and all shared data.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.tags.clear();
        self.shared.clear();
    }

    /// The row at position `i`, if any.
    pub fn get(&self, i: usize) -> Option<&Row> {
        self.rows.get(i)
    }

    /// The most recently appended row, if any.
    pub fn last(&self) -> Option<&Row> {
        self.rows.last()
    }

    /// The row sequence.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Iterate the rows in sequence order.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// The live position of the row with the given id, if any.
    pub fn position_of_id(&self, id: usize) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Create an empty row: assign the next unused row id, append an empty
    /// tag, and initialize every declared column's slot to [`Value::Null`].
    ///
    /// The returned row is a detached copy of the stored one, carrying its
    /// id; fill it in and commit with [`RowSet::update_row`].
    pub fn new_row(&mut self, cols: &ColumnSet) -> Row {
        let id = self.next_row_id();
        let mut row = Row::with_id(id);
        for col in cols.columns() {
            row.values.insert(col.name.clone(), Value::Null);
        }
        self.tags.push(Tag::default());
        self.rows.push(row.clone());
        row
    }

    /// Append a row with the caller's content.
    ///
    /// A fresh slot is allocated via [`RowSet::new_row`] and the caller's
    /// declared-column values are copied into it; the caller's row object is
    /// not itself stored and its id is ignored. Returns the assigned id.
    pub fn add(&mut self, cols: &ColumnSet, row: &Row) -> usize {
        self.new_row(cols);
        let stored = self.rows.last_mut().expect("row just appended");
        for col in cols.columns() {
            let v = row.get(&col.name).cloned().unwrap_or(Value::Null);
            stored.values.insert(col.name.clone(), v);
        }
        stored.id
    }

    /// Copy the caller's declared-column values into the live row with the
    /// same id.
    ///
    /// Fails with [`CollectionError::OutOfBounds`] when the id does not map
    /// to a live row. Keys outside the declared columns are ignored; missing
    /// declared keys overwrite the stored slot with [`Value::Null`].
    pub fn update_row(&mut self, cols: &ColumnSet, row: &Row) -> CollectionResult<()> {
        let pos = self
            .position_of_id(row.id)
            .ok_or(CollectionError::OutOfBounds {
                index: row.id,
                len: self.rows.len(),
            })?;

        let stored = &mut self.rows[pos];
        for col in cols.columns() {
            let v = row.get(&col.name).cloned().unwrap_or(Value::Null);
            stored.values.insert(col.name.clone(), v);
        }
        Ok(())
    }

    /// Bulk-load positional string records, mapping field `j` onto declared
    /// column `j` as a [`Value::Str`].
    ///
    /// Batches below 1,000,000 records load sequentially (with `log`-level
    /// progress when `verbose` is set). Larger batches are split in half and
    /// the two halves transformed concurrently, then committed in input
    /// order; the call returns only after both halves complete.
    ///
    /// Loading is lenient by contract: a short record pads its missing
    /// columns with [`Value::Null`], extra fields are ignored, and the batch
    /// never aborts part-way.
    pub fn insert_records(&mut self, cols: &ColumnSet, records: &[Vec<String>], verbose: bool) {
        let total = records.len();

        if total < PARALLEL_INSERT_MIN {
            for (i, record) in records.iter().enumerate() {
                if verbose && i % PROGRESS_EVERY == 0 {
                    log::debug!("creating data-table: row {i} of {total}");
                }
                self.insert_single_record(cols, record);
            }
            if verbose {
                log::info!("created {total} rows");
            }
            return;
        }

        let half = total / 2;
        let (left, right) = records.split_at(half);
        let (a, b) = rayon::join(
            || materialize_records(cols, left),
            || materialize_records(cols, right),
        );

        for values in a.into_iter().chain(b) {
            self.commit_record(values);
        }
        if verbose {
            log::info!("created {total} rows across two workers");
        }
    }

    /// Load one positional string record. Same mapping and leniency as
    /// [`RowSet::insert_records`].
    pub fn insert_single_record(&mut self, cols: &ColumnSet, record: &[String]) {
        let values = materialize_record(cols, record);
        self.commit_record(values);
    }

    /// Replace the tag at row position `i`.
    pub fn set_tag(&mut self, i: usize, tag: Tag) -> CollectionResult<()> {
        let len = self.tags.len();
        let slot = self
            .tags
            .get_mut(i)
            .ok_or(CollectionError::OutOfBounds { index: i, len })?;
        *slot = tag;
        Ok(())
    }

    /// The tag at row position `i`, if any.
    pub fn tag(&self, i: usize) -> Option<&Tag> {
        self.tags.get(i)
    }

    /// All rows whose tag carries `name`, via a linear scan over the
    /// parallel tag sequence.
    pub fn rows_by_tag(&self, name: &str) -> Vec<&Row> {
        self.rows
            .iter()
            .zip(&self.tags)
            .filter(|(_, tag)| tag.name == name)
            .map(|(row, _)| row)
            .collect()
    }

    /// Attach a shared-data item to a tag group.
    ///
    /// Fails with [`CollectionError::EmptyTagName`] on a blank name, with
    /// [`CollectionError::NoMatchingRows`] when no row carries the tag yet,
    /// and with [`CollectionError::DuplicateSharedData`] when the group
    /// already has an item.
    pub fn add_shared_data(&mut self, item: SharedDataItem) -> CollectionResult<()> {
        if item.tag_name.is_empty() {
            return Err(CollectionError::EmptyTagName);
        }
        if self.rows_by_tag(&item.tag_name).is_empty() {
            return Err(CollectionError::NoMatchingRows {
                tag: item.tag_name,
            });
        }
        if self.shared.iter().any(|s| s.tag_name == item.tag_name) {
            return Err(CollectionError::DuplicateSharedData {
                tag: item.tag_name,
            });
        }
        self.shared.push(item);
        Ok(())
    }

    /// The shared-data item attached to a tag group, if any.
    pub fn shared_data(&self, tag_name: &str) -> Option<&SharedDataItem> {
        self.shared.iter().find(|s| s.tag_name == tag_name)
    }

    /// Render all rows as a JSON array of value objects.
    pub fn to_json(&self) -> String {
        let rows: Vec<serde_json::Value> = self.rows.iter().map(|r| r.to_json()).collect();
        serde_json::Value::Array(rows).to_string()
    }

    /// Render the row at position `i` as a JSON object.
    pub fn row_json(&self, i: usize) -> Option<String> {
        self.rows.get(i).map(|r| r.to_json().to_string())
    }

    fn next_row_id(&self) -> usize {
        let mut candidate = match self.rows.last() {
            Some(last) => last.id,
            None => return 0,
        };
        while self.id_claimed(candidate) {
            candidate += 1;
        }
        candidate
    }

    // Ids are appended in non-decreasing order, so the scan from the back
    // can stop at the first id below the candidate.
    fn id_claimed(&self, id: usize) -> bool {
        self.rows
            .iter()
            .rev()
            .take_while(|r| r.id >= id)
            .any(|r| r.id == id)
    }

    fn commit_record(&mut self, values: BTreeMap<String, Value>) {
        let id = self.next_row_id();
        let mut row = Row::with_id(id);
        row.values = values;
        self.tags.push(Tag::default());
        self.rows.push(row);
    }
}

fn materialize_records(cols: &ColumnSet, records: &[Vec<String>]) -> Vec<BTreeMap<String, Value>> {
    records
        .iter()
        .map(|record| materialize_record(cols, record))
        .collect()
}

fn materialize_record(cols: &ColumnSet, record: &[String]) -> BTreeMap<String, Value> {
    let mut values = BTreeMap::new();
    for (j, col) in cols.columns().iter().enumerate() {
        let v = record
            .get(j)
            .map(|s| Value::Str(s.clone()))
            .unwrap_or(Value::Null);
        values.insert(col.name.clone(), v);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::{RowSet, SharedDataItem, Tag};
    use crate::error::CollectionError;
    use crate::table::column::ColumnSet;
    use crate::value::Value;

    fn two_columns() -> ColumnSet {
        let mut cols = ColumnSet::new();
        cols.add("name");
        cols.add("age");
        cols
    }

    #[test]
    fn new_row_assigns_unique_increasing_ids_and_a_tag() {
        let cols = two_columns();
        let mut rows = RowSet::new();

        let a = rows.new_row(&cols);
        let b = rows.new_row(&cols);
        let c = rows.new_row(&cols);

        assert_eq!((a.id(), b.id(), c.id()), (0, 1, 2));
        assert_eq!(rows.len(), 3);
        // Tag sequence stays parallel to the rows.
        assert_eq!(rows.tag(2), Some(&Tag::default()));
        // Declared slots start out null.
        assert_eq!(a.get("name"), Some(&Value::Null));
        assert_eq!(a.get("age"), Some(&Value::Null));
    }

    #[test]
    fn add_copies_content_into_a_fresh_slot() {
        let cols = two_columns();
        let mut rows = RowSet::new();

        let mut draft = rows.new_row(&cols);
        draft.set("name", "Alice");
        draft.set("age", 30);
        rows.update_row(&cols, &draft).unwrap();

        // A second set: the caller's row keeps id 0, but add() ignores it.
        let assigned = rows.add(&cols, &draft);
        assert_eq!(assigned, 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.get(1).unwrap().get("name"), Some(&Value::from("Alice")));
    }

    #[test]
    fn update_row_rejects_stale_ids_and_ignores_extra_keys() {
        let cols = two_columns();
        let mut rows = RowSet::new();

        let mut row = rows.new_row(&cols);
        row.set("name", "Bob");
        row.set("unknown", "dropped");
        rows.update_row(&cols, &row).unwrap();

        let stored = rows.get(0).unwrap();
        assert_eq!(stored.get("name"), Some(&Value::from("Bob")));
        assert_eq!(stored.get("unknown"), None);

        let mut phantom = rows.new_row(&cols);
        rows.clear();
        phantom.set("name", "gone");
        assert!(matches!(
            rows.update_row(&cols, &phantom),
            Err(CollectionError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn insert_records_is_lenient_about_record_width() {
        let cols = two_columns();
        let mut rows = RowSet::new();

        let records = vec![
            vec!["Alice".to_string(), "30".to_string()],
            vec!["Bob".to_string()],                                        // short
            vec!["Eve".to_string(), "7".to_string(), "extra".to_string()], // wide
        ];
        rows.insert_records(&cols, &records, false);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows.get(1).unwrap().get("age"), Some(&Value::Null));
        assert_eq!(rows.get(2).unwrap().get("age"), Some(&Value::from("7")));
        assert_eq!(rows.get(2).unwrap().values().len(), 2);
    }

    #[test]
    fn tags_group_rows_and_gate_shared_data() {
        let cols = two_columns();
        let mut rows = RowSet::new();
        rows.new_row(&cols);
        rows.new_row(&cols);
        rows.new_row(&cols);

        rows.set_tag(0, Tag::new("batch-1", Value::Null)).unwrap();
        rows.set_tag(2, Tag::new("batch-1", Value::Null)).unwrap();
        assert_eq!(rows.rows_by_tag("batch-1").len(), 2);
        assert!(rows.rows_by_tag("batch-2").is_empty());

        assert!(matches!(
            rows.add_shared_data(SharedDataItem::new("", 1)),
            Err(CollectionError::EmptyTagName)
        ));
        assert!(matches!(
            rows.add_shared_data(SharedDataItem::new("batch-2", 1)),
            Err(CollectionError::NoMatchingRows { .. })
        ));

        rows.add_shared_data(SharedDataItem::new("batch-1", "meta"))
            .unwrap();
        assert!(matches!(
            rows.add_shared_data(SharedDataItem::new("batch-1", "again")),
            Err(CollectionError::DuplicateSharedData { .. })
        ));
        assert_eq!(
            rows.shared_data("batch-1").unwrap().data,
            Value::from("meta")
        );

        assert!(matches!(
            rows.set_tag(9, Tag::default()),
            Err(CollectionError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn clear_keeps_row_and_tag_counts_equal() {
        let cols = two_columns();
        let mut rows = RowSet::new();
        rows.new_row(&cols);
        rows.new_row(&cols);

        rows.clear();
        assert!(rows.is_empty());
        assert!(rows.tag(0).is_none());

        // Ids restart once the set is empty.
        let row = rows.new_row(&cols);
        assert_eq!(row.id(), 0);
    }

    #[test]
    fn row_json_renders_plain_values() {
        let cols = two_columns();
        let mut rows = RowSet::new();
        let mut row = rows.new_row(&cols);
        row.set("name", "Ada");
        row.set("age", 36);
        rows.update_row(&cols, &row).unwrap();

        let json = rows.row_json(0).unwrap();
        assert_eq!(json, r#"{"age":36,"name":"Ada"}"#);
    }
}
