//! Tables: one named column set bound to one row set.
//!
//! A [`Table`] owns its [`ColumnSet`] and [`RowSet`] and is the only way to
//! structurally mutate them together: the row set resolves column names
//! through the column set, so the cross-component operations live here as
//! coordinating methods. It also owns the binary persistence format and the
//! JSON rendering of its rows.

pub mod column;
pub mod row;

use std::collections::BTreeMap;
use std::path::Path;

pub use crate::codec::TABLE_NAME_LEN;
pub use column::{Column, ColumnSet, ColumnType, count_occurrences};
pub use row::{Row, RowSet, SharedDataItem, Tag};

use crate::codec;
use crate::error::{CollectionError, CollectionResult};
use crate::value::Value;

/// A named pair of column definitions and rows.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: ColumnSet,
    rows: RowSet,
}

impl Table {
    /// Create an empty table.
    ///
    /// Fails with [`CollectionError::NameTooLong`] when the name does not
    /// fit the fixed [`TABLE_NAME_LEN`]-byte header of the binary format.
    pub fn create(name: impl Into<String>) -> CollectionResult<Table> {
        let name = name.into();
        if name.len() > TABLE_NAME_LEN {
            return Err(CollectionError::NameTooLong {
                len: name.len(),
                max: TABLE_NAME_LEN,
            });
        }
        Ok(Table {
            name,
            columns: ColumnSet::new(),
            rows: RowSet::new(),
        })
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column definitions.
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Mutable access to the column definitions (for tag stamping, inserts,
    /// and other column-only operations).
    pub fn columns_mut(&mut self) -> &mut ColumnSet {
        &mut self.columns
    }

    /// The rows.
    pub fn rows(&self) -> &RowSet {
        &self.rows
    }

    /// Append a column; see [`ColumnSet::add`].
    pub fn add_column(&mut self, name: impl Into<String>) -> &Column {
        self.columns.add(name)
    }

    /// Create an empty row; see [`RowSet::new_row`].
    pub fn new_row(&mut self) -> Row {
        self.rows.new_row(&self.columns)
    }

    /// Append a row with the caller's content; see [`RowSet::add`].
    pub fn add_row(&mut self, row: &Row) -> usize {
        self.rows.add(&self.columns, row)
    }

    /// Write a row's declared-column values back by id; see
    /// [`RowSet::update_row`].
    pub fn update_row(&mut self, row: &Row) -> CollectionResult<()> {
        self.rows.update_row(&self.columns, row)
    }

    /// Bulk-load positional string records; see [`RowSet::insert_records`].
    pub fn insert_records(&mut self, records: &[Vec<String>], verbose: bool) {
        self.rows.insert_records(&self.columns, records, verbose)
    }

    /// Load one positional string record; see
    /// [`RowSet::insert_single_record`].
    pub fn insert_single_record(&mut self, record: &[String]) {
        self.rows.insert_single_record(&self.columns, record)
    }

    /// Replace the tag of the row at position `i`.
    pub fn set_row_tag(&mut self, i: usize, tag: Tag) -> CollectionResult<()> {
        self.rows.set_tag(i, tag)
    }

    /// Attach shared data to a tag group; see [`RowSet::add_shared_data`].
    pub fn add_shared_data(&mut self, item: SharedDataItem) -> CollectionResult<()> {
        self.rows.add_shared_data(item)
    }

    /// Re-infer every column's type from the accumulated row data; see
    /// [`ColumnSet::reset_col_types`].
    pub fn reset_col_types(&mut self) {
        self.columns.reset_col_types(&self.rows)
    }

    /// Count how often `value` occurs in a column.
    pub fn occurrence(&self, column: &str, value: &Value) -> usize {
        self.columns.occurrence(column, value, &self.rows)
    }

    /// Append a column's frequency summary to `out`; see
    /// [`ColumnSet::occurrence_matrix`].
    pub fn occurrence_matrix(&self, column: &str, out: &mut Table) -> CollectionResult<()> {
        self.columns.occurrence_matrix(column, &self.rows, out)
    }

    /// All values of a column, in row order.
    pub fn column_data(&self, column: &str) -> Vec<Value> {
        self.columns.column_data(column, &self.rows)
    }

    /// Distinct values of a column plus its flat data.
    pub fn distinct_values(&self, column: &str) -> (Vec<Value>, Vec<Value>) {
        self.columns.distinct_values(column, &self.rows)
    }

    /// Render all rows as a JSON array, one object per row with fields in
    /// column order.
    ///
    /// The renderer is hand-built: strings and dates are quoted (and
    /// escaped), numbers and booleans are emitted bare, and nulls render as
    /// `null`, so the output is always valid JSON.
    pub fn get_json(&self) -> String {
        let mut rows_json = Vec::with_capacity(self.rows.len());
        for row in self.rows.iter() {
            let mut fields = Vec::with_capacity(self.columns.len());
            for col in self.columns.columns() {
                let v = row.get(&col.name).unwrap_or(&Value::Null);
                fields.push(format!("\"{}\":{}", escape_json(&col.name), render_value(v)));
            }
            rows_json.push(format!("{{{}}}", fields.join(",")));
        }
        format!("[{}]", rows_json.join(","))
    }

    /// Serialize to the Table binary format.
    ///
    /// Layout: an [`TABLE_NAME_LEN`]-byte NUL-padded name header followed by
    /// the bincode-encoded rows-as-maps, the whole thing wrapped in base64
    /// text. Only declared columns are serialized; row ids are synthetic and
    /// reassigned on decode. Identical content always produces identical
    /// bytes (the row maps are ordered).
    pub fn serialize(&self) -> CollectionResult<Vec<u8>> {
        let rows: Vec<BTreeMap<&str, &Value>> = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .columns()
                    .iter()
                    .filter_map(|c| row.get(&c.name).map(|v| (c.name.as_str(), v)))
                    .collect()
            })
            .collect();

        let payload = bincode::serialize(&rows)?;
        let framed = codec::pack_name_header(&self.name, &payload);
        Ok(codec::base64_encode(&framed))
    }

    /// Reverse of [`Table::serialize`].
    ///
    /// The first [`TABLE_NAME_LEN`] bytes of the decoded payload are the
    /// name (stopping at the first NUL); the rest decodes as row maps. The
    /// rebuilt table takes its columns from the keys of the first decoded
    /// row, so column order after a round-trip is the map's natural (sorted)
    /// order. Fails with [`CollectionError::ShortData`] when the payload
    /// cannot hold the header and [`CollectionError::EmptyPayload`] when no
    /// rows decode.
    pub fn deserialize(data: &[u8]) -> CollectionResult<Table> {
        let framed = codec::base64_decode(data)?;
        let (name, payload) = codec::split_name_header(&framed)?;
        let rows: Vec<BTreeMap<String, Value>> = bincode::deserialize(payload)?;
        if rows.is_empty() {
            return Err(CollectionError::EmptyPayload);
        }

        let mut table = Table::create(name)?;
        for key in rows[0].keys() {
            table.columns.add(key.clone());
        }
        for decoded in &rows {
            let mut row = table.rows.new_row(&table.columns);
            for col in table.columns.columns() {
                if let Some(v) = decoded.get(&col.name) {
                    row.set(col.name.clone(), v.clone());
                }
            }
            table.rows.update_row(&table.columns, &row)?;
        }
        Ok(table)
    }

    /// [`Table::serialize`], then gzip the base64 bytes into `path`.
    pub fn serialize_to_file(&self, path: impl AsRef<Path>) -> CollectionResult<()> {
        let data = self.serialize()?;
        codec::write_gzip(path.as_ref(), &data)
    }

    /// Gunzip `path` and [`Table::deserialize`] the contents.
    pub fn deserialize_from_file(path: impl AsRef<Path>) -> CollectionResult<Table> {
        let data = codec::read_gzip(path.as_ref())?;
        Table::deserialize(&data)
    }
}

fn render_value(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        // JSON has no NaN/Infinity.
        Value::Float(_) => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) => format!("\"{}\"", escape_json(s)),
        Value::DateTime(d) => format!("\"{d}\""),
    }
}

fn escape_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
