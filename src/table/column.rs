//! Column definitions, dynamic type inference and occurrence statistics.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CollectionError, CollectionResult};
use crate::list::List;
use crate::table::Table;
use crate::table::row::RowSet;
use crate::value::{self, Value};

/// Column data sets below this size are counted with a direct scan; larger
/// ones fan out to [`COUNT_WORKERS`] partial counts.
const PARALLEL_COUNT_MIN: usize = 10_000;

/// Worker count for fanned-out occurrence counting.
const COUNT_WORKERS: usize = 4;

/// Occurrence-matrix shortcut: above this distinct/total ratio (and above
/// [`SPARSE_MIN_ROWS`] records) exact counts are skipped.
const SPARSE_RATIO: f64 = 0.99;
const SPARSE_MIN_ROWS: usize = 10_000;

/// Columns an occurrence-matrix results table must carry; missing ones are
/// added on first use.
const MATRIX_COLUMNS: &[&str] = &[
    "column_name",
    "is_unique",
    "n_times_occurred",
    "distinct_to_all_ratio",
    "value",
];

/// Logical data type of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// UTF-8 string (the default for freshly added columns).
    #[default]
    Str,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// Date with time.
    DateTime,
}

/// A single named, typed column.
///
/// The `tag` field is write-shared: setting a tag through the owning
/// [`ColumnSet`] stamps every column identically, which lets the column
/// array double as a row-group marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name; position in the set defines positional row layout.
    pub name: String,
    /// Inferred data type; see [`ColumnSet::reset_col_types`].
    pub data_type: ColumnType,
    /// Shared row-group tag.
    pub tag: String,
}

impl Column {
    /// Create a column with an explicit type and an empty tag.
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            tag: String::new(),
        }
    }
}

/// Ordered set of column definitions shared by all rows of a table.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<Column>,
}

impl ColumnSet {
    /// Create an empty column set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declared columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` when no column is declared.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Drop all column definitions.
    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// The column definitions, in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Replace the whole column array.
    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.columns = columns;
    }

    /// Append a column.
    ///
    /// A freshly added column starts as [`ColumnType::Str`]: the only
    /// evidence at this point is the name literal itself. Accurate typing
    /// comes from [`ColumnSet::reset_col_types`] once row data exists.
    pub fn add(&mut self, name: impl Into<String>) -> &Column {
        self.columns.push(Column::new(name, ColumnType::Str));
        self.columns.last().expect("column just pushed")
    }

    /// Insert a column at `pos`, where `-1` appends.
    ///
    /// Fails with [`CollectionError::InvalidPosition`] outside `[-1, len]`
    /// and [`CollectionError::DuplicateColumn`] when the name (compared
    /// case-insensitively) is taken. Any duplicate names already present
    /// are cleaned up afterwards, keeping first-occurrence order.
    pub fn insert_at(&mut self, pos: isize, column: Column) -> CollectionResult<()> {
        let len = self.columns.len() as isize;
        if pos < -1 || pos > len {
            return Err(CollectionError::InvalidPosition { pos });
        }
        if self.exists(&column.name) {
            return Err(CollectionError::DuplicateColumn { name: column.name });
        }

        let at = if pos < 0 { self.columns.len() } else { pos as usize };
        self.columns.insert(at, column);
        self.dedup_by_name();
        Ok(())
    }

    /// Returns `true` when a column with this name (case-insensitive) is
    /// declared.
    pub fn exists(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Position of the column with this exact name, if declared.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Stamp every column with the same row-group tag.
    pub fn set_tag(&mut self, tag: &str) {
        for col in &mut self.columns {
            tag.clone_into(&mut col.tag);
        }
    }

    /// The shared row-group tag (all columns carry the same one).
    pub fn tag(&self) -> &str {
        self.columns.first().map(|c| c.tag.as_str()).unwrap_or("")
    }

    /// All values of a column, in row order. Unknown columns yield an empty
    /// vector; missing slots yield [`Value::Null`].
    pub fn column_data(&self, name: &str, rows: &RowSet) -> Vec<Value> {
        if !self.exists(name) {
            return Vec::new();
        }
        rows.iter()
            .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Number of data slots a column contributes (one per row).
    pub fn data_count(&self, name: &str, rows: &RowSet) -> usize {
        if self.exists(name) { rows.len() } else { 0 }
    }

    /// Number of non-null, non-blank values in a column.
    pub fn data_count_non_null(&self, name: &str, rows: &RowSet) -> usize {
        self.column_data(name, rows)
            .iter()
            .filter(|v| !v.is_null() && !v.to_string().trim().is_empty())
            .count()
    }

    /// Distinct values of a column plus the flat data they came from.
    ///
    /// Distinctness is decided on the *stringified* value. The dedup runs
    /// through a [`List`], whose duplicate-key rejection is exactly the
    /// check needed; first-occurrence order is kept.
    pub fn distinct_values(&self, name: &str, rows: &RowSet) -> (Vec<Value>, Vec<Value>) {
        let data = self.column_data(name, rows);

        let mut seen = List::new();
        let mut distinct = Vec::new();
        for v in &data {
            let key = match v {
                // Null stringifies to "", which the list rejects as a key.
                Value::Null => "<null>".to_string(),
                other => other.to_string(),
            };
            if seen.add(key, Value::Null).is_ok() {
                distinct.push(v.clone());
            }
        }
        (distinct, data)
    }

    /// Re-examine every column's values and set the most specific type all
    /// of them agree on.
    ///
    /// Classification is lenient and best-effort: each column's distinct
    /// stringified values are tested as `i64`, then `f64`, then
    /// date-with-time, then boolean literal, then plain text. A column whose
    /// values all parse as integers becomes [`ColumnType::Int`]; all numeric
    /// with at least one non-integer becomes [`ColumnType::Float`]; and so
    /// on. Mixed columns keep their previous type. Idempotent.
    pub fn reset_col_types(&mut self, rows: &RowSet) {
        for i in 0..self.columns.len() {
            let name = self.columns[i].name.clone();
            let (distinct, _) = self.distinct_values(&name, rows);
            if distinct.is_empty() {
                continue;
            }
            if let Some(t) = classify(&distinct) {
                self.columns[i].data_type = t;
            }
        }
    }

    /// Count how often `value` occurs in a column.
    pub fn occurrence(&self, name: &str, value: &Value, rows: &RowSet) -> usize {
        let data = self.column_data(name, rows);
        count_occurrences(value, &data)
    }

    /// Compute a per-distinct-value frequency summary for a column and
    /// append it as rows of `out`.
    ///
    /// The results table gets the columns `column_name`, `is_unique`,
    /// `n_times_occurred`, `distinct_to_all_ratio` and `value` (added if
    /// missing). Three shortcut shapes avoid the full per-value listing:
    /// all values unique; a single repeated value; and a high-cardinality
    /// column (ratio above 0.99 over more than 10,000 records) where exact
    /// counts are skipped for speed. An empty column writes nothing.
    pub fn occurrence_matrix(
        &self,
        name: &str,
        rows: &RowSet,
        out: &mut Table,
    ) -> CollectionResult<()> {
        let (distinct, flat) = self.distinct_values(name, rows);
        if flat.is_empty() {
            return Ok(());
        }

        for col in MATRIX_COLUMNS {
            if !out.columns().exists(col) {
                out.add_column(*col);
            }
        }

        let dist_len = distinct.len();
        let flat_len = flat.len();
        let ratio = dist_len as f64 / flat_len as f64;

        if dist_len == flat_len {
            // Every value unique; all occurrences are 1.
            let mut row = out.new_row();
            row.set("column_name", name);
            row.set("is_unique", 1);
            out.update_row(&row)?;
            return Ok(());
        }

        if dist_len == 1 {
            // One value repeated across the whole column.
            let mut row = out.new_row();
            row.set("column_name", name);
            row.set("is_unique", 0);
            row.set("n_times_occurred", flat_len as i64);
            row.set("distinct_to_all_ratio", ratio);
            row.set("value", distinct[0].clone());
            out.update_row(&row)?;
            return Ok(());
        }

        if ratio > SPARSE_RATIO && flat_len > SPARSE_MIN_ROWS {
            // Only a handful repeat; report 1 instead of exact counts.
            let mut row = out.new_row();
            row.set("column_name", name);
            row.set("is_unique", 0);
            row.set("n_times_occurred", 1);
            row.set("distinct_to_all_ratio", ratio);
            out.update_row(&row)?;
            return Ok(());
        }

        for v in &distinct {
            let count = count_occurrences(v, &flat);
            let mut row = out.new_row();
            row.set("column_name", name);
            row.set("distinct_to_all_ratio", ratio);
            row.set("value", v.clone());
            row.set("is_unique", 0);
            row.set("n_times_occurred", count as i64);
            out.update_row(&row)?;
        }
        Ok(())
    }

    fn dedup_by_name(&mut self) {
        let mut seen: Vec<String> = Vec::with_capacity(self.columns.len());
        self.columns.retain(|c| {
            let lower = c.name.to_lowercase();
            if seen.contains(&lower) {
                false
            } else {
                seen.push(lower);
                true
            }
        });
    }
}

/// Count how often `value` occurs in `data`.
///
/// Below 10,000 records this is a direct scan. At or above, the data is
/// split into four contiguous, non-overlapping ranges counted concurrently;
/// each worker accumulates its own partial count and the partials are summed
/// at the end, so there is no shared mutable counter.
pub fn count_occurrences(value: &Value, data: &[Value]) -> usize {
    if data.len() < PARALLEL_COUNT_MIN {
        return data.iter().filter(|v| *v == value).count();
    }

    let chunk = data.len().div_ceil(COUNT_WORKERS);
    data.par_chunks(chunk)
        .map(|range| range.iter().filter(|v| *v == value).count())
        .sum()
}

fn classify(distinct: &[Value]) -> Option<ColumnType> {
    let total = distinct.len();
    let (mut ints, mut floats, mut dates, mut bools, mut strs) = (0, 0, 0, 0, 0);

    for v in distinct {
        let s = v.to_string();
        let s = s.trim();
        // i64 is tested before f64: every integer literal also parses as a
        // float, and integer-only columns must classify Int.
        if s.parse::<i64>().is_ok() {
            ints += 1;
        } else if s.parse::<f64>().is_ok() {
            floats += 1;
        } else if value::looks_like_date_time(s) && value::parse_date_time(s).is_some() {
            dates += 1;
        } else if value::parse_bool_literal(s).is_some() {
            bools += 1;
        } else {
            strs += 1;
        }
    }

    if ints == total {
        Some(ColumnType::Int)
    } else if ints + floats == total {
        Some(ColumnType::Float)
    } else if dates == total {
        Some(ColumnType::DateTime)
    } else if bools == total {
        Some(ColumnType::Bool)
    } else if strs == total {
        Some(ColumnType::Str)
    } else {
        // Mixed evidence: leave the previous type in place.
        None
    }
}
