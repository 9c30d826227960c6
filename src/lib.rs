//! `tabular-collections` is an embeddable, in-process collection engine with
//! two composable abstractions:
//!
//! - [`List`]: a key-unique, insertion-ordered key/value collection backed
//!   by both a sequence and a derived hash index, with concurrent search and
//!   two sort orders.
//! - A tabular store: [`Table`] binds one [`table::ColumnSet`] to one
//!   [`table::RowSet`] under a name, with dynamic type inference, occurrence
//!   statistics, row tagging, shared-data linkage and JSON rendering;
//!   [`Dataset`] groups tables and persists them as a single compressed
//!   archive.
//!
//! Cells are typed [`Value`]s; columns carry a [`table::ColumnType`] that is
//! re-inferred from the accumulated data on demand.
//!
//! ## Quick example: build a table, infer types, round-trip it
//!
//! ```rust
//! use tabular_collections::{ColumnType, Table};
//!
//! # fn main() -> Result<(), tabular_collections::CollectionError> {
//! let mut people = Table::create("people")?;
//! people.add_column("name");
//! people.add_column("age");
//!
//! people.insert_single_record(&["Alice".to_string(), "30".to_string()]);
//! people.insert_single_record(&["Bob".to_string(), "41".to_string()]);
//!
//! // Bulk-loaded values arrive as strings; re-infer the real column types.
//! people.reset_col_types();
//! assert_eq!(people.columns().columns()[1].data_type, ColumnType::Int);
//!
//! let bytes = people.serialize()?;
//! let restored = Table::deserialize(&bytes)?;
//! assert_eq!(restored.name(), "people");
//! assert_eq!(restored.rows().len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick example: ordered list with index lookups
//!
//! ```rust
//! use tabular_collections::{List, SortOrder, Value};
//!
//! # fn main() -> Result<(), tabular_collections::CollectionError> {
//! let mut list = List::new();
//! list.add("beta", 2)?;
//! list.add("alpha", 1)?;
//!
//! // Sequence order is insertion order; the index answers key lookups.
//! assert_eq!(list.index_of_key("alpha"), Some(1));
//! assert_eq!(list.value_of("beta"), Some(&Value::Int(2)));
//!
//! list.sort_by_key(SortOrder::Asc);
//! assert_eq!(list.index_of_key("alpha"), Some(0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency contract
//!
//! Exactly three operations fan out internally to a small fixed set of
//! workers: list search (3), occurrence counting (4) and bulk record
//! insertion (2). Each computes its partition bounds up front and blocks on
//! a join barrier; none is cancellable or carries a timeout. Everything
//! else assumes a single writer: the engine takes no internal locks for
//! structural mutation, and callers that share a collection across threads
//! synchronize it themselves.
//!
//! ## Persistence
//!
//! Lists and tables serialize to a bincode payload wrapped in base64 text;
//! their file variants gzip the base64 bytes. A dataset archive maps table
//! names to table blobs and is gzipped *without* a dataset-level base64
//! layer; the asymmetry is part of the format. Serialized maps are
//! ordered, so identical content always produces identical bytes; sequence
//! order, however, is not part of the format (round-trips restore content,
//! with elements/columns in sorted-key order).
//!
//! ## Modules
//!
//! - [`list`]: the ordered key/value list
//! - [`table`]: columns, rows, tags and tables
//! - [`dataset`]: table collections and archive persistence
//! - [`value`]: the tagged cell value type
//! - [`error`]: the crate-wide error type

pub mod dataset;
pub mod error;
pub mod list;
pub mod table;
pub mod value;

mod codec;

pub use dataset::Dataset;
pub use error::{CollectionError, CollectionResult};
pub use list::{Element, List, SortOrder};
pub use table::{
    Column, ColumnSet, ColumnType, Row, RowSet, SharedDataItem, TABLE_NAME_LEN, Table, Tag,
};
pub use value::Value;
