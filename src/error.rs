use thiserror::Error;

/// Convenience result type for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Error type returned across the crate.
///
/// This is a single error enum shared by lists, column sets, row sets, tables
/// and datasets. Every detectable misuse is reported back to the immediate
/// caller as a value; nothing is raised as a panic on non-test paths.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary payload decoding failed.
    #[error("decode error: {0}")]
    Decode(#[from] bincode::Error),

    /// The printable text wrapping of a payload is not valid base64.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A key was blank where a non-empty key is required.
    #[error("key cannot be blank")]
    EmptyKey,

    /// The key is already present and duplicates are disallowed.
    #[error("key '{key}' already exists")]
    DuplicateKey { key: String },

    /// No entry matches the given key, value or name.
    #[error("item not found")]
    NotFound,

    /// An index does not address a live entry.
    #[error("index {index} is out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },

    /// An insertion position is outside the accepted range.
    #[error("invalid position {pos}")]
    InvalidPosition { pos: isize },

    /// A name exceeds the fixed width reserved for it by the binary format.
    #[error("name is {len} bytes; the maximum is {max}")]
    NameTooLong { len: usize, max: usize },

    /// A column with this name is already declared.
    #[error("column '{name}' already exists")]
    DuplicateColumn { name: String },

    /// A tag name was blank where one is required.
    #[error("tag name is blank")]
    EmptyTagName,

    /// No row currently carries the given tag.
    #[error("no rows carry tag '{tag}'")]
    NoMatchingRows { tag: String },

    /// A shared-data item for this tag has already been attached.
    #[error("shared data for tag '{tag}' already exists")]
    DuplicateSharedData { tag: String },

    /// A table with this (case-insensitive) name is already in the dataset.
    #[error("table '{name}' already exists")]
    DuplicateTable { name: String },

    /// A serialized payload is shorter than its fixed-width header.
    #[error("serialized payload is {len} bytes; expected at least {expected}")]
    ShortData { len: usize, expected: usize },

    /// A payload decoded successfully but contained no entries.
    #[error("no items found in serialized payload")]
    EmptyPayload,
}
