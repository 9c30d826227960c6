//! Insertion-ordered key/value list with a derived hash index.
//!
//! A [`List`] keeps two representations of the same data: the element
//! sequence (which defines iteration order) and a hash index for O(1) key
//! lookup. The index is derived state: every mutating method either updates
//! it in place or rebuilds it, and the sequence is never exposed mutably, so
//! the two can not drift apart.
//!
//! Lookups on long lists fan out to a small fixed set of worker threads; see
//! [`List::index_of_key`] and [`List::index_of_value`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{CollectionError, CollectionResult};
use crate::value::Value;

/// Sort direction for [`List::sort_by_key`] and [`List::sort_by_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending (the default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// One key/value entry of a [`List`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Entry key; unique within its list unless duplicates are enabled.
    pub key: String,
    /// Entry value.
    pub value: Value,
}

/// Lists at or below this length are searched with a plain linear scan;
/// longer lists fan out to [`SEARCH_WORKERS`] threads.
const MAX_LINEAR_SEARCH: usize = 100;

/// Worker count for the fanned-out search.
const SEARCH_WORKERS: usize = 3;

/// Sentinel stored in the shared found-slot while no worker has committed.
const NO_MATCH: usize = usize::MAX;

/// Key-unique, insertion-ordered key/value collection.
///
/// # Concurrency contract
///
/// Lookups are internally parallel on long lists, but no method is safe to
/// call while another thread mutates the same list. The engine assumes
/// single-writer, multiple-reader-after-quiescence usage; callers that need
/// more synchronize externally.
#[derive(Debug, Clone, Default)]
pub struct List {
    elements: Vec<Element>,
    index: HashMap<String, Value>,
    allow_duplicates: bool,
}

impl List {
    /// Create an empty list that rejects duplicate keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty list that accepts duplicate keys.
    ///
    /// With duplicates enabled the index maps each key to its most recently
    /// written value.
    pub fn with_duplicates() -> Self {
        Self {
            allow_duplicates: true,
            ..Self::default()
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` when the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Drop every element.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.index.clear();
    }

    /// Append a key/value pair.
    ///
    /// Fails with [`CollectionError::EmptyKey`] on a blank key and with
    /// [`CollectionError::DuplicateKey`] when the key already exists and
    /// duplicates are disallowed.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) -> CollectionResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(CollectionError::EmptyKey);
        }
        if !self.allow_duplicates && self.key_exists(&key) {
            return Err(CollectionError::DuplicateKey { key });
        }

        let value = value.into();
        self.index.insert(key.clone(), value.clone());
        self.elements.push(Element { key, value });
        Ok(())
    }

    /// Insert a key/value pair at position `i`, shifting later elements.
    ///
    /// Unlike [`List::add`] this is positional: the new element really lands
    /// at `i`. Fails with [`CollectionError::OutOfBounds`] when `i > len`.
    pub fn insert_at(
        &mut self,
        i: usize,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> CollectionResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(CollectionError::EmptyKey);
        }
        if i > self.elements.len() {
            return Err(CollectionError::OutOfBounds {
                index: i,
                len: self.elements.len(),
            });
        }
        if !self.allow_duplicates && self.key_exists(&key) {
            return Err(CollectionError::DuplicateKey { key });
        }

        let value = value.into();
        self.index.insert(key.clone(), value.clone());
        self.elements.insert(i, Element { key, value });
        Ok(())
    }

    /// Returns `true` when `key` is present.
    pub fn key_exists(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns `true` when at least one element holds `value`.
    pub fn value_exists(&self, value: &Value) -> bool {
        self.index_of_value(value).is_some()
    }

    /// The element at position `i`, if any.
    pub fn get(&self, i: usize) -> Option<&Element> {
        self.elements.get(i)
    }

    /// Replace the value at position `i`.
    pub fn set_value_at(&mut self, i: usize, value: impl Into<Value>) -> CollectionResult<()> {
        let len = self.elements.len();
        let elem = self
            .elements
            .get_mut(i)
            .ok_or(CollectionError::OutOfBounds { index: i, len })?;
        let value = value.into();
        self.index.insert(elem.key.clone(), value.clone());
        elem.value = value;
        Ok(())
    }

    /// The value stored under `key`, if any. O(1) via the index.
    pub fn value_of(&self, key: &str) -> Option<&Value> {
        self.index.get(key)
    }

    /// Rename an existing key.
    ///
    /// Fails with [`CollectionError::DuplicateKey`] when `new_key` is taken
    /// and [`CollectionError::NotFound`] when `old_key` is absent.
    pub fn set_key(&mut self, old_key: &str, new_key: impl Into<String>) -> CollectionResult<()> {
        let new_key = new_key.into();
        if new_key.is_empty() {
            return Err(CollectionError::EmptyKey);
        }
        if self.key_exists(&new_key) {
            return Err(CollectionError::DuplicateKey { key: new_key });
        }

        let i = self.index_of_key(old_key).ok_or(CollectionError::NotFound)?;
        self.elements[i].key = new_key;
        self.rebuild_index();
        Ok(())
    }

    /// Replace the value stored under `key`.
    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) -> CollectionResult<()> {
        let i = self.index_of_key(key).ok_or(CollectionError::NotFound)?;
        let value = value.into();
        self.index.insert(key.to_owned(), value.clone());
        self.elements[i].value = value;
        Ok(())
    }

    /// The element sequence, in iteration order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Replace the whole sequence. The index is rebuilt from the new
    /// elements.
    pub fn set_elements(&mut self, elements: Vec<Element>) {
        self.elements = elements;
        self.rebuild_index();
    }

    /// The derived key → value index.
    pub fn as_map(&self) -> &HashMap<String, Value> {
        &self.index
    }

    /// Render the list as a JSON array of `{"key": ..., "value": ...}`
    /// objects, in sequence order.
    pub fn to_json(&self) -> String {
        let items: Vec<serde_json::Value> = self
            .elements
            .iter()
            .map(|e| serde_json::json!({ "key": e.key, "value": e.value.to_json() }))
            .collect();
        serde_json::Value::Array(items).to_string()
    }

    /// Position of `key` in the sequence.
    ///
    /// Lists up to 100 elements are scanned linearly; longer lists are split
    /// into three contiguous ranges searched concurrently, each worker
    /// walking its range from both ends inward and short-circuiting once any
    /// worker commits a match. Keys are unique, so both strategies return
    /// the same position.
    pub fn index_of_key(&self, key: &str) -> Option<usize> {
        self.search(|e| e.key == key)
    }

    /// Position of the first committed element holding `value`.
    ///
    /// Uses the same size-dependent strategy as [`List::index_of_key`].
    /// When several elements hold equal values, *which* matching index is
    /// returned is undefined: on long lists it is whichever worker commits
    /// first.
    pub fn index_of_value(&self, value: &Value) -> Option<usize> {
        self.search(|e| e.value == *value)
    }

    fn search<F>(&self, matches: F) -> Option<usize>
    where
        F: Fn(&Element) -> bool + Sync,
    {
        let count = self.elements.len();
        if count == 0 {
            return None;
        }
        if count <= MAX_LINEAR_SEARCH {
            return self.elements.iter().position(|e| matches(e));
        }

        let found = AtomicUsize::new(NO_MATCH);
        let third = count / SEARCH_WORKERS;
        let bounds = [(0, third), (third, 2 * third), (2 * third, count)];

        thread::scope(|scope| {
            for (from, to) in bounds {
                let found = &found;
                let matches = &matches;
                let elements = self.elements.as_slice();
                scope.spawn(move || search_range(elements, from, to, matches, found));
            }
        });

        match found.load(Ordering::Acquire) {
            NO_MATCH => None,
            i => Some(i),
        }
    }

    /// Remove the element at `i` by swapping the last element into its place
    /// and truncating. O(1) for the sequence, O(n) for the index rebuild.
    ///
    /// Positions are *not* stable across removals; order-sensitive callers
    /// must re-resolve indices afterwards.
    pub fn remove_at(&mut self, i: usize) -> CollectionResult<Element> {
        if i >= self.elements.len() {
            return Err(CollectionError::OutOfBounds {
                index: i,
                len: self.elements.len(),
            });
        }
        let removed = self.elements.swap_remove(i);
        self.rebuild_index();
        Ok(removed)
    }

    /// Remove the element stored under `key`, if present.
    ///
    /// Same swap-with-last semantics as [`List::remove_at`].
    pub fn remove_by_key(&mut self, key: &str) -> Option<Element> {
        let i = self.index_of_key(key)?;
        self.remove_at(i).ok()
    }

    /// Remove one element holding `value`, if present. With duplicate values
    /// it is undefined which one goes.
    pub fn remove_by_value(&mut self, value: &Value) -> Option<Element> {
        let i = self.index_of_value(value)?;
        self.remove_at(i).ok()
    }

    /// Stable sort by key.
    pub fn sort_by_key(&mut self, order: SortOrder) {
        match order {
            SortOrder::Asc => self.elements.sort_by(|a, b| a.key.cmp(&b.key)),
            SortOrder::Desc => self.elements.sort_by(|a, b| b.key.cmp(&a.key)),
        }
        self.rebuild_index();
    }

    /// Stable swap sort by value.
    ///
    /// Only pairs sharing the same concrete variant are compared; a pair of
    /// different variants (or NaN floats) is non-comparable and left in
    /// place, so a mixed-type list ends up only locally ordered.
    pub fn sort_by_value(&mut self, order: SortOrder) {
        let n = self.elements.len();
        for _ in 0..n {
            for i in 0..n.saturating_sub(1) {
                let cmp = self.elements[i]
                    .value
                    .partial_cmp_same_type(&self.elements[i + 1].value);
                let out_of_order = match (order, cmp) {
                    (SortOrder::Asc, Some(std::cmp::Ordering::Greater)) => true,
                    (SortOrder::Desc, Some(std::cmp::Ordering::Less)) => true,
                    _ => false,
                };
                if out_of_order {
                    self.elements.swap(i, i + 1);
                }
            }
        }
        self.rebuild_index();
    }

    /// Serialize to the List binary format: the key/value *map view* encoded
    /// with bincode, wrapped in base64 text.
    ///
    /// The map view does not carry sequence order; see
    /// [`List::deserialize`] for what a round-trip preserves.
    pub fn serialize(&self) -> CollectionResult<Vec<u8>> {
        let map: BTreeMap<&str, &Value> = self
            .elements
            .iter()
            .map(|e| (e.key.as_str(), &e.value))
            .collect();
        let encoded = bincode::serialize(&map)?;
        Ok(codec::base64_encode(&encoded))
    }

    /// Reverse of [`List::serialize`].
    ///
    /// A round-trip preserves key/value *content* only: the rebuilt sequence
    /// follows the map's natural (sorted-key) iteration order, not the
    /// original insertion order. An empty decoded map is reported as
    /// [`CollectionError::EmptyPayload`].
    pub fn deserialize(data: &[u8]) -> CollectionResult<List> {
        let raw = codec::base64_decode(data)?;
        let map: BTreeMap<String, Value> = bincode::deserialize(&raw)?;
        if map.is_empty() {
            return Err(CollectionError::EmptyPayload);
        }

        let mut list = List::new();
        for (key, value) in map {
            list.index.insert(key.clone(), value.clone());
            list.elements.push(Element { key, value });
        }
        Ok(list)
    }

    /// [`List::serialize`], then gzip the base64 bytes into `path`.
    pub fn serialize_to_file(&self, path: impl AsRef<Path>) -> CollectionResult<()> {
        let data = self.serialize()?;
        codec::write_gzip(path.as_ref(), &data)
    }

    /// Gunzip `path` and [`List::deserialize`] the contents.
    pub fn deserialize_from_file(path: impl AsRef<Path>) -> CollectionResult<List> {
        let data = codec::read_gzip(path.as_ref())?;
        List::deserialize(&data)
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for e in &self.elements {
            self.index.insert(e.key.clone(), e.value.clone());
        }
    }
}

/// One search worker: walk `[from, to)` from both ends inward, bailing as
/// soon as any worker has committed a match.
fn search_range<F>(
    elements: &[Element],
    from: usize,
    to: usize,
    matches: &F,
    found: &AtomicUsize,
) where
    F: Fn(&Element) -> bool + Sync,
{
    let mut front = from;
    let mut back = to;

    while front < back {
        if found.load(Ordering::Acquire) != NO_MATCH {
            return;
        }
        if matches(&elements[front]) {
            commit(found, front);
            return;
        }
        front += 1;
        if front >= back {
            break;
        }
        back -= 1;
        if matches(&elements[back]) {
            commit(found, back);
            return;
        }
    }
}

/// First committed position wins; later matches are dropped.
fn commit(found: &AtomicUsize, index: usize) {
    let _ = found.compare_exchange(NO_MATCH, index, Ordering::AcqRel, Ordering::Acquire);
}
