use tabular_collections::{CollectionError, List, Value};

fn sample_list() -> List {
    let mut list = List::new();
    list.add("gamma", 3).unwrap();
    list.add("alpha", "one").unwrap();
    list.add("beta", 2.5).unwrap();
    list.add("delta", true).unwrap();
    list
}

#[test]
fn round_trip_preserves_content_not_order() {
    let original = sample_list();
    let bytes = original.serialize().unwrap();
    let restored = List::deserialize(&bytes).unwrap();

    assert_eq!(restored.len(), original.len());
    // Content equality goes through the map view; sequence order is not part
    // of the format.
    assert_eq!(restored.as_map(), original.as_map());

    // The rebuilt sequence follows the map's natural (sorted-key) order.
    let keys: Vec<&str> = restored.elements().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, ["alpha", "beta", "delta", "gamma"]);
}

#[test]
fn serialized_bytes_are_printable_base64() {
    let bytes = sample_list().serialize().unwrap();
    assert!(bytes.iter().all(|b| b.is_ascii()));
}

#[test]
fn file_round_trip_gzips_the_payload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.bin");

    let original = sample_list();
    original.serialize_to_file(&path).unwrap();

    // The on-disk form is gzip, not the raw base64 text.
    let raw = std::fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    let restored = List::deserialize_from_file(&path).unwrap();
    assert_eq!(restored.as_map(), original.as_map());
}

#[test]
fn empty_payload_is_an_error() {
    let empty = List::new();
    let bytes = empty.serialize().unwrap();
    assert!(matches!(
        List::deserialize(&bytes),
        Err(CollectionError::EmptyPayload)
    ));
}

#[test]
fn garbage_input_is_a_decode_error_not_a_panic() {
    assert!(List::deserialize(b"not base64 !!!").is_err());

    // Valid base64 of junk bytes fails at the bincode layer instead.
    let junk = {
        use std::io::Write as _;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"plain bytes, not gzip").unwrap();
        f
    };
    assert!(List::deserialize_from_file(junk.path()).is_err());
}

#[test]
fn search_results_are_independent_of_the_partitioning_strategy() {
    // One list below the worker threshold, one above; every key and value
    // must resolve to the same position under both strategies.
    for n in [99usize, 150, 301] {
        let mut list = List::new();
        for i in 0..n {
            list.add(format!("key-{i:04}"), i as i64).unwrap();
        }

        for i in 0..n {
            assert_eq!(
                list.index_of_key(&format!("key-{i:04}")),
                Some(i),
                "key lookup at {i} of {n}"
            );
            assert_eq!(
                list.index_of_value(&Value::Int(i as i64)),
                Some(i),
                "value lookup at {i} of {n}"
            );
        }
        assert_eq!(list.index_of_key("missing"), None);
        assert_eq!(list.index_of_value(&Value::Int(-1)), None);
    }
}
