use tabular_collections::{CollectionError, Dataset, Table, Value};

fn people() -> Table {
    let mut t = Table::create("people").unwrap();
    t.add_column("name");
    t.add_column("age");
    t.insert_single_record(&["Alice".to_string(), "30".to_string()]);
    t.insert_single_record(&["Bob".to_string(), "41".to_string()]);
    t
}

fn cities() -> Table {
    let mut t = Table::create("cities").unwrap();
    t.add_column("city");
    t.insert_single_record(&["Oslo".to_string()]);
    t
}

#[test]
fn file_round_trip_restores_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.bin");

    let mut ds = Dataset::new();
    ds.add(people()).unwrap();
    ds.add(cities()).unwrap();
    ds.serialize_to_file(&path).unwrap();

    // gzip on disk, like lists and tables.
    let raw = std::fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    let restored = Dataset::deserialize_from_file(&path).unwrap();
    assert_eq!(restored.len(), 2);
    assert!(restored.contains("people"));
    assert!(restored.contains("cities"));

    let people = restored.get_by_name("people").unwrap();
    assert_eq!(people.rows().len(), 2);
    assert_eq!(
        people.rows().get(0).unwrap().get("name"),
        Some(&Value::from("Alice"))
    );

    let cities = restored.get_by_name("CITIES").unwrap();
    assert_eq!(cities.rows().len(), 1);
}

#[test]
fn archive_payload_is_raw_bincode_not_base64() {
    let mut ds = Dataset::new();
    ds.add(people()).unwrap();

    // Table blobs are base64 text; the dataset archive around them is not.
    let table_bytes = people().serialize().unwrap();
    assert!(table_bytes.iter().all(|b| b.is_ascii()));

    let archive = ds.serialize().unwrap();
    assert!(!archive.iter().all(|b| b.is_ascii()));
}

#[test]
fn in_memory_round_trip_preserves_table_content() {
    let mut ds = Dataset::new();
    ds.add(people()).unwrap();

    let restored = Dataset::deserialize(&ds.serialize().unwrap()).unwrap();
    let table = restored.get_by_name("people").unwrap();
    assert_eq!(table.name(), "people");
    assert_eq!(table.rows().len(), 2);
    assert_eq!(
        table.rows().get(1).unwrap().get("age"),
        Some(&Value::from("41"))
    );
}

#[test]
fn duplicate_names_are_rejected_case_insensitively() {
    let mut ds = Dataset::new();
    ds.add(people()).unwrap();

    let mut shadow = Table::create("PEOPLE").unwrap();
    shadow.add_column("x");
    assert!(matches!(
        ds.add(shadow),
        Err(CollectionError::DuplicateTable { .. })
    ));
}

#[test]
fn removal_is_swap_with_last() {
    let mut ds = Dataset::new();
    ds.add(people()).unwrap();
    ds.add(cities()).unwrap();

    let removed = ds.remove_by_name("people").unwrap();
    assert_eq!(removed.name(), "people");
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.get(0).unwrap().name(), "cities");

    assert!(matches!(
        ds.remove_by_name("people"),
        Err(CollectionError::NotFound)
    ));
}
