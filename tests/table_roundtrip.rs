use tabular_collections::{CollectionError, ColumnType, TABLE_NAME_LEN, Table, Value};

fn people_table() -> Table {
    let mut people = Table::create("people").unwrap();
    people.add_column("name");
    people.add_column("age");
    people.insert_single_record(&["Alice".to_string(), "30".to_string()]);
    people.insert_single_record(&["Bob".to_string(), "41".to_string()]);
    people
}

#[test]
fn people_scenario_end_to_end() {
    let mut people = people_table();

    // Bulk-loaded values arrive as strings; re-inference fixes the types.
    people.reset_col_types();
    let cols = people.columns().columns();
    assert_eq!(cols[0].name, "name");
    assert_eq!(cols[0].data_type, ColumnType::Str);
    assert_eq!(cols[1].name, "age");
    assert_eq!(cols[1].data_type, ColumnType::Int);

    let bytes = people.serialize().unwrap();
    let restored = Table::deserialize(&bytes).unwrap();

    assert_eq!(restored.name(), "people");
    assert_eq!(restored.rows().len(), 2);

    let first = restored.rows().get(0).unwrap();
    assert_eq!(first.get("name"), Some(&Value::from("Alice")));
    assert_eq!(first.get("age"), Some(&Value::from("30")));
    let second = restored.rows().get(1).unwrap();
    assert_eq!(second.get("name"), Some(&Value::from("Bob")));
    assert_eq!(second.get("age"), Some(&Value::from("41")));
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.bin");

    let people = people_table();
    people.serialize_to_file(&path).unwrap();

    // gzip magic on disk.
    let raw = std::fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    let restored = Table::deserialize_from_file(&path).unwrap();
    assert_eq!(restored.name(), "people");
    assert_eq!(restored.rows().len(), 2);
}

#[test]
fn typed_values_survive_a_round_trip() {
    let mut t = Table::create("typed").unwrap();
    t.add_column("n");
    t.add_column("f");
    t.add_column("b");
    t.add_column("s");

    let mut row = t.new_row();
    row.set("n", 7);
    row.set("f", 2.25);
    row.set("b", false);
    row.set("s", "text");
    t.update_row(&row).unwrap();

    let restored = Table::deserialize(&t.serialize().unwrap()).unwrap();
    let r = restored.rows().get(0).unwrap();
    assert_eq!(r.get("n"), Some(&Value::Int(7)));
    assert_eq!(r.get("f"), Some(&Value::Float(2.25)));
    assert_eq!(r.get("b"), Some(&Value::Bool(false)));
    assert_eq!(r.get("s"), Some(&Value::from("text")));

    // Columns come back from the first decoded row's keys, sorted.
    let names: Vec<&str> = restored
        .columns()
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["b", "f", "n", "s"]);
}

#[test]
fn name_length_is_enforced_at_create_and_decode() {
    assert!(matches!(
        Table::create("x".repeat(TABLE_NAME_LEN + 1)),
        Err(CollectionError::NameTooLong { .. })
    ));

    // Anything shorter than the fixed header is rejected at decode.
    let too_short = Table::create("t").unwrap().serialize().unwrap();
    let truncated = &too_short[..16];
    assert!(Table::deserialize(truncated).is_err());
}

#[test]
fn serializing_identical_content_twice_yields_identical_bytes() {
    let a = people_table();
    let b = people_table();
    assert_eq!(a.serialize().unwrap(), b.serialize().unwrap());
}
