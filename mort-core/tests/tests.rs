use mort_core::{GrowArray, HashTable, TableKey};

#[test]
fn array_growth_test() {
    let mut array = GrowArray::with_capacity(1);

    for i in 0..100usize {
        array.push(i);
    }

    assert_eq!(array.len(), 100);
    for i in 0..100usize {
        assert_eq!(*array.get(i), i);
    }
}

#[test]
fn array_growth_is_gradual_test() {
    let mut array = GrowArray::with_capacity(4);

    for i in 0..5usize {
        array.push(i);
    }

    // 50% growth policy: 4 -> 6, not 8.
    assert_eq!(array.capacity(), 6);
}

#[test]
fn array_remove_shifts_down_test() {
    let mut array = GrowArray::new();
    for i in 0..5usize {
        array.push(i);
    }

    let removed = array.remove(1);
    assert_eq!(removed, 1);
    assert_eq!(array.len(), 4);

    let items: Vec<usize> = array.iter().copied().collect();
    assert_eq!(items, vec![0, 2, 3, 4]);
}

#[test]
fn array_index_of_test() {
    let mut array = GrowArray::new();
    array.push("alpha");
    array.push("beta");

    assert_eq!(array.index_of(|it| *it == "beta"), Some(1));
    assert_eq!(array.index_of(|it| *it == "gamma"), None);

    assert_eq!(array.remove_item(|it| *it == "alpha"), Some("alpha"));
    assert_eq!(array.len(), 1);
}

#[test]
#[should_panic(expected = "out of range")]
fn array_out_of_range_test() {
    let mut array = GrowArray::new();
    array.push(1usize);
    array.get(1);
}

#[derive(Debug, PartialEq)]
struct Entry {
    name: String,
    value: usize,
}

fn entry_key(entry: &Entry) -> &str {
    entry.name.as_str()
}

fn entry_equals(a: &Entry, b: &Entry) -> bool {
    a.name == b.name
}

#[test]
fn table_insert_get_test() {
    let mut table = HashTable::with_capacity(4, entry_key, entry_equals);

    for i in 0..64usize {
        table.insert(Entry {
            name: format!("entry-{}", i),
            value: i,
        });
    }

    assert_eq!(table.len(), 64);
    for i in 0..64usize {
        let name = format!("entry-{}", i);
        let found = table.get(name.as_str()).unwrap();
        assert_eq!(found.value, i);
    }
    assert!(table.get("entry-64").is_none());
}

#[test]
fn table_duplicate_insert_test() {
    let mut table = HashTable::with_capacity(4, entry_key, entry_equals);

    table.insert(Entry {
        name: "only".to_string(),
        value: 1,
    });
    table.insert(Entry {
        name: "only".to_string(),
        value: 2,
    });

    assert_eq!(table.len(), 1);
    // The original entry wins; the duplicate insert is a no-op.
    assert_eq!(table.get("only").unwrap().value, 1);
}

#[test]
fn table_growth_invariant_test() {
    let mut table = HashTable::with_capacity(1, entry_key, entry_equals);

    for i in 0..200usize {
        table.insert(Entry {
            name: format!("entry-{}", i),
            value: i,
        });

        assert!(table.len() <= table.bucket_count());
        assert!(table.bucket_count().is_power_of_two());
    }

    // Everything must still be reachable after multiple rehashes.
    for i in 0..200usize {
        let name = format!("entry-{}", i);
        assert_eq!(table.get(name.as_str()).unwrap().value, i);
    }
}

#[test]
fn table_capacity_rounding_test() {
    let table: HashTable<Entry, str> = HashTable::with_capacity(12, entry_key, entry_equals);
    assert_eq!(table.bucket_count(), 16);

    let table: HashTable<Entry, str> = HashTable::with_capacity(0, entry_key, entry_equals);
    assert_eq!(table.bucket_count(), 1);
}

#[test]
fn table_iter_test() {
    let mut table = HashTable::with_capacity(2, entry_key, entry_equals);
    for i in 0..10usize {
        table.insert(Entry {
            name: format!("entry-{}", i),
            value: i,
        });
    }

    let mut values: Vec<usize> = table.iter().map(|entry| entry.value).collect();
    values.sort_unstable();
    assert_eq!(values, (0..10).collect::<Vec<_>>());
}

#[test]
fn string_hash_test() {
    // Equal strings in distinct buffers hash identically.
    let a = String::from("forwardMessage:");
    let b = String::from("forwardMessage:");
    assert_eq!(a.as_str().table_hash(), b.as_str().table_hash());

    // The fold is order-dependent.
    assert_ne!("ab".table_hash(), "ba".table_hash());
}
