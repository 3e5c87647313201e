use rusqlite::Connection;
use unitdesk_core::{
    SqliteUnitStore, StoreError, Unit, UnitDocument, UnitDraft, UnitStatus, UnitStore,
};

fn pod(name: &str) -> Unit {
    Unit::new(UnitDraft {
        name: Some(name.to_string()),
        ..UnitDraft::default()
    })
    .unwrap()
}

fn user_version(path: &std::path::Path) -> u32 {
    Connection::open(path)
        .unwrap()
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn fresh_file_gets_current_layout_and_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("units.sqlite3");

    let store = SqliteUnitStore::open(&path).unwrap();
    assert!(store.load().unwrap().units.is_empty());
    drop(store);

    assert_eq!(user_version(&path), SqliteUnitStore::LAYOUT_VERSION);
}

#[test]
fn reopening_keeps_rows_and_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("units.sqlite3");
    let document = UnitDocument {
        units: vec![pod("Pod 1"), pod("Pod 2")],
    };

    SqliteUnitStore::open(&path).unwrap().save(&document).unwrap();
    let reopened = SqliteUnitStore::open(&path).unwrap();

    assert_eq!(reopened.load().unwrap(), document);
    assert_eq!(user_version(&path), SqliteUnitStore::LAYOUT_VERSION);
}

#[test]
fn file_from_newer_layout_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 99;")
        .unwrap();

    match SqliteUnitStore::open(&path) {
        Err(StoreError::UnsupportedLayout { found, supported }) => {
            assert_eq!(found, 99);
            assert_eq!(supported, SqliteUnitStore::LAYOUT_VERSION);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer layout was accepted"),
    }
    assert_eq!(user_version(&path), 99);
}

#[test]
fn table_refuses_unknown_status_from_other_writers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("units.sqlite3");
    drop(SqliteUnitStore::open(&path).unwrap());

    let result = Connection::open(&path).unwrap().execute(
        "INSERT INTO units (position, id, name, type, status, last_updated)
         VALUES (0, ?1, 'Pod', 'capsule', 'Dirty', '2025-01-01T00:00:00.000Z');",
        [pod("Pod").id.to_string()],
    );
    assert!(result.is_err());
}

#[test]
fn rows_with_malformed_ids_fail_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("units.sqlite3");
    let store = SqliteUnitStore::open(&path).unwrap();
    store
        .save(&UnitDocument {
            units: vec![pod("Pod 1")],
        })
        .unwrap();

    Connection::open(&path)
        .unwrap()
        .execute(
            "INSERT INTO units (position, id, name, type, status, last_updated)
             VALUES (1, 'room-7', 'Pod 7', 'capsule', ?1, '2025-01-01T00:00:00.000Z');",
            [UnitStatus::Occupied.as_str()],
        )
        .unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)), "unexpected: {err}");
}
