use rowrunner::store::{cell, columns, ensure_header, MemoryStore, QueueStore, StoreError};

#[test]
fn ensure_header_creates_header_once() {
    let store = MemoryStore::new("store-under-test");

    ensure_header(&store).unwrap();
    let rows = store.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "jobId");
    assert_eq!(rows[0][columns::STATUS - 1], "status");

    // Second call leaves the table untouched
    ensure_header(&store).unwrap();
    assert_eq!(store.snapshot().len(), 1);
}

#[test]
fn ensure_header_skips_populated_store() {
    let store = MemoryStore::new("populated");
    store.append_row(&["custom".to_string()]).unwrap();

    ensure_header(&store).unwrap();
    let rows = store.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "custom");
}

#[test]
fn update_cell_pads_short_rows() {
    let store = MemoryStore::new("pad");
    store.append_row(&["a".to_string()]).unwrap();

    store.update_cell(1, 5, "e").unwrap();
    let rows = store.snapshot();
    assert_eq!(rows[0].len(), 5);
    assert_eq!(rows[0][4], "e");
    assert_eq!(rows[0][1], "");
}

#[test]
fn update_cell_rejects_out_of_range_rows() {
    let store = MemoryStore::new("bounds");
    store.append_row(&["a".to_string()]).unwrap();

    assert!(matches!(
        store.update_cell(2, 1, "x"),
        Err(StoreError::RowOutOfRange(2))
    ));
    assert!(matches!(
        store.update_cell(0, 1, "x"),
        Err(StoreError::RowOutOfRange(0))
    ));
}

#[test]
fn failure_toggle_affects_all_operations() {
    let store = MemoryStore::new("flaky");
    store.append_row(&["a".to_string()]).unwrap();

    store.set_failing(true);
    assert!(store.list_rows().is_err());
    assert!(store.update_cell(1, 1, "x").is_err());
    assert!(store.append_row(&[]).is_err());

    store.set_failing(false);
    assert_eq!(store.list_rows().unwrap().len(), 1);
}

#[test]
fn cell_accessor_tolerates_short_rows() {
    let row = vec!["id".to_string(), "name".to_string()];
    assert_eq!(cell(&row, columns::JOB_ID), Some("id"));
    assert_eq!(cell(&row, columns::JOB_NAME), Some("name"));
    assert_eq!(cell(&row, columns::STATUS), None);
}

#[test]
fn read_count_tracks_listings() {
    let store = MemoryStore::new("counted");
    assert_eq!(store.read_count(), 0);
    let _ = store.list_rows();
    let _ = store.list_rows();
    assert_eq!(store.read_count(), 2);
}
