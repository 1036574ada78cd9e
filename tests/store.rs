use std::{fs, io::Write};

use sheet_entry::store::{CsvStore, TabularStore, resolve_delimiter};
use sheet_entry::value::CellValue;
use tempfile::tempdir;

fn write_file(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).expect("create file");
    write!(file, "{contents}").unwrap();
    (dir, path)
}

#[test]
fn open_reads_headers_and_data_rows() {
    let (_dir, path) = write_file(
        "people.csv",
        "Name,Email,Amount\nAlice,alice@example.com,10\nBob,bob@example.com,20\n",
    );
    let store = CsvStore::open(&path, None).unwrap();
    assert_eq!(store.load_headers().unwrap(), vec!["Name", "Email", "Amount"]);
    let rows = store.data_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["Alice", "alice@example.com", "10"]);
}

#[test]
fn blank_leading_rows_are_skipped_when_finding_headers() {
    let (_dir, path) = write_file("padded.csv", ",,\n,,\nName,Code\nAlice,a1\n");
    let store = CsvStore::open(&path, None).unwrap();
    assert_eq!(store.load_headers().unwrap(), vec!["Name", "Code"]);
    assert_eq!(store.data_rows().unwrap(), vec![vec!["Alice", "a1"]]);
}

#[test]
fn blank_header_cells_get_fallback_names() {
    let (_dir, path) = write_file("gaps.csv", "Name,,Amount\nAlice,x,10\n");
    let store = CsvStore::open(&path, None).unwrap();
    assert_eq!(
        store.load_headers().unwrap(),
        vec!["Name", "Column 2", "Amount"]
    );
}

#[test]
fn empty_data_rows_are_skipped_and_short_rows_padded() {
    let (_dir, path) = write_file(
        "sparse.csv",
        "Name,Code,Amount\nAlice,a1,10\n,,\nBob\n",
    );
    let store = CsvStore::open(&path, None).unwrap();
    let rows = store.data_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["Bob", "", ""]);
    assert_eq!(store.column_values(2).unwrap(), vec!["a1", ""]);
}

#[test]
fn mutations_round_trip_through_persist() {
    let (_dir, path) = write_file("orders.csv", "Code,Amount\na1,10\nb2,20\n");
    let mut store = CsvStore::open(&path, None).unwrap();

    store
        .append_row(&[Some(CellValue::Text("c3".into())), Some(CellValue::Float(30.5))])
        .unwrap();
    store
        .update_row(1, &[Some(CellValue::Text("a1".into())), Some(CellValue::Integer(11))])
        .unwrap();
    store.delete_row(2).unwrap();
    store.persist().unwrap();

    let reloaded = CsvStore::open(&path, None).unwrap();
    assert_eq!(
        reloaded.data_rows().unwrap(),
        vec![vec!["a1", "11"], vec!["c3", "30.5"]]
    );
}

#[test]
fn persist_writes_nulls_as_blank_cells() {
    let (_dir, path) = write_file("notes.csv", "Name,Notes\n");
    let mut store = CsvStore::open(&path, None).unwrap();
    store
        .append_row(&[Some(CellValue::Text("Ada".into())), None])
        .unwrap();
    store.persist().unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.lines().any(|line| line == "Ada," || line == "Ada,\"\""));
}

#[test]
fn tsv_extension_selects_tab_delimiter() {
    let (_dir, path) = write_file("data.tsv", "Name\tAmount\nAlice\t10\n");
    assert_eq!(resolve_delimiter(&path, None), b'\t');
    assert_eq!(resolve_delimiter(&path, Some(b';')), b';');
    let store = CsvStore::open(&path, None).unwrap();
    assert_eq!(store.load_headers().unwrap(), vec!["Name", "Amount"]);
    assert_eq!(store.data_rows().unwrap(), vec![vec!["Alice", "10"]]);
}

#[test]
fn open_fails_on_headerless_blank_file() {
    let (_dir, path) = write_file("empty.csv", ",,\n,,\n");
    assert!(CsvStore::open(&path, None).is_err());
}
