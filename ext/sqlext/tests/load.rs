///
/// # Integration Tests for per-connection loading
///
/// Loads the built-in extensions into individual connections, driven by
/// configs parsed from strings and from files on disk. Nothing here touches
/// the process-wide auto-extension list.
///

use std::fs;

use rusqlite::Connection;
use tempfile::TempDir;

use sqlext::{ExtensionConfig, ExtensionError, load_extensions, open, open_in_memory, parse_config, parse_config_str};

fn has_function(conn: &Connection, sql: &str) -> bool {
    conn.prepare(sql).is_ok()
}

#[test]
fn test_open_in_memory_loads_everything() {
    let conn = open_in_memory(&ExtensionConfig::all()).expect("Failed to open");

    let (count, digest): (i64, String) = conn
        .query_row(
            "SELECT mycount(column1), sha1('hello world') FROM (VALUES (1), (NULL), ('x'), (NULL), (3))",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(digest, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
}

#[test]
fn test_disabled_extension_is_not_loaded() {
    let config = parse_config_str("[extensions]\nsha1 = false\n").unwrap();
    let conn = open_in_memory(&config).unwrap();

    assert!(has_function(&conn, "SELECT mycount()"));
    assert!(!has_function(&conn, "SELECT sha1('a')"));
    assert!(!has_function(&conn, "SELECT sha1_query('SELECT 1')"));
}

#[test]
fn test_unknown_extension_is_rejected() {
    let config = parse_config_str("[extensions]\nclosure = true\n").unwrap();
    let conn = Connection::open_in_memory().unwrap();
    let err = load_extensions(&conn, &config).unwrap_err();
    assert!(matches!(err, ExtensionError::UnknownExtension(ref name) if name == "closure"));
}

#[test]
fn test_open_on_disk_with_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("sqlext.toml");
    fs::write(&config_path, "[extensions]\nsha1 = true\nmycount = true\n").unwrap();
    let config = parse_config(&config_path).unwrap();

    let db_path = temp_dir.path().join("events.db");
    {
        let conn = open(&db_path, &config).unwrap();
        conn.execute_batch(
            "CREATE TABLE events (kind TEXT, payload BLOB);
             INSERT INTO events VALUES ('open', x'01'), ('close', NULL), ('open', NULL);",
        )
        .unwrap();
    }

    let conn = open(&db_path, &config).unwrap();
    let mut stmt = conn
        .prepare("SELECT kind, mycount(), mycount(payload) FROM events GROUP BY kind ORDER BY kind")
        .unwrap();
    let rows: Vec<(String, i64, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        rows,
        vec![("close".to_string(), 1, 0), ("open".to_string(), 2, 1)]
    );
}

#[test]
fn test_load_into_plain_connection_is_isolated() {
    let loaded = Connection::open_in_memory().unwrap();
    load_extensions(&loaded, &ExtensionConfig::all()).unwrap();
    assert!(has_function(&loaded, "SELECT mycount()"));

    let plain = Connection::open_in_memory().unwrap();
    // Another test binary may install auto-extensions, but this one never does.
    assert!(!has_function(&plain, "SELECT mycount()"));
}
