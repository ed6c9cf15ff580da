use pendulum_core::db::migrations::latest_version;
use pendulum_core::db::{open_db, open_db_in_memory, DbError};
use pendulum_core::{RepoError, SqliteEventRepository, SqlitePenPalRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "penpals");
    assert_table_exists(&conn, "events");
    assert_table_exists(&conn, "event_photos");
}

#[test]
fn foreign_keys_are_enforced_on_opened_connections() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO events (penpal_id, type_value, date) VALUES ('ghost', 1, 0);",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pendulum.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    conn_first
        .execute("INSERT INTO penpals (id) VALUES ('pp-keep');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "event_photos");
    let kept: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM penpals;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(kept, 1);
}

#[test]
fn open_db_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store").join("pendulum.db");

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert!(path.exists());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let mut conn = Connection::open_in_memory().unwrap();

    let event_err = SqliteEventRepository::try_new(&mut conn)
        .err()
        .expect("event repo must reject raw connection");
    assert!(matches!(
        event_err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));

    let penpal_err = SqlitePenPalRepository::try_new(&mut conn)
        .err()
        .expect("pen-pal repo must reject raw connection");
    assert!(matches!(
        penpal_err,
        RepoError::UninitializedConnection { .. }
    ));
}

#[test]
fn repositories_reject_connections_missing_required_tables() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE event_photos;").unwrap();

    let err = SqliteEventRepository::try_new(&mut conn)
        .err()
        .expect("missing table must be reported");
    assert!(matches!(err, RepoError::MissingRequiredTable("event_photos")));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
