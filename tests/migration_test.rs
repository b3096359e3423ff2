mod helpers;

use cocoon::db;
use cocoon::db::migrations::{
    get_embedding_model, get_schema_version, run_migrations, set_embedding_model,
    CURRENT_SCHEMA_VERSION,
};

#[test]
fn fresh_db_migrates_to_current_version() {
    let conn = helpers::test_db();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn migrations_are_idempotent() {
    let mut conn = helpers::test_db();
    run_migrations(&mut conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn manual_v1_db_upgrades_and_keeps_rows() {
    db::load_sqlite_vec();
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), 1);

    conn.execute(
        "INSERT INTO chunks (id, user_id, path, position, content, created_at) \
         VALUES ('c1', 'u1', 'a.md', 0, 'hello', '2026-01-01T00:00:00Z')",
        [],
    )
    .unwrap();

    run_migrations(&mut conn).unwrap();

    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    assert_eq!(helpers::count(&conn, "SELECT COUNT(*) FROM chunks"), 1);
}

#[test]
fn embedding_model_is_unset_until_recorded() {
    let conn = helpers::test_db();
    assert!(get_embedding_model(&conn).unwrap().is_none());

    set_embedding_model(&conn, "all-MiniLM-L6-v2").unwrap();
    set_embedding_model(&conn, "feature-hash-384").unwrap();
    assert_eq!(
        get_embedding_model(&conn).unwrap().as_deref(),
        Some("feature-hash-384")
    );
}
