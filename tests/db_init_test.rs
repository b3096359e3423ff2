mod helpers;

use cocoon::db;
use cocoon::db::migrations::{get_embedding_model, set_embedding_model, CURRENT_SCHEMA_VERSION};
use cocoon::embedding::hash;
use cocoon::server::build_service;
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");
    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();

    assert!(db_path.exists());
    assert_eq!(helpers::count(&conn, "SELECT COUNT(*) FROM chunks"), 0);
    assert_eq!(helpers::count(&conn, "SELECT COUNT(*) FROM vault_files"), 0);
}

#[test]
fn wal_and_busy_timeout_are_set() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("test.db")).unwrap();

    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);
}

#[test]
fn health_check_passes_on_fresh_db() {
    let conn = helpers::test_db();
    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.schema_version, CURRENT_SCHEMA_VERSION);
    assert!(!report.sqlite_vec_version.is_empty());
    assert_eq!(report.chunk_count, 0);
    assert_eq!(report.vector_count, 0);
    assert_eq!(report.mirrored_files, 0);
    assert_eq!(report.user_count, 0);
}

#[test]
fn build_service_records_embedding_model() {
    let tmp = TempDir::new().unwrap();
    let config = helpers::test_config(&tmp);
    let db_path = config.resolved_db_path();

    let service = build_service(config).unwrap();
    assert_eq!(service.mirror_name(), "sqlite");
    assert!(service.llm_model().is_none());
    drop(service);

    let conn = db::open_database(&db_path).unwrap();
    assert_eq!(
        get_embedding_model(&conn).unwrap().as_deref(),
        Some(hash::MODEL_ID)
    );
}

fn seed_stale_model(db_path: &std::path::Path) {
    let conn = db::open_database(db_path).unwrap();
    set_embedding_model(&conn, "all-MiniLM-L6-v2").unwrap();
}

#[tokio::test]
async fn reindex_records_the_configured_model() {
    let tmp = TempDir::new().unwrap();
    let config = helpers::test_config(&tmp);
    let db_path = config.resolved_db_path();
    seed_stale_model(&db_path);

    let service = build_service(config).unwrap();
    service.save_note("alice", "a.md", "river notes", None).await.unwrap();
    {
        let conn = db::open_database(&db_path).unwrap();
        assert_eq!(
            get_embedding_model(&conn).unwrap().as_deref(),
            Some("all-MiniLM-L6-v2")
        );
    }

    service.reindex("alice").await.unwrap();
    drop(service);

    let conn = db::open_database(&db_path).unwrap();
    assert_eq!(
        get_embedding_model(&conn).unwrap().as_deref(),
        Some(hash::MODEL_ID)
    );
}

#[tokio::test]
async fn partial_reindex_keeps_the_old_model_until_all_users_are_rebuilt() {
    let tmp = TempDir::new().unwrap();
    let config = helpers::test_config(&tmp);
    let db_path = config.resolved_db_path();
    seed_stale_model(&db_path);

    let service = build_service(config).unwrap();
    service.save_note("alice", "a.md", "river notes", None).await.unwrap();
    service.save_note("bob", "b.md", "mountain notes", None).await.unwrap();

    service.reindex("alice").await.unwrap();
    let stored = {
        let conn = db::open_database(&db_path).unwrap();
        get_embedding_model(&conn).unwrap()
    };
    assert_eq!(stored.as_deref(), Some("all-MiniLM-L6-v2"));

    let reports = service.reindex_all().await.unwrap();
    let users: Vec<&str> = reports.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(users, vec!["alice", "bob"]);
    assert!(reports.iter().all(|r| r.report.notes == 1));
    drop(service);

    let conn = db::open_database(&db_path).unwrap();
    assert_eq!(
        get_embedding_model(&conn).unwrap().as_deref(),
        Some(hash::MODEL_ID)
    );
}

#[tokio::test]
async fn full_reindex_drops_users_without_a_vault() {
    let tmp = TempDir::new().unwrap();
    let config = helpers::test_config(&tmp);
    let vault_root = config.resolved_vault_root();
    let db_path = config.resolved_db_path();

    let service = build_service(config).unwrap();
    service.save_note("alice", "a.md", "river notes", None).await.unwrap();
    service.save_note("bob", "b.md", "mountain notes", None).await.unwrap();
    std::fs::remove_dir_all(vault_root.join("user_bob")).unwrap();

    let reports = service.reindex_all().await.unwrap();
    assert_eq!(reports.len(), 1);
    drop(service);

    let conn = db::open_database(&db_path).unwrap();
    assert_eq!(
        helpers::count(&conn, "SELECT COUNT(*) FROM chunks WHERE user_id = 'bob'"),
        0
    );
    let report = db::check_database_health(&conn).unwrap();
    assert_eq!(report.chunk_count, report.vector_count);
}

#[test]
fn build_service_rejects_unknown_providers() {
    let tmp = TempDir::new().unwrap();

    let mut config = helpers::test_config(&tmp);
    config.mirror.provider = "dynamo".into();
    assert!(build_service(config).is_err());

    let mut config = helpers::test_config(&tmp);
    config.embedding.provider = "openai".into();
    assert!(build_service(config).is_err());
}
