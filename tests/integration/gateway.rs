use pretty_assertions::assert_eq;
use query_workbench::{
    error::GatewayError,
    sql::{sqlite::SqliteGateway, ConnectParams, DatabaseProvider, ObjectRef, SearchScopes, SessionGateway},
};

use crate::test_utils::{fixtures::empty_database, seeded_database};

#[tokio::test]
async fn test_only_sqlite_connects() {
    let gateway = SqliteGateway::new();
    let params = ConnectParams { provider: DatabaseProvider::Oracle, ..ConnectParams::sqlite("ignored.db") };
    assert_eq!(gateway.connect(&params).await, Err(GatewayError::ProviderNotImplemented("oracle".into())));

    let params = ConnectParams { path: None, ..ConnectParams::sqlite("") };
    assert_eq!(gateway.connect(&params).await, Err(GatewayError::Invalid("Database path is required".into())));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let db = empty_database().unwrap();
    let gateway = SqliteGateway::new();
    let first = gateway.connect(&db.params()).await.unwrap();
    let second = gateway.connect(&db.params()).await.unwrap();

    assert_eq!(first.session_id, 1);
    assert_eq!(second.session_id, 2);
    assert_eq!(first.schema, "main");
    assert!(first.display_name.ends_with("workbench.db [main]"), "{}", first.display_name);

    gateway.disconnect(first.session_id).await.unwrap();
    assert_eq!(gateway.list_objects(first.session_id).await, Err(GatewayError::SessionNotFound));
    assert_eq!(gateway.list_objects(second.session_id).await, Ok(vec![]));
}

#[tokio::test]
async fn test_destructive_statements_are_blocked_unless_allowed() {
    let db = seeded_database().await.unwrap();
    let gateway = SqliteGateway::new();
    let session = gateway.connect(&db.params()).await.unwrap().session_id;

    let sql = "DELETE FROM employees WHERE id = 2";
    assert_eq!(gateway.run_statement(session, sql, 10, false).await, Err(GatewayError::DestructiveBlocked));
    assert_eq!(gateway.run_statement(session, sql, 10, true).await.unwrap().rows_affected, Some(1));
    assert_eq!(
        gateway.run_statement(session, "   ", 10, true).await,
        Err(GatewayError::Invalid("Query cannot be empty".into()))
    );
}

#[tokio::test]
async fn test_queries_follow_schema_changes() {
    let db = empty_database().unwrap();
    let gateway = SqliteGateway::new();
    let session = gateway.connect(&db.params()).await.unwrap().session_id;

    gateway.run_statement(session, "CREATE TABLE t (a INTEGER)", 10, true).await.unwrap();
    gateway.run_statement(session, "INSERT INTO t VALUES (1)", 10, true).await.unwrap();
    let before = gateway.run_statement(session, "SELECT * FROM t", 10, false).await.unwrap();
    assert_eq!(before.columns, vec!["a"]);
    assert_eq!(before.rows, vec![vec!["1"]]);

    gateway.run_statement(session, "ALTER TABLE t ADD COLUMN b TEXT DEFAULT 'x'", 10, true).await.unwrap();
    let after = gateway.run_statement(session, "SELECT * FROM t", 10, false).await.unwrap();
    assert_eq!(after.columns, vec!["a", "b"]);
    assert_eq!(after.rows, vec![vec!["1", "x"]]);
    assert_eq!(after.message, "Query executed. Returned 1 row(s).");
}

#[tokio::test]
async fn test_values_render_as_text() {
    let db = empty_database().unwrap();
    let gateway = SqliteGateway::new();
    let session = gateway.connect(&db.params()).await.unwrap().session_id;

    let result = gateway.run_statement(session, "SELECT 42, 1.5, 'text', NULL, x'CAFE'", 10, false).await.unwrap();
    assert_eq!(result.rows, vec![vec!["42", "1.5", "text", "NULL", "\\xcafe"]]);
}

#[tokio::test]
async fn test_object_access_is_limited_to_main() {
    let db = seeded_database().await.unwrap();
    let gateway = SqliteGateway::new();
    let session = gateway.connect(&db.params()).await.unwrap().session_id;

    let outside = ObjectRef::new("temp", "TABLE", "employees");
    assert_eq!(gateway.get_object_ddl(session, &outside).await, Err(GatewayError::OutOfScope("main".into())));
    assert_eq!(
        gateway.get_object_ddl(session, &ObjectRef::new("main", "VIEW", "nope")).await,
        Err(GatewayError::Invalid("VIEW main.nope not found".into()))
    );
}

#[tokio::test]
async fn test_ddl_search_reports_first_matching_line() {
    let db = seeded_database().await.unwrap();
    let gateway = SqliteGateway::new();
    let session = gateway.connect(&db.params()).await.unwrap().session_id;

    let scopes = SearchScopes { object_names: false, source: false, ddl: true };
    let hits = gateway.search_schema(session, "dept", scopes, 10).await.unwrap();
    let found: Vec<(&str, Option<u32>)> = hits.iter().map(|hit| (hit.object_name.as_str(), hit.line)).collect();
    assert_eq!(found, vec![("employees", Some(1)), ("sales_staff", Some(1))]);

    let limited = gateway.search_schema(session, "e", SearchScopes::default(), 2).await.unwrap();
    assert_eq!(limited.len(), 2);
}
