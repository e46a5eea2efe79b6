use pretty_assertions::assert_eq;
use query_workbench::{
    error::WorkspaceError,
    sql::{MatchScope, ObjectRef, SearchScopes},
    workspace::{DetailKind, TabId},
};

use crate::test_utils::{connected_workspace, employees_table, seeded_database, test_settings};

fn sales_staff() -> ObjectRef {
    ObjectRef::new("main", "VIEW", "sales_staff")
}

#[tokio::test]
async fn test_object_list_loads_on_connect() {
    let db = seeded_database().await.unwrap();
    let workspace = connected_workspace(&db, test_settings()).await.unwrap();

    let names: Vec<String> = workspace.state.objects.iter().map(|object| object.to_string()).collect();
    assert_eq!(
        names,
        vec!["TABLE main.audit_log", "TABLE main.employees", "TRIGGER main.employees_audit", "VIEW main.sales_staff"]
    );
    assert_eq!(workspace.state.status.as_deref(), Some("Loaded 4 object(s)"));
}

#[tokio::test]
async fn test_reopening_an_object_reuses_its_tab() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();

    let first = workspace.open_object(&employees_table(), None).unwrap();
    let second = workspace.open_object(&ObjectRef::new(" main ", "table", "employees"), None).unwrap();
    workspace.settle().await;

    assert_eq!(first, second);
    assert_eq!(workspace.state.object_tabs.len(), 1);
    assert_eq!(workspace.state.active_tab(), &first);
}

#[tokio::test]
async fn test_ddl_and_metadata_views() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();
    let id = workspace.open_object(&employees_table(), None).unwrap();

    workspace.set_detail_kind(&id, DetailKind::Ddl).unwrap();
    workspace.set_detail_kind(&id, DetailKind::Metadata).unwrap();
    workspace.settle().await;

    let tab = workspace.state.object_tab(&id).unwrap();
    assert_eq!(tab.source_text, "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT NOT NULL, dept TEXT)");
    let metadata = tab.metadata.value.as_ref().unwrap();
    assert_eq!(metadata.columns, vec!["COLUMN_NAME", "DATA_TYPE", "NULLABLE", "DATA_DEFAULT", "PRIMARY_KEY"]);
    assert_eq!(metadata.rows[1], vec!["name", "TEXT", "N", "NULL", "0"]);
    assert!(tab.grid().is_some());
}

#[tokio::test]
async fn test_view_ddl_can_be_replaced() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();
    let id = workspace.open_object(&sales_staff(), None).unwrap();
    workspace.set_detail_kind(&id, DetailKind::Ddl).unwrap();
    workspace.settle().await;

    let ddl = "CREATE VIEW sales_staff AS SELECT id, name, dept FROM employees WHERE dept = 'Sales'\n/\n";
    workspace.set_ddl_text(&id, ddl).unwrap();
    workspace.save_ddl(&id).unwrap();
    workspace.settle().await;
    assert_eq!(workspace.state.status.as_deref(), Some("Loaded 4 object(s)"));
    assert_eq!(workspace.state.last_error, None);

    workspace.load_detail(&id, DetailKind::Data).unwrap();
    workspace.settle().await;
    assert_eq!(workspace.grid(&id).unwrap().columns(), ["id", "name", "dept"]);
}

#[tokio::test]
async fn test_tables_cannot_be_redefined() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();
    let id = workspace.open_object(&employees_table(), Some(1)).unwrap();
    workspace.settle().await;

    workspace.set_ddl_text(&id, "CREATE TABLE employees (id INTEGER)").unwrap();
    workspace.save_ddl(&id).unwrap();
    workspace.settle().await;
    assert!(workspace.state.last_error.as_deref().unwrap().starts_with("Tables cannot be recreated"));

    workspace.set_ddl_text(&id, "   ").unwrap();
    assert_eq!(workspace.save_ddl(&id), Err(WorkspaceError::EmptyDdl));
}

#[tokio::test]
async fn test_search_hit_reveals_the_matching_line() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();

    let scopes = SearchScopes { object_names: false, source: true, ddl: false };
    workspace.search("hired", scopes).unwrap();
    workspace.settle().await;

    let hit = workspace.state.search_results[0].clone();
    assert_eq!(workspace.state.search_results.len(), 1);
    assert_eq!(hit.match_scope, MatchScope::Source);
    assert_eq!(hit.object_name, "employees_audit");
    assert_eq!(hit.line, Some(3));
    assert_eq!(hit.snippet, "INSERT INTO audit_log (entry) VALUES ('hired ' || NEW.name);");

    let id = workspace.open_search_hit(&hit).unwrap();
    workspace.settle().await;
    let tab = workspace.state.object_tab(&id).unwrap();
    assert_eq!(tab.active_kind, DetailKind::Ddl);
    assert_eq!(tab.focus_line, Some(3));
    assert!(tab.source_text.starts_with("CREATE TRIGGER employees_audit"));
}

#[tokio::test]
async fn test_name_search_covers_every_object_type() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();

    let scopes = SearchScopes { object_names: true, source: false, ddl: false };
    workspace.search("EMPLOYEES", scopes).unwrap();
    workspace.settle().await;

    let found: Vec<(String, String)> = workspace
        .state
        .search_results
        .iter()
        .map(|hit| (hit.object_type.clone(), hit.object_name.clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("TABLE".to_string(), "employees".to_string()),
            ("TRIGGER".to_string(), "employees_audit".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_closing_object_tab_returns_to_worksheet() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();
    let id = workspace.open_object(&sales_staff(), None).unwrap();
    workspace.settle().await;

    workspace.state.close_object_tab(&id).unwrap();
    assert_eq!(workspace.state.active_tab(), &TabId::Query(1));
    assert!(workspace.state.object_tab(&id).is_err());
}

#[tokio::test]
async fn test_disconnect_clears_session_state() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();
    let id = workspace.open_object(&employees_table(), None).unwrap();
    workspace.settle().await;

    workspace.disconnect().await.unwrap();
    assert!(workspace.state.objects.is_empty());
    assert!(workspace.state.object_tab(&id).unwrap().grid().is_none());
    assert_eq!(workspace.disconnect().await, Err(WorkspaceError::NotConnected));
    assert_eq!(workspace.load_detail(&id, DetailKind::Data), Err(WorkspaceError::NotConnected));
}
