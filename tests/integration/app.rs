use pretty_assertions::assert_eq;
use query_workbench::{app::App, cli::Command};

use crate::test_utils::{seeded_database, test_settings};

#[tokio::test]
async fn test_objects_command_lists_schema() {
    let db = seeded_database().await.unwrap();
    let mut app = App::open(&db.path, test_settings(), false).await.unwrap();

    let output = app.execute(Command::Objects).await.unwrap();
    assert!(output.starts_with("TYPE    | SCHEMA | NAME\n"), "{output}");
    assert!(output.contains("VIEW    | main   | sales_staff\n"), "{output}");
    assert!(output.ends_with("4 object(s)\n"), "{output}");
}

#[tokio::test]
async fn test_run_command_prints_each_pane() {
    let db = seeded_database().await.unwrap();
    let mut app = App::open(&db.path, test_settings(), false).await.unwrap();

    let command = Command::Run {
        script: None,
        execute: Some("UPDATE employees SET dept = 'Ops' WHERE id = 2; SELECT id, dept FROM employees ORDER BY id".into()),
        yes: true,
    };
    let output = app.execute(command).await.unwrap();
    assert_eq!(
        output.lines().filter(|line| !line.starts_with("-- ")).collect::<Vec<_>>(),
        vec![
            "Statement executed. 1 row(s) affected.",
            "id | dept",
            "---+------",
            "1  | Sales",
            "2  | Ops",
            "Query executed. Returned 2 row(s).",
            "Executed 2 statement(s)",
        ]
    );
    assert_eq!(app.workspace().state.last_error, None);
}

#[tokio::test]
async fn test_ddl_and_preview_commands() {
    let db = seeded_database().await.unwrap();
    let mut app = App::open(&db.path, test_settings(), true).await.unwrap();

    let ddl = app.execute(Command::Ddl { object_type: "view".into(), name: "sales_staff".into() }).await.unwrap();
    let ddl: String = serde_json::from_str(&ddl).unwrap();
    assert!(ddl.starts_with("CREATE VIEW sales_staff"));

    let preview =
        app.execute(Command::Preview { name: "employees".into(), object_type: "TABLE".into() }).await.unwrap();
    let preview: serde_json::Value = serde_json::from_str(&preview).unwrap();
    assert_eq!(preview["columns"], serde_json::json!(["id", "name", "dept"]));
    assert_eq!(preview["rows"][1], serde_json::json!(["2", "Bob", "NULL"]));
}

#[tokio::test]
async fn test_preview_rejects_objects_without_rows() {
    let db = seeded_database().await.unwrap();
    let mut app = App::open(&db.path, test_settings(), false).await.unwrap();

    let error = app
        .execute(Command::Preview { name: "employees_audit".into(), object_type: "TRIGGER".into() })
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "TRIGGER main.employees_audit has no row data");
}

#[tokio::test]
async fn test_search_command_honours_scopes() {
    let db = seeded_database().await.unwrap();
    let mut app = App::open(&db.path, test_settings(), false).await.unwrap();

    let command =
        Command::Search { term: "audit".into(), no_names: true, no_source: true, no_ddl: false, limit: None };
    let output = app.execute(command).await.unwrap();
    assert!(output.contains("ddl   | TRIGGER | main.employees_audit | 1"), "{output}");
    assert!(!output.contains("object_name"), "{output}");
}
