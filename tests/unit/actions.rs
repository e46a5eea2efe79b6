use pretty_assertions::assert_eq;
use query_workbench::{
    action::{Action, DetailPayload},
    sql::ObjectRef,
    workspace::{ChangeKind, DetailKind, RowChange, TabId},
};

#[test]
fn test_task_ending_actions() {
    let tab = TabId::object(&ObjectRef::new("main", "table", "employees"));
    let loaded = Action::DetailLoaded {
        session_id: 3,
        tab: tab.clone(),
        kind: DetailKind::Ddl,
        outcome: Ok(DetailPayload::Ddl("CREATE TABLE employees (id INTEGER)".into())),
    };
    assert!(loaded.ends_task());
    assert_eq!(loaded.session_id(), Some(3));

    let status = Action::Status("Connected".into());
    assert!(!status.ends_task());
    assert_eq!(status.session_id(), None);
}

#[test]
fn test_action_display_names_the_variant() {
    let action = Action::CommitFinished { session_id: 1, tab: TabId::Query(1), applied: vec![], failure: None };
    assert_eq!(action.to_string(), "CommitFinished");
}

#[test]
fn test_commit_result_serializes_with_row_changes() {
    let action = Action::CommitFinished {
        session_id: 1,
        tab: TabId::object(&ObjectRef::new("main", "TABLE", "employees")),
        applied: vec![RowChange {
            row: 0,
            kind: ChangeKind::Update,
            sql: "UPDATE \"main\".\"employees\" SET \"name\" = 'Anna' WHERE ROWID = 1".into(),
        }],
        failure: Some("Row 2: constraint failed".into()),
    };
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json["CommitFinished"]["applied"][0]["kind"], "Update");
    assert_eq!(json["CommitFinished"]["failure"], "Row 2: constraint failed");

    let back: Action = serde_json::from_value(json).unwrap();
    assert_eq!(back, action);
}

#[test]
fn test_statement_failure_carries_message() {
    let action = Action::StatementFinished {
        session_id: 1,
        tab_id: 2,
        run_id: 5,
        index: 1,
        outcome: Err("no such table: missing".into()),
        elapsed_ms: 4,
    };
    match action {
        Action::StatementFinished { outcome: Err(message), index, .. } => {
            assert_eq!(message, "no such table: missing");
            assert_eq!(index, 1);
        },
        other => panic!("Wrong action type: {other}"),
    }
}
