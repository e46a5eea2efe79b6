use pretty_assertions::assert_eq;
use query_workbench::{
    error::WorkspaceError,
    sql::ObjectRef,
    workspace::{GridError, TabId, Workspace},
};

use crate::test_utils::{
    connected_workspace, employees_table, query_rows, seeded_database, test_settings, TestDatabase,
};

async fn open_employees() -> (TestDatabase, Workspace, TabId) {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();
    let id = workspace.open_object(&employees_table(), None).unwrap();
    workspace.settle().await;
    (db, workspace, id)
}

#[tokio::test]
async fn test_table_preview_is_editable() {
    let (_db, workspace, id) = open_employees().await;

    let grid = workspace.grid(&id).unwrap();
    assert!(grid.is_editable());
    assert_eq!(grid.columns(), ["id", "name", "dept"]);
    assert_eq!(grid.rows(), vec![vec!["1", "Ann", "Sales"], vec!["2", "Bob", "NULL"]]);
    assert_eq!(grid.snapshot().columns[0], "__ROWID");
}

#[tokio::test]
async fn test_cell_edit_commits_an_update() {
    let (_db, mut workspace, id) = open_employees().await;

    workspace.edit_cell(&id, 0, 1, "Anna").unwrap();
    assert_eq!(workspace.grid(&id).unwrap().dirty_rows(), vec![0]);
    assert_eq!(workspace.commit_grid(&id).unwrap(), 1);
    workspace.settle().await;

    let grid = workspace.grid(&id).unwrap();
    assert!(!grid.has_changes());
    assert_eq!(grid.rows()[0], vec!["1", "Anna", "Sales"]);
    assert_eq!(workspace.state.status.as_deref(), Some("Committed 1 change(s)"));
    assert_eq!(query_rows(&mut workspace, "SELECT name FROM employees WHERE id = 1").await.unwrap(), vec![vec!["Anna"]]);
}

#[tokio::test]
async fn test_insert_and_delete_reload_the_grid() {
    let (_db, mut workspace, id) = open_employees().await;

    let row = workspace.add_row(&id).unwrap();
    assert_eq!(row, 2);
    workspace.edit_cell(&id, row, 0, "3").unwrap();
    workspace.edit_cell(&id, row, 1, "Cy").unwrap();
    workspace.delete_row(&id, 1).unwrap();
    assert_eq!(workspace.commit_grid(&id).unwrap(), 2);
    workspace.settle().await;

    let grid = workspace.grid(&id).unwrap();
    assert!(!grid.has_changes());
    assert_eq!(grid.rows(), vec![vec!["1", "Ann", "Sales"], vec!["3", "Cy", "NULL"]]);
    assert_eq!(query_rows(&mut workspace, "SELECT entry FROM audit_log").await.unwrap(), vec![vec!["hired Cy"]]);
}

#[tokio::test]
async fn test_failed_commit_keeps_drafts() {
    let (_db, mut workspace, id) = open_employees().await;

    workspace.edit_cell(&id, 0, 2, "Ops").unwrap();
    workspace.edit_cell(&id, 1, 1, "").unwrap();
    workspace.commit_grid(&id).unwrap();
    workspace.settle().await;

    let error = workspace.state.last_error.clone().unwrap();
    assert!(error.starts_with("Row 2: "), "{error}");
    assert!(error.contains("NOT NULL"), "{error}");

    let grid = workspace.grid(&id).unwrap();
    assert!(!grid.is_committing());
    assert_eq!(grid.dirty_rows(), vec![1]);
    assert_eq!(grid.snapshot().rows[0], vec!["1", "1", "Ann", "Ops"]);
}

#[tokio::test]
async fn test_revert_discards_drafts() {
    let (_db, mut workspace, id) = open_employees().await;

    workspace.edit_cell(&id, 1, 2, "Support").unwrap();
    workspace.add_row(&id).unwrap();
    workspace.revert_grid(&id).unwrap();

    let grid = workspace.grid(&id).unwrap();
    assert!(!grid.has_changes());
    assert_eq!(grid.row_count(), 2);
    assert_eq!(workspace.commit_grid(&id), Err(WorkspaceError::Grid(GridError::NothingToCommit)));
}

#[tokio::test]
async fn test_view_preview_is_read_only() {
    let db = seeded_database().await.unwrap();
    let mut workspace = connected_workspace(&db, test_settings()).await.unwrap();
    let id = workspace.open_object(&ObjectRef::new("main", "view", "sales_staff"), None).unwrap();
    workspace.settle().await;

    let grid = workspace.grid(&id).unwrap();
    assert!(!grid.is_editable());
    assert_eq!(grid.rows(), vec![vec!["1", "Ann"]]);
    assert!(matches!(
        workspace.edit_cell(&id, 0, 1, "Anna"),
        Err(WorkspaceError::Grid(GridError::ReadOnly(_)))
    ));
}
