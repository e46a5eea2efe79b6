use pretty_assertions::assert_eq;
use query_workbench::{
    config::{Config, WorkspaceSettings},
    sql::{DEFAULT_ROW_LIMIT, DEFAULT_SEARCH_LIMIT},
};

#[test]
fn test_default_workspace_settings() {
    let settings = WorkspaceSettings::default();
    assert_eq!(settings.row_limit, DEFAULT_ROW_LIMIT);
    assert_eq!(settings.search_limit, DEFAULT_SEARCH_LIMIT);
    assert!(settings.confirm_destructive);
}

#[test]
fn test_user_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json5"),
        "{\n  // lower limits for slow links\n  workspace: { row_limit: 25, confirm_destructive: false },\n}\n",
    )
    .unwrap();

    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.workspace.row_limit, 25);
    assert_eq!(config.workspace.search_limit, DEFAULT_SEARCH_LIMIT);
    assert!(!config.workspace.confirm_destructive);
}

#[test]
fn test_empty_config_dir_uses_embedded_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.workspace, WorkspaceSettings::default());
}
