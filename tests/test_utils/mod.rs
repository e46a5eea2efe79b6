
// Re-export commonly used items
pub use fixtures::{connected_workspace, employees_table, query_rows, seeded_database, TestDatabase};

use query_workbench::config::WorkspaceSettings;

pub const TEST_ROW_LIMIT: u32 = 50;

pub fn test_settings() -> WorkspaceSettings {
    WorkspaceSettings { row_limit: TEST_ROW_LIMIT, ..WorkspaceSettings::default() }
}
