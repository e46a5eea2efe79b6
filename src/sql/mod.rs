pub mod lexer;
pub mod models;
pub mod preflight;
pub mod quote;
pub mod splitter;
pub mod sqlite;

use async_trait::async_trait;

pub use self::{
  models::{
    ConnectParams, DatabaseProvider, MatchScope, ObjectRef, SchemaSearchHit, SearchScopes, SessionId, SessionSummary,
    TabularResult,
  },
  preflight::{assess, assess_all, Assessment},
  splitter::split_statements,
};
use crate::error::GatewayResult;

/// Alias of the hidden leading column that carries each row's physical
/// locator in a data preview.
pub const ROW_IDENTITY_COLUMN: &str = "__ROWID";

pub const DEFAULT_ROW_LIMIT: u32 = 1000;
pub const MAX_ROW_LIMIT: u32 = 10_000;
pub const DEFAULT_SEARCH_LIMIT: u32 = 200;
pub const MAX_SEARCH_LIMIT: u32 = 1000;
pub const MAX_SNIPPET_CHARS: usize = 220;
pub const MAX_EXPLORER_OBJECTS: u32 = 5000;

/// Everything the workspace needs from a live database connection.
///
/// Implementations own their sessions; every call names the session it is
/// meant for and must fail with `SessionNotFound` once that session is gone.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionGateway: Send + Sync {
  async fn connect(&self, params: &ConnectParams) -> GatewayResult<SessionSummary>;
  async fn disconnect(&self, session_id: SessionId) -> GatewayResult<()>;
  async fn list_objects(&self, session_id: SessionId) -> GatewayResult<Vec<ObjectRef>>;
  async fn get_object_ddl(&self, session_id: SessionId, object: &ObjectRef) -> GatewayResult<String>;
  async fn update_object_ddl(&self, session_id: SessionId, object: &ObjectRef, ddl: &str) -> GatewayResult<String>;
  async fn run_statement(
    &self,
    session_id: SessionId,
    sql: &str,
    row_limit: u32,
    allow_destructive: bool,
  ) -> GatewayResult<TabularResult>;
  async fn search_schema(
    &self,
    session_id: SessionId,
    term: &str,
    scopes: SearchScopes,
    limit: u32,
  ) -> GatewayResult<Vec<SchemaSearchHit>>;
}

/// Renders a nullable column value, `NULL` when absent.
#[macro_export]
macro_rules! get_or_null {
  ($value:expr) => {
    $value.map_or("NULL".to_string(), |v| v.to_string())
  };
}

/// Data preview for a table or view. Tables lead with the row locator so the
/// grid can be edited; views are previewed read-only.
pub fn data_preview_sql(object: &ObjectRef) -> String {
  let table = quote::qualified_name(object);
  if object.is_editable_type() {
    format!("SELECT ROWID AS {}, t.* FROM {table} t", quote::quote_identifier(ROW_IDENTITY_COLUMN))
  } else {
    format!("SELECT t.* FROM {table} t")
  }
}

/// Column metadata query for the provider's catalog.
pub fn metadata_sql(provider: DatabaseProvider, object: &ObjectRef) -> String {
  match provider {
    DatabaseProvider::Sqlite => format!(
      "SELECT name AS COLUMN_NAME, type AS DATA_TYPE, CASE \"notnull\" WHEN 1 THEN 'N' ELSE 'Y' END AS NULLABLE, \
       dflt_value AS DATA_DEFAULT, pk AS PRIMARY_KEY FROM pragma_table_info({}, {}) ORDER BY cid",
      quote::quote_literal(&object.object_name),
      quote::quote_literal(&object.schema),
    ),
    _ => format!(
      "SELECT COLUMN_NAME, DATA_TYPE, NULLABLE, DATA_DEFAULT FROM ALL_TAB_COLUMNS \
       WHERE OWNER = {} AND TABLE_NAME = {} ORDER BY COLUMN_ID",
      quote::quote_literal(&object.schema),
      quote::quote_literal(&object.object_name),
    ),
  }
}

pub fn clamp_row_limit(row_limit: u32) -> u32 {
  row_limit.clamp(1, MAX_ROW_LIMIT)
}

pub fn clamp_search_limit(limit: u32) -> u32 {
  limit.clamp(1, MAX_SEARCH_LIMIT)
}

/// Trimmed text, cut at [`MAX_SNIPPET_CHARS`] characters with `...` appended.
pub fn truncate_for_snippet(value: &str) -> String {
  let trimmed = value.trim();
  if trimmed.chars().count() <= MAX_SNIPPET_CHARS {
    return trimmed.to_string();
  }
  let mut snippet: String = trimmed.chars().take(MAX_SNIPPET_CHARS).collect();
  snippet.push_str("...");
  snippet
}

/// First line (1-based) containing `needle_upper`, compared case-insensitively.
pub fn find_matching_line(text: &str, needle_upper: &str) -> Option<(u32, String)> {
  text.lines().enumerate().find_map(|(index, line)| {
    line
      .to_ascii_uppercase()
      .contains(needle_upper)
      .then(|| (u32::try_from(index + 1).unwrap_or(u32::MAX), line.trim().to_string()))
  })
}

/// Drops trailing blank lines and SQL*Plus `/` terminators.
pub fn normalize_ddl_for_execute(ddl: &str) -> String {
  let mut lines: Vec<&str> = ddl.lines().collect();
  while lines.last().is_some_and(|line| line.trim().is_empty() || line.trim() == "/") {
    lines.pop();
  }
  lines.join("\n")
}
