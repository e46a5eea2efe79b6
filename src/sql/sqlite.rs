use std::{
  collections::HashMap,
  path::Path,
  sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use sqlx::{
  sqlite::{SqliteColumn, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
  Column, Executor, Row, Statement,
};
use tokio::sync::Mutex;
use tokio_stream::StreamExt as _;
use tracing::{debug, info};

use super::{
  clamp_row_limit, clamp_search_limit, find_matching_line, lexer, normalize_ddl_for_execute, preflight, quote,
  truncate_for_snippet, ConnectParams, DatabaseProvider, MatchScope, ObjectRef, SchemaSearchHit, SearchScopes,
  SessionGateway, SessionId, SessionSummary, TabularResult, MAX_EXPLORER_OBJECTS,
};
use crate::{
  error::{GatewayError, GatewayResult},
  get_or_null,
};

/// The only schema a SQLite session exposes.
pub const SQLITE_SCHEMA: &str = "main";

const DML_KEYWORDS: &[&str] = &["INSERT", "UPDATE", "DELETE", "MERGE", "REPLACE"];
const DDL_KEYWORDS: &[&str] = &["CREATE", "ALTER", "DROP", "TRUNCATE", "RENAME", "COMMENT", "GRANT", "REVOKE"];

/// Completion message for a statement that returned no row set.
pub fn completion_message(sql: &str, rows_affected: u64) -> String {
  match lexer::leading_keyword(sql).as_deref() {
    Some(keyword) if DML_KEYWORDS.contains(&keyword) => format!("Statement executed. {rows_affected} row(s) affected."),
    Some(keyword) if DDL_KEYWORDS.contains(&keyword) => "DDL executed.".to_string(),
    _ => "Statement executed.".to_string(),
  }
}

/// File-backed sessions, one single-connection pool each so transactions and
/// pragmas stick to the session.
pub struct SqliteGateway {
  sessions: Mutex<HashMap<SessionId, SqlitePool>>,
  next_session_id: AtomicU64,
}

impl Default for SqliteGateway {
  fn default() -> Self {
    Self::new()
  }
}

impl SqliteGateway {
  pub fn new() -> Self {
    Self { sessions: Mutex::new(HashMap::new()), next_session_id: AtomicU64::new(1) }
  }

  async fn pool(&self, session_id: SessionId) -> GatewayResult<SqlitePool> {
    self.sessions.lock().await.get(&session_id).cloned().ok_or(GatewayError::SessionNotFound)
  }

  async fn open(path: &Path) -> GatewayResult<SqlitePool> {
    // Worksheets change the schema under their own queries, so prepared
    // statements are never cached across calls.
    let options = SqliteConnectOptions::new().filename(path).create_if_missing(true).statement_cache_capacity(0);
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;
    Ok(pool)
  }

  fn ensure_in_scope(object: &ObjectRef) -> GatewayResult<()> {
    if !object.schema.trim().eq_ignore_ascii_case(SQLITE_SCHEMA) {
      return Err(GatewayError::OutOfScope(SQLITE_SCHEMA.to_string()));
    }
    Ok(())
  }

  async fn fetch_rows(pool: &SqlitePool, sql: &str, row_limit: usize) -> GatewayResult<(Vec<Vec<String>>, bool)> {
    let mut stream = sqlx::query(sql).fetch(pool);
    let mut rows = Vec::new();
    let mut truncated = false;

    while let Some(row) = stream.try_next().await? {
      if rows.len() >= row_limit {
        truncated = true;
        break;
      }
      let values = row.columns().iter().map(|column| get_sqlite_value(&row, column)).collect::<GatewayResult<_>>()?;
      rows.push(values);
    }

    Ok((rows, truncated))
  }

  async fn search_object_names(
    pool: &SqlitePool,
    term: &str,
    limit: usize,
    hits: &mut Vec<SchemaSearchHit>,
  ) -> GatewayResult<()> {
    let remaining = limit.saturating_sub(hits.len());
    if remaining == 0 {
      return Ok(());
    }

    let rows = sqlx::query(
      "SELECT type, name FROM sqlite_master
       WHERE name NOT LIKE 'sqlite_%' AND instr(upper(name), upper(?1)) > 0
       ORDER BY type, name LIMIT ?2",
    )
    .bind(term)
    .bind(remaining as i64)
    .fetch_all(pool)
    .await?;

    for row in rows {
      let object_type: String = row.try_get("type")?;
      let object_name: String = row.try_get("name")?;
      hits.push(SchemaSearchHit {
        schema: SQLITE_SCHEMA.to_string(),
        object_type: object_type.to_ascii_uppercase(),
        snippet: truncate_for_snippet(&object_name),
        object_name,
        match_scope: MatchScope::ObjectName,
        line: None,
      });
    }
    Ok(())
  }

  /// Trigger bodies are the closest SQLite has to stored program source.
  async fn search_source(
    pool: &SqlitePool,
    needle_upper: &str,
    limit: usize,
    hits: &mut Vec<SchemaSearchHit>,
  ) -> GatewayResult<()> {
    if hits.len() >= limit {
      return Ok(());
    }

    let rows = sqlx::query(
      "SELECT name, sql FROM sqlite_master WHERE type = 'trigger' AND sql IS NOT NULL ORDER BY name LIMIT ?1",
    )
    .bind(i64::from(MAX_EXPLORER_OBJECTS))
    .fetch_all(pool)
    .await?;

    'objects: for row in rows {
      let object_name: String = row.try_get("name")?;
      let source: String = row.try_get("sql")?;
      for (index, line) in source.lines().enumerate() {
        if hits.len() >= limit {
          break 'objects;
        }
        if line.to_ascii_uppercase().contains(needle_upper) {
          hits.push(SchemaSearchHit {
            schema: SQLITE_SCHEMA.to_string(),
            object_type: "TRIGGER".to_string(),
            object_name: object_name.clone(),
            match_scope: MatchScope::Source,
            line: Some(u32::try_from(index + 1).unwrap_or(u32::MAX)),
            snippet: truncate_for_snippet(line.trim_end_matches(['\r', '\n'])),
          });
        }
      }
    }
    Ok(())
  }

  async fn search_ddl(
    pool: &SqlitePool,
    needle_upper: &str,
    limit: usize,
    hits: &mut Vec<SchemaSearchHit>,
  ) -> GatewayResult<()> {
    if hits.len() >= limit {
      return Ok(());
    }

    let rows = sqlx::query(
      "SELECT type, name, sql FROM sqlite_master
       WHERE name NOT LIKE 'sqlite_%' AND sql IS NOT NULL
       ORDER BY type, name LIMIT ?1",
    )
    .bind(i64::from(MAX_EXPLORER_OBJECTS))
    .fetch_all(pool)
    .await?;

    for row in rows {
      if hits.len() >= limit {
        break;
      }
      let object_type: String = row.try_get("type")?;
      let object_name: String = row.try_get("name")?;
      let ddl: String = row.try_get("sql")?;
      if let Some((line, text)) = find_matching_line(&ddl, needle_upper) {
        hits.push(SchemaSearchHit {
          schema: SQLITE_SCHEMA.to_string(),
          object_type: object_type.to_ascii_uppercase(),
          object_name,
          match_scope: MatchScope::Ddl,
          line: Some(line),
          snippet: truncate_for_snippet(&text),
        });
      }
    }
    Ok(())
  }
}

#[async_trait]
impl SessionGateway for SqliteGateway {
  async fn connect(&self, params: &ConnectParams) -> GatewayResult<SessionSummary> {
    if params.provider != DatabaseProvider::Sqlite {
      return Err(GatewayError::ProviderNotImplemented(params.provider.to_string()));
    }
    params.validate().map_err(GatewayError::Invalid)?;
    let path = params.path.as_deref().ok_or_else(|| GatewayError::Invalid("Database path is required".to_string()))?;

    let pool = Self::open(path).await?;
    let session_id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
    self.sessions.lock().await.insert(session_id, pool);

    let display_name = format!("sqlite:{} [{SQLITE_SCHEMA}]", path.display());
    info!("Opened session {session_id} on {display_name}");
    Ok(SessionSummary {
      session_id,
      display_name,
      schema: SQLITE_SCHEMA.to_string(),
      provider: DatabaseProvider::Sqlite,
    })
  }

  async fn disconnect(&self, session_id: SessionId) -> GatewayResult<()> {
    let pool = self.sessions.lock().await.remove(&session_id).ok_or(GatewayError::SessionNotFound)?;
    pool.close().await;
    info!("Closed session {session_id}");
    Ok(())
  }

  async fn list_objects(&self, session_id: SessionId) -> GatewayResult<Vec<ObjectRef>> {
    let pool = self.pool(session_id).await?;
    let rows = sqlx::query(
      "SELECT type, name FROM sqlite_master WHERE name NOT LIKE 'sqlite_%' ORDER BY type, name LIMIT ?1",
    )
    .bind(i64::from(MAX_EXPLORER_OBJECTS))
    .fetch_all(&pool)
    .await?;

    rows
      .into_iter()
      .map(|row| -> GatewayResult<ObjectRef> {
        let object_type: String = row.try_get("type")?;
        let object_name: String = row.try_get("name")?;
        Ok(ObjectRef::new(SQLITE_SCHEMA, object_type.to_ascii_uppercase(), object_name))
      })
      .collect()
  }

  async fn get_object_ddl(&self, session_id: SessionId, object: &ObjectRef) -> GatewayResult<String> {
    let pool = self.pool(session_id).await?;
    Self::ensure_in_scope(object)?;

    let ddl: Option<Option<String>> =
      sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = lower(?1) AND name = ?2")
        .bind(object.normalized_type())
        .bind(&object.object_name)
        .fetch_optional(&pool)
        .await?;

    match ddl {
      Some(Some(ddl)) => Ok(ddl),
      Some(None) => Err(GatewayError::Invalid(format!("{object} has no stored DDL"))),
      None => Err(GatewayError::Invalid(format!("{object} not found"))),
    }
  }

  async fn update_object_ddl(&self, session_id: SessionId, object: &ObjectRef, ddl: &str) -> GatewayResult<String> {
    let ddl = ddl.trim();
    if ddl.is_empty() {
      return Err(GatewayError::Invalid("DDL cannot be empty".to_string()));
    }
    let ddl = normalize_ddl_for_execute(ddl);
    let pool = self.pool(session_id).await?;
    Self::ensure_in_scope(object)?;

    let object_type = object.normalized_type();
    if object_type == "TABLE" {
      return Err(GatewayError::Invalid(
        "Tables cannot be recreated from their DDL; run ALTER TABLE from a query tab.".to_string(),
      ));
    }

    let mut tx = pool.begin().await?;
    sqlx::query(&format!("DROP {object_type} IF EXISTS {}", quote::qualified_name(object))).execute(&mut *tx).await?;
    sqlx::query(&ddl).execute(&mut *tx).await?;
    tx.commit().await?;

    info!("Replaced {object}");
    Ok(format!("{object_type} {}.{} updated", object.schema, object.object_name))
  }

  async fn run_statement(
    &self,
    session_id: SessionId,
    sql: &str,
    row_limit: u32,
    allow_destructive: bool,
  ) -> GatewayResult<TabularResult> {
    let sql = sql.trim();
    if sql.is_empty() {
      return Err(GatewayError::Invalid("Query cannot be empty".to_string()));
    }
    let pool = self.pool(session_id).await?;

    if preflight::assess(sql).should_confirm && !allow_destructive {
      return Err(GatewayError::DestructiveBlocked);
    }

    let statement = (&pool).prepare(sql).await?;
    if statement.columns().is_empty() {
      let done = sqlx::query(sql).execute(&pool).await?;
      let rows_affected = done.rows_affected();
      debug!("Session {session_id} executed statement, {rows_affected} row(s) affected");
      return Ok(TabularResult::affected(rows_affected, completion_message(sql, rows_affected)));
    }

    let columns = statement.columns().iter().map(|column| column.name().to_string()).collect();
    let row_limit = clamp_row_limit(row_limit);
    let (rows, truncated) = Self::fetch_rows(&pool, sql, row_limit as usize).await?;

    let mut message = format!("Query executed. Returned {} row(s).", rows.len());
    if truncated {
      message.push_str(&format!(" Results truncated at {row_limit} rows."));
    }
    debug!("Session {session_id} returned {} row(s)", rows.len());
    Ok(TabularResult::rows(columns, rows, message))
  }

  async fn search_schema(
    &self,
    session_id: SessionId,
    term: &str,
    scopes: SearchScopes,
    limit: u32,
  ) -> GatewayResult<Vec<SchemaSearchHit>> {
    let term = term.trim();
    if term.is_empty() {
      return Err(GatewayError::Invalid("Search term is required".to_string()));
    }
    if !scopes.any() {
      return Err(GatewayError::Invalid("Select at least one search scope".to_string()));
    }
    let pool = self.pool(session_id).await?;
    let limit = clamp_search_limit(limit) as usize;
    let needle_upper = term.to_ascii_uppercase();

    let mut hits = Vec::new();
    if scopes.object_names {
      Self::search_object_names(&pool, term, limit, &mut hits).await?;
    }
    if scopes.source {
      Self::search_source(&pool, &needle_upper, limit, &mut hits).await?;
    }
    if scopes.ddl {
      Self::search_ddl(&pool, &needle_upper, limit, &mut hits).await?;
    }
    Ok(hits)
  }
}

fn get_sqlite_value(row: &SqliteRow, column: &SqliteColumn) -> GatewayResult<String> {
  let ordinal = column.ordinal();
  if let Ok(value) = row.try_get::<Option<i64>, _>(ordinal) {
    Ok(get_or_null!(value))
  } else if let Ok(value) = row.try_get::<Option<f64>, _>(ordinal) {
    Ok(get_or_null!(value))
  } else if let Ok(value) = row.try_get::<Option<String>, _>(ordinal) {
    Ok(value.unwrap_or_else(|| "NULL".to_string()))
  } else if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(ordinal) {
    Ok(value.map_or("NULL".to_string(), |bytes| {
      format!("\\x{}", bytes.iter().map(|byte| format!("{byte:02x}")).collect::<String>())
    }))
  } else {
    Err(GatewayError::Database(format!("Unknown type for column {}", column.name())))
  }
}
