use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use strum::Display;

pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatabaseProvider {
  Oracle,
  Postgres,
  Mysql,
  Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
  pub provider: DatabaseProvider,
  #[serde(default)]
  pub host: String,
  pub port: Option<u16>,
  #[serde(default)]
  pub service_name: String,
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub schema: String,
  /// Database file for file-backed providers.
  pub path: Option<PathBuf>,
}

impl ConnectParams {
  pub fn sqlite(path: impl Into<PathBuf>) -> Self {
    Self {
      provider: DatabaseProvider::Sqlite,
      host: String::new(),
      port: None,
      service_name: String::new(),
      username: String::new(),
      password: String::new(),
      schema: String::new(),
      path: Some(path.into()),
    }
  }

  /// Checks required fields before any connection attempt.
  pub fn validate(&self) -> Result<(), String> {
    if self.provider == DatabaseProvider::Sqlite {
      return match &self.path {
        Some(path) if !path.as_os_str().is_empty() => Ok(()),
        _ => Err("Database path is required".to_string()),
      };
    }

    if self.host.trim().is_empty() {
      return Err("Host is required".to_string());
    }
    if self.username.trim().is_empty() {
      return Err("Username is required".to_string());
    }
    if self.password.is_empty() {
      return Err("Password is required".to_string());
    }
    if self.service_name.trim().is_empty() {
      return Err("Service name is required".to_string());
    }
    if self.schema.trim().is_empty() {
      return Err("Schema is required".to_string());
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
  pub session_id: SessionId,
  pub display_name: String,
  pub schema: String,
  pub provider: DatabaseProvider,
}

/// An explorer object. Also the identity of its detail tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
  pub schema: String,
  pub object_type: String,
  pub object_name: String,
}

impl ObjectRef {
  pub fn new(schema: impl Into<String>, object_type: impl Into<String>, object_name: impl Into<String>) -> Self {
    Self { schema: schema.into(), object_type: object_type.into(), object_name: object_name.into() }
  }

  pub fn normalized_type(&self) -> String {
    self.object_type.trim().to_ascii_uppercase()
  }

  /// Trimmed copy with the type upper-cased.
  pub fn normalized(&self) -> Self {
    Self::new(self.schema.trim(), self.normalized_type(), self.object_name.trim())
  }

  /// Rows can be previewed.
  pub fn has_data(&self) -> bool {
    matches!(self.normalized_type().as_str(), "TABLE" | "VIEW")
  }

  /// Rows can be edited in place, provided the preview carries row identities.
  pub fn is_editable_type(&self) -> bool {
    self.normalized_type() == "TABLE"
  }
}

impl fmt::Display for ObjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}.{}", self.normalized_type(), self.schema, self.object_name)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularResult {
  pub columns: Vec<String>,
  pub rows: Vec<Vec<String>>,
  pub rows_affected: Option<u64>,
  pub message: String,
}

impl TabularResult {
  pub fn rows(columns: Vec<String>, rows: Vec<Vec<String>>, message: impl Into<String>) -> Self {
    Self { columns, rows, rows_affected: None, message: message.into() }
  }

  pub fn affected(rows_affected: u64, message: impl Into<String>) -> Self {
    Self { columns: Vec::new(), rows: Vec::new(), rows_affected: Some(rows_affected), message: message.into() }
  }

  pub fn is_row_set(&self) -> bool {
    self.rows_affected.is_none()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchScopes {
  pub object_names: bool,
  pub source: bool,
  pub ddl: bool,
}

impl Default for SearchScopes {
  fn default() -> Self {
    Self { object_names: true, source: true, ddl: true }
  }
}

impl SearchScopes {
  pub fn any(&self) -> bool {
    self.object_names || self.source || self.ddl
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchScope {
  ObjectName,
  Source,
  Ddl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSearchHit {
  pub schema: String,
  pub object_type: String,
  pub object_name: String,
  pub match_scope: MatchScope,
  pub line: Option<u32>,
  pub snippet: String,
}

impl SchemaSearchHit {
  pub fn object(&self) -> ObjectRef {
    ObjectRef::new(&self.schema, &self.object_type, &self.object_name)
  }
}
