//! Error types for the gateway and the workspace engine.

use thiserror::Error;

use crate::workspace::grid::GridError;

/// Failures reported by a [`SessionGateway`](crate::sql::SessionGateway).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
  #[error("Session not found")]
  SessionNotFound,

  #[error("Provider '{0}' is not implemented yet.")]
  ProviderNotImplemented(String),

  #[error("{0}")]
  Invalid(String),

  #[error("Safety check blocked a write/DDL/PLSQL statement. Confirm execution and retry.")]
  DestructiveBlocked,

  #[error("Connected schema is {0}. Object access is limited to that schema.")]
  OutOfScope(String),

  #[error("{0}")]
  Database(String),
}

impl From<sqlx::Error> for GatewayError {
  fn from(error: sqlx::Error) -> Self {
    Self::Database(error.to_string())
  }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Validation failures raised by the workspace before anything is sent to the
/// gateway, plus gateway errors surfaced from awaited calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
  #[error("Not connected")]
  NotConnected,

  #[error("Query cannot be empty")]
  EmptyStatement,

  #[error("DDL cannot be empty")]
  EmptyDdl,

  #[error("Search term is required")]
  EmptySearchTerm,

  #[error("Select at least one search scope")]
  NoSearchScope,

  #[error("The last query tab cannot be closed")]
  LastQueryTab,

  #[error("Tab not found: {0}")]
  TabNotFound(String),

  #[error("{0} is still running")]
  RunInProgress(String),

  #[error("{1} for {0} is still loading")]
  LoadInProgress(String, String),

  #[error("{0} has no row data")]
  NoData(String),

  #[error("Data for {0} is not loaded")]
  DataNotLoaded(String),

  #[error(transparent)]
  Grid(#[from] GridError),

  #[error(transparent)]
  Gateway(#[from] GatewayError),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
