use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  sql::{ObjectRef, SchemaSearchHit, SessionId, TabularResult},
  workspace::{grid::RowChange, DetailKind, TabId},
};

/// Payload of a finished object-detail load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailPayload {
  Data(TabularResult),
  Ddl(String),
  Metadata(TabularResult),
}

/// Responses from gateway tasks, applied to the workspace in arrival order.
/// Every variant that touches session state names the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display, Deserialize)]
pub enum Action {
  ObjectsLoaded {
    session_id: SessionId,
    outcome: Result<Vec<ObjectRef>, String>,
  },
  StatementFinished {
    session_id: SessionId,
    tab_id: u64,
    run_id: u64,
    index: usize,
    outcome: Result<TabularResult, String>,
    elapsed_ms: u64,
  },
  BatchFinished {
    session_id: SessionId,
    tab_id: u64,
    run_id: u64,
    completed: usize,
    failed: bool,
  },
  DetailLoaded {
    session_id: SessionId,
    tab: TabId,
    kind: DetailKind,
    outcome: Result<DetailPayload, String>,
  },
  DdlSaved {
    session_id: SessionId,
    tab: TabId,
    ddl: String,
    outcome: Result<String, String>,
  },
  CommitFinished {
    session_id: SessionId,
    tab: TabId,
    applied: Vec<RowChange>,
    failure: Option<String>,
  },
  SearchFinished {
    session_id: SessionId,
    outcome: Result<Vec<SchemaSearchHit>, String>,
  },
  Status(String),
  Error(String),
}

impl Action {
  /// The last message a spawned task sends.
  pub fn ends_task(&self) -> bool {
    !matches!(self, Action::StatementFinished { .. } | Action::Status(_) | Action::Error(_))
  }

  pub fn session_id(&self) -> Option<SessionId> {
    match self {
      Action::ObjectsLoaded { session_id, .. }
      | Action::StatementFinished { session_id, .. }
      | Action::BatchFinished { session_id, .. }
      | Action::DetailLoaded { session_id, .. }
      | Action::DdlSaved { session_id, .. }
      | Action::CommitFinished { session_id, .. }
      | Action::SearchFinished { session_id, .. } => Some(*session_id),
      Action::Status(_) | Action::Error(_) => None,
    }
  }
}
