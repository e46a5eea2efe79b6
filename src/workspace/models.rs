use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

use super::grid::DataGrid;
use crate::sql::{ObjectRef, SchemaSearchHit, SessionSummary, TabularResult};

pub type PaneId = u64;

/// Identity of a worksheet or object-detail tab. Object tabs are keyed by
/// `(schema, type, name)` with the type normalised, so reopening an object
/// always resolves to the same tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TabId {
  Query(u64),
  Object(ObjectRef),
}

impl TabId {
  pub fn object(target: &ObjectRef) -> Self {
    Self::Object(target.normalized())
  }
}

impl fmt::Display for TabId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Query(id) => write!(f, "query:{id}"),
      Self::Object(target) => write!(f, "object:{}.{}.{}", target.schema, target.object_type, target.object_name),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultPane {
  pub id: PaneId,
  pub title: String,
  pub result: Option<TabularResult>,
  pub error_message: Option<String>,
  pub elapsed_ms: Option<u64>,
}

impl ResultPane {
  pub fn new(id: PaneId) -> Self {
    Self { id, title: format!("Result {id}"), result: None, error_message: None, elapsed_ms: None }
  }

  /// Neither a result nor an error has been written.
  pub fn is_empty(&self) -> bool {
    self.result.is_none() && self.error_message.is_none()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTab {
  pub id: u64,
  pub title: String,
  pub source_text: String,
  pub result_panes: Vec<ResultPane>,
  pub active_result_pane_id: PaneId,
  pub next_pane_number: u64,
  /// Run whose responses this tab accepts.
  pub run_id: u64,
  pub running: bool,
}

impl QueryTab {
  pub fn new(id: u64) -> Self {
    let mut tab = Self {
      id,
      title: format!("Query {id}"),
      source_text: String::new(),
      result_panes: Vec::new(),
      active_result_pane_id: 0,
      next_pane_number: 1,
      run_id: 0,
      running: false,
    };
    tab.prepare(0);
    tab
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DetailKind {
  #[default]
  Data,
  Ddl,
  Metadata,
}

/// Cached state of one detail kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSlot<T> {
  pub value: Option<T>,
  pub loading: bool,
  pub error: Option<String>,
}

impl<T> Default for DetailSlot<T> {
  fn default() -> Self {
    Self { value: None, loading: false, error: None }
  }
}

impl<T> DetailSlot<T> {
  /// Loaded, failed or in flight: nothing left to fetch without an explicit
  /// reload.
  pub fn is_settled(&self) -> bool {
    self.loading || self.value.is_some() || self.error.is_some()
  }

  pub fn start_loading(&mut self) {
    self.loading = true;
    self.error = None;
  }

  pub fn finish(&mut self, outcome: Result<T, String>) {
    self.loading = false;
    match outcome {
      Ok(value) => {
        self.value = Some(value);
        self.error = None;
      },
      Err(message) => self.error = Some(message),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDetailTab {
  pub id: TabId,
  pub target: ObjectRef,
  /// Editable DDL buffer; replaced whenever DDL is (re)loaded.
  pub source_text: String,
  pub focus_line: Option<u32>,
  pub focus_token: u64,
  pub active_kind: DetailKind,
  pub data: DetailSlot<DataGrid>,
  pub ddl: DetailSlot<String>,
  pub metadata: DetailSlot<TabularResult>,
  pub saving: bool,
}

impl ObjectDetailTab {
  pub fn new(target: ObjectRef) -> Self {
    let active_kind = if target.has_data() { DetailKind::Data } else { DetailKind::Ddl };
    Self {
      id: TabId::object(&target),
      target,
      source_text: String::new(),
      focus_line: None,
      focus_token: 0,
      active_kind,
      data: DetailSlot::default(),
      ddl: DetailSlot::default(),
      metadata: DetailSlot::default(),
      saving: false,
    }
  }

  pub fn is_settled(&self, kind: DetailKind) -> bool {
    match kind {
      DetailKind::Data => self.data.is_settled(),
      DetailKind::Ddl => self.ddl.is_settled(),
      DetailKind::Metadata => self.metadata.is_settled(),
    }
  }

  pub fn is_loading_kind(&self, kind: DetailKind) -> bool {
    match kind {
      DetailKind::Data => self.data.loading,
      DetailKind::Ddl => self.ddl.loading,
      DetailKind::Metadata => self.metadata.loading,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.data.loading || self.ddl.loading || self.metadata.loading
  }

  pub fn grid(&self) -> Option<&DataGrid> {
    self.data.value.as_ref()
  }
}

/// Everything a view needs to render the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceState {
  pub session: Option<SessionSummary>,
  pub objects: Vec<ObjectRef>,
  pub objects_loading: bool,
  pub query_tabs: Vec<QueryTab>,
  pub object_tabs: Vec<ObjectDetailTab>,
  pub active_tab: TabId,
  pub search_results: Vec<SchemaSearchHit>,
  pub searching: bool,
  pub status: Option<String>,
  pub last_error: Option<String>,
  pub(super) next_query_tab_number: u64,
  pub(super) next_focus_token: u64,
}

impl Default for WorkspaceState {
  fn default() -> Self {
    Self::new()
  }
}

impl WorkspaceState {
  pub fn new() -> Self {
    Self {
      session: None,
      objects: Vec::new(),
      objects_loading: false,
      query_tabs: vec![QueryTab::new(1)],
      object_tabs: Vec::new(),
      active_tab: TabId::Query(1),
      search_results: Vec::new(),
      searching: false,
      status: None,
      last_error: None,
      next_query_tab_number: 2,
      next_focus_token: 1,
    }
  }
}
