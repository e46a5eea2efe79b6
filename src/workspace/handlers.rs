use std::time::Instant;

use tracing::{debug, info};

use super::{
  grid::{DataGrid, GridError},
  models::{DetailKind, DetailSlot, TabId},
  Workspace,
};
use crate::{
  action::{Action, DetailPayload},
  error::{WorkspaceError, WorkspaceResult},
  sql::{
    assess_all, data_preview_sql, metadata_sql, split_statements, Assessment, ConnectParams, MatchScope, ObjectRef,
    SchemaSearchHit, SearchScopes, SessionSummary,
  },
  workspace::dispatch,
};

/// What happened when a worksheet tab was asked to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
  Started { run_id: u64, statements: usize },
  /// Nothing was run; the batch needs the user's go-ahead first.
  ConfirmationRequired(Assessment),
}

fn elapsed_ms(started: Instant) -> u64 {
  u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl Workspace {
  /// Opens a session, replacing the current one, and starts loading the
  /// object list.
  pub async fn connect(&mut self, params: &ConnectParams) -> WorkspaceResult<SessionSummary> {
    if self.state.session.is_some() {
      self.disconnect().await?;
    }
    let summary = self.gateway.connect(params).await?;
    info!("Connected to {}", summary.display_name);
    self.state.session = Some(summary.clone());
    self.state.status = Some(format!("Connected to {}", summary.display_name));
    self.state.last_error = None;
    self.refresh_objects()?;
    Ok(summary)
  }

  /// Drops the session. Work still in flight for it is discarded when it
  /// reports back, and cached object details are cleared.
  pub async fn disconnect(&mut self) -> WorkspaceResult<()> {
    let session = self.state.session.take().ok_or(WorkspaceError::NotConnected)?;
    for tab in &mut self.state.query_tabs {
      tab.running = false;
    }
    for tab in &mut self.state.object_tabs {
      tab.data = DetailSlot::default();
      tab.ddl = DetailSlot::default();
      tab.metadata = DetailSlot::default();
      tab.saving = false;
    }
    self.state.objects.clear();
    self.state.objects_loading = false;
    self.state.search_results.clear();
    self.state.searching = false;

    self.gateway.disconnect(session.session_id).await?;
    info!("Disconnected from {}", session.display_name);
    self.state.status = Some(format!("Disconnected from {}", session.display_name));
    Ok(())
  }

  pub fn refresh_objects(&mut self) -> WorkspaceResult<()> {
    let session_id = self.session_id()?;
    self.state.objects_loading = true;
    let gateway = self.gateway.clone();
    self.spawn(async move {
      let outcome = gateway.list_objects(session_id).await.map_err(|e| e.to_string());
      Action::ObjectsLoaded { session_id, outcome }
    });
    Ok(())
  }

  /// Splits the tab's text and runs the statements in order, one result pane
  /// each. A batch that needs confirmation is not started unless `confirmed`.
  pub fn execute_tab(&mut self, tab_id: u64, confirmed: bool) -> WorkspaceResult<Execution> {
    let session_id = self.session_id()?;
    let tab = self.state.query_tab(tab_id)?;
    if tab.running {
      return Err(WorkspaceError::RunInProgress(tab.title.clone()));
    }
    let statements = split_statements(&tab.source_text);
    if statements.is_empty() {
      return Err(WorkspaceError::EmptyStatement);
    }

    let assessment = assess_all(&statements);
    if assessment.should_confirm && self.settings.confirm_destructive && !confirmed {
      debug!("Tab {tab_id} needs confirmation: {:?}", assessment.reasons);
      return Ok(Execution::ConfirmationRequired(assessment));
    }
    let allow_destructive = confirmed || !self.settings.confirm_destructive;

    let run_id = self.next_run_id;
    self.next_run_id += 1;
    let count = statements.len();
    let tab = self.state.query_tab_mut(tab_id)?;
    tab.prepare(count);
    tab.run_id = run_id;
    tab.running = true;

    let gateway = self.gateway.clone();
    let tx = self.action_tx.clone();
    let row_limit = self.settings.row_limit;
    debug!("Running {count} statement(s) from tab {tab_id} as run {run_id}");
    self.spawn(async move {
      let mut completed = 0;
      let mut failed = false;
      for (index, sql) in statements.iter().enumerate() {
        let started = Instant::now();
        let outcome =
          gateway.run_statement(session_id, sql, row_limit, allow_destructive).await.map_err(|e| e.to_string());
        failed = outcome.is_err();
        completed += 1;
        let elapsed_ms = elapsed_ms(started);
        dispatch(&tx, Action::StatementFinished { session_id, tab_id, run_id, index, outcome, elapsed_ms }).await;
        if failed {
          break;
        }
      }
      Action::BatchFinished { session_id, tab_id, run_id, completed, failed }
    });

    Ok(Execution::Started { run_id, statements: count })
  }

  pub fn execute_active(&mut self, confirmed: bool) -> WorkspaceResult<Execution> {
    match self.state.active_tab().clone() {
      TabId::Query(id) => self.execute_tab(id, confirmed),
      other => Err(WorkspaceError::TabNotFound(other.to_string())),
    }
  }

  /// Opens (or reactivates) the detail tab for `target` and loads its active
  /// view when connected.
  pub fn open_object(&mut self, target: &ObjectRef, line: Option<u32>) -> WorkspaceResult<TabId> {
    let id = self.state.open_object(target, line);
    if self.state.session.is_some() {
      self.ensure_detail_loaded(&id)?;
    }
    Ok(id)
  }

  /// Name hits open the object's default view; source and DDL hits reveal the
  /// matching line.
  pub fn open_search_hit(&mut self, hit: &SchemaSearchHit) -> WorkspaceResult<TabId> {
    let line = match hit.match_scope {
      MatchScope::ObjectName => None,
      MatchScope::Source | MatchScope::Ddl => hit.line,
    };
    self.open_object(&hit.object(), line)
  }

  pub fn activate(&mut self, id: &TabId) -> WorkspaceResult<()> {
    self.state.activate(id)?;
    if matches!(id, TabId::Object(_)) && self.state.session.is_some() {
      self.ensure_detail_loaded(id)?;
    }
    Ok(())
  }

  pub fn set_detail_kind(&mut self, id: &TabId, kind: DetailKind) -> WorkspaceResult<()> {
    self.state.set_detail_kind(id, kind)?;
    if self.state.session.is_some() {
      self.ensure_detail_loaded(id)?;
    }
    Ok(())
  }

  /// Starts loading the tab's active view unless it is already cached, failed
  /// or in flight. Returns whether a load was started.
  pub fn ensure_detail_loaded(&mut self, id: &TabId) -> WorkspaceResult<bool> {
    self.session_id()?;
    let tab = self.state.object_tab(id)?;
    let kind = tab.active_kind;
    if tab.is_settled(kind) {
      return Ok(false);
    }
    self.load_detail(id, kind)?;
    Ok(true)
  }

  /// Fetches one view of an object tab, replacing whatever is cached. At most
  /// one fetch per kind is in flight.
  pub fn load_detail(&mut self, id: &TabId, kind: DetailKind) -> WorkspaceResult<()> {
    let session = self.state.session.clone().ok_or(WorkspaceError::NotConnected)?;
    let tab = self.state.object_tab_mut(id)?;
    let target = tab.target.clone();
    if tab.is_loading_kind(kind) {
      return Err(WorkspaceError::LoadInProgress(target.to_string(), kind.to_string()));
    }
    match kind {
      DetailKind::Data => {
        if !target.has_data() {
          return Err(WorkspaceError::NoData(target.to_string()));
        }
        if tab.grid().is_some_and(DataGrid::is_committing) {
          return Err(GridError::CommitInProgress.into());
        }
        tab.data.start_loading();
      },
      DetailKind::Ddl => tab.ddl.start_loading(),
      DetailKind::Metadata => tab.metadata.start_loading(),
    }

    let gateway = self.gateway.clone();
    let session_id = session.session_id;
    let row_limit = self.settings.row_limit;
    let tab = id.clone();
    debug!("Loading {kind} for {target}");
    self.spawn(async move {
      let outcome = match kind {
        DetailKind::Data => {
          gateway.run_statement(session_id, &data_preview_sql(&target), row_limit, false).await.map(DetailPayload::Data)
        },
        DetailKind::Ddl => gateway.get_object_ddl(session_id, &target).await.map(DetailPayload::Ddl),
        DetailKind::Metadata => gateway
          .run_statement(session_id, &metadata_sql(session.provider, &target), row_limit, false)
          .await
          .map(DetailPayload::Metadata),
      };
      Action::DetailLoaded { session_id, tab, kind, outcome: outcome.map_err(|e| e.to_string()) }
    });
    Ok(())
  }

  pub fn set_ddl_text(&mut self, id: &TabId, text: impl Into<String>) -> WorkspaceResult<()> {
    self.state.object_tab_mut(id)?.source_text = text.into();
    Ok(())
  }

  /// Sends the tab's DDL buffer back to the database.
  pub fn save_ddl(&mut self, id: &TabId) -> WorkspaceResult<()> {
    let session_id = self.session_id()?;
    let tab = self.state.object_tab_mut(id)?;
    if tab.source_text.trim().is_empty() {
      return Err(WorkspaceError::EmptyDdl);
    }
    tab.saving = true;
    let target = tab.target.clone();
    let ddl = tab.source_text.clone();

    let gateway = self.gateway.clone();
    let tab = id.clone();
    self.spawn(async move {
      let outcome = gateway.update_object_ddl(session_id, &target, &ddl).await.map_err(|e| e.to_string());
      Action::DdlSaved { session_id, tab, ddl, outcome }
    });
    Ok(())
  }

  /// The tab's grid, refused while a data reload is in flight since the
  /// reload replaces its rows.
  fn grid_mut(&mut self, id: &TabId) -> WorkspaceResult<&mut DataGrid> {
    let tab = self.state.object_tab_mut(id)?;
    let name = tab.target.to_string();
    if tab.data.loading {
      return Err(WorkspaceError::LoadInProgress(name, DetailKind::Data.to_string()));
    }
    tab.data.value.as_mut().ok_or(WorkspaceError::DataNotLoaded(name))
  }

  pub fn grid(&self, id: &TabId) -> WorkspaceResult<&DataGrid> {
    let tab = self.state.object_tab(id)?;
    tab.grid().ok_or_else(|| WorkspaceError::DataNotLoaded(tab.target.to_string()))
  }

  pub fn edit_cell(&mut self, id: &TabId, row: usize, column: usize, value: impl Into<String>) -> WorkspaceResult<()> {
    self.grid_mut(id)?.edit_cell(row, column, value)?;
    Ok(())
  }

  pub fn add_row(&mut self, id: &TabId) -> WorkspaceResult<usize> {
    Ok(self.grid_mut(id)?.add_row()?)
  }

  pub fn delete_row(&mut self, id: &TabId, row: usize) -> WorkspaceResult<()> {
    self.grid_mut(id)?.delete_row(row)?;
    Ok(())
  }

  /// Runs one statement per dirty row, in row order, stopping at the first
  /// failure. Returns the number of statements queued.
  pub fn commit_grid(&mut self, id: &TabId) -> WorkspaceResult<usize> {
    let session_id = self.session_id()?;
    let plan = self.grid_mut(id)?.begin_commit()?;
    let assessment = assess_all(&plan.iter().map(|change| change.sql.as_str()).collect::<Vec<_>>());
    debug!("Committing {} change(s) to {id}: {:?}", plan.len(), assessment.reasons);

    let count = plan.len();
    let gateway = self.gateway.clone();
    let tab = id.clone();
    self.spawn(async move {
      let mut applied = Vec::with_capacity(plan.len());
      let mut failure = None;
      for change in plan {
        match gateway.run_statement(session_id, &change.sql, 1, true).await {
          Ok(_) => applied.push(change),
          Err(e) => {
            failure = Some(format!("Row {}: {e}", change.row + 1));
            break;
          },
        }
      }
      Action::CommitFinished { session_id, tab, applied, failure }
    });
    Ok(count)
  }

  /// Drops every draft change. Rows saved by a partial commit are only
  /// visible after a reload, so those grids are fetched again instead.
  pub fn revert_grid(&mut self, id: &TabId) -> WorkspaceResult<()> {
    let grid = self.grid_mut(id)?;
    if grid.is_committing() {
      return Err(GridError::CommitInProgress.into());
    }
    if grid.needs_reload() {
      return self.load_detail(id, DetailKind::Data);
    }
    grid.revert();
    Ok(())
  }

  pub fn search(&mut self, term: &str, scopes: SearchScopes) -> WorkspaceResult<()> {
    let term = term.trim().to_string();
    if term.is_empty() {
      return Err(WorkspaceError::EmptySearchTerm);
    }
    if !scopes.any() {
      return Err(WorkspaceError::NoSearchScope);
    }
    let session_id = self.session_id()?;
    self.state.searching = true;

    let gateway = self.gateway.clone();
    let limit = self.settings.search_limit;
    self.spawn(async move {
      let outcome = gateway.search_schema(session_id, &term, scopes, limit).await.map_err(|e| e.to_string());
      Action::SearchFinished { session_id, outcome }
    });
    Ok(())
  }
}
