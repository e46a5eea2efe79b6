use tracing::{info, warn};

use super::{grid::DataGrid, models::DetailKind, Workspace};
use crate::action::{Action, DetailPayload};

impl Workspace {
  /// Applies one gateway response. Responses for another session, a closed
  /// tab or a superseded run are dropped.
  pub fn update(&mut self, action: Action) {
    if action.ends_task() {
      self.in_flight = self.in_flight.saturating_sub(1);
    }
    if let Some(session_id) = action.session_id() {
      let active = self.state.session.as_ref().map(|session| session.session_id);
      if active != Some(session_id) {
        warn!("Discarding {action} for inactive session {session_id}");
        return;
      }
    }

    match action {
      Action::ObjectsLoaded { outcome, .. } => {
        self.state.objects_loading = false;
        match outcome {
          Ok(objects) => {
            self.state.status = Some(format!("Loaded {} object(s)", objects.len()));
            self.state.objects = objects;
          },
          Err(message) => self.state.last_error = Some(message),
        }
      },
      Action::StatementFinished { tab_id, run_id, index, outcome, elapsed_ms, .. } => {
        let Ok(tab) = self.state.query_tab_mut(tab_id) else {
          warn!("Discarding statement result for closed tab {tab_id}");
          return;
        };
        if tab.run_id != run_id {
          warn!("Discarding statement result from superseded run {run_id} of tab {tab_id}");
          return;
        }
        let error = outcome.as_ref().err().cloned();
        tab.write(index, outcome, Some(elapsed_ms));
        if let Some(message) = error {
          self.state.last_error = Some(message);
        }
      },
      Action::BatchFinished { tab_id, run_id, completed, failed, .. } => {
        let Ok(tab) = self.state.query_tab_mut(tab_id) else {
          return;
        };
        if tab.run_id != run_id {
          return;
        }
        tab.running = false;
        self.state.status = Some(if failed {
          format!("Execution stopped at statement {completed}")
        } else {
          format!("Executed {completed} statement(s)")
        });
      },
      Action::DetailLoaded { tab, kind, outcome, .. } => {
        let Ok(detail) = self.state.object_tab_mut(&tab) else {
          warn!("Discarding {kind} for closed tab {tab}");
          return;
        };
        match (kind, outcome) {
          (DetailKind::Data, Ok(DetailPayload::Data(result))) => {
            detail.data.loading = false;
            match detail.data.value.as_mut() {
              Some(grid) if grid.is_committing() => {
                warn!("Discarding data for {tab} while a commit is in flight");
                return;
              },
              Some(grid) => grid.load_snapshot(result),
              None => detail.data.value = Some(DataGrid::new(detail.target.clone(), result)),
            }
            detail.data.error = None;
          },
          (DetailKind::Ddl, Ok(DetailPayload::Ddl(ddl))) => {
            detail.source_text = ddl.clone();
            detail.ddl.finish(Ok(ddl));
          },
          (DetailKind::Metadata, Ok(DetailPayload::Metadata(result))) => detail.metadata.finish(Ok(result)),
          (kind, Ok(_)) => warn!("Mismatched {kind} payload for tab {tab}"),
          (DetailKind::Data, Err(message)) => detail.data.finish(Err(message)),
          (DetailKind::Ddl, Err(message)) => detail.ddl.finish(Err(message)),
          (DetailKind::Metadata, Err(message)) => detail.metadata.finish(Err(message)),
        }
      },
      Action::DdlSaved { tab, ddl, outcome, .. } => {
        let Ok(detail) = self.state.object_tab_mut(&tab) else {
          return;
        };
        detail.saving = false;
        match outcome {
          Ok(message) => {
            detail.ddl.value = Some(ddl);
            info!("{message}");
            self.state.status = Some(message);
            if let Err(e) = self.refresh_objects() {
              warn!("Could not refresh objects: {e}");
            }
          },
          Err(message) => self.state.last_error = Some(message),
        }
      },
      Action::CommitFinished { tab, applied, failure, .. } => {
        let Some(grid) = self.state.object_tab_mut(&tab).ok().and_then(|detail| detail.data.value.as_mut()) else {
          warn!("Discarding commit result for tab {tab}");
          return;
        };
        let reload = grid.finish_commit(&applied, failure.is_some());
        match failure {
          Some(message) => {
            self.state.status = Some(format!("Committed {} change(s) before failing", applied.len()));
            self.state.last_error = Some(message);
          },
          None => {
            info!("Committed {} change(s) to {tab}", applied.len());
            self.state.status = Some(format!("Committed {} change(s)", applied.len()));
          },
        }
        if reload {
          if let Err(e) = self.load_detail(&tab, DetailKind::Data) {
            warn!("Could not reload {tab}: {e}");
          }
        }
      },
      Action::SearchFinished { outcome, .. } => {
        self.state.searching = false;
        match outcome {
          Ok(hits) => {
            self.state.status = Some(format!("Found {} match(es)", hits.len()));
            self.state.search_results = hits;
          },
          Err(message) => self.state.last_error = Some(message),
        }
      },
      Action::Status(message) => self.state.status = Some(message),
      Action::Error(message) => self.state.last_error = Some(message),
    }
  }
}
