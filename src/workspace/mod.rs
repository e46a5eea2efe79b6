//! The workspace execution engine: tabs, result panes and the data grid,
//! driven by gateway tasks that report back over an action channel.

pub mod grid;
mod handlers;
pub mod models;
mod panes;
mod state;
mod tabs;

use std::{future::Future, sync::Arc};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

pub use self::{
  grid::{ChangeKind, DataGrid, GridError, RowChange},
  handlers::Execution,
  models::{DetailKind, DetailSlot, ObjectDetailTab, PaneId, QueryTab, ResultPane, TabId, WorkspaceState},
};
use crate::{
  action::Action,
  config::WorkspaceSettings,
  error::{WorkspaceError, WorkspaceResult},
  sql::{SessionGateway, SessionId},
};

pub async fn dispatch(tx: &UnboundedSender<Action>, action: Action) {
  if let Err(e) = tx.send(action) {
    warn!("Error dispatching: {e:?}");
  }
}

/// Owns the workspace state and the only path by which it changes: user
/// operations on this type, and gateway responses fed through [`update`].
///
/// [`update`]: Workspace::update
pub struct Workspace {
  pub state: WorkspaceState,
  gateway: Arc<dyn SessionGateway>,
  settings: WorkspaceSettings,
  action_tx: UnboundedSender<Action>,
  action_rx: UnboundedReceiver<Action>,
  in_flight: usize,
  next_run_id: u64,
}

impl Workspace {
  pub fn new(gateway: Arc<dyn SessionGateway>, settings: WorkspaceSettings) -> Self {
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    Self {
      state: WorkspaceState::new(),
      gateway,
      settings,
      action_tx,
      action_rx,
      in_flight: 0,
      next_run_id: 1,
    }
  }

  pub fn settings(&self) -> &WorkspaceSettings {
    &self.settings
  }

  /// Sender for actions raised outside the workspace, such as status lines.
  pub fn action_sender(&self) -> UnboundedSender<Action> {
    self.action_tx.clone()
  }

  pub fn session_id(&self) -> WorkspaceResult<SessionId> {
    self.state.session.as_ref().map(|session| session.session_id).ok_or(WorkspaceError::NotConnected)
  }

  /// Number of gateway tasks whose final action has not been applied yet.
  pub fn in_flight(&self) -> usize {
    self.in_flight
  }

  fn spawn<F>(&mut self, task: F)
  where
    F: Future<Output = Action> + Send + 'static,
  {
    self.in_flight += 1;
    let tx = self.action_tx.clone();
    tokio::spawn(async move {
      let action = task.await;
      dispatch(&tx, action).await;
    });
  }

  /// Applies the next queued action, waiting for one if none is queued.
  pub async fn next(&mut self) -> Option<Action> {
    let action = self.action_rx.recv().await?;
    debug!("Applying {action}");
    self.update(action.clone());
    Some(action)
  }

  /// Applies actions until every spawned task has reported back and the queue
  /// is empty.
  pub async fn settle(&mut self) {
    while self.in_flight > 0 {
      if self.next().await.is_none() {
        break;
      }
    }
    while let Ok(action) = self.action_rx.try_recv() {
      self.update(action);
    }
  }
}
