//! One result pane per statement of a tab's latest run.

use super::models::{PaneId, QueryTab, ResultPane};
use crate::sql::TabularResult;

impl QueryTab {
  /// Replaces the panes with `max(1, statement_count)` empty ones. Pane
  /// numbers keep counting up across runs, so titles never repeat.
  pub fn prepare(&mut self, statement_count: usize) {
    let count = statement_count.max(1);
    self.result_panes = (0..count)
      .map(|_| {
        let pane = ResultPane::new(self.next_pane_number);
        self.next_pane_number += 1;
        pane
      })
      .collect();
    self.active_result_pane_id = self.result_panes[0].id;
  }

  /// Fills the pane at `index`. A failure also becomes the active pane.
  /// Returns false when the index is outside the current pane set.
  pub fn write(&mut self, index: usize, outcome: Result<TabularResult, String>, elapsed_ms: Option<u64>) -> bool {
    let Some(pane) = self.result_panes.get_mut(index) else {
      return false;
    };
    pane.elapsed_ms = elapsed_ms;
    match outcome {
      Ok(result) => {
        pane.result = Some(result);
        pane.error_message = None;
      },
      Err(message) => {
        pane.result = None;
        pane.error_message = Some(message);
        self.active_result_pane_id = pane.id;
      },
    }
    true
  }

  /// Ignores ids from earlier runs.
  pub fn activate_pane(&mut self, pane_id: PaneId) -> bool {
    if self.result_panes.iter().any(|pane| pane.id == pane_id) {
      self.active_result_pane_id = pane_id;
      true
    } else {
      false
    }
  }

  pub fn active_pane(&self) -> Option<&ResultPane> {
    self.result_panes.iter().find(|pane| pane.id == self.active_result_pane_id)
  }
}
