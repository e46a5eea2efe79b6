//! Worksheet and object-detail tab registry.

use super::models::{DetailKind, ObjectDetailTab, QueryTab, TabId, WorkspaceState};
use crate::{
  error::{WorkspaceError, WorkspaceResult},
  sql::ObjectRef,
};

impl WorkspaceState {
  pub fn query_tab(&self, id: u64) -> WorkspaceResult<&QueryTab> {
    self.query_tabs.iter().find(|tab| tab.id == id).ok_or_else(|| WorkspaceError::TabNotFound(TabId::Query(id).to_string()))
  }

  pub fn query_tab_mut(&mut self, id: u64) -> WorkspaceResult<&mut QueryTab> {
    self
      .query_tabs
      .iter_mut()
      .find(|tab| tab.id == id)
      .ok_or_else(|| WorkspaceError::TabNotFound(TabId::Query(id).to_string()))
  }

  pub fn object_tab(&self, id: &TabId) -> WorkspaceResult<&ObjectDetailTab> {
    self.object_tabs.iter().find(|tab| &tab.id == id).ok_or_else(|| WorkspaceError::TabNotFound(id.to_string()))
  }

  pub fn object_tab_mut(&mut self, id: &TabId) -> WorkspaceResult<&mut ObjectDetailTab> {
    self.object_tabs.iter_mut().find(|tab| &tab.id == id).ok_or_else(|| WorkspaceError::TabNotFound(id.to_string()))
  }

  fn contains(&self, id: &TabId) -> bool {
    match id {
      TabId::Query(query_id) => self.query_tabs.iter().any(|tab| tab.id == *query_id),
      TabId::Object(_) => self.object_tabs.iter().any(|tab| &tab.id == id),
    }
  }

  /// Opens "Query N" and makes it active.
  pub fn new_query_tab(&mut self) -> u64 {
    let id = self.next_query_tab_number;
    self.next_query_tab_number += 1;
    self.query_tabs.push(QueryTab::new(id));
    self.active_tab = TabId::Query(id);
    id
  }

  /// Closing the active tab activates its left neighbour, or the new first
  /// tab. The last query tab stays open.
  pub fn close_query_tab(&mut self, id: u64) -> WorkspaceResult<()> {
    let index = self
      .query_tabs
      .iter()
      .position(|tab| tab.id == id)
      .ok_or_else(|| WorkspaceError::TabNotFound(TabId::Query(id).to_string()))?;
    if self.query_tabs.len() == 1 {
      return Err(WorkspaceError::LastQueryTab);
    }

    self.query_tabs.remove(index);
    if self.active_tab == TabId::Query(id) {
      let fallback = &self.query_tabs[index.saturating_sub(1)];
      self.active_tab = TabId::Query(fallback.id);
    }
    Ok(())
  }

  pub fn set_source_text(&mut self, id: u64, text: impl Into<String>) -> WorkspaceResult<()> {
    self.query_tab_mut(id)?.source_text = text.into();
    Ok(())
  }

  /// Opens or reactivates the detail tab for `target`. A target line forces
  /// the DDL view and bumps the focus token so the line is revealed again
  /// even when it did not change.
  pub fn open_object(&mut self, target: &ObjectRef, line: Option<u32>) -> TabId {
    let id = TabId::object(target);
    let index = match self.object_tabs.iter().position(|tab| tab.id == id) {
      Some(index) => index,
      None => {
        self.object_tabs.push(ObjectDetailTab::new(target.normalized()));
        self.object_tabs.len() - 1
      },
    };

    if let Some(line) = line {
      let token = self.next_focus_token;
      self.next_focus_token += 1;
      let tab = &mut self.object_tabs[index];
      tab.active_kind = DetailKind::Ddl;
      tab.focus_line = Some(line);
      tab.focus_token = token;
    }

    self.active_tab = id.clone();
    id
  }

  /// Closing the active detail tab falls back to the nearest remaining detail
  /// tab, else the first query tab.
  pub fn close_object_tab(&mut self, id: &TabId) -> WorkspaceResult<()> {
    let index = self
      .object_tabs
      .iter()
      .position(|tab| &tab.id == id)
      .ok_or_else(|| WorkspaceError::TabNotFound(id.to_string()))?;
    self.object_tabs.remove(index);

    if &self.active_tab == id {
      self.active_tab = match self.object_tabs.get(index.saturating_sub(1)) {
        Some(tab) => tab.id.clone(),
        None => TabId::Query(self.query_tabs[0].id),
      };
    }
    Ok(())
  }

  pub fn activate(&mut self, id: &TabId) -> WorkspaceResult<()> {
    if !self.contains(id) {
      return Err(WorkspaceError::TabNotFound(id.to_string()));
    }
    self.active_tab = id.clone();
    Ok(())
  }

  pub fn set_detail_kind(&mut self, id: &TabId, kind: DetailKind) -> WorkspaceResult<()> {
    let tab = self.object_tab_mut(id)?;
    if kind == DetailKind::Data && !tab.target.has_data() {
      return Err(WorkspaceError::NoData(tab.target.to_string()));
    }
    tab.active_kind = kind;
    Ok(())
  }

  pub fn active_tab(&self) -> &TabId {
    &self.active_tab
  }

  pub fn active_query_tab(&self) -> Option<&QueryTab> {
    match &self.active_tab {
      TabId::Query(id) => self.query_tab(*id).ok(),
      TabId::Object(_) => None,
    }
  }

  pub fn active_object_tab(&self) -> Option<&ObjectDetailTab> {
    match &self.active_tab {
      TabId::Object(_) => self.object_tab(&self.active_tab).ok(),
      TabId::Query(_) => None,
    }
  }
}
