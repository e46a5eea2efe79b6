//! Editable data grid over a table preview.
//!
//! The snapshot keeps the hidden row-identity column; drafts hold only the
//! visible columns. Dirtiness is always derived by comparing a draft row with
//! the snapshot row at the same index.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sql::{
  quote::{qualified_name, quote_identifier, quote_literal},
  ObjectRef, TabularResult, ROW_IDENTITY_COLUMN,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
  #[error("{0} is read-only: its preview carries no row identity")]
  ReadOnly(String),

  #[error("Row {0} is out of range")]
  RowOutOfRange(usize),

  #[error("Column {0} is out of range")]
  ColumnOutOfRange(usize),

  #[error("Row {row} has {found} value(s), expected {expected}")]
  ShapeMismatch { row: usize, expected: usize, found: usize },

  #[error("Row {0} was already saved; reload the data to edit it again")]
  RowSaved(usize),

  #[error("A commit is already in progress")]
  CommitInProgress,

  #[error("No changes to commit")]
  NothingToCommit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
  Update,
  Insert,
  Delete,
}

/// One statement of a commit plan, tied to the draft row it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowChange {
  pub row: usize,
  pub kind: ChangeKind,
  pub sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataGrid {
  target: ObjectRef,
  snapshot: TabularResult,
  editable: bool,
  drafts: Vec<Vec<String>>,
  deleted: BTreeSet<usize>,
  /// Inserted or deleted rows whose statements already ran. They stay
  /// read-only until the next reload assigns real identities.
  saved: BTreeSet<usize>,
  committing: bool,
}

fn is_blank(value: &str) -> bool {
  value.trim().is_empty()
}

fn has_identity_column(snapshot: &TabularResult) -> bool {
  snapshot.columns.first().is_some_and(|column| column.eq_ignore_ascii_case(ROW_IDENTITY_COLUMN))
}

/// SQLite row ids are integers; every other locator is compared as text.
fn identity_literal(identity: &str) -> String {
  if identity.parse::<i64>().is_ok() {
    identity.to_string()
  } else {
    quote_literal(identity)
  }
}

impl DataGrid {
  pub fn new(target: ObjectRef, snapshot: TabularResult) -> Self {
    let mut grid = Self {
      target,
      snapshot: TabularResult::default(),
      editable: false,
      drafts: Vec::new(),
      deleted: BTreeSet::new(),
      saved: BTreeSet::new(),
      committing: false,
    };
    grid.load_snapshot(snapshot);
    grid
  }

  /// Replaces the baseline and every draft row.
  pub fn load_snapshot(&mut self, snapshot: TabularResult) {
    self.editable = self.target.is_editable_type() && has_identity_column(&snapshot);
    self.drafts = if self.editable {
      snapshot.rows.iter().map(|row| row.iter().skip(1).cloned().collect()).collect()
    } else {
      Vec::new()
    };
    self.snapshot = snapshot;
    self.deleted.clear();
    self.saved.clear();
    self.committing = false;
  }

  pub fn target(&self) -> &ObjectRef {
    &self.target
  }

  pub fn snapshot(&self) -> &TabularResult {
    &self.snapshot
  }

  pub fn is_editable(&self) -> bool {
    self.editable
  }

  pub fn is_committing(&self) -> bool {
    self.committing
  }

  fn identity_offset(&self) -> usize {
    usize::from(has_identity_column(&self.snapshot))
  }

  /// Visible column names, identity column stripped.
  pub fn columns(&self) -> &[String] {
    &self.snapshot.columns[self.identity_offset().min(self.snapshot.columns.len())..]
  }

  /// Rows as displayed: drafts when editable, otherwise the snapshot without
  /// the identity column.
  pub fn rows(&self) -> Vec<Vec<String>> {
    if self.editable {
      return self.drafts.clone();
    }
    let offset = self.identity_offset();
    self.snapshot.rows.iter().map(|row| row.iter().skip(offset).cloned().collect()).collect()
  }

  pub fn row_count(&self) -> usize {
    if self.editable {
      self.drafts.len()
    } else {
      self.snapshot.rows.len()
    }
  }

  fn ensure_editable(&self) -> Result<(), GridError> {
    if !self.editable {
      return Err(GridError::ReadOnly(self.target.to_string()));
    }
    if self.committing {
      return Err(GridError::CommitInProgress);
    }
    Ok(())
  }

  fn ensure_row_editable(&self, row: usize) -> Result<(), GridError> {
    self.ensure_editable()?;
    if row >= self.drafts.len() {
      return Err(GridError::RowOutOfRange(row));
    }
    if self.saved.contains(&row) {
      return Err(GridError::RowSaved(row));
    }
    Ok(())
  }

  pub fn edit_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<(), GridError> {
    self.ensure_row_editable(row)?;
    let width = self.columns().len();
    let draft = &mut self.drafts[row];
    if column >= width {
      return Err(GridError::ColumnOutOfRange(column));
    }
    if draft.len() < width {
      draft.resize(width, String::new());
    }
    draft[column] = value.into();
    Ok(())
  }

  /// Appends a blank draft row and returns its index.
  pub fn add_row(&mut self) -> Result<usize, GridError> {
    self.ensure_editable()?;
    self.drafts.push(vec![String::new(); self.columns().len()]);
    Ok(self.drafts.len() - 1)
  }

  /// Marks an existing row for deletion, or drops a row that was never saved.
  pub fn delete_row(&mut self, row: usize) -> Result<(), GridError> {
    self.ensure_row_editable(row)?;
    if row >= self.snapshot.rows.len() {
      self.drafts.remove(row);
      self.saved = self.saved.iter().map(|&saved| if saved > row { saved - 1 } else { saved }).collect();
    } else {
      self.deleted.insert(row);
    }
    Ok(())
  }

  pub fn is_deleted(&self, row: usize) -> bool {
    self.deleted.contains(&row)
  }

  pub fn is_dirty(&self, row: usize) -> bool {
    if !self.editable || self.saved.contains(&row) {
      return false;
    }
    let Some(draft) = self.drafts.get(row) else {
      return false;
    };
    if self.deleted.contains(&row) {
      return true;
    }
    match self.snapshot.rows.get(row) {
      None => draft.iter().any(|value| !is_blank(value)),
      Some(original) => {
        let original = &original[self.identity_offset().min(original.len())..];
        original.len() != draft.len() || original.iter().zip(draft).any(|(before, after)| before != after)
      },
    }
  }

  pub fn dirty_rows(&self) -> Vec<usize> {
    (0..self.drafts.len()).filter(|&row| self.is_dirty(row)).collect()
  }

  pub fn has_changes(&self) -> bool {
    (0..self.drafts.len()).any(|row| self.is_dirty(row))
  }

  /// Rows whose inserts or deletes ran and need a reload to become editable.
  pub fn needs_reload(&self) -> bool {
    !self.saved.is_empty()
  }

  fn validate_shape(&self) -> Result<(), GridError> {
    let width = self.snapshot.columns.len();
    for (row, values) in self.snapshot.rows.iter().enumerate() {
      if values.len() != width {
        return Err(GridError::ShapeMismatch { row, expected: width, found: values.len() });
      }
    }
    let visible = width.saturating_sub(1);
    for (row, values) in self.drafts.iter().enumerate() {
      if values.len() != visible {
        return Err(GridError::ShapeMismatch { row, expected: visible, found: values.len() });
      }
    }
    Ok(())
  }

  /// One statement per dirty row, ascending. All-blank new rows produce
  /// nothing.
  pub fn build_commit_plan(&self) -> Result<Vec<RowChange>, GridError> {
    self.ensure_editable()?;
    self.validate_shape()?;

    let table = qualified_name(&self.target);
    let columns = self.columns();
    let mut plan = Vec::new();

    for row in self.dirty_rows() {
      let draft = &self.drafts[row];
      if let Some(original) = self.snapshot.rows.get(row) {
        let identity = identity_literal(&original[0]);
        if self.deleted.contains(&row) {
          plan.push(RowChange {
            row,
            kind: ChangeKind::Delete,
            sql: format!("DELETE FROM {table} WHERE ROWID = {identity}"),
          });
          continue;
        }

        let assignments: Vec<String> = original[1..]
          .iter()
          .zip(draft)
          .zip(columns)
          .filter(|((before, after), _)| before != after)
          .map(|((_, after), column)| {
            let value = if is_blank(after) { "NULL".to_string() } else { quote_literal(after) };
            format!("{} = {value}", quote_identifier(column))
          })
          .collect();
        if assignments.is_empty() {
          continue;
        }
        plan.push(RowChange {
          row,
          kind: ChangeKind::Update,
          sql: format!("UPDATE {table} SET {} WHERE ROWID = {identity}", assignments.join(", ")),
        });
      } else {
        let (names, values): (Vec<String>, Vec<String>) = columns
          .iter()
          .zip(draft)
          .filter(|(_, value)| !is_blank(value))
          .map(|(column, value)| (quote_identifier(column), quote_literal(value)))
          .unzip();
        if names.is_empty() {
          continue;
        }
        plan.push(RowChange {
          row,
          kind: ChangeKind::Insert,
          sql: format!("INSERT INTO {table} ({}) VALUES ({})", names.join(", "), values.join(", ")),
        });
      }
    }

    Ok(plan)
  }

  /// Builds the plan and raises the re-entrancy guard.
  pub fn begin_commit(&mut self) -> Result<Vec<RowChange>, GridError> {
    let plan = self.build_commit_plan()?;
    if plan.is_empty() {
      return Err(GridError::NothingToCommit);
    }
    self.committing = true;
    Ok(plan)
  }

  /// Applies the outcome of a commit: `applied` ran successfully, in order.
  /// Returns true when the snapshot must be reloaded from the database.
  pub fn finish_commit(&mut self, applied: &[RowChange], failed: bool) -> bool {
    self.committing = false;
    for change in applied {
      match change.kind {
        ChangeKind::Update => {
          if let (Some(original), Some(draft)) = (self.snapshot.rows.get_mut(change.row), self.drafts.get(change.row)) {
            original.truncate(1);
            original.extend(draft.iter().cloned());
          }
        },
        ChangeKind::Insert | ChangeKind::Delete => {
          self.saved.insert(change.row);
        },
      }
    }
    !failed && self.needs_reload()
  }

  /// Discards every draft change and restores the last loaded snapshot.
  pub fn revert(&mut self) {
    let snapshot = std::mem::take(&mut self.snapshot);
    self.load_snapshot(snapshot);
  }
}
