use std::{fmt::Write as _, path::Path, sync::Arc};

use color_eyre::eyre::{eyre, Result, WrapErr};
use dialoguer::Confirm;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  cli::{Cli, Command},
  config::{Config, WorkspaceSettings},
  sql::{sqlite::SqliteGateway, Assessment, ConnectParams, ObjectRef, SearchScopes, TabularResult},
  workspace::{DetailKind, Execution, ResultPane, TabId, Workspace},
};

/// Runs one command against a SQLite file through the workspace engine.
pub struct App {
  workspace: Workspace,
  json: bool,
}

impl App {
  pub async fn new(cli: &Cli) -> Result<Self> {
    let config = Config::new()?;
    debug!("Config: {config:?}");
    let mut settings = config.workspace;
    if let Command::Search { limit: Some(limit), .. } = &cli.command {
      settings.search_limit = *limit;
    }
    Self::open(&cli.database, settings, cli.json).await
  }

  /// Connects to `database` and waits for the object list.
  pub async fn open(database: &Path, settings: WorkspaceSettings, json: bool) -> Result<Self> {
    let mut workspace = Workspace::new(Arc::new(SqliteGateway::new()), settings);
    workspace.connect(&ConnectParams::sqlite(database)).await?;
    workspace.settle().await;
    if let Some(error) = workspace.state.last_error.take() {
      return Err(eyre!(error));
    }
    Ok(Self { workspace, json })
  }

  pub fn workspace(&self) -> &Workspace {
    &self.workspace
  }

  pub async fn run(&mut self, command: Command) -> Result<()> {
    let output = self.execute(command).await;
    if let Err(e) = self.workspace.disconnect().await {
      warn!("Error disconnecting: {e}");
    }
    print!("{}", output?);
    match self.workspace.state.last_error.take() {
      Some(error) => Err(eyre!(error)),
      None => Ok(()),
    }
  }

  /// Runs `command` and renders what it produced. Statement failures are part
  /// of the output and also left in `last_error`.
  pub async fn execute(&mut self, command: Command) -> Result<String> {
    let scopes = command.search_scopes().unwrap_or_default();
    match command {
      Command::Run { script, execute, yes } => {
        let text = match (script, execute) {
          (Some(path), _) => {
            std::fs::read_to_string(&path).wrap_err_with(|| format!("Could not read {}", path.display()))?
          },
          (None, Some(text)) => text,
          (None, None) => return Err(eyre!("Provide a script file or --execute text")),
        };
        self.run_worksheet(text, yes).await
      },
      Command::Objects => {
        let objects = &self.workspace.state.objects;
        if self.json {
          return to_json(objects);
        }
        let rows = objects.iter().map(|o| vec![o.normalized_type(), o.schema.clone(), o.object_name.clone()]).collect();
        Ok(render_table(&TabularResult::rows(
          vec!["TYPE".into(), "SCHEMA".into(), "NAME".into()],
          rows,
          format!("{} object(s)", objects.len()),
        )))
      },
      Command::Ddl { object_type, name } => {
        let target = self.target(&object_type, &name)?;
        self.show_ddl(&target).await
      },
      Command::Preview { name, object_type } => {
        let target = self.target(&object_type, &name)?;
        self.preview(&target).await
      },
      Command::Search { term, .. } => self.search(&term, scopes).await,
    }
  }

  fn target(&self, object_type: &str, name: &str) -> Result<ObjectRef> {
    let session = self.workspace.state.session.as_ref().ok_or_else(|| eyre!("Not connected"))?;
    Ok(ObjectRef::new(&session.schema, object_type, name).normalized())
  }

  async fn run_worksheet(&mut self, text: String, yes: bool) -> Result<String> {
    let tab_id = self.workspace.state.new_query_tab();
    self.workspace.state.set_source_text(tab_id, text)?;
    match self.workspace.execute_tab(tab_id, yes)? {
      Execution::Started { run_id, statements } => debug!("Run {run_id} started with {statements} statement(s)"),
      Execution::ConfirmationRequired(assessment) => {
        if !confirm(&assessment)? {
          info!("Execution cancelled");
          return Ok("Execution cancelled.\n".to_string());
        }
        self.workspace.execute_tab(tab_id, true)?;
      },
    }
    self.workspace.settle().await;

    let tab = self.workspace.state.query_tab(tab_id)?;
    if self.json {
      return to_json(&tab.result_panes);
    }
    let mut output = String::new();
    for pane in tab.result_panes.iter().filter(|pane| !pane.is_empty()) {
      output.push_str(&render_pane(pane));
    }
    if let Some(status) = &self.workspace.state.status {
      let _ = writeln!(output, "{status}");
    }
    Ok(output)
  }

  async fn show_ddl(&mut self, target: &ObjectRef) -> Result<String> {
    let id = self.workspace.state.open_object(target, None);
    self.workspace.set_detail_kind(&id, DetailKind::Ddl)?;
    self.workspace.settle().await;

    let tab = self.workspace.state.object_tab(&id)?;
    if let Some(error) = &tab.ddl.error {
      return Err(eyre!(error.clone()));
    }
    if self.json {
      return to_json(&tab.source_text);
    }
    Ok(format!("{}\n", tab.source_text.trim_end()))
  }

  async fn preview(&mut self, target: &ObjectRef) -> Result<String> {
    let id: TabId = self.workspace.state.open_object(target, None);
    self.workspace.set_detail_kind(&id, DetailKind::Data)?;
    self.workspace.settle().await;

    let tab = self.workspace.state.object_tab(&id)?;
    if let Some(error) = &tab.data.error {
      return Err(eyre!(error.clone()));
    }
    let grid = self.workspace.grid(&id)?;
    let view = TabularResult::rows(grid.columns().to_vec(), grid.rows(), grid.snapshot().message.clone());
    if self.json {
      return to_json(&view);
    }
    Ok(render_table(&view))
  }

  async fn search(&mut self, term: &str, scopes: SearchScopes) -> Result<String> {
    debug!("Searching {term:?} with limit {}", self.workspace.settings().search_limit);
    self.workspace.search(term, scopes)?;
    self.workspace.settle().await;
    if let Some(error) = self.workspace.state.last_error.take() {
      return Err(eyre!(error));
    }

    let hits = &self.workspace.state.search_results;
    if self.json {
      return to_json(hits);
    }
    let rows = hits
      .iter()
      .map(|hit| {
        vec![
          hit.match_scope.to_string(),
          hit.object_type.clone(),
          format!("{}.{}", hit.schema, hit.object_name),
          hit.line.map(|line| line.to_string()).unwrap_or_default(),
          hit.snippet.clone(),
        ]
      })
      .collect();
    Ok(render_table(&TabularResult::rows(
      vec!["SCOPE".into(), "TYPE".into(), "OBJECT".into(), "LINE".into(), "SNIPPET".into()],
      rows,
      format!("{} match(es)", hits.len()),
    )))
  }
}

fn confirm(assessment: &Assessment) -> Result<bool> {
  let prompt = format!("This worksheet contains {}. Run it anyway?", assessment.reasons.join(", "));
  Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

fn render_pane(pane: &ResultPane) -> String {
  let mut output = match pane.elapsed_ms {
    Some(ms) => format!("-- {} ({ms} ms)\n", pane.title),
    None => format!("-- {}\n", pane.title),
  };
  if let Some(error) = &pane.error_message {
    let _ = writeln!(output, "Error: {error}");
  }
  if let Some(result) = &pane.result {
    output.push_str(&render_table(result));
  }
  output
}

/// Plain text table followed by the result message. Results without a row
/// set print the message alone.
pub fn render_table(result: &TabularResult) -> String {
  let mut output = String::new();
  if result.is_row_set() && !result.columns.is_empty() {
    let mut widths: Vec<usize> = result.columns.iter().map(|column| column.chars().count()).collect();
    for row in &result.rows {
      for (width, cell) in widths.iter_mut().zip(row) {
        *width = (*width).max(cell.chars().count());
      }
    }

    let line = |cells: &[String]| {
      let padded: Vec<String> =
        widths.iter().zip(cells).map(|(width, cell)| format!("{cell:<width$}", width = *width)).collect();
      padded.join(" | ").trim_end().to_string()
    };
    let _ = writeln!(output, "{}", line(&result.columns));
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let _ = writeln!(output, "{}", rule.join("-+-"));
    for row in &result.rows {
      let _ = writeln!(output, "{}", line(row));
    }
  }
  if !result.message.is_empty() {
    let _ = writeln!(output, "{}", result.message);
  }
  output
}
