use std::path::Path;

use color_eyre::eyre::Result;
use serde::Deserialize;
use tracing::warn;

use crate::{
  sql::{DEFAULT_ROW_LIMIT, DEFAULT_SEARCH_LIMIT},
  utils::get_config_dir,
};

const CONFIG: &str = include_str!("../.config/config.json5");

/// Tunables for the workspace engine.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkspaceSettings {
  pub row_limit: u32,
  pub search_limit: u32,
  pub confirm_destructive: bool,
}

impl Default for WorkspaceSettings {
  fn default() -> Self {
    Self { row_limit: DEFAULT_ROW_LIMIT, search_limit: DEFAULT_SEARCH_LIMIT, confirm_destructive: true }
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub workspace: WorkspaceSettings,
}

impl Config {
  pub fn new() -> Result<Self> {
    Self::load(&get_config_dir())
  }

  /// Embedded defaults overlaid with whichever `config.*` files exist in
  /// `config_dir`.
  pub fn load(config_dir: &Path) -> Result<Self> {
    let defaults: Config = json5::from_str(CONFIG)?;
    let mut builder = config::Config::builder()
      .set_default("workspace.row_limit", i64::from(defaults.workspace.row_limit))?
      .set_default("workspace.search_limit", i64::from(defaults.workspace.search_limit))?
      .set_default("workspace.confirm_destructive", defaults.workspace.confirm_destructive)?;

    let config_files = [
      ("config.json5", config::FileFormat::Json5),
      ("config.json", config::FileFormat::Json),
      ("config.yaml", config::FileFormat::Yaml),
      ("config.toml", config::FileFormat::Toml),
      ("config.ini", config::FileFormat::Ini),
    ];
    let mut found_config = false;
    for (file, format) in &config_files {
      builder = builder.add_source(config::File::from(config_dir.join(file)).format(*format).required(false));
      if config_dir.join(file).exists() {
        found_config = true
      }
    }
    if !found_config {
      warn!("No configuration file found in {}, using defaults", config_dir.display());
    }

    let cfg: Self = builder.build()?.try_deserialize()?;
    Ok(cfg)
  }
}
