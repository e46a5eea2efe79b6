use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{sql::SearchScopes, utils::version};

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
  #[arg(short('f'), long = "database", value_name = "FILE", help = "SQLite database file to open")]
  pub database: PathBuf,

  #[arg(long, help = "Print results as JSON instead of text tables")]
  pub json: bool,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Run a worksheet: every statement in order, stopping at the first failure
  Run {
    #[arg(value_name = "SCRIPT", help = "File holding the worksheet text", conflicts_with = "execute")]
    script: Option<PathBuf>,

    #[arg(short('e'), long, value_name = "SQL", help = "Worksheet text given inline")]
    execute: Option<String>,

    #[arg(short('y'), long, help = "Run write/DDL statements without asking")]
    yes: bool,
  },
  /// List the objects of the connected schema
  Objects,
  /// Print the DDL of one object
  Ddl {
    #[arg(value_name = "TYPE", help = "Object type, e.g. TABLE or VIEW")]
    object_type: String,

    #[arg(value_name = "NAME")]
    name: String,
  },
  /// Print the first rows of a table or view
  Preview {
    #[arg(value_name = "NAME")]
    name: String,

    #[arg(long, value_name = "TYPE", default_value = "TABLE")]
    object_type: String,
  },
  /// Search object names, source and DDL
  Search {
    #[arg(value_name = "TERM")]
    term: String,

    #[arg(long, help = "Skip object names")]
    no_names: bool,

    #[arg(long, help = "Skip stored source")]
    no_source: bool,

    #[arg(long, help = "Skip DDL")]
    no_ddl: bool,

    #[arg(short('l'), long, value_name = "N", help = "Maximum number of hits")]
    limit: Option<u32>,
  },
}

impl Command {
  /// Search scopes selected by the `--no-*` flags; `None` for other commands.
  pub fn search_scopes(&self) -> Option<SearchScopes> {
    match self {
      Command::Search { no_names, no_source, no_ddl, .. } => {
        Some(SearchScopes { object_names: !no_names, source: !no_source, ddl: !no_ddl })
      },
      _ => None,
    }
  }
}
