pub mod action;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod sql;
pub mod utils;
pub mod workspace;
