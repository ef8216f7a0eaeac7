//! Command-line interface for seo-report
//!
//! This module implements the CLI commands on top of the pipeline and the report store. It
//! handles argument parsing, configuration management, and logging setup.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **run**: Take the run lock, replay a captured dashboard session through the
//!   orchestrator, and print a per-metric summary
//! - **merge**: Append the rows of one workbook's sheet to a sheet of another workbook
//! - **init**: Generate a default configuration file
//! - **validate**: Check configuration file syntax and consistency
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. Output goes through the [`Host`] trait so commands can be
//! exercised in tests without touching the real process streams.
//!
//! Configuration is managed through a TOML file with `[report]`, `[dashboard]` and
//! `[exports]` sections; when no file is present the embedded defaults are used.

mod collect;
mod common;
mod config;
mod host;
mod init;
mod merge;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use collect::{RunArgs, collect_metrics};
pub use common::LogLevel;
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use merge::{MergeArgs, merge_sheet};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
