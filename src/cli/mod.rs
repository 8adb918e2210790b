// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for corpus preparation.
//!
//! This module contains the command-line interface logic, including argument parsing,
//! console logging, and the `prepare` command implementation.

// Modules
/// CLI arguments.
pub mod args;

/// Console logging macros and verbosity control.
pub mod logging;

/// Corpus preparation logic.
pub mod prepare;
