//! Command-line front end for roster synchronisation.
//!
//! Loads the source snapshot, runs the reconciler against the destination,
//! then writes the exports and sends (or prints) the run summary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod summary;
pub mod types;
