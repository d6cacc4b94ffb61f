//! `pw` command-line front end for the locator engine.
//!
//! Loads an HTML file into a static document and runs `parse`, `query` or
//! `generate` against it, printing a [`output::CommandResult`] envelope.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
