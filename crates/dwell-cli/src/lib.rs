//! dwell CLI library.
//!
//! This crate provides the tracking daemon and the CLI interface for dwell.

mod cli;
pub mod commands;
mod config;
pub mod event;

pub use cli::{Cli, Commands};
pub use config::Config;
