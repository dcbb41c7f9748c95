//! CLI subcommand implementations.

pub mod clear;
pub mod run;
pub mod status;
pub mod util;
