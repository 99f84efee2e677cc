//! CLI subcommand implementations.

pub mod export;
pub mod import;
pub mod report;
pub mod reset;
pub mod run;
pub mod status;
