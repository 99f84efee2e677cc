//! Browsing time meter CLI library.
//!
//! This crate provides the CLI interface and live tracking loop for the
//! attention engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
