//! CLI argument parsing and command dispatch.

pub mod args;
pub mod providers;
pub mod usage;

pub use args::{Cli, Commands, OutputFormat};
