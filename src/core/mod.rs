//! Core application functionality: CLI handling, configuration loading,
//! error types, and the run dispatcher.

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config::{load_instructions, Instructions};
pub use error::BuildError;
pub use runner::run;
