//! Typed failures for operations that must abort before mutating state.

use std::fmt;

/// Errors that fail an operation outright.
///
/// Everything else in the pipeline is a diagnostic: logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Malformed or missing required configuration, e.g. a kerning class
    /// whose side indicator is not recognized.
    Config(String),
    /// A requested name (kerning class, glyph) does not exist.
    Lookup(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config(msg) => write!(f, "configuration error: {msg}"),
            BuildError::Lookup(msg) => write!(f, "lookup error: {msg}"),
        }
    }
}

impl std::error::Error for BuildError {}
