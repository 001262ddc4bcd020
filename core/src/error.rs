//! Error types for the demo player
//!
//! Every player error is recoverable: callers log it and the player stays in a
//! consistent state (a failing fragment always ends the run first).

use thiserror::Error;

use crate::interpreter::errors::ScriptError;
use crate::outline::OutlineError;

/// Result alias used across the library
pub type DemoResult<T> = Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    /// The root is not a node of the outline, or its tree holds no scripts
    #[error("invalid demo root: {0}")]
    InvalidRoot(String),

    /// A fragment raised while executing; the run has already been ended
    #[error("{error}\nscript...\n{script}")]
    ExecutionFailure { script: String, error: ScriptError },

    /// A command was issued while no run is active
    #[error("no demo instance")]
    NoActiveRun,

    /// `prev` was issued with fewer than two executed fragments
    #[error("no previous script")]
    NoPreviousStep,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A script failed outside of a run (parsing or checking a tree)
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Outline(#[from] OutlineError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigSource(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
