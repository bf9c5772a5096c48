//! Error types for tsh

use thiserror::Error;

/// Result type alias for tsh operations
pub type ShResult<T> = Result<T, ShError>;

/// A grammar error, located at the character column where parsing stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxError {
    pub position: usize,
    pub message: String,
}

/// Error types for tsh shell operations
#[derive(Error, Debug)]
pub enum ShError {
    /// Malformed input line
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// No builtin, executable or script matches the command name
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// Script exists but may not be executed
    #[error("{command}: {source}")]
    PermissionDenied {
        command: String,
        source: nix::Error,
    },

    /// Shebang interpreter does not resolve to an executable
    #[error("{0}: interpreter not found")]
    InterpreterNotFound(String),

    /// Pipe or fork failure
    #[error("process error: {0}")]
    Process(String),

    /// Broken internal invariant
    #[error("runtime error: {0}")]
    Runtime(String),

    /// IO error (pipes, script files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Exit requested (not really an error)
    #[error("exit with code {0}")]
    Exit(i32),
}

impl From<nix::Error> for ShError {
    fn from(err: nix::Error) -> Self {
        Self::Process(err.desc().to_string())
    }
}

impl ShError {
    /// Resolution failures are reported per command and never abort a line.
    pub const fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::CommandNotFound(_) | Self::PermissionDenied { .. } | Self::InterpreterNotFound(_)
        )
    }

    /// Column for the caret under the echoed line.
    pub const fn position(&self) -> usize {
        match self {
            Self::Syntax(e) => e.position,
            _ => 0,
        }
    }
}
