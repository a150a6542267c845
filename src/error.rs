//! Error types for codelex

use thiserror::Error;

/// Result type alias for codelex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed grammar data or registry misuse.
///
/// These are setup-time failures. A bootstrap that hits one should stop
/// rather than continue with a partially built registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pattern /{0}/ uses multiline mode and cannot join a single-pass tokenizer")]
    MultilinePattern(String),

    #[error("shortcut character {ch:?} is claimed by rules styled `{first}` and `{second}`")]
    ConflictingShortcut {
        ch: char,
        first: String,
        second: String,
    },

    #[error("language `{0}` is already registered")]
    DuplicateLanguage(String),

    #[error("no grammar registered for `{0}`")]
    UnknownLanguage(String),

    #[error("invalid pattern /{pattern}/: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown style `{0}`")]
    UnknownStyle(String),

    #[error("malformed grammar file: {0}")]
    Grammar(String),
}

/// Crate-level error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("matching failed while decorating: {0}")]
    Match(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a fatal setup error rather than a runtime failure
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
