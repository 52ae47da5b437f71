//! Canonical error facility for rswupd
//!
//! Every failure in the update pipeline is classified into a small, stable
//! taxonomy. Each kind maps to a stable error code used for programmatic
//! handling and for the single-line diagnostic the CLI prints. Where a
//! failure is recoverable (a pack that 404s, a delta whose patch output
//! mismatches), the *caller* decides to demote it; the error itself always
//! says what went wrong and in which operation.

use rswupd_core_types::{HashParseError, VersionParseError};

/// Result type alias using UpdError
pub type Result<T> = std::result::Result<T, UpdError>;

/// Canonical error kind taxonomy
///
/// One variant per failure class in the update pipeline. The mapping from
/// kind to policy (fatal, demote-to-fallback, log-and-swallow) lives with
/// the components, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdErrorKind {
    /// Missing or malformed local configuration (os-release, format file,
    /// subscription directory)
    Config,
    /// Network failure: DNS, connect, non-200 status, truncated body
    Transport,
    /// Manifest or version text that does not parse
    Parse,
    /// A staged artifact's digest disagrees with its manifest record
    Integrity,
    /// A subprocess exited non-zero or could not be spawned
    Exec,
    /// Link, copy, rename, or mkdir failure
    Filesystem,
    /// A delta references a source or target absent from the run indices
    State,
    /// Another update run holds the state-directory lock
    Concurrency,
    /// Conditions that are unreachable by design
    Internal,
}

impl UpdErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            UpdErrorKind::Config => "ERR_CONFIG",
            UpdErrorKind::Transport => "ERR_TRANSPORT",
            UpdErrorKind::Parse => "ERR_PARSE",
            UpdErrorKind::Integrity => "ERR_INTEGRITY",
            UpdErrorKind::Exec => "ERR_EXEC",
            UpdErrorKind::Filesystem => "ERR_FILESYSTEM",
            UpdErrorKind::State => "ERR_STATE",
            UpdErrorKind::Concurrency => "ERR_CONCURRENCY",
            UpdErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the kind plus whatever context the failing component had on
/// hand: the operation name, a filesystem path, a URL. Built fluently:
///
/// ```
/// use rswupd_core::errors::{UpdError, UpdErrorKind};
///
/// let err = UpdError::new(UpdErrorKind::Transport)
///     .with_op("fetch_mom")
///     .with_url("update/30010/Manifest.MoM")
///     .with_message("replied: 404");
/// assert_eq!(err.code(), "ERR_TRANSPORT");
/// ```
#[derive(Debug, Clone)]
pub struct UpdError {
    kind: UpdErrorKind,
    op: Option<String>,
    path: Option<String>,
    url: Option<String>,
    message: String,
}

impl UpdError {
    /// Create a new error with the specified kind
    pub fn new(kind: UpdErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            url: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add filesystem path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add URL context
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add a human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> UpdErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the URL context, if any
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for UpdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(url) = &self.url {
            write!(f, " (url: {})", url)?;
        }
        Ok(())
    }
}

impl std::error::Error for UpdError {}

impl From<VersionParseError> for UpdError {
    fn from(err: VersionParseError) -> Self {
        UpdError::new(UpdErrorKind::Parse).with_message(err.to_string())
    }
}

impl From<HashParseError> for UpdError {
    fn from(err: HashParseError) -> Self {
        UpdError::new(UpdErrorKind::Parse).with_message(err.to_string())
    }
}

// ===== Helper constructors =====

/// Create a configuration error
pub fn config_error(op: &str, reason: impl Into<String>) -> UpdError {
    UpdError::new(UpdErrorKind::Config)
        .with_op(op)
        .with_message(reason)
}

/// Create a transport error for a URL
pub fn transport_error(op: &str, url: &str, reason: impl Into<String>) -> UpdError {
    UpdError::new(UpdErrorKind::Transport)
        .with_op(op)
        .with_url(url)
        .with_message(reason)
}

/// Create a parse error
pub fn parse_error(op: &str, reason: impl Into<String>) -> UpdError {
    UpdError::new(UpdErrorKind::Parse)
        .with_op(op)
        .with_message(reason)
}

/// Create an integrity error for a digest mismatch
pub fn integrity_mismatch(op: &str, path: &std::path::Path, expected: &str, actual: &str) -> UpdError {
    UpdError::new(UpdErrorKind::Integrity)
        .with_op(op)
        .with_path(path.display().to_string())
        .with_message(format!("digest mismatch: expected {}, got {}", expected, actual))
}

/// Create a filesystem error from an I/O failure
pub fn io_error(op: &str, path: &std::path::Path, err: std::io::Error) -> UpdError {
    UpdError::new(UpdErrorKind::Filesystem)
        .with_op(op)
        .with_path(path.display().to_string())
        .with_message(err.to_string())
}
