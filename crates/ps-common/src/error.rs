//! Error types for pstree.
//!
//! Every failure of a snapshot build is reported through [`Error`], which
//! carries:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints (most snapshot failures go away on retry)
//! - Remediation suggestions for humans
//!
//! A process that exits between listing and reading is *not* an error; it
//! is simply absent from the snapshot.
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 24,
//!   "category": "consistency",
//!   "message": "parent pid=812 of pid=4410 does not exist",
//!   "recoverable": true,
//!   "suggested_action": "rescan",
//!   "context": { "pid": 4410, "ppid": 812 }
//! }
//! ```

use crate::field::AuxField;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pstree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Listing and reading per-process records.
    Collection,
    /// The scanned id space does not form a consistent tree.
    Consistency,
    /// Bugs (worker panics and the like).
    Internal,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Collection => write!(f, "collection"),
            ErrorCategory::Consistency => write!(f, "consistency"),
            ErrorCategory::Internal => write!(f, "internal"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for callers to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Take a fresh snapshot.
    Rescan,
    /// Run with elevated privileges or lenient auxiliary reads.
    Elevate,
    /// Validate configuration.
    RunCheck,
    /// Report as a bug.
    Report,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::Rescan => write!(f, "rescan"),
            SuggestedAction::Elevate => write!(f, "elevate"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::Report => write!(f, "report"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for pstree.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Collection errors (20-29)
    #[error("could not list pid entries under {}: {source}", .path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: file format invalid: {message}", .path.display())]
    MalformedRecord { path: PathBuf, message: String },

    #[error("could not read {}: {source}", .path.display())]
    PrimaryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read {field} from {}: {source}", .path.display())]
    AuxiliaryField {
        field: AuxField,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parent pid={ppid} of pid={pid} does not exist")]
    MissingParent { pid: u32, ppid: u32 },

    #[error("pid {pid} is not in the snapshot")]
    UnknownPid { pid: u32 },

    // Internal errors (30-39)
    #[error("internal error: {0}")]
    Internal(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Collection and consistency errors
    /// - 30-39: Internal errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Enumeration { .. } => 20,
            Error::MalformedRecord { .. } => 21,
            Error::PrimaryRead { .. } => 22,
            Error::AuxiliaryField { .. } => 23,
            Error::MissingParent { .. } => 24,
            Error::UnknownPid { .. } => 25,
            Error::Internal(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,

            Error::Enumeration { .. }
            | Error::MalformedRecord { .. }
            | Error::PrimaryRead { .. }
            | Error::AuxiliaryField { .. } => ErrorCategory::Collection,

            Error::MissingParent { .. } | Error::UnknownPid { .. } => ErrorCategory::Consistency,

            Error::Internal(_) => ErrorCategory::Internal,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Snapshots are stateless, so anything caused by the id space moving
    /// under the scan is recoverable by building again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,

            Error::Enumeration { source, .. } => {
                source.kind() != std::io::ErrorKind::PermissionDenied
            }
            // The kernel produced a record we cannot read; retrying won't help.
            Error::MalformedRecord { .. } => false,
            Error::PrimaryRead { .. } => true,
            Error::AuxiliaryField { .. } => true,
            Error::MissingParent { .. } => true,
            Error::UnknownPid { .. } => false,

            Error::Internal(_) => false,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns the suggested action for callers.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,

            Error::Enumeration { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                SuggestedAction::Elevate
            }
            Error::Enumeration { .. } => SuggestedAction::Retry,
            Error::MalformedRecord { .. } => SuggestedAction::Report,
            Error::PrimaryRead { .. } => SuggestedAction::Rescan,
            Error::AuxiliaryField { .. } => SuggestedAction::Elevate,
            Error::MissingParent { .. } => SuggestedAction::Rescan,
            Error::UnknownPid { .. } => SuggestedAction::ManualIntervention,

            Error::Internal(_) => SuggestedAction::Report,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Check the syntax of config.toml, or remove it to use built-in defaults."
            }
            Error::Enumeration { .. } => {
                "Check that the proc root exists and is mounted. Use '--proc-root' to point elsewhere."
            }
            Error::MalformedRecord { .. } => {
                "The kernel returned a stat record in an unexpected shape. Please report it with the record contents."
            }
            Error::PrimaryRead { .. } => {
                "A stat record could not be read. Retry the snapshot; short-lived processes cause this under load."
            }
            Error::AuxiliaryField { .. } => {
                "An auxiliary field could not be read. Run with '--lenient' to leave it empty instead."
            }
            Error::MissingParent { .. } => {
                "A parent exited while the snapshot was taken. Take a fresh snapshot."
            }
            Error::UnknownPid { .. } => {
                "The process does not exist or exited before the snapshot. Check the pid."
            }
            Error::Internal(_) => "Internal error. Please report it as a bug.",
            Error::Io(_) => "Check permissions and retry the operation.",
            Error::Json(_) => "Output could not be serialized. Please report it as a bug.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::Enumeration { .. } => "Process Listing Failed",
            Error::MalformedRecord { .. } => "Malformed Stat Record",
            Error::PrimaryRead { .. } => "Stat Record Unreadable",
            Error::AuxiliaryField { .. } => "Auxiliary Field Unreadable",
            Error::MissingParent { .. } => "Inconsistent Snapshot",
            Error::UnknownPid { .. } => "Unknown Process",
            Error::Internal(_) => "Internal Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }

    /// Format for humans: headline, reason and fix.
    pub fn format_human(&self) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            self.headline(),
            self,
            self.remediation()
        )
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for callers.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., pid, file path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::MissingParent { pid, ppid } => {
                context.insert("pid".to_string(), serde_json::json!(pid));
                context.insert("ppid".to_string(), serde_json::json!(ppid));
            }
            Error::UnknownPid { pid } => {
                context.insert("pid".to_string(), serde_json::json!(pid));
            }
            Error::Enumeration { path, .. }
            | Error::MalformedRecord { path, .. }
            | Error::PrimaryRead { path, .. } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::AuxiliaryField { field, path, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
                context.insert("path".to_string(), serde_json::json!(path));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
