//! Exit codes for the procs-tree CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: Snapshot printed
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Collection and internal errors

use ps_common::Error;
use std::io;

/// Exit codes for procs-tree.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Snapshot taken and printed
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Config file missing, unparseable or invalid
    ConfigError = 11,

    /// Permission denied
    PermissionError = 12,

    // ========================================================================
    // Collection / Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// A stat record could not be parsed
    MalformedError = 22,

    /// Parent exited mid-snapshot; retry
    InconsistentSnapshot = 23,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    pub fn is_error(self) -> bool {
        self.as_i32() >= 10
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::PermissionError => "ERR_PERMISSION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::MalformedError => "ERR_MALFORMED",
            ExitCode::InconsistentSnapshot => "ERR_INCONSISTENT",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        let denied = |e: &io::Error| e.kind() == io::ErrorKind::PermissionDenied;
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::Enumeration { source, .. }
            | Error::PrimaryRead { source, .. }
            | Error::AuxiliaryField { source, .. } => {
                if denied(source) {
                    ExitCode::PermissionError
                } else {
                    ExitCode::IoError
                }
            }
            Error::MalformedRecord { .. } => ExitCode::MalformedError,
            Error::MissingParent { .. } => ExitCode::InconsistentSnapshot,
            Error::UnknownPid { .. } => ExitCode::ArgsError,
            Error::Io(e) if denied(e) => ExitCode::PermissionError,
            Error::Io(_) => ExitCode::IoError,
            Error::Internal(_) | Error::Json(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
