//! Auxiliary per-process fields.

use serde::{Deserialize, Serialize};

/// Optional per-process data read from files next to the stat record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxField {
    /// NUL-separated `KEY=value` environment block.
    Environ,
    /// Current working directory (symlink target).
    Cwd,
    /// NUL-separated argument vector.
    Cmdline,
}

impl AuxField {
    /// All fields, in the order they are read.
    pub const ALL: [AuxField; 3] = [AuxField::Environ, AuxField::Cwd, AuxField::Cmdline];

    /// Name of the per-process entry backing this field.
    pub fn file_name(self) -> &'static str {
        match self {
            AuxField::Environ => "environ",
            AuxField::Cwd => "cwd",
            AuxField::Cmdline => "cmdline",
        }
    }
}

impl std::fmt::Display for AuxField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}
