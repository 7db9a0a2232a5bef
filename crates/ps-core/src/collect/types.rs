//! Common types for process scanning.

use super::stat::ProcessStat;
use ps_common::{AuxField, ProcessId};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

/// How to treat auxiliary field read failures other than permission denied.
///
/// Permission denied is always tolerated: unprivileged users cannot read
/// other users' `environ` or `cwd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuxPolicy {
    /// Fail the scan, naming the field and path.
    #[default]
    Strict,
    /// Leave the field empty.
    Lenient,
}

impl std::str::FromStr for AuxPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(AuxPolicy::Strict),
            "lenient" | "best-effort" | "best_effort" => Ok(AuxPolicy::Lenient),
            _ => Err(format!("unknown auxiliary field policy: {}", s)),
        }
    }
}

impl std::fmt::Display for AuxPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuxPolicy::Strict => write!(f, "strict"),
            AuxPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// Which auxiliary fields to read for each process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuxSelection {
    pub environ: bool,
    pub cwd: bool,
    pub cmdline: bool,
}

impl Default for AuxSelection {
    fn default() -> Self {
        AuxSelection::all()
    }
}

impl AuxSelection {
    /// Read every auxiliary field.
    pub fn all() -> Self {
        AuxSelection {
            environ: true,
            cwd: true,
            cmdline: true,
        }
    }

    /// Read only the stat record.
    pub fn none() -> Self {
        AuxSelection {
            environ: false,
            cwd: false,
            cmdline: false,
        }
    }

    pub fn contains(&self, field: AuxField) -> bool {
        match field {
            AuxField::Environ => self.environ,
            AuxField::Cwd => self.cwd,
            AuxField::Cmdline => self.cmdline,
        }
    }
}

/// Options for scanning a single process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub aux_policy: AuxPolicy,
    pub aux_fields: AuxSelection,
}

/// One scanned process: its stat record plus best-effort auxiliary fields.
///
/// Auxiliary fields are kept as the raw bytes the kernel returned; `None`
/// means the field was not selected, not present, or not readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub stat: ProcessStat,
    pub environ: Option<Vec<u8>>,
    pub cwd: Option<Vec<u8>>,
    pub cmdline: Option<Vec<u8>>,
}

impl ProcessRecord {
    pub fn new(stat: ProcessStat) -> Self {
        ProcessRecord {
            stat,
            environ: None,
            cwd: None,
            cmdline: None,
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.stat.pid
    }

    pub fn ppid(&self) -> ProcessId {
        self.stat.ppid
    }

    pub fn aux(&self, field: AuxField) -> Option<&[u8]> {
        match field {
            AuxField::Environ => self.environ.as_deref(),
            AuxField::Cwd => self.cwd.as_deref(),
            AuxField::Cmdline => self.cmdline.as_deref(),
        }
    }

    pub(crate) fn set_aux(&mut self, field: AuxField, value: Option<Vec<u8>>) {
        match field {
            AuxField::Environ => self.environ = value,
            AuxField::Cwd => self.cwd = value,
            AuxField::Cmdline => self.cmdline = value,
        }
    }

    /// Working directory as a path.
    pub fn cwd_path(&self) -> Option<PathBuf> {
        self.cwd
            .as_ref()
            .map(|bytes| PathBuf::from(OsString::from_vec(bytes.clone())))
    }

    /// Command line split on NUL separators (lossy UTF-8).
    pub fn cmdline_args(&self) -> Vec<String> {
        self.cmdline
            .as_deref()
            .map(split_nul)
            .unwrap_or_default()
    }

    /// Environment as `(key, value)` pairs in kernel order.
    ///
    /// Entries without `=` are skipped.
    pub fn environ_vars(&self) -> Vec<(String, String)> {
        self.environ
            .as_deref()
            .map(|bytes| {
                split_nul(bytes)
                    .into_iter()
                    .filter_map(|entry| {
                        entry
                            .split_once('=')
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn split_nul(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|&b| b == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| String::from_utf8_lossy(entry).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::stat::parse_stat_content;

    fn record() -> ProcessRecord {
        let stat = parse_stat_content(
            b"7 (sh) S 1 7 7 0 -1 0 0 0 0 0 0 0 0 0 20 0 1 0 100 0 0",
        )
        .unwrap();
        ProcessRecord::new(stat)
    }

    #[test]
    fn test_aux_policy_parse() {
        assert_eq!("strict".parse::<AuxPolicy>().unwrap(), AuxPolicy::Strict);
        assert_eq!("Lenient".parse::<AuxPolicy>().unwrap(), AuxPolicy::Lenient);
        assert_eq!("best-effort".parse::<AuxPolicy>().unwrap(), AuxPolicy::Lenient);
        assert!("sometimes".parse::<AuxPolicy>().is_err());
    }

    #[test]
    fn test_aux_selection() {
        let all = AuxSelection::all();
        let none = AuxSelection::none();
        for field in AuxField::ALL {
            assert!(all.contains(field));
            assert!(!none.contains(field));
        }
        assert_eq!(AuxSelection::default(), all);
    }

    #[test]
    fn test_cmdline_args() {
        let mut rec = record();
        assert!(rec.cmdline_args().is_empty());
        rec.set_aux(AuxField::Cmdline, Some(b"sh\0-c\0echo hi\0".to_vec()));
        assert_eq!(rec.cmdline_args(), vec!["sh", "-c", "echo hi"]);
    }

    #[test]
    fn test_environ_vars() {
        let mut rec = record();
        rec.set_aux(
            AuxField::Environ,
            Some(b"HOME=/root\0JUNK\0PS1=a=b\0".to_vec()),
        );
        assert_eq!(
            rec.environ_vars(),
            vec![
                ("HOME".to_string(), "/root".to_string()),
                ("PS1".to_string(), "a=b".to_string())
            ]
        );
    }

    #[test]
    fn test_cwd_path() {
        let mut rec = record();
        rec.set_aux(AuxField::Cwd, Some(b"/home/me".to_vec()));
        assert_eq!(rec.cwd_path(), Some(PathBuf::from("/home/me")));
        assert_eq!(rec.aux(AuxField::Cwd), Some(&b"/home/me"[..]));
    }
}
