//! Where per-process records come from.
//!
//! The builder never touches the filesystem directly: it lists handles and
//! reads raw bytes through a [`ProcessSource`]. [`ProcFs`] is the Linux
//! implementation; tests feed synthetic records through
//! `mock_process::MockSource`.

use ps_common::{AuxField, ProcessId};
use std::fs;
use std::io;
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

/// Name of the primary record inside a process directory.
pub const STAT_FILE: &str = "stat";

/// Default mount point of procfs.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// A listed process: its pid and the directory holding its records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessHandle {
    pid: ProcessId,
    dir: PathBuf,
}

impl ProcessHandle {
    pub fn new(pid: u32, dir: impl Into<PathBuf>) -> Self {
        ProcessHandle {
            pid: ProcessId(pid),
            dir: dir.into(),
        }
    }

    /// Pid as listed (the directory name).
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the primary stat record.
    pub fn stat_path(&self) -> PathBuf {
        self.dir.join(STAT_FILE)
    }

    /// Path of an auxiliary field.
    pub fn aux_path(&self, field: AuxField) -> PathBuf {
        self.dir.join(field.file_name())
    }
}

/// Lists processes and reads their raw records.
///
/// Implementations must report a process that no longer exists as
/// `Ok(None)` rather than an error; the scanner relies on this to tell a
/// vanished process from a broken one.
pub trait ProcessSource: Sync {
    /// Location being listed, used to name enumeration failures.
    fn root(&self) -> &Path;

    /// Currently visible processes, in no particular order.
    fn list_processes(&self) -> io::Result<Vec<ProcessHandle>>;

    /// Raw stat record, or `None` if the process is gone.
    fn read_primary_record(&self, handle: &ProcessHandle) -> io::Result<Option<Vec<u8>>>;

    /// Raw auxiliary field, or `None` if it is not present.
    fn read_aux_field(
        &self,
        handle: &ProcessHandle,
        field: AuxField,
    ) -> io::Result<Option<Vec<u8>>>;
}

/// procfs-backed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        ProcFs::new()
    }
}

impl ProcFs {
    /// Source rooted at `/proc`.
    pub fn new() -> Self {
        ProcFs::with_root(DEFAULT_PROC_ROOT)
    }

    /// Source rooted at an arbitrary directory laid out like procfs.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        ProcFs { root: root.into() }
    }
}

impl ProcessSource for ProcFs {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_processes(&self) -> io::Result<Vec<ProcessHandle>> {
        let mut handles = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            // Only numeric directories are processes
            if let Ok(pid) = name_str.parse::<u32>() {
                if pid != 0 {
                    handles.push(ProcessHandle::new(pid, entry.path()));
                }
            }
        }

        Ok(handles)
    }

    fn read_primary_record(&self, handle: &ProcessHandle) -> io::Result<Option<Vec<u8>>> {
        absent_if_gone(fs::read(handle.stat_path()))
    }

    fn read_aux_field(
        &self,
        handle: &ProcessHandle,
        field: AuxField,
    ) -> io::Result<Option<Vec<u8>>> {
        let path = handle.aux_path(field);
        match field {
            AuxField::Cwd => absent_if_gone(
                fs::read_link(path).map(|target| target.into_os_string().into_vec()),
            ),
            AuxField::Environ | AuxField::Cmdline => absent_if_gone(fs::read(path)),
        }
    }
}

/// Map "the process exited" errors to `Ok(None)`.
///
/// A vanished pid shows up as ENOENT on its files, or ESRCH when the task
/// is already being torn down.
fn absent_if_gone(result: io::Result<Vec<u8>>) -> io::Result<Option<Vec<u8>>> {
    match result {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if is_gone(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

pub(crate) fn is_gone(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ESRCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_paths() {
        let handle = ProcessHandle::new(42, "/proc/42");
        assert_eq!(handle.pid(), ProcessId(42));
        assert_eq!(handle.stat_path(), PathBuf::from("/proc/42/stat"));
        assert_eq!(
            handle.aux_path(AuxField::Cmdline),
            PathBuf::from("/proc/42/cmdline")
        );
    }

    #[test]
    fn test_is_gone() {
        assert!(is_gone(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(is_gone(&io::Error::from_raw_os_error(libc::ESRCH)));
        assert!(!is_gone(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }

    #[test]
    fn test_absent_if_gone() {
        assert_eq!(absent_if_gone(Ok(vec![1])).unwrap(), Some(vec![1]));
        assert_eq!(
            absent_if_gone(Err(io::Error::from(io::ErrorKind::NotFound))).unwrap(),
            None
        );
        assert!(absent_if_gone(Err(io::Error::from(io::ErrorKind::PermissionDenied))).is_err());
    }

    #[test]
    fn test_list_skips_non_numeric_entries() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["1", "42", "self", "net", "0"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("uptime"), "1.0 1.0").unwrap();

        let source = ProcFs::with_root(dir.path());
        let mut pids: Vec<u32> = source
            .list_processes()
            .unwrap()
            .iter()
            .map(|h| h.pid().0)
            .collect();
        pids.sort();
        assert_eq!(pids, vec![1, 42]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let source = ProcFs::with_root("/nonexistent/pstree-test-root");
        assert!(source.list_processes().is_err());
    }

    #[test]
    fn test_read_vanished_process() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProcFs::with_root(dir.path());
        let handle = ProcessHandle::new(99, dir.path().join("99"));

        assert_eq!(source.read_primary_record(&handle).unwrap(), None);
        assert_eq!(source.read_aux_field(&handle, AuxField::Cwd).unwrap(), None);
    }

    #[test]
    fn test_read_cwd_link_target() {
        let dir = tempfile::tempdir().unwrap();
        let pid_dir = dir.path().join("7");
        fs::create_dir(&pid_dir).unwrap();
        std::os::unix::fs::symlink("/var/tmp", pid_dir.join("cwd")).unwrap();

        let source = ProcFs::with_root(dir.path());
        let handle = ProcessHandle::new(7, &pid_dir);
        assert_eq!(
            source.read_aux_field(&handle, AuxField::Cwd).unwrap(),
            Some(b"/var/tmp".to_vec())
        );
    }
}
