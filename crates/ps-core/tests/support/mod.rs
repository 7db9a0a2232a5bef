//! Shared fixtures: a procfs-shaped directory tree on disk.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stat line with the given identity and fixed plausible remaining fields.
pub fn stat_line(pid: u32, name: &str, ppid: u32) -> String {
    format!(
        "{pid} ({name}) S {ppid} {pid} {pid} 0 -1 4194560 52 0 0 0 7 2 0 0 20 0 1 0 {} 4096000 300 18446744073709551615 0 0 0 0 0 0 0 0 0 0\n",
        5000 + pid
    )
}

/// Temporary directory laid out like `/proc`.
pub struct FakeProc {
    dir: TempDir,
}

impl FakeProc {
    pub fn new() -> Self {
        FakeProc {
            dir: TempDir::new().expect("create temp proc root"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        let dir = self.root().join(pid.to_string());
        fs::create_dir_all(&dir).expect("create pid dir");
        dir
    }

    /// Add a process with a well-formed stat record and no auxiliary files.
    pub fn add(&self, pid: u32, ppid: u32, name: &str) -> &Self {
        self.add_raw_stat(pid, stat_line(pid, name, ppid))
    }

    pub fn add_raw_stat(&self, pid: u32, stat: impl AsRef<[u8]>) -> &Self {
        fs::write(self.pid_dir(pid).join("stat"), stat).expect("write stat");
        self
    }

    /// A listed pid directory with no stat file, as left by an exited process.
    pub fn add_vanished(&self, pid: u32) -> &Self {
        self.pid_dir(pid);
        self
    }

    pub fn set_cmdline(&self, pid: u32, args: &[&str]) -> &Self {
        let mut bytes = Vec::new();
        for arg in args {
            bytes.extend_from_slice(arg.as_bytes());
            bytes.push(0);
        }
        fs::write(self.pid_dir(pid).join("cmdline"), bytes).expect("write cmdline");
        self
    }

    pub fn set_environ(&self, pid: u32, vars: &[(&str, &str)]) -> &Self {
        let mut bytes = Vec::new();
        for (k, v) in vars {
            bytes.extend_from_slice(format!("{k}={v}").as_bytes());
            bytes.push(0);
        }
        fs::write(self.pid_dir(pid).join("environ"), bytes).expect("write environ");
        self
    }

    pub fn set_cwd(&self, pid: u32, target: &str) -> &Self {
        symlink(target, self.pid_dir(pid).join("cwd")).expect("link cwd");
        self
    }

    /// Non-process entries real procfs also contains.
    pub fn add_noise(&self) -> &Self {
        fs::create_dir_all(self.root().join("sys")).expect("create sys");
        fs::create_dir_all(self.root().join("self")).expect("create self");
        fs::write(self.root().join("uptime"), "1.0 1.0\n").expect("write uptime");
        fs::create_dir_all(self.root().join("0")).expect("create 0");
        self
    }

    /// init -> {sshd -> bash, cron}, with auxiliary files on bash.
    pub fn family() -> Self {
        let proc = FakeProc::new();
        proc.add(1, 0, "init")
            .add(2, 1, "sshd")
            .add(3, 1, "cron")
            .add(4, 2, "bash")
            .set_cmdline(4, &["bash", "-l"])
            .set_environ(4, &[("HOME", "/home/u"), ("TERM", "xterm")])
            .set_cwd(4, "/home/u");
        proc
    }
}
