//! Shared fixtures: a scratch directory with fake database binaries.

#![allow(dead_code)]

use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use dockhand_core::config::EntrypointConfig;

/// Write an executable `#!/bin/sh` script.
pub fn write_executable(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("write executable");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
}

/// Scratch layout for one entrypoint run.
pub struct Sandbox {
    pub root: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        for dir in ["bin", "init.d", "entrypoint.d", "logs"] {
            std::fs::create_dir(root.path().join(dir)).expect("mkdir");
        }
        Self { root }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    pub fn log(&self, name: &str) -> PathBuf {
        self.path("logs").join(name)
    }

    pub fn read_log(&self, name: &str) -> String {
        std::fs::read_to_string(self.log(name)).unwrap_or_default()
    }

    /// Fake `mysqld`: records its arguments. With `--skip-networking` it
    /// runs until SIGTERM; otherwise it exits 0 right away.
    pub fn fake_server(&self) -> PathBuf {
        let path = self.path("bin/mysqld");
        let runs = self.log("server.log");
        write_executable(
            &path,
            &format!(
                "echo \"start $*\" >> {log}\n\
                 case \"$*\" in *--skip-networking*) ;; *) exit 0 ;; esac\n\
                 trap 'echo \"stop $*\" >> {log}; rm -f {ready}; exit 0' TERM\n\
                 touch {ready}\n\
                 while :; do sleep 0.05; done",
                log = runs.display(),
                ready = self.ready_marker().display(),
            ),
        );
        path
    }

    /// Created by the fake server once its TERM handler is in place.
    pub fn ready_marker(&self) -> PathBuf {
        self.log("server.ready")
    }

    /// Fake `mysqladmin`. When `can_succeed` is set it reports ready once
    /// the fake server is up; otherwise it never does.
    pub fn fake_admin(&self, can_succeed: bool) -> PathBuf {
        let path = self.path("bin/mysqladmin");
        let pings = self.log("pings.log");
        let check = if can_succeed {
            format!("test -f {}", self.ready_marker().display())
        } else {
            "exit 1".to_string()
        };
        write_executable(&path, &format!("echo ping >> {}\n{check}", pings.display()));
        path
    }

    /// Fake `mysql`: appends stdin to `loaded.sql`, rejects input containing
    /// `BROKEN`.
    pub fn fake_client(&self) -> PathBuf {
        let path = self.path("bin/mysql");
        let loaded = self.log("loaded.sql");
        write_executable(
            &path,
            &format!(
                "input=$(cat)\n\
                 case \"$input\" in *BROKEN*) exit 1;; esac\n\
                 printf '%s\\n' \"$input\" >> {}",
                loaded.display()
            ),
        );
        path
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        std::fs::write(&path, contents).expect("write file");
        path
    }

    /// Write `contents` gzip-compressed to `rel` (which must end in `.gz`).
    pub fn write_gzip(&self, rel: &str, contents: &str) -> PathBuf {
        let plain = rel.strip_suffix(".gz").expect("gz suffix");
        self.write(plain, contents);
        let status = std::process::Command::new("gzip")
            .arg(self.path(plain))
            .status()
            .expect("run gzip");
        assert!(status.success(), "gzip failed");
        self.path(rel)
    }

    /// Configuration pointing every directory and binary into the sandbox.
    pub fn config(&self, extra: &[(&str, &str)]) -> EntrypointConfig {
        let mut vars: HashMap<String, String> = HashMap::new();
        let mut set = |k: &str, v: String| {
            vars.insert(k.to_string(), v);
        };
        set("DOCKHAND_INIT_SCRIPTS_DIR", self.path("init.d").display().to_string());
        set("DOCKHAND_ENTRYPOINT_DIR", self.path("entrypoint.d").display().to_string());
        set("DOCKHAND_CLIENT_BIN", self.path("bin/mysql").display().to_string());
        set("DOCKHAND_ADMIN_BIN", self.path("bin/mysqladmin").display().to_string());
        set("DOCKHAND_SCRIPT_SHELL", "sh".to_string());
        set("DOCKHAND_READY_ATTEMPTS", "10".to_string());
        set("DOCKHAND_READY_INTERVAL_SECS", "1".to_string());
        for (k, v) in extra {
            set(k, v.to_string());
        }
        EntrypointConfig::from_lookup(|key| vars.get(key).cloned()).expect("config")
    }
}
