//! The only seam that touches the host.
//!
//! Checks talk to [`SubsystemProbe`] instead of spawning processes or
//! reading files themselves, so the whole runner can be driven by a fake.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::exec::{ExecResult, run_cmd_unchecked};

pub trait SubsystemProbe {
    /// Raw OS version banner (`ver` output on Windows).
    fn os_version(&self) -> Option<String>;

    /// `None` when elevation cannot be determined on this platform.
    fn is_elevated(&self) -> Option<bool>;

    fn env_var(&self, key: &str) -> Option<String>;

    /// Run `wsl.exe` on the host.
    fn wsl(&self, args: &[&str]) -> Result<ExecResult>;

    /// Run a command inside a distro (`wsl -d <distro> -- ...`).
    fn wsl_exec(&self, distro: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run the host `podman` CLI.
    fn podman(&self, args: &[&str]) -> Result<ExecResult>;

    fn find_on_path(&self, tool: &str) -> Option<PathBuf>;

    fn read_file(&self, path: &Path) -> std::io::Result<String>;

    fn named_pipe_exists(&self, name: &str) -> bool;

    /// GET `url` and return the HTTP status code.
    fn http_get(&self, url: &str, timeout: Duration) -> Result<u16>;
}

/// Probe backed by the real host.
pub struct HostProbe {
    timeout: Duration,
}

impl HostProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl SubsystemProbe for HostProbe {
    fn os_version(&self) -> Option<String> {
        if !cfg!(windows) {
            return None;
        }
        run_cmd_unchecked("cmd", &["/c", "ver"], self.timeout)
            .ok()
            .filter(ExecResult::success)
            .map(|r| r.stdout.trim().to_string())
    }

    fn is_elevated(&self) -> Option<bool> {
        if !cfg!(windows) {
            return None;
        }
        // `net session` only succeeds from an elevated prompt.
        run_cmd_unchecked("net", &["session"], self.timeout)
            .ok()
            .map(|r| r.success())
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn wsl(&self, args: &[&str]) -> Result<ExecResult> {
        run_cmd_unchecked("wsl", args, self.timeout)
    }

    fn wsl_exec(&self, distro: &str, args: &[&str]) -> Result<ExecResult> {
        let mut full = vec!["-d", distro, "--"];
        full.extend_from_slice(args);
        run_cmd_unchecked("wsl", &full, self.timeout)
    }

    fn podman(&self, args: &[&str]) -> Result<ExecResult> {
        run_cmd_unchecked("podman", args, self.timeout)
    }

    fn find_on_path(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }

    fn read_file(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn named_pipe_exists(&self, name: &str) -> bool {
        pipe_listed(name)
    }

    fn http_get(&self, url: &str, timeout: Duration) -> Result<u16> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("wsl-podman-doctor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let response = client.get(url).send().with_context(|| format!("GET {url} failed"))?;
        Ok(response.status().as_u16())
    }
}

/// Enumerating the pipe namespace avoids opening (and consuming) the pipe.
#[cfg(windows)]
fn pipe_listed(name: &str) -> bool {
    match std::fs::read_dir(r"\\.\pipe\") {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(name)),
        Err(e) => {
            tracing::debug!("Cannot list named pipes: {e}");
            Path::new(&format!(r"\\.\pipe\{name}")).exists()
        }
    }
}

#[cfg(not(windows))]
fn pipe_listed(_name: &str) -> bool {
    false
}

#[cfg(test)]
pub mod fake {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use super::*;

    /// Scripted probe. Commands are keyed by their full command line, e.g.
    /// `"wsl -d Ubuntu -- id -u"`; unscripted commands behave as missing.
    #[derive(Default)]
    pub struct FakeProbe {
        os_version: Option<String>,
        elevated: Option<bool>,
        env: HashMap<String, String>,
        commands: HashMap<String, ExecResult>,
        files: HashMap<PathBuf, String>,
        on_path: HashMap<String, PathBuf>,
        pipes: HashSet<String>,
        http: HashMap<String, std::result::Result<u16, String>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn os(mut self, banner: &str) -> Self {
            self.os_version = Some(banner.into());
            self
        }

        pub fn elevated(mut self, elevated: bool) -> Self {
            self.elevated = Some(elevated);
            self
        }

        pub fn env(mut self, key: &str, value: &str) -> Self {
            self.env.insert(key.into(), value.into());
            self
        }

        pub fn cmd(mut self, line: &str, stdout: &str) -> Self {
            self.commands.insert(
                line.into(),
                ExecResult {
                    exit_code: 0,
                    stdout: stdout.into(),
                    ..ExecResult::default()
                },
            );
            self
        }

        pub fn cmd_fail(mut self, line: &str, exit_code: i32) -> Self {
            self.commands.insert(
                line.into(),
                ExecResult {
                    exit_code,
                    ..ExecResult::default()
                },
            );
            self
        }

        /// The command ran past its deadline and was killed.
        pub fn cmd_timeout(mut self, line: &str) -> Self {
            self.commands.insert(
                line.into(),
                ExecResult {
                    exit_code: -1,
                    timed_out: true,
                    ..ExecResult::default()
                },
            );
            self
        }

        pub fn file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
            self.files.insert(path.into(), content.into());
            self
        }

        pub fn on_path(mut self, tool: &str, path: &str) -> Self {
            self.on_path.insert(tool.into(), PathBuf::from(path));
            self
        }

        pub fn pipe(mut self, name: &str) -> Self {
            self.pipes.insert(name.into());
            self
        }

        pub fn http(mut self, url: &str, outcome: std::result::Result<u16, &str>) -> Self {
            self.http.insert(url.into(), outcome.map_err(str::to_string));
            self
        }

        pub fn ran(&self, prefix: &str) -> bool {
            self.calls.borrow().iter().any(|c| c.starts_with(prefix))
        }

        fn run(&self, line: String) -> Result<ExecResult> {
            self.calls.borrow_mut().push(line.clone());
            match self.commands.get(&line) {
                Some(result) => Ok(result.clone()),
                None => anyhow::bail!("failed to execute {line}"),
            }
        }
    }

    impl SubsystemProbe for FakeProbe {
        fn os_version(&self) -> Option<String> {
            self.os_version.clone()
        }

        fn is_elevated(&self) -> Option<bool> {
            self.elevated
        }

        fn env_var(&self, key: &str) -> Option<String> {
            self.env.get(key).cloned()
        }

        fn wsl(&self, args: &[&str]) -> Result<ExecResult> {
            self.run(format!("wsl {}", args.join(" ")))
        }

        fn wsl_exec(&self, distro: &str, args: &[&str]) -> Result<ExecResult> {
            self.run(format!("wsl -d {distro} -- {}", args.join(" ")))
        }

        fn podman(&self, args: &[&str]) -> Result<ExecResult> {
            self.run(format!("podman {}", args.join(" ")))
        }

        fn find_on_path(&self, tool: &str) -> Option<PathBuf> {
            self.on_path.get(tool).cloned()
        }

        fn read_file(&self, path: &Path) -> std::io::Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }

        fn named_pipe_exists(&self, name: &str) -> bool {
            self.pipes.contains(name)
        }

        fn http_get(&self, url: &str, _timeout: Duration) -> Result<u16> {
            self.calls.borrow_mut().push(format!("GET {url}"));
            match self.http.get(url) {
                Some(Ok(code)) => Ok(*code),
                Some(Err(e)) => anyhow::bail!("{e}"),
                None => anyhow::bail!("connection refused"),
            }
        }
    }
}
