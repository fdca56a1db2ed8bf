use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

/// Default bound on any single external command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on the artifact-repository reachability request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Overrides [`DEFAULT_COMMAND_TIMEOUT`], in whole seconds.
pub const TIMEOUT_ENV: &str = "WSL_PODMAN_DOCTOR_TIMEOUT";

/// Name of the machine whose pipe the editor connects to.
pub const DEFAULT_MACHINE_PIPE: &str = "podman-machine-default";

/// Builds older than this lack the virtualization features WSL 2 needs.
pub const MIN_WINDOWS_BUILD: u32 = 19041;

pub const REGISTRIES_CONF: &str = "/etc/containers/registries.conf";

/// Resolved settings for one run. Built once from the CLI and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub verbose: bool,
    /// Draw spinners on stderr while sections run.
    pub progress: bool,
    pub artifact_url: Option<String>,
    pub command_timeout: Duration,
    pub http_timeout: Duration,
    pub machine_pipe: String,
    /// `%USERPROFILE%\.wslconfig`; `None` when no home directory resolves.
    pub wslconfig_path: Option<PathBuf>,
    pub editor_settings_path: Option<PathBuf>,
    pub credential_paths: Vec<PathBuf>,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let home = dirs::home_dir();
        let config_dir = dirs::config_dir();

        let mut credential_paths = Vec::new();
        if let Some(home) = &home {
            credential_paths.push(home.join(".docker").join("config.json"));
        }
        if let Some(dir) = &config_dir {
            credential_paths.push(dir.join("containers").join("auth.json"));
        }

        Self {
            verbose: cli.verbose,
            progress: true,
            artifact_url: cli.artifact_url.clone().filter(|u| !u.trim().is_empty()),
            command_timeout: command_timeout_from_env(std::env::var(TIMEOUT_ENV).ok().as_deref()),
            http_timeout: HTTP_TIMEOUT,
            machine_pipe: DEFAULT_MACHINE_PIPE.to_string(),
            wslconfig_path: home.as_ref().map(|h| h.join(".wslconfig")),
            editor_settings_path: config_dir
                .as_ref()
                .map(|d| d.join("Code").join("User").join("settings.json")),
            credential_paths,
        }
    }
}

fn command_timeout_from_env(value: Option<&str>) -> Duration {
    match value.map(str::trim).map(str::parse::<u64>) {
        Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
        Some(_) => {
            tracing::warn!("Ignoring invalid {TIMEOUT_ENV}; using {:?}", DEFAULT_COMMAND_TIMEOUT);
            DEFAULT_COMMAND_TIMEOUT
        }
        None => DEFAULT_COMMAND_TIMEOUT,
    }
}

#[cfg(test)]
impl Config {
    /// Fixed paths so tests never depend on the real home directory.
    pub fn for_tests() -> Self {
        Self {
            verbose: false,
            progress: false,
            artifact_url: None,
            command_timeout: Duration::from_secs(5),
            http_timeout: Duration::from_millis(300),
            machine_pipe: DEFAULT_MACHINE_PIPE.to_string(),
            wslconfig_path: Some(PathBuf::from(r"C:\Users\dev\.wslconfig")),
            editor_settings_path: Some(PathBuf::from(
                r"C:\Users\dev\AppData\Roaming\Code\User\settings.json",
            )),
            credential_paths: vec![PathBuf::from(r"C:\Users\dev\.docker\config.json")],
        }
    }
}
