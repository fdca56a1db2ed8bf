//! Pure parsers for the text and JSON the host tools produce.
//!
//! Each function takes captured output and returns plain data so it can be
//! tested against literal samples without touching the host.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::types::DistroInfo;

static WINDOWS_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)(?:\.(\d+))?").expect("valid regex"));

/// Extract the build number from `ver` output, e.g.
/// `Microsoft Windows [Version 10.0.22631.4317]` -> 22631.
pub fn parse_windows_build(ver_output: &str) -> Option<u32> {
    let caps = WINDOWS_VERSION_RE.captures(ver_output)?;
    caps.get(3)?.as_str().parse().ok()
}

/// Parse `wsl --list --verbose`.
///
/// ```text
///   NAME                      STATE           VERSION
/// * Ubuntu-22.04              Running         2
///   podman-machine-default    Stopped         2
/// ```
pub fn parse_distro_list(raw: &str) -> Vec<DistroInfo> {
    let mut distros = Vec::new();
    let mut header_seen = false;
    for line in raw.lines() {
        let line = line.replace('\0', "");
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (is_default, rest) = match trimmed.strip_prefix('*') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let fields: Vec<&str> = rest.split_whitespace().collect();
        // The header is localized, so it is recognized by position: the first
        // row, unmarked, without a numeric VERSION cell.
        let first_row = !header_seen;
        header_seen = true;
        if first_row && !is_default && fields.last().is_none_or(|v| v.parse::<u8>().is_err()) {
            continue;
        }
        // Names and states are single words, so a row is NAME STATE VERSION
        // or NAME STATE. Anything else is prose (e.g. the "no installed
        // distributions" notice).
        let (state, version) = match fields.as_slice() {
            [_, state, version] => match version.parse::<u8>() {
                Ok(v) => (*state, Some(v)),
                Err(_) => continue,
            },
            [_, state] if state.chars().all(char::is_alphabetic) => (*state, None),
            _ => continue,
        };
        distros.push(DistroInfo {
            name: fields[0].to_string(),
            running: state.eq_ignore_ascii_case("running"),
            is_default,
            version,
        });
    }
    distros
}

/// True when `[wsl2]` carries a `kernelCommandLine` that disables cgroups v1.
pub fn wslconfig_has_cgroup_v2(content: &str) -> bool {
    let mut in_wsl2 = false;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_wsl2 = line[1..line.len() - 1].trim().eq_ignore_ascii_case("wsl2");
            continue;
        }
        if !in_wsl2 {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim().eq_ignore_ascii_case("kernelCommandLine")
                && value.split_whitespace().any(|arg| arg.trim_matches('"') == "cgroup_no_v1=all")
            {
                return true;
            }
        }
    }
    false
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MachineInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Running", default)]
    pub running: bool,
    #[serde(rename = "Default", default)]
    pub default: bool,
}

/// Parse `podman machine list --format json`.
pub fn parse_machine_list(json: &str) -> Result<Vec<MachineInfo>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).context("Failed to parse podman machine list")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "URI")]
    pub uri: String,
    #[serde(rename = "Default", default)]
    pub default: bool,
}

/// Parse `podman system connection list --format json`.
pub fn parse_connection_list(json: &str) -> Result<Vec<ConnectionInfo>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).context("Failed to parse podman connection list")
}

/// Server version out of `podman info --format json`, if it parses.
pub fn podman_info_version(json: &str) -> Option<String> {
    let info: Value = serde_json::from_str(json).ok()?;
    info.pointer("/version/Version")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageList {
    pub tagged: Vec<String>,
    pub dangling: usize,
}

impl ImageList {
    pub fn total(&self) -> usize {
        self.tagged.len() + self.dangling
    }
}

/// Parse `podman images --format {{.Repository}}:{{.Tag}}`.
pub fn parse_image_list(raw: &str) -> ImageList {
    let mut images = ImageList::default();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line == "<none>:<none>" {
            images.dangling += 1;
        } else {
            images.tagged.push(line.to_string());
        }
    }
    images
}

pub fn first_line(output: &str) -> &str {
    output.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

/// PID 1 is the full service manager rather than the minimal WSL init.
pub fn is_full_service_manager(pid1_comm: &str) -> bool {
    first_line(pid1_comm) == "systemd"
}

pub fn rootless_socket_path(uid: u32) -> String {
    format!("/run/user/{uid}/podman/podman.sock")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryMarkers {
    pub registry_blocks: bool,
    pub mirrors: usize,
}

#[derive(Debug, Default, Deserialize)]
struct RegistriesConf {
    #[serde(default)]
    registry: Vec<RegistryEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryEntry {
    #[serde(default)]
    mirror: Vec<toml::Table>,
}

/// Count `[[registry]]` entries and their mirrors in `registries.conf`.
/// Mirrors may be written as `[[registry.mirror]]` tables or as an inline
/// `mirror = [...]` array.
pub fn registries_mirror_markers(content: &str) -> Result<RegistryMarkers> {
    let conf: RegistriesConf =
        toml::from_str(content).context("Failed to parse registries.conf")?;
    Ok(RegistryMarkers {
        registry_blocks: !conf.registry.is_empty(),
        mirrors: conf.registry.iter().map(|r| r.mirror.len()).sum(),
    })
}

pub const DOCKER_PATH_KEY: &str = "dev.containers.dockerPath";
pub const DOCKER_SOCKET_KEY: &str = "dev.containers.dockerSocketPath";
pub const DOCKER_HOST_KEY: &str = "docker.host";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorContainerSettings {
    pub docker_path: Option<String>,
    pub docker_socket_path: Option<String>,
    pub docker_host: Option<String>,
}

/// Pull the container-related keys out of the editor's settings file.
/// The file is JSON with comments and trailing commas allowed.
pub fn editor_container_settings(jsonc: &str) -> Result<EditorContainerSettings> {
    let value: Value = json5::from_str(jsonc).context("Failed to parse editor settings")?;
    let get = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    Ok(EditorContainerSettings {
        docker_path: get(DOCKER_PATH_KEY),
        docker_socket_path: get(DOCKER_SOCKET_KEY),
        docker_host: get(DOCKER_HOST_KEY),
    })
}

/// Registry hostnames under the `auths` map of a credentials file.
pub fn auth_registries(json: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(json).context("Failed to parse credentials file")?;
    let mut hosts: Vec<String> = value
        .get("auths")
        .and_then(Value::as_object)
        .map(|auths| auths.keys().cloned().collect())
        .unwrap_or_default();
    hosts.sort();
    Ok(hosts)
}

/// Drop the password from a proxy URL before it is displayed.
pub fn mask_proxy(value: &str) -> String {
    match reqwest::Url::parse(value) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("****"));
            url.to_string()
        }
        _ => value.to_string(),
    }
}
