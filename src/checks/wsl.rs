use std::io::ErrorKind;

use crate::parse::{first_line, parse_distro_list, wslconfig_has_cgroup_v2};
use crate::types::{CheckResult, Section};

use super::{Aborted, Context, WSL_SECTION};

pub const WSLCONFIG_SECTION_LINE: &str = "[wsl2]";
pub const WSLCONFIG_KERNEL_LINE: &str = "kernelCommandLine = cgroup_no_v1=all";

pub fn check(ctx: &mut Context) -> Result<Section, Aborted> {
    let mut section = Section::new(WSL_SECTION);

    let version = match ctx.probe.wsl(&["--version"]) {
        Ok(r) if r.success() => first_line(&r.stdout).to_string(),
        Ok(r) => {
            let detail = if r.timed_out {
                "`wsl --version` timed out".to_string()
            } else {
                format!("`wsl --version` exited with {}", r.exit_code)
            };
            return Err(abort(section, detail));
        }
        Err(e) => return Err(abort(section, format!("{e:#}"))),
    };
    section.push_check(CheckResult::pass("wsl", version));

    match ctx.probe.wsl(&["--list", "--verbose"]) {
        Ok(r) if r.success() => ctx.distros = parse_distro_list(&r.stdout),
        Ok(r) => tracing::debug!("wsl --list --verbose exited with {}", r.exit_code),
        Err(e) => tracing::debug!("wsl --list --verbose failed: {e:#}"),
    }

    for distro in &ctx.distros {
        let mut traits = Vec::new();
        if distro.is_default {
            traits.push("default".to_string());
        }
        traits.push(if distro.running { "Running" } else { "Stopped" }.to_string());
        if let Some(v) = distro.version {
            traits.push(format!("WSL {v}"));
        }
        section.push_info(format!("distro {} ({})", distro.name, traits.join(", ")));
    }

    let machine_distros: Vec<&str> = ctx
        .distros
        .iter()
        .filter(|d| d.is_podman_machine())
        .map(|d| d.name.as_str())
        .collect();
    section.push_check(if machine_distros.is_empty() {
        CheckResult::fail("podman machine distro", "No podman-machine distro registered")
    } else {
        CheckResult::pass("podman machine distro", machine_distros.join(", "))
    });

    let general: Vec<&str> = ctx
        .distros
        .iter()
        .filter(|d| d.is_general_purpose())
        .map(|d| d.name.as_str())
        .collect();
    let has_general = !general.is_empty();
    section.push_check(if has_general {
        CheckResult::pass("general-purpose distro", general.join(", "))
    } else {
        CheckResult::fail("general-purpose distro", "None installed")
    });
    if !has_general {
        ctx.recommend("Install a Linux distro for native Podman: wsl --install -d Ubuntu");
    }

    section.push_check(check_wslconfig(ctx));
    Ok(section)
}

fn abort(mut section: Section, detail: String) -> Aborted {
    section.push_check(CheckResult::fail("wsl", detail.clone()));
    Aborted {
        section,
        reason: format!(
            "WSL is not available ({detail}). Install it from an elevated prompt with `wsl --install`, then rerun."
        ),
    }
}

fn check_wslconfig(ctx: &mut Context) -> CheckResult {
    let Some(path) = ctx.config.wslconfig_path.clone() else {
        ctx.recommend(cgroup_recommendation(r"%USERPROFILE%\.wslconfig"));
        return CheckResult::fail("cgroups v2", "Home directory unknown; cannot locate .wslconfig");
    };
    let shown = path.display().to_string();

    match ctx.probe.read_file(&path) {
        Ok(content) if wslconfig_has_cgroup_v2(&content) => {
            CheckResult::pass("cgroups v2", format!("cgroup_no_v1=all set in {shown}"))
        }
        Ok(_) => {
            ctx.recommend(cgroup_recommendation(&shown));
            CheckResult::fail("cgroups v2", format!("kernelCommandLine not set in {shown}"))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            ctx.recommend(cgroup_recommendation(&shown));
            CheckResult::fail("cgroups v2", format!("{shown} not found"))
        }
        Err(e) => CheckResult::fail("cgroups v2", format!("{shown} present but unreadable: {e}")),
    }
}

fn cgroup_recommendation(path: &str) -> String {
    format!(
        "Enable cgroups v2 for WSL by adding these lines to {path}:\n\
         {WSLCONFIG_SECTION_LINE}\n\
         {WSLCONFIG_KERNEL_LINE}\n\
         then run `wsl --shutdown` so the setting takes effect."
    )
}
