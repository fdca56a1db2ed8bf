use crate::config::REGISTRIES_CONF;
use crate::parse::{
    first_line, is_full_service_manager, parse_image_list, registries_mirror_markers,
    rootless_socket_path,
};
use crate::types::{CheckResult, DistroInfo, Section};

use super::{Context, IMAGE_FORMAT, PODMAN_WSL_SECTION};

pub fn check(ctx: &mut Context) -> Section {
    let mut section = Section::new(PODMAN_WSL_SECTION);

    let candidates = candidate_distros(&ctx.distros);
    if candidates.is_empty() {
        section.push_info("No general-purpose distro to inspect");
        return section;
    }
    for distro in candidates {
        check_distro(ctx, &mut section, &distro);
    }
    section
}

/// Every running general-purpose distro; if none is running, the default
/// one (or the first), so at most one distro gets booted.
pub fn candidate_distros(distros: &[DistroInfo]) -> Vec<String> {
    let general: Vec<&DistroInfo> = distros.iter().filter(|d| d.is_general_purpose()).collect();
    let running: Vec<String> = general
        .iter()
        .filter(|d| d.running)
        .map(|d| d.name.clone())
        .collect();
    if !running.is_empty() {
        return running;
    }
    general
        .iter()
        .find(|d| d.is_default)
        .or_else(|| general.first())
        .map(|d| vec![d.name.clone()])
        .unwrap_or_default()
}

fn check_distro(ctx: &mut Context, section: &mut Section, distro: &str) {
    let probe = ctx.probe;
    let podman_check = format!("podman in {distro}");

    let binary = match probe.wsl_exec(distro, &["which", "podman"]) {
        Ok(r) if r.success() && !r.stdout.trim().is_empty() => first_line(&r.stdout).to_string(),
        _ => {
            section.push_check(CheckResult::fail(podman_check, "Not installed"));
            if !ctx.podman_on_host {
                ctx.recommend(format!(
                    "Install Podman inside {distro} with its package manager, e.g.:\n\
                     wsl -d {distro} -- sudo apt-get install -y podman"
                ));
            }
            return;
        }
    };
    section.push_check(CheckResult::pass(podman_check, binary));

    match probe.wsl_exec(distro, &["podman", "--version"]) {
        Ok(r) if r.success() => section.push_info(format!("{distro}: {}", first_line(&r.stdout))),
        _ => section.push_info(format!("{distro}: could not read podman version")),
    }

    let systemd_check = format!("systemd in {distro}");
    let systemd = match probe.wsl_exec(distro, &["ps", "-p", "1", "-o", "comm="]) {
        Ok(r) if r.success() && is_full_service_manager(&r.stdout) => {
            section.push_check(CheckResult::pass(systemd_check, "PID 1 is systemd"));
            true
        }
        Ok(r) if r.success() => {
            section.push_check(CheckResult::fail(
                systemd_check,
                format!("PID 1 is {}", first_line(&r.stdout)),
            ));
            ctx.recommend(systemd_recommendation(distro));
            false
        }
        _ => {
            section.push_check(CheckResult::fail(systemd_check, "Could not inspect PID 1"));
            false
        }
    };

    let socket_check = format!("rootless socket in {distro}");
    let uid = probe
        .wsl_exec(distro, &["id", "-u"])
        .ok()
        .filter(|r| r.success())
        .and_then(|r| first_line(&r.stdout).parse::<u32>().ok());
    match uid {
        Some(uid) => {
            let path = rootless_socket_path(uid);
            let present = probe
                .wsl_exec(distro, &["test", "-S", &path])
                .is_ok_and(|r| r.success());
            if present {
                section.push_check(CheckResult::pass(socket_check, path.clone()));
                if ctx.wsl_socket.is_none() {
                    ctx.wsl_socket = Some((distro.to_string(), path));
                }
            } else {
                section.push_check(CheckResult::fail(socket_check, format!("{path} not found")));
                if systemd {
                    ctx.recommend(format!(
                        "Enable the rootless Podman socket in {distro} (no sudo):\n\
                         wsl -d {distro} -- systemctl --user enable --now podman.socket"
                    ));
                }
            }
        }
        None => section.push_check(CheckResult::fail(socket_check, "Could not determine user id")),
    }

    match probe.wsl_exec(distro, &["podman", "images", "--format", IMAGE_FORMAT]) {
        Ok(r) if r.success() => {
            let images = parse_image_list(&r.stdout);
            section.push_info(format!(
                "{distro}: {} image(s) ({} dangling)",
                images.total(),
                images.dangling
            ));
            if ctx.config.verbose {
                for image in &images.tagged {
                    section.push_info(format!("  {image}"));
                }
            }
        }
        _ => section.push_info(format!("{distro}: could not list images")),
    }

    match probe.wsl_exec(distro, &["cat", REGISTRIES_CONF]) {
        Ok(r) if r.success() => {
            section.push_info(match registries_mirror_markers(&r.stdout) {
                Ok(markers) if markers.mirrors > 0 => {
                    format!("{distro}: {REGISTRIES_CONF} mirror entries: {}", markers.mirrors)
                }
                Ok(markers) if markers.registry_blocks => {
                    format!("{distro}: {REGISTRIES_CONF} has registry entries but no mirrors")
                }
                Ok(_) => format!("{distro}: {REGISTRIES_CONF} has no mirror entries"),
                Err(e) => {
                    tracing::debug!("{distro}: {e:#}");
                    format!("{distro}: {REGISTRIES_CONF} present but could not be parsed")
                }
            });
        }
        _ => section.push_info(format!("{distro}: {REGISTRIES_CONF} not readable")),
    }
}

fn systemd_recommendation(distro: &str) -> String {
    format!(
        "Enable systemd in {distro} by adding to /etc/wsl.conf:\n\
         [boot]\n\
         systemd=true\n\
         then run `wsl --shutdown` and reopen the distro."
    )
}
