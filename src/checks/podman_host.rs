use crate::parse::{
    first_line, parse_connection_list, parse_image_list, parse_machine_list, podman_info_version,
};
use crate::types::{CheckResult, Section};

use super::{Context, IMAGE_FORMAT, PODMAN_HOST_SECTION};

const INSTALL_HINT: &str = "https://podman.io/docs/installation";

pub fn check(ctx: &mut Context) -> Section {
    let mut section = Section::new(PODMAN_HOST_SECTION);

    match ctx.probe.find_on_path("podman") {
        Some(path) => {
            ctx.podman_on_host = true;
            section.push_check(CheckResult::pass("podman", path.display().to_string()));
            check_cli(ctx, &mut section);
        }
        None => {
            section.push_check(CheckResult::fail("podman", "Not found on PATH"));
            ctx.issue(format!(
                "Podman is not installed on the host. Install Podman Desktop or the CLI: {INSTALL_HINT}"
            ));
        }
    }

    let pipe = format!(r"\\.\pipe\{}", ctx.config.machine_pipe);
    ctx.host_pipe = ctx.probe.named_pipe_exists(&ctx.config.machine_pipe);
    section.push_check(if ctx.host_pipe {
        CheckResult::pass("named pipe", pipe)
    } else {
        CheckResult::fail("named pipe", format!("{pipe} not found"))
    });

    section
}

fn check_cli(ctx: &mut Context, section: &mut Section) {
    section.push_check(match ctx.probe.podman(&["--version"]) {
        Ok(r) if r.success() => CheckResult::pass("podman version", first_line(&r.stdout)),
        _ => CheckResult::fail("podman version", "Found on PATH but failed to get version"),
    });

    let machine_running = check_machines(ctx, section);

    match ctx.probe.podman(&["system", "connection", "list", "--format", "json"]) {
        Ok(r) if r.success() => match parse_connection_list(&r.stdout) {
            Ok(conns) if conns.is_empty() => section.push_info("No system connections configured"),
            Ok(conns) => {
                for conn in conns {
                    let marker = if conn.default { " (default)" } else { "" };
                    section.push_info(format!("connection {}{marker}: {}", conn.name, conn.uri));
                }
            }
            Err(e) => section.push_info(format!("System connections unreadable: {e:#}")),
        },
        _ => section.push_info("Could not list system connections"),
    }

    let connected = match ctx.probe.podman(&["info", "--format", "json"]) {
        Ok(r) if r.success() => {
            let detail = podman_info_version(&r.stdout)
                .map(|v| format!("server {v}"))
                .unwrap_or_else(|| "connected".to_string());
            section.push_check(CheckResult::pass("podman connectivity", detail));
            true
        }
        _ => {
            section.push_check(CheckResult::fail(
                "podman connectivity",
                "`podman info` failed; the machine is unreachable",
            ));
            if machine_running {
                ctx.issue("A Podman machine is running but the host CLI cannot reach it (`podman info` failed)");
            }
            false
        }
    };

    if connected {
        match ctx.probe.podman(&["images", "--format", IMAGE_FORMAT]) {
            Ok(r) if r.success() => {
                let images = parse_image_list(&r.stdout);
                section.push_info(format!(
                    "{} image(s) on host machine ({} dangling)",
                    images.total(),
                    images.dangling
                ));
                if ctx.config.verbose {
                    for image in &images.tagged {
                        section.push_info(format!("  {image}"));
                    }
                }
            }
            _ => section.push_info("Could not list images"),
        }
    }
}

/// Returns whether at least one machine is running.
fn check_machines(ctx: &mut Context, section: &mut Section) -> bool {
    let machines = match ctx.probe.podman(&["machine", "list", "--format", "json"]) {
        Ok(r) if r.success() => parse_machine_list(&r.stdout),
        Ok(r) => Err(anyhow::anyhow!("`podman machine list` exited with {}", r.exit_code)),
        Err(e) => Err(e),
    };

    match machines {
        Ok(machines) if machines.is_empty() => {
            section.push_check(CheckResult::fail("podman machine", "No machines defined"));
            ctx.recommend("Create and start a Podman machine:\npodman machine init\npodman machine start");
            false
        }
        Ok(machines) => {
            let running: Vec<String> = machines
                .iter()
                .filter(|m| m.running)
                .map(|m| {
                    if m.default {
                        format!("{} (default)", m.name)
                    } else {
                        m.name.clone()
                    }
                })
                .collect();
            if running.is_empty() {
                let names: Vec<&str> = machines.iter().map(|m| m.name.as_str()).collect();
                section.push_check(CheckResult::fail(
                    "podman machine",
                    format!("None running ({})", names.join(", ")),
                ));
                ctx.recommend("Start the Podman machine: podman machine start");
                false
            } else {
                section.push_check(CheckResult::pass(
                    "podman machine",
                    format!("{} running", running.join(", ")),
                ));
                true
            }
        }
        Err(e) => {
            section.push_check(CheckResult::fail(
                "podman machine",
                format!("Could not list machines: {e:#}"),
            ));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::probe::fake::FakeProbe;

    const MACHINES_RUNNING: &str =
        r#"[{"Name":"podman-machine-default","Default":true,"Running":true}]"#;
    const MACHINES_STOPPED: &str =
        r#"[{"Name":"podman-machine-default","Default":true,"Running":false}]"#;

    fn host_podman(machines: &str) -> FakeProbe {
        FakeProbe::new()
            .on_path("podman", r"C:\Program Files\RedHat\Podman\podman.exe")
            .cmd("podman --version", "podman version 5.2.1\n")
            .cmd("podman machine list --format json", machines)
            .cmd(
                "podman system connection list --format json",
                r#"[{"Name":"podman-machine-default","URI":"ssh://user@127.0.0.1:52123/run/user/1000/podman/podman.sock","Default":true}]"#,
            )
    }

    #[test]
    fn test_podman_missing_is_issue_and_pipe_still_checked() {
        let probe = FakeProbe::new().pipe("podman-machine-default");
        let config = Config::for_tests();
        let mut ctx = Context::new(&probe, &config);
        let section = check(&mut ctx);
        assert!(!section.check("podman").unwrap().passed);
        assert_eq!(ctx.issues.len(), 1);
        assert!(ctx.issues[0].contains(INSTALL_HINT));
        assert!(section.check("named pipe").unwrap().passed);
        assert!(ctx.host_pipe);
        assert!(!probe.ran("podman"));
    }

    #[test]
    fn test_running_machine_connected() {
        let probe = host_podman(MACHINES_RUNNING)
            .cmd("podman info --format json", r#"{"version":{"Version":"5.2.1"}}"#)
            .cmd(
                "podman images --format {{.Repository}}:{{.Tag}}",
                "docker.io/library/alpine:latest\n<none>:<none>\n",
            )
            .pipe("podman-machine-default");
        let config = Config::for_tests();
        let mut ctx = Context::new(&probe, &config);
        let section = check(&mut ctx);
        assert!(section.passed());
        assert_eq!(
            section.check("podman connectivity").unwrap().detail.as_deref(),
            Some("server 5.2.1")
        );
        assert!(ctx.issues.is_empty());
        assert!(ctx.recommendations.is_empty());
        assert!(probe.ran("podman images"));
    }

    #[test]
    fn test_stopped_machine_recommends_start() {
        let probe = host_podman(MACHINES_STOPPED).cmd_fail("podman info --format json", 125);
        let config = Config::for_tests();
        let mut ctx = Context::new(&probe, &config);
        let section = check(&mut ctx);
        assert!(!section.check("podman machine").unwrap().passed);
        assert!(!section.check("podman connectivity").unwrap().passed);
        assert_eq!(ctx.recommendations, vec!["Start the Podman machine: podman machine start"]);
        // Not connected, so no image listing and no duplicate issue.
        assert!(ctx.issues.is_empty());
        assert!(!probe.ran("podman images"));
    }

    #[test]
    fn test_no_machines_recommends_init() {
        let probe = host_podman("[]").cmd_fail("podman info --format json", 125);
        let config = Config::for_tests();
        let mut ctx = Context::new(&probe, &config);
        check(&mut ctx);
        assert!(ctx.recommendations[0].contains("podman machine init"));
    }

    #[test]
    fn test_running_but_unreachable_is_issue() {
        let probe = host_podman(MACHINES_RUNNING).cmd_fail("podman info --format json", 125);
        let config = Config::for_tests();
        let mut ctx = Context::new(&probe, &config);
        check(&mut ctx);
        assert_eq!(ctx.issues.len(), 1);
        assert!(ctx.issues[0].contains("podman info"));
    }
}
