use console::Style;
use serde_json::json;

use crate::parse::{DOCKER_HOST_KEY, DOCKER_PATH_KEY, DOCKER_SOCKET_KEY};
use crate::types::{Line, Report, SettingsSnippet, SettingsTarget};

/// Pick the endpoint the editor should use. The machine's named pipe wins
/// whenever it exists; the WSL rootless socket is the fallback.
pub fn choose_settings(
    host_pipe: bool,
    wsl_socket: Option<(String, String)>,
    pipe_name: &str,
) -> SettingsSnippet {
    let pipe_target = SettingsTarget::NamedPipe {
        pipe: pipe_name.to_string(),
    };
    match (host_pipe, wsl_socket) {
        (true, _) => SettingsSnippet {
            target: pipe_target,
            detected: true,
        },
        (false, Some((distro, path))) => SettingsSnippet {
            target: SettingsTarget::WslSocket { distro, path },
            detected: true,
        },
        (false, None) => SettingsSnippet {
            target: pipe_target,
            detected: false,
        },
    }
}

/// JSON object to paste into the editor's `settings.json`.
pub fn settings_json(snippet: &SettingsSnippet) -> serde_json::Value {
    match &snippet.target {
        SettingsTarget::NamedPipe { pipe } => {
            let endpoint = format!("npipe:////./pipe/{pipe}");
            json!({
                DOCKER_PATH_KEY: "podman",
                DOCKER_SOCKET_KEY: endpoint,
                DOCKER_HOST_KEY: endpoint,
            })
        }
        SettingsTarget::WslSocket { path, .. } => json!({
            DOCKER_PATH_KEY: "podman",
            "dev.containers.executeInWSL": true,
            DOCKER_SOCKET_KEY: path,
            DOCKER_HOST_KEY: format!("unix://{path}"),
        }),
    }
}

pub fn render(report: &Report) -> String {
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let dim = Style::new().dim();
    let header = Style::new().bold().underlined();

    let mut out: Vec<String> = Vec::new();

    for section in &report.sections {
        out.push(String::new());
        out.push(header.apply_to(&section.title).to_string());
        for line in &section.lines {
            match line {
                Line::Check(c) => {
                    let status = if c.passed {
                        green.apply_to("PASS")
                    } else {
                        red.apply_to("FAIL")
                    };
                    match &c.detail {
                        Some(detail) => out.push(format!("  {status} {}: {detail}", c.name)),
                        None => out.push(format!("  {status} {}", c.name)),
                    }
                }
                Line::Info(text) => out.push(format!("  {} {text}", dim.apply_to("INFO"))),
            }
        }
    }

    if let Some(reason) = &report.aborted {
        out.push(String::new());
        out.push(format!("{} {reason}", red.apply_to("FATAL")));
        out.push("Diagnostic aborted.".to_string());
        out.push(String::new());
        return out.join("\n");
    }

    out.push(String::new());
    out.push(header.apply_to("Summary").to_string());
    if report.issues.is_empty() {
        out.push(format!("  {} No blocking issues found.", green.apply_to("OK")));
    } else {
        out.push(format!("  Issues ({}):", report.issues.len()));
        for issue in &report.issues {
            out.push(format!("    {} {issue}", red.apply_to("-")));
        }
    }

    if report.recommendations.is_empty() {
        out.push("  No recommendations.".to_string());
    } else {
        out.push(format!("  Recommendations ({}):", report.recommendations.len()));
        for (i, rec) in report.recommendations.iter().enumerate() {
            let mut lines = rec.lines();
            let first = lines.next().unwrap_or("");
            out.push(format!("    {}. {first}", i + 1));
            for rest in lines {
                out.push(format!("         {rest}"));
            }
        }
    }

    if let Some(snippet) = &report.settings {
        out.push(String::new());
        out.push(header.apply_to("Recommended VS Code settings").to_string());
        match &snippet.target {
            _ if !snippet.detected => out.push(format!(
                "  {} No Podman endpoint detected; showing the default machine pipe.",
                dim.apply_to("NOTE")
            )),
            SettingsTarget::NamedPipe { pipe } => {
                out.push(format!("  Using the Podman machine pipe \\\\.\\pipe\\{pipe}"));
            }
            SettingsTarget::WslSocket { distro, path } => {
                out.push(format!("  Using the rootless socket {path} in {distro}"));
            }
        }
        let body = serde_json::to_string_pretty(&settings_json(snippet)).unwrap_or_default();
        for line in body.lines() {
            out.push(format!("  {line}"));
        }
    }

    out.push(String::new());
    out.join("\n")
}
