use std::io::ErrorKind;

use crate::parse::auth_registries;
use crate::types::{CheckResult, Section};

use super::{CORPORATE_SECTION, Context};

pub fn check(ctx: &mut Context) -> Section {
    let mut section = Section::new(CORPORATE_SECTION);

    match ctx.config.artifact_url.clone() {
        Some(url) => match ctx.probe.http_get(&url, ctx.config.http_timeout) {
            Ok(status) => {
                section.push_check(CheckResult::pass(
                    "artifact repository",
                    format!("{url} -> HTTP {status}"),
                ));
            }
            Err(e) => {
                section.push_check(CheckResult::fail(
                    "artifact repository",
                    format!("{url} unreachable"),
                ));
                ctx.issue(format!("Cannot reach artifact repository {url}: {e:#}"));
            }
        },
        None => section.push_info("No artifact repository URL given; reachability not tested"),
    }

    let mut found = Vec::new();
    for path in &ctx.config.credential_paths {
        let shown = path.display().to_string();
        match ctx.probe.read_file(path) {
            Ok(content) => {
                match auth_registries(&content) {
                    Ok(hosts) if hosts.is_empty() => {
                        section.push_info(format!("{shown}: no registries configured"));
                    }
                    Ok(hosts) => section.push_info(format!("{shown}: {}", hosts.join(", "))),
                    Err(_) => section.push_info(format!("{shown}: present but could not be parsed")),
                }
                found.push(shown);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => section.push_info(format!("{shown}: unreadable ({e})")),
        }
    }
    section.push_check(if found.is_empty() {
        CheckResult::fail("registry credentials", "No credentials file found")
    } else {
        CheckResult::pass("registry credentials", found.join(", "))
    });

    section
}
