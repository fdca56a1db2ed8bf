use indicatif::ProgressBar;

use crate::checks::{self, Context};
use crate::config::Config;
use crate::probe::SubsystemProbe;
use crate::progress::{finish_spinner, stage_spinner};
use crate::report::choose_settings;
use crate::types::{Report, Section};

/// Run every section once, in order.
///
/// Only a missing WSL stops the run early; the returned report then has
/// `aborted` set and carries the sections that ran up to that point.
pub fn run(probe: &dyn SubsystemProbe, config: &Config) -> Report {
    let mut ctx = Context::new(probe, config);
    let mut sections = Vec::new();

    sections.push(stage(config, "Checking host environment...", || checks::host::check(&mut ctx)));

    let pb = config.progress.then(|| stage_spinner("Checking WSL..."));
    match checks::wsl::check(&mut ctx) {
        Ok(section) => {
            finish(pb, &section);
            sections.push(section);
        }
        Err(aborted) => {
            finish(pb, &aborted.section);
            sections.push(aborted.section);
            return Report {
                sections,
                issues: ctx.issues,
                recommendations: ctx.recommendations,
                settings: None,
                aborted: Some(aborted.reason),
            };
        }
    }

    sections.push(stage(config, "Checking Podman on host...", || {
        checks::podman_host::check(&mut ctx)
    }));
    sections.push(stage(config, "Checking Podman in WSL...", || {
        checks::podman_wsl::check(&mut ctx)
    }));
    sections.push(stage(config, "Checking VS Code settings...", || checks::editor::check(&mut ctx)));
    sections.push(stage(config, "Checking corporate connectivity...", || {
        checks::corporate::check(&mut ctx)
    }));

    let settings = choose_settings(ctx.host_pipe, ctx.wsl_socket.clone(), &config.machine_pipe);

    Report {
        sections,
        issues: ctx.issues,
        recommendations: ctx.recommendations,
        settings: Some(settings),
        aborted: None,
    }
}

fn stage(config: &Config, message: &str, f: impl FnOnce() -> Section) -> Section {
    let pb = config.progress.then(|| stage_spinner(message));
    let section = f();
    finish(pb, &section);
    section
}

fn finish(pb: Option<ProgressBar>, section: &Section) {
    if let Some(pb) = pb {
        finish_spinner(&pb, section.passed());
    }
}
