use std::io::ErrorKind;

use crate::parse::{
    DOCKER_HOST_KEY, DOCKER_PATH_KEY, DOCKER_SOCKET_KEY, EditorContainerSettings,
    editor_container_settings,
};
use crate::types::{CheckResult, Section};

use super::{Context, EDITOR_SECTION};

pub fn check(ctx: &mut Context) -> Section {
    let mut section = Section::new(EDITOR_SECTION);

    section.push_check(match ctx.probe.find_on_path("code") {
        Some(path) => CheckResult::pass("code CLI", path.display().to_string()),
        None => CheckResult::fail("code CLI", "`code` not found on PATH"),
    });

    let Some(path) = ctx.config.editor_settings_path.clone() else {
        section.push_info("Editor settings location unknown");
        return section;
    };
    let shown = path.display().to_string();

    let settings = match ctx.probe.read_file(&path) {
        Ok(content) => {
            section.push_check(CheckResult::pass("settings.json", shown.clone()));
            match editor_container_settings(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::debug!("{shown}: {e:#}");
                    section.push_info("settings.json could not be parsed; contents unknown");
                    return section;
                }
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            section.push_check(CheckResult::fail("settings.json", format!("{shown} not found")));
            EditorContainerSettings::default()
        }
        Err(e) => {
            section.push_check(CheckResult::fail(
                "settings.json",
                format!("{shown} present but unreadable: {e}"),
            ));
            return section;
        }
    };

    for (key, value) in [
        (DOCKER_PATH_KEY, &settings.docker_path),
        (DOCKER_SOCKET_KEY, &settings.docker_socket_path),
        (DOCKER_HOST_KEY, &settings.docker_host),
    ] {
        section.push_info(format!("{key}: {}", value.as_deref().unwrap_or("<not set>")));
    }

    if settings.docker_path.as_deref() == Some("podman") {
        section.push_check(CheckResult::pass(DOCKER_PATH_KEY, "podman"));
    } else {
        section.push_check(CheckResult::fail(
            DOCKER_PATH_KEY,
            settings.docker_path.as_deref().unwrap_or("<not set>"),
        ));
        ctx.recommend(format!("Set \"{DOCKER_PATH_KEY}\": \"podman\" in {shown}"));
    }

    section
}
