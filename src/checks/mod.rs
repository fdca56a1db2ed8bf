pub mod corporate;
pub mod editor;
pub mod host;
pub mod podman_host;
pub mod podman_wsl;
pub mod wsl;

use crate::config::Config;
use crate::probe::SubsystemProbe;
use crate::types::{DistroInfo, Section};

pub const HOST_SECTION: &str = "Host environment";
pub const WSL_SECTION: &str = "WSL";
pub const PODMAN_HOST_SECTION: &str = "Podman on host";
pub const PODMAN_WSL_SECTION: &str = "Podman in WSL";
pub const EDITOR_SECTION: &str = "VS Code Dev Containers";
pub const CORPORATE_SECTION: &str = "Corporate connectivity";

/// `podman images` output format shared by host and distro listings.
pub const IMAGE_FORMAT: &str = "{{.Repository}}:{{.Tag}}";

/// State threaded through the sections of one run.
///
/// Sections only append to `issues` and `recommendations`; later sections
/// read the facts earlier ones recorded (`distros`, `host_pipe`,
/// `wsl_socket`).
pub struct Context<'a> {
    pub probe: &'a dyn SubsystemProbe,
    pub config: &'a Config,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub distros: Vec<DistroInfo>,
    pub podman_on_host: bool,
    pub host_pipe: bool,
    /// First `(distro, socket path)` whose rootless socket exists.
    pub wsl_socket: Option<(String, String)>,
}

impl<'a> Context<'a> {
    pub fn new(probe: &'a dyn SubsystemProbe, config: &'a Config) -> Self {
        Self {
            probe,
            config,
            issues: Vec::new(),
            recommendations: Vec::new(),
            distros: Vec::new(),
            podman_on_host: false,
            host_pipe: false,
            wsl_socket: None,
        }
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!("issue: {text}");
        self.issues.push(text);
    }

    pub fn recommend(&mut self, text: impl Into<String>) {
        self.recommendations.push(text.into());
    }
}

/// Raised only by the WSL section when WSL itself is unusable.
#[derive(Debug)]
pub struct Aborted {
    pub section: Section,
    pub reason: String,
}
