use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "wsl-podman-doctor",
    about = "Diagnose WSL, Podman and Dev Containers setup on a Windows host"
)]
pub struct Cli {
    /// Enable verbose output (debug logs, full image lists)
    #[arg(short, long)]
    pub verbose: bool,

    /// Artifact repository base URL to probe for reachability
    /// (e.g. https://artifactory.example.com)
    #[arg(long, env = "ARTIFACT_URL")]
    pub artifact_url: Option<String>,
}
