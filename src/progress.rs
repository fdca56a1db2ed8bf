use indicatif::{ProgressBar, ProgressStyle};

/// Spinner on stderr for one diagnostic section. Hidden when stderr is not a
/// terminal, so piped reports stay clean.
pub fn stage_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner} {msg}")
            .expect("invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

pub fn finish_spinner(pb: &ProgressBar, success: bool) {
    if success {
        pb.finish_with_message(format!("✓ {}", pb.message()));
    } else {
        pb.finish_with_message(format!("✗ {}", pb.message()));
    }
}
