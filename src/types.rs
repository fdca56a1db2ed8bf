#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: Some(detail.into()),
        }
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// One rendered line inside a section.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Check(CheckResult),
    Info(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub lines: Vec<Line>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn push_check(&mut self, check: CheckResult) {
        self.lines.push(Line::Check(check));
    }

    pub fn push_info(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Info(text.into()));
    }

    /// True when no check in the section failed.
    pub fn passed(&self) -> bool {
        self.lines
            .iter()
            .all(|line| !matches!(line, Line::Check(c) if !c.passed))
    }

    /// Look up a check by name.
    #[cfg(test)]
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.lines.iter().find_map(|line| match line {
            Line::Check(c) if c.name == name => Some(c),
            _ => None,
        })
    }
}

/// A distro row from `wsl --list --verbose`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroInfo {
    pub name: String,
    pub running: bool,
    pub is_default: bool,
    pub version: Option<u8>,
}

impl DistroInfo {
    pub fn is_podman_machine(&self) -> bool {
        self.name.starts_with("podman-machine")
    }

    /// A distro a user would work in, as opposed to a tool-managed one.
    pub fn is_general_purpose(&self) -> bool {
        !self.is_podman_machine() && !self.name.starts_with("docker-desktop")
    }
}

/// Which endpoint the generated editor settings point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsTarget {
    NamedPipe { pipe: String },
    WslSocket { distro: String, path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSnippet {
    pub target: SettingsTarget,
    /// False when neither endpoint was found and the pipe form is a guess.
    pub detected: bool,
}

/// Everything one run produces. `aborted` is set when the run stopped on
/// the fatal WSL precondition; in that case no summary is rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub sections: Vec<Section>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub settings: Option<SettingsSnippet>,
    pub aborted: Option<String>,
}

#[cfg(test)]
impl Report {
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Find a check by name in any section.
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.sections.iter().find_map(|s| s.check(name))
    }
}
