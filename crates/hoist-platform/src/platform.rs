use std::sync::OnceLock;

/// Operating system family the running process was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformId {
    Windows,
    Macos,
    Linux,
}

impl PlatformId {
    /// Platform of the running process, or `None` on targets without an
    /// update channel. Resolved once and cached for the life of the process.
    #[must_use]
    pub fn current() -> Option<Self> {
        static CURRENT: OnceLock<Option<PlatformId>> = OnceLock::new();
        *CURRENT.get_or_init(Self::detect)
    }

    fn detect() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(Self::Windows)
        } else if cfg!(target_os = "macos") {
            Some(Self::Macos)
        } else if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else {
            None
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Macos => "macOS",
            Self::Linux => "Linux",
        }
    }

    /// Naming rule that ties a release asset to this platform.
    #[must_use]
    pub fn matches_asset(self, name: &str) -> bool {
        match self {
            Self::Windows => name.ends_with(".exe"),
            Self::Macos => name.to_ascii_lowercase().contains("mac"),
            Self::Linux => name.to_ascii_lowercase().contains("linux"),
        }
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
