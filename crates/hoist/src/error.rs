#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorDetail {
    Message(String),
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl std::fmt::Display for AppErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::Io { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

impl From<String> for AppErrorDetail {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for AppErrorDetail {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<std::io::Error> for AppErrorDetail {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<hoist_core::UpdateError> for AppErrorDetail {
    fn from(value: hoist_core::UpdateError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<serde_json::Error> for AppErrorDetail {
    fn from(value: serde_json::Error) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<hoist_platform::AppPathsError> for AppErrorDetail {
    fn from(value: hoist_platform::AppPathsError) -> Self {
        Self::Message(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    UpdateCheckFailed {
        details: AppErrorDetail,
    },
    AutoUpdateFailed {
        phase: &'static str,
        details: AppErrorDetail,
    },
    Settings {
        action: &'static str,
        details: AppErrorDetail,
    },
}

impl AppError {
    pub fn update_check_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::UpdateCheckFailed {
            details: details.into(),
        }
    }

    pub fn auto_update_failed(phase: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::AutoUpdateFailed {
            phase,
            details: details.into(),
        }
    }

    pub fn settings(action: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::Settings {
            action,
            details: details.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpdateCheckFailed { details } => write!(f, "Update check failed: {details}"),
            Self::AutoUpdateFailed { phase, details } => {
                write!(f, "App update {phase} failed: {details}")
            }
            Self::Settings { action, details } => {
                write!(f, "Settings {action} failed: {details}")
            }
        }
    }
}

impl std::error::Error for AppError {}
